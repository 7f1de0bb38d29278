//! Stateless request builder and response parser for the favorites API.
//!
//! # Design
//! `FavoritesClient` holds only its `ClientConfig` and carries no mutable
//! state between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes the
//! `TransportResult`. The session is an explicit argument to every call.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::decode::{decode, expect_body, StatusCodePolicy};
use crate::error::{snippet, ApiError};
use crate::http::{build_request, Endpoint, HttpMethod, HttpRequest, TransportResult};
use crate::types::{
    AckCode, FavoritesEnvelope, FavoritesPage, Movie, Session, ToggleAcknowledgement,
    ToggleRequest,
};

pub const FAVORITE_MOVIES: Endpoint = Endpoint {
    method: HttpMethod::Get,
    path: "/account/{account_id}/favorite/movies",
};

pub const MARK_FAVORITE: Endpoint = Endpoint {
    method: HttpMethod::Post,
    path: "/account/{account_id}/favorite",
};

const JSON: &str = "application/json";
const JSON_UTF8: &str = "application/json;charset=utf-8";

/// A well-formed JSON payload that does not have the expected shape.
fn shape_error(err: serde_json::Error, value: &Value) -> ApiError {
    ApiError::MalformedJsonError(format!("{err}; body: {}", snippet(value.to_string().as_bytes())))
}

/// Synchronous, stateless client for the favorites endpoints.
#[derive(Debug, Clone)]
pub struct FavoritesClient {
    config: ClientConfig,
}

impl FavoritesClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn credentials(&self, session: &Session) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("api_key", self.config.api_key.clone()),
            ("session_id", session.session_id.clone()),
        ])
    }

    /// GET one page of the account's favorite movies. Pages start at 1.
    pub fn build_favorites_query(
        &self,
        session: &Session,
        page: u32,
    ) -> Result<HttpRequest, ApiError> {
        let mut query = self.credentials(session);
        query.insert("page", page.max(1).to_string());
        build_request(
            &self.config.api_base_url,
            FAVORITE_MOVIES,
            &[("account_id", session.user_id.as_str())],
            &query,
            vec![("accept".to_string(), JSON.to_string())],
            None,
        )
    }

    /// Decode one page of favorites.
    ///
    /// Any `status_code` in this payload is treated as the remote error
    /// envelope, even on a 2xx response.
    pub fn parse_favorites_page(&self, result: TransportResult) -> Result<FavoritesPage, ApiError> {
        let value = decode(result, StatusCodePolicy::Reject)?;
        let envelope =
            FavoritesEnvelope::deserialize(&value).map_err(|e| shape_error(e, &value))?;
        let movies = envelope.results.ok_or(ApiError::MissingResultsField)?;
        let page = envelope.page.unwrap_or(1);
        Ok(FavoritesPage {
            page,
            total_pages: envelope.total_pages.unwrap_or(page),
            total_results: envelope
                .total_results
                .unwrap_or_else(|| u32::try_from(movies.len()).unwrap_or(u32::MAX)),
            movies,
        })
    }

    /// Whether `movie` appears in a single page of favorites.
    pub fn parse_favorite_status(
        &self,
        result: TransportResult,
        movie: &Movie,
    ) -> Result<bool, ApiError> {
        Ok(self.parse_favorites_page(result)?.contains(movie.id))
    }

    /// POST a mutation that flips `current_favorite` for `movie`.
    pub fn build_toggle_favorite(
        &self,
        session: &Session,
        movie: &Movie,
        current_favorite: bool,
    ) -> Result<HttpRequest, ApiError> {
        let payload = ToggleRequest::movie(movie.id, !current_favorite);
        let body = serde_json::to_string(&payload)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let request = build_request(
            &self.config.api_base_url,
            MARK_FAVORITE,
            &[("account_id", session.user_id.as_str())],
            &self.credentials(session),
            vec![
                ("accept".to_string(), JSON.to_string()),
                ("content-type".to_string(), JSON_UTF8.to_string()),
            ],
            Some(body),
        )?;
        Ok(request.with_timeout(self.config.toggle_timeout))
    }

    /// Decode the mutation acknowledgement into its code.
    pub fn parse_toggle_acknowledgement(&self, result: TransportResult) -> Result<AckCode, ApiError> {
        let value = decode(result, StatusCodePolicy::Acknowledge)?;
        let ack =
            ToggleAcknowledgement::deserialize(&value).map_err(|e| shape_error(e, &value))?;
        let code = AckCode::from_code(ack.status_code.ok_or(ApiError::MissingStatusCodeField)?);
        if let AckCode::Unrecognized(code) = code {
            log::warn!(
                "unrecognized favorite acknowledgement code {code} ({}); treating as not favorite",
                ack.status_message.as_deref().unwrap_or("no message")
            );
        }
        Ok(code)
    }

    /// Favorite state after a mutation, derived from the acknowledgement code.
    pub fn parse_toggle_favorite(&self, result: TransportResult) -> Result<bool, ApiError> {
        Ok(self.parse_toggle_acknowledgement(result)?.favorite())
    }

    /// GET the poster image, or `None` when the movie has no poster.
    pub fn build_poster_request(&self, movie: &Movie) -> Option<Result<HttpRequest, ApiError>> {
        let poster_path = movie.poster_path.as_deref()?.trim_start_matches('/');
        Some(build_request(
            &self.config.image_base_url,
            Endpoint {
                method: HttpMethod::Get,
                path: "/{size}/{file}",
            },
            &[("size", self.config.poster_size.as_str()), ("file", poster_path)],
            &BTreeMap::new(),
            Vec::new(),
            None,
        ))
    }

    /// Raw poster bytes; the image itself is not inspected.
    pub fn parse_poster(&self, result: TransportResult) -> Result<Vec<u8>, ApiError> {
        expect_body(result)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::http::HttpResponse;

    fn client() -> FavoritesClient {
        FavoritesClient::new(
            ClientConfig::new("key")
                .with_api_base_url("http://localhost:3000/3")
                .with_image_base_url("http://localhost:3000/t/p"),
        )
    }

    fn session() -> Session {
        Session::new("42", "sid")
    }

    fn respond(status: u16, body: &str) -> TransportResult {
        TransportResult::completed(HttpResponse::new(status, body))
    }

    #[test]
    fn build_favorites_query_produces_correct_request() {
        let req = client().build_favorites_query(&session(), 1).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:3000/3/account/42/favorite/movies?api_key=key&page=1&session_id=sid"
        );
        assert_eq!(req.header("accept"), Some("application/json"));
        assert!(req.body.is_none());
        assert!(req.timeout.is_none());
    }

    #[test]
    fn build_favorites_query_clamps_page_zero() {
        let req = client().build_favorites_query(&session(), 0).unwrap();
        assert!(req.url.contains("page=1"));
    }

    #[test]
    fn build_toggle_favorite_produces_correct_request() {
        let movie = Movie::new(603, "The Matrix");
        let req = client().build_toggle_favorite(&session(), &movie, false).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.url,
            "http://localhost:3000/3/account/42/favorite?api_key=key&session_id=sid"
        );
        assert_eq!(req.header("content-type"), Some("application/json;charset=utf-8"));
        assert_eq!(req.timeout, Some(Duration::from_secs(10)));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"media_type": "movie", "media_id": 603, "favorite": true})
        );
    }

    #[test]
    fn build_toggle_favorite_unfavorites_when_current() {
        let movie = Movie::new(603, "The Matrix");
        let req = client().build_toggle_favorite(&session(), &movie, true).unwrap();
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["favorite"], false);
    }

    #[test]
    fn build_with_bad_base_url_is_malformed() {
        let client = FavoritesClient::new(ClientConfig::new("key").with_api_base_url("::nope"));
        let err = client.build_favorites_query(&session(), 1).unwrap_err();
        assert!(matches!(err, ApiError::MalformedUrl(_)));
    }

    #[test]
    fn favorite_status_true_when_movie_listed() {
        let movie = Movie::new(603, "The Matrix");
        let favorite = client()
            .parse_favorite_status(respond(200, r#"{"results":[{"id":603},{"id":550}]}"#), &movie)
            .unwrap();
        assert!(favorite);
    }

    #[test]
    fn favorite_status_false_when_movie_absent() {
        let movie = Movie::new(13, "Forrest Gump");
        let favorite = client()
            .parse_favorite_status(respond(200, r#"{"results":[{"id":603},{"id":550}]}"#), &movie)
            .unwrap();
        assert!(!favorite);

        let empty = client()
            .parse_favorite_status(respond(200, r#"{"results":[]}"#), &movie)
            .unwrap();
        assert!(!empty);
    }

    #[test]
    fn favorite_status_ignores_fields_other_than_id() {
        let movie = Movie::new(603, "The Matrix");
        let body = r#"{"results":[{"id":603,"title":null},{"id":550,"poster_path":false}]}"#;
        assert!(client().parse_favorite_status(respond(200, body), &movie).unwrap());

        let body = r#"{"results":[{"id":550,"title":{"en":"Fight Club"},"poster_path":3}]}"#;
        assert!(!client().parse_favorite_status(respond(200, body), &movie).unwrap());
    }

    #[test]
    fn favorites_entry_without_id_is_malformed_with_snippet() {
        let err = client()
            .parse_favorites_page(respond(200, r#"{"results":[{"title":"No id"}]}"#))
            .unwrap_err();
        match err {
            ApiError::MalformedJsonError(message) => assert!(message.contains("No id"), "{message}"),
            other => panic!("expected MalformedJsonError, got {other:?}"),
        }
    }

    #[test]
    fn favorites_page_without_results_is_missing_field() {
        let err = client()
            .parse_favorites_page(respond(200, r#"{"page":1}"#))
            .unwrap_err();
        assert_eq!(err, ApiError::MissingResultsField);
    }

    #[test]
    fn favorites_page_with_status_code_is_remote_error() {
        let err = client()
            .parse_favorites_page(respond(
                200,
                r#"{"status_code":3,"status_message":"Authentication failed","results":[]}"#,
            ))
            .unwrap_err();
        assert!(matches!(err, ApiError::RemoteApiError { code: 3, .. }));
    }

    #[test]
    fn favorites_page_reads_paging_fields() {
        let page = client()
            .parse_favorites_page(respond(
                200,
                r#"{"page":2,"total_pages":3,"total_results":41,"results":[{"id":1}]}"#,
            ))
            .unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_results, 41);
        assert!(!page.is_last());
    }

    #[test]
    fn favorites_page_defaults_to_single_page() {
        let page = client()
            .parse_favorites_page(respond(200, r#"{"results":[{"id":1},{"id":2}]}"#))
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_results, 2);
        assert!(page.is_last());
    }

    #[test]
    fn favorites_page_with_non_array_results_is_malformed() {
        let err = client()
            .parse_favorites_page(respond(200, r#"{"results":"nope"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedJsonError(_)));
    }

    #[test]
    fn toggle_codes_one_and_twelve_are_favorite() {
        for code in [1, 12] {
            let body = format!(r#"{{"status_code":{code}}}"#);
            assert!(client().parse_toggle_favorite(respond(201, &body)).unwrap());
        }
    }

    #[test]
    fn toggle_other_codes_are_not_favorite() {
        for code in [13, 0, 2, 99] {
            let body = format!(r#"{{"status_code":{code}}}"#);
            assert!(!client().parse_toggle_favorite(respond(200, &body)).unwrap());
        }
    }

    #[test]
    fn toggle_without_status_code_is_missing_field() {
        let err = client()
            .parse_toggle_favorite(respond(200, r#"{"status_message":"?"}"#))
            .unwrap_err();
        assert_eq!(err, ApiError::MissingStatusCodeField);
    }

    #[test]
    fn toggle_with_null_status_code_is_missing_field() {
        let err = client()
            .parse_toggle_favorite(respond(200, r#"{"status_code":null}"#))
            .unwrap_err();
        assert_eq!(err, ApiError::MissingStatusCodeField);
    }

    #[test]
    fn toggle_with_non_integer_status_code_is_malformed() {
        let err = client()
            .parse_toggle_favorite(respond(200, r#"{"status_code":"1"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedJsonError(_)));
    }

    #[test]
    fn toggle_http_500_is_status_error() {
        let err = client()
            .parse_toggle_favorite(respond(500, "{not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpStatusError { status: 500, .. }));
    }

    #[test]
    fn toggle_acknowledgement_exposes_code() {
        let ack = client()
            .parse_toggle_acknowledgement(respond(200, r#"{"status_code":13,"success":true}"#))
            .unwrap();
        assert_eq!(ack, AckCode::Deleted);
    }

    #[test]
    fn poster_request_joins_size_and_path() {
        let movie = Movie::new(603, "The Matrix").with_poster("/matrix.jpg");
        let req = client().build_poster_request(&movie).unwrap().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/t/p/w342/matrix.jpg");
    }

    #[test]
    fn poster_request_absent_without_poster_path() {
        let movie = Movie::new(603, "The Matrix");
        assert!(client().build_poster_request(&movie).is_none());
    }

    #[test]
    fn parse_poster_rejects_404() {
        let err = client().parse_poster(respond(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::HttpStatusError { status: 404, .. }));
    }
}
