//! Async execution of `FavoritesClient` requests.
//!
//! # Design
//! `Transport` is the only seam that touches the network. Each service
//! method is one build, one (or, for paging, a few) awaited round-trips, and
//! one parse; suspension only happens inside `Transport::execute`. Nothing is
//! retried. Failures are logged with the redacted URL and returned to the
//! caller untouched.

use async_trait::async_trait;

use crate::client::FavoritesClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, TransportResult};
use crate::types::{Movie, Session};

/// The remote API never serves more pages than this.
pub const MAX_FAVORITE_PAGES: u32 = 500;

/// Executes plain-data requests against the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> TransportResult;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn execute(&self, request: HttpRequest) -> TransportResult {
        (**self).execute(request).await
    }
}

/// Both halves of loading a movie detail screen.
#[derive(Debug)]
pub struct DetailLoad {
    pub favorite: Result<bool, ApiError>,
    pub poster: Result<Option<Vec<u8>>, ApiError>,
}

/// Favorites operations over a shared transport.
pub struct FavoritesService<T> {
    client: FavoritesClient,
    transport: T,
}

impl<T: Transport> FavoritesService<T> {
    pub fn new(client: FavoritesClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &FavoritesClient {
        &self.client
    }

    async fn round_trip(&self, request: HttpRequest) -> (String, TransportResult) {
        let url = request.redacted_url();
        log::debug!("{} {}", request.method.as_str(), url);
        let result = self.transport.execute(request).await;
        (url, result)
    }

    /// Whether `movie` is among the account's favorites, walking every page.
    pub async fn resolve_favorite(&self, session: &Session, movie: &Movie) -> Result<bool, ApiError> {
        let mut page = 1;
        loop {
            let request = self.client.build_favorites_query(session, page)?;
            let (url, result) = self.round_trip(request).await;
            let favorites = self.client.parse_favorites_page(result).inspect_err(|e| {
                log::warn!("favorite status query {url} failed: {e}");
            })?;
            if favorites.contains(movie.id) {
                return Ok(true);
            }
            if favorites.is_last() || page >= MAX_FAVORITE_PAGES {
                log::debug!("movie {} not found in {} favorite page(s)", movie.id, page);
                return Ok(false);
            }
            page = favorites.page.max(page) + 1;
        }
    }

    /// Flip the favorite state of `movie`; returns the acknowledged state.
    ///
    /// On error the caller's `current_favorite` stays authoritative.
    pub async fn toggle_favorite(
        &self,
        session: &Session,
        movie: &Movie,
        current_favorite: bool,
    ) -> Result<bool, ApiError> {
        let request = self
            .client
            .build_toggle_favorite(session, movie, current_favorite)?;
        let (url, result) = self.round_trip(request).await;
        let favorite = self.client.parse_toggle_favorite(result).inspect_err(|e| {
            log::warn!("favorite toggle {url} for movie {} failed: {e}", movie.id);
        })?;
        log::debug!("movie {} favorite is now {favorite}", movie.id);
        Ok(favorite)
    }

    /// Poster bytes, or `None` when the movie has no poster.
    pub async fn fetch_poster(&self, movie: &Movie) -> Result<Option<Vec<u8>>, ApiError> {
        let Some(request) = self.client.build_poster_request(movie) else {
            return Ok(None);
        };
        let (url, result) = self.round_trip(request?).await;
        let bytes = self.client.parse_poster(result).inspect_err(|e| {
            log::warn!("poster fetch {url} failed: {e}");
        })?;
        Ok(Some(bytes))
    }

    /// Run the favorite query and the poster fetch concurrently.
    pub async fn load_detail(&self, session: &Session, movie: &Movie) -> DetailLoad {
        let (favorite, poster) = futures::join!(
            self.resolve_favorite(session, movie),
            self.fetch_poster(movie)
        );
        DetailLoad { favorite, poster }
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use async_trait::async_trait;

    use super::Transport;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportResult};

    /// `Transport` backed by a shared `reqwest::Client`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn execute(&self, request: HttpRequest) -> TransportResult {
            let method = match request.method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
            };
            let mut builder = self.client.request(method, request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => return TransportResult::failed(e.to_string()),
            };
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            match response.bytes().await {
                Ok(body) => TransportResult::completed(HttpResponse {
                    status,
                    headers,
                    body: body.to_vec(),
                }),
                Err(e) => TransportResult::failed(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::ClientConfig;
    use crate::http::{HttpMethod, HttpResponse};

    /// Replays canned outcomes in order and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<Vec<TransportResult>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<TransportResult>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: HttpRequest) -> TransportResult {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| TransportResult::failed("no scripted reply"))
        }
    }

    fn json(status: u16, body: &str) -> TransportResult {
        TransportResult::completed(HttpResponse::new(status, body))
    }

    fn service(replies: Vec<TransportResult>) -> FavoritesService<ScriptedTransport> {
        let config = ClientConfig::new("key")
            .with_api_base_url("http://api.test/3")
            .with_image_base_url("http://img.test/t/p");
        FavoritesService::new(FavoritesClient::new(config), ScriptedTransport::new(replies))
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn resolve_finds_movie_on_first_page() {
        let svc = service(vec![json(200, r#"{"page":1,"total_pages":1,"results":[{"id":603},{"id":550}]}"#)]);
        let session = Session::new("42", "sid");
        let found = block_on(svc.resolve_favorite(&session, &Movie::new(603, "The Matrix")));
        assert!(found.unwrap());
        assert_eq!(svc.transport.seen().len(), 1);
    }

    #[test]
    fn resolve_walks_pages_until_found() {
        let svc = service(vec![
            json(200, r#"{"page":1,"total_pages":3,"results":[{"id":1}]}"#),
            json(200, r#"{"page":2,"total_pages":3,"results":[{"id":603}]}"#),
        ]);
        let session = Session::new("42", "sid");
        let found = block_on(svc.resolve_favorite(&session, &Movie::new(603, "The Matrix")));
        assert!(found.unwrap());
        let seen = svc.transport.seen();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].url.contains("page=2"));
    }

    #[test]
    fn resolve_returns_false_after_last_page() {
        let svc = service(vec![
            json(200, r#"{"page":1,"total_pages":2,"results":[{"id":1}]}"#),
            json(200, r#"{"page":2,"total_pages":2,"results":[{"id":2}]}"#),
        ]);
        let session = Session::new("42", "sid");
        let found = block_on(svc.resolve_favorite(&session, &Movie::new(603, "The Matrix")));
        assert!(!found.unwrap());
    }

    #[test]
    fn resolve_propagates_errors_without_retry() {
        let svc = service(vec![json(500, "boom")]);
        let session = Session::new("42", "sid");
        let err = block_on(svc.resolve_favorite(&session, &Movie::new(603, "The Matrix"))).unwrap_err();
        assert!(matches!(err, ApiError::HttpStatusError { status: 500, .. }));
        assert_eq!(svc.transport.seen().len(), 1);
    }

    #[test]
    fn toggle_posts_desired_state_and_reads_ack() {
        let svc = service(vec![json(201, r#"{"status_code":1,"status_message":"Success."}"#)]);
        let session = Session::new("42", "sid");
        let favorite = block_on(svc.toggle_favorite(&session, &Movie::new(603, "The Matrix"), false));
        assert!(favorite.unwrap());

        let seen = svc.transport.seen();
        assert_eq!(seen[0].method, HttpMethod::Post);
        let body: serde_json::Value = serde_json::from_str(seen[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"media_type": "movie", "media_id": 603, "favorite": true})
        );
    }

    #[test]
    fn toggle_transport_failure_is_returned() {
        let svc = service(vec![TransportResult::failed("timed out")]);
        let session = Session::new("42", "sid");
        let err = block_on(svc.toggle_favorite(&session, &Movie::new(603, "The Matrix"), true)).unwrap_err();
        assert_eq!(err, ApiError::TransportError("timed out".to_string()));
    }

    #[test]
    fn poster_is_skipped_without_path() {
        let svc = service(Vec::new());
        let poster = block_on(svc.fetch_poster(&Movie::new(603, "The Matrix")));
        assert_eq!(poster.unwrap(), None);
        assert!(svc.transport.seen().is_empty());
    }

    #[test]
    fn load_detail_reports_each_half_independently() {
        let svc = service(vec![
            json(200, r#"{"results":[{"id":603}]}"#),
            json(404, ""),
        ]);
        let session = Session::new("42", "sid");
        let movie = Movie::new(603, "The Matrix").with_poster("/m.jpg");
        let load = block_on(svc.load_detail(&session, &movie));
        assert!(load.favorite.unwrap());
        assert!(matches!(load.poster, Err(ApiError::HttpStatusError { status: 404, .. })));
    }
}
