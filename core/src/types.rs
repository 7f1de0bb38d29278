//! Domain DTOs for the movie database's favorites endpoints.
//!
//! # Design
//! Response envelopes are decoded into these structs field by field instead
//! of being probed as dynamic maps. The mock-server crate defines its own
//! copies of the wire types; integration tests catch schema drift.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A movie as returned by the API. Only `id` is required; a `title` or
/// `poster_path` that is null or not a string reads as absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_title")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub poster_path: Option<String>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_owned))
}

fn lenient_title<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

impl Movie {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: None,
        }
    }

    pub fn with_poster(mut self, poster_path: impl Into<String>) -> Self {
        self.poster_path = Some(poster_path.into());
        self
    }
}

/// Opaque credential pair supplied by the authentication flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub session_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
}

/// Body of the favorite mutation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleRequest {
    pub media_type: MediaType,
    pub media_id: i64,
    pub favorite: bool,
}

impl ToggleRequest {
    pub fn movie(media_id: i64, favorite: bool) -> Self {
        Self {
            media_type: MediaType::Movie,
            media_id,
            favorite,
        }
    }
}

/// Body of the favorite mutation response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ToggleAcknowledgement {
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
}

/// Acknowledgement codes defined by the remote API for favorite mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckCode {
    /// 1: the item was added.
    Success,
    /// 12: the item was already present and has been updated.
    Updated,
    /// 13: the item was removed.
    Deleted,
    Unrecognized(i64),
}

impl AckCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => AckCode::Success,
            12 => AckCode::Updated,
            13 => AckCode::Deleted,
            other => AckCode::Unrecognized(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            AckCode::Success => 1,
            AckCode::Updated => 12,
            AckCode::Deleted => 13,
            AckCode::Unrecognized(code) => code,
        }
    }

    /// Favorite state implied by the acknowledgement.
    pub fn favorite(self) -> bool {
        match self {
            AckCode::Success | AckCode::Updated => true,
            AckCode::Deleted | AckCode::Unrecognized(_) => false,
        }
    }
}

/// One page of the account's favorite movies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesPage {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub movies: Vec<Movie>,
}

impl FavoritesPage {
    pub fn contains(&self, movie_id: i64) -> bool {
        self.movies.iter().any(|m| m.id == movie_id)
    }

    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }
}

/// Wire shape of the favorites list response.
#[derive(Debug, Deserialize)]
pub(crate) struct FavoritesEnvelope {
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
    pub total_results: Option<u32>,
    pub results: Option<Vec<Movie>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_request_serializes_with_movie_media_type() {
        let body = serde_json::to_value(ToggleRequest::movie(603, true)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"media_type": "movie", "media_id": 603, "favorite": true})
        );
    }

    #[test]
    fn movie_requires_id_only() {
        let movie: Movie = serde_json::from_str(r#"{"id":550}"#).unwrap();
        assert_eq!(movie.id, 550);
        assert!(movie.title.is_empty());
        assert!(movie.poster_path.is_none());

        let result: Result<Movie, _> = serde_json::from_str(r#"{"title":"No id"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn movie_ignores_unknown_fields() {
        let movie: Movie = serde_json::from_str(
            r#"{"id":603,"title":"The Matrix","poster_path":"/m.jpg","vote_average":8.2}"#,
        )
        .unwrap();
        assert_eq!(movie.poster_path.as_deref(), Some("/m.jpg"));
    }

    #[test]
    fn movie_tolerates_null_and_mistyped_fields() {
        let movie: Movie =
            serde_json::from_str(r#"{"id":603,"title":null,"poster_path":false}"#).unwrap();
        assert_eq!(movie, Movie::new(603, ""));

        let movie: Movie = serde_json::from_str(r#"{"id":550,"title":7,"poster_path":null}"#).unwrap();
        assert_eq!(movie.id, 550);
        assert!(movie.title.is_empty());
        assert!(movie.poster_path.is_none());
    }

    #[test]
    fn ack_codes_map_to_favorite_state() {
        assert!(AckCode::from_code(1).favorite());
        assert!(AckCode::from_code(12).favorite());
        assert!(!AckCode::from_code(13).favorite());
        assert_eq!(AckCode::from_code(99), AckCode::Unrecognized(99));
        assert!(!AckCode::from_code(99).favorite());
    }

    #[test]
    fn ack_code_round_trips_numeric_value() {
        for code in [1, 12, 13, 7, -1] {
            assert_eq!(AckCode::from_code(code).code(), code);
        }
    }

    #[test]
    fn page_is_last_when_page_reaches_total() {
        let page = FavoritesPage {
            page: 2,
            total_pages: 2,
            total_results: 21,
            movies: Vec::new(),
        };
        assert!(page.is_last());
    }
}
