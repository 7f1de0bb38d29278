use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const API_KEY: &str = "test-api-key";
pub const SESSION_ID: &str = "test-session";
pub const ACCOUNT_ID: &str = "42";
pub const PAGE_SIZE: usize = 20;

/// A PNG signature followed by filler; enough for byte-level assertions.
pub const POSTER_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoritesPage {
    pub page: usize,
    pub results: Vec<Movie>,
    pub total_pages: usize,
    pub total_results: usize,
}

#[derive(Debug, Deserialize)]
pub struct MarkFavorite {
    pub media_type: String,
    pub media_id: i64,
    pub favorite: bool,
}

/// Envelope used for both acknowledgements and errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct Status {
    pub status_code: i64,
    pub status_message: String,
    pub success: bool,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub session_id: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Store {
    pub api_key: String,
    /// session id -> account id
    pub sessions: HashMap<String, String>,
    pub catalogue: HashMap<i64, Movie>,
    /// account id -> favorites in insertion order
    pub favorites: HashMap<String, Vec<i64>>,
}

impl Store {
    pub fn empty(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            sessions: HashMap::new(),
            catalogue: HashMap::new(),
            favorites: HashMap::new(),
        }
    }

    /// One account with a valid session and a small catalogue, no favorites.
    pub fn seeded() -> Self {
        let mut store = Self::empty(API_KEY);
        store.sessions.insert(SESSION_ID.to_string(), ACCOUNT_ID.to_string());
        for (id, title, poster) in [
            (603, "The Matrix", Some("/matrix.jpg")),
            (550, "Fight Club", Some("/fight-club.jpg")),
            (13, "Forrest Gump", None),
        ] {
            store.add_movie(Movie {
                id,
                title: title.to_string(),
                poster_path: poster.map(str::to_string),
            });
        }
        store
    }

    pub fn add_movie(&mut self, movie: Movie) {
        self.catalogue.insert(movie.id, movie);
    }

    pub fn with_favorites(mut self, account_id: &str, ids: &[i64]) -> Self {
        self.favorites.insert(account_id.to_string(), ids.to_vec());
        self
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/3/account/{account_id}/favorite/movies", get(list_favorites))
        .route("/3/account/{account_id}/favorite", post(mark_favorite))
        .route("/t/p/{size}/{file}", get(poster))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Store::seeded()).await
}

pub async fn run_with(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(store)).await
}

fn status(http: StatusCode, code: i64, message: &str) -> Response {
    let body = Status {
        status_code: code,
        status_message: message.to_string(),
        success: http.is_success(),
    };
    (http, Json(body)).into_response()
}

/// Validate credentials against `account_id`, returning the error response on failure.
fn authorize(store: &Store, account_id: &str, creds: &Credentials) -> Result<(), Response> {
    if creds.api_key.as_deref() != Some(store.api_key.as_str()) {
        return Err(status(
            StatusCode::UNAUTHORIZED,
            7,
            "Invalid API key: You must be granted a valid key.",
        ));
    }
    let owner = creds
        .session_id
        .as_deref()
        .and_then(|sid| store.sessions.get(sid));
    if owner.map(String::as_str) != Some(account_id) {
        return Err(status(
            StatusCode::UNAUTHORIZED,
            3,
            "Authentication failed: You do not have permissions to access the service.",
        ));
    }
    Ok(())
}

async fn list_favorites(
    State(db): State<Db>,
    Path(account_id): Path<String>,
    Query(creds): Query<Credentials>,
) -> Response {
    let store = db.read().await;
    if let Err(resp) = authorize(&store, &account_id, &creds) {
        return resp;
    }
    let ids = store.favorites.get(&account_id).cloned().unwrap_or_default();
    let page = creds.page.unwrap_or(1).max(1);
    let total_results = ids.len();
    let total_pages = total_results.div_ceil(PAGE_SIZE).max(1);
    let results = ids
        .iter()
        .skip((page - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .filter_map(|id| store.catalogue.get(id).cloned())
        .collect();
    log::debug!("account {account_id} favorites page {page}/{total_pages}");
    Json(FavoritesPage {
        page,
        results,
        total_pages,
        total_results,
    })
    .into_response()
}

async fn mark_favorite(
    State(db): State<Db>,
    Path(account_id): Path<String>,
    Query(creds): Query<Credentials>,
    Json(input): Json<MarkFavorite>,
) -> Response {
    let mut store = db.write().await;
    if let Err(resp) = authorize(&store, &account_id, &creds) {
        return resp;
    }
    if input.media_type != "movie" {
        return status(
            StatusCode::BAD_REQUEST,
            5,
            "Invalid parameters: Your request parameters are incorrect.",
        );
    }
    if !store.catalogue.contains_key(&input.media_id) {
        return status(
            StatusCode::NOT_FOUND,
            34,
            "The resource you requested could not be found.",
        );
    }

    let favorites = store.favorites.entry(account_id.clone()).or_default();
    let present = favorites.contains(&input.media_id);
    log::debug!(
        "account {account_id} favorite={} for movie {}",
        input.favorite,
        input.media_id
    );
    match (input.favorite, present) {
        (true, false) => {
            favorites.push(input.media_id);
            status(StatusCode::CREATED, 1, "Success.")
        }
        (true, true) => status(
            StatusCode::CREATED,
            12,
            "The item/record was updated successfully.",
        ),
        (false, _) => {
            favorites.retain(|id| *id != input.media_id);
            status(StatusCode::OK, 13, "The item/record was deleted successfully.")
        }
    }
}

async fn poster(State(db): State<Db>, Path((_size, file)): Path<(String, String)>) -> Response {
    let store = db.read().await;
    let known = store
        .catalogue
        .values()
        .filter_map(|m| m.poster_path.as_deref())
        .any(|p| p.trim_start_matches('/') == file);
    if !known {
        return StatusCode::NOT_FOUND.into_response();
    }
    ([(header::CONTENT_TYPE, "image/png")], POSTER_BYTES).into_response()
}
