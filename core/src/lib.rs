//! API client core for a movie detail screen's favorite button.
//!
//! # Overview
//! Resolves whether a movie is among an account's favorites, flips that
//! state, and fetches the poster, against the movie database's REST API.
//! The client builds `HttpRequest` values and parses `TransportResult`
//! values without touching the network (host-does-IO pattern); the
//! `service` layer executes them asynchronously through a `Transport`.
//!
//! # Design
//! - `FavoritesClient` is stateless; the `Session` is passed to every call.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Decoding is ordered: transport, HTTP status, body, JSON, API envelope.
//! - `FavoriteProjector` is the only stateful piece: it owns the displayed
//!   favorite state and discards results for stale selections.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod projector;
pub mod service;
pub mod types;

pub use client::FavoritesClient;
pub use config::ClientConfig;
pub use decode::{decode, StatusCodePolicy};
pub use error::{ApiError, ConfigError};
pub use http::{build_request, Endpoint, HttpMethod, HttpRequest, HttpResponse, TransportResult};
pub use projector::{FavoriteProjector, FavoriteSink, Selection};
pub use service::{DetailLoad, FavoritesService, Transport};
#[cfg(feature = "reqwest")]
pub use service::ReqwestTransport;
pub use types::{AckCode, FavoritesPage, MediaType, Movie, Session, ToggleAcknowledgement, ToggleRequest};
