//! C-ABI wrapper around `favorites-core`.
//!
//! # Overview
//! Exposes favorite-status queries, favorite toggles and poster requests
//! through `extern "C"` functions, so a mobile host can run the HTTP
//! round-trip on its own networking stack while the request shapes and the
//! decoding rules stay in Rust.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `fav_build_*` / `fav_parse_*` mirrors the core API 1:1.
//! - Parse functions return a single `FfiFavoriteResult` envelope; on error
//!   its `favorite` field is meaningless and the host keeps what it shows.
//! - The C caller owns all returned pointers and must call the matching
//!   `fav_free_*` function to release them.

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use favorites_core::{ClientConfig, FavoritesClient, Movie, Session};

use types::*;

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Route the core's `log` output to stderr, filtered by `RUST_LOG`.
/// Safe to call more than once.
#[unsafe(no_mangle)]
pub extern "C" fn fav_init_logging() {
    let _ = catch_unwind(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .try_init();
    });
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `FavoritesClient`.
///
/// `api_base_url` and `image_base_url` may be null to use the public
/// defaults. Returns null if `api_key` is null, not UTF-8, or empty.
/// The caller must free the returned pointer with `fav_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fav_client_new(
    api_key: *const c_char,
    api_base_url: *const c_char,
    image_base_url: *const c_char,
) -> *mut FfiFavoritesClient {
    catch_unwind(|| {
        let Some(key) = (unsafe { borrow_str(api_key) }).filter(|k| !k.is_empty()) else {
            return std::ptr::null_mut();
        };
        let mut config = ClientConfig::new(key);
        if let Some(url) = unsafe { borrow_str(api_base_url) } {
            config = config.with_api_base_url(url);
        }
        if let Some(url) = unsafe { borrow_str(image_base_url) } {
            config = config.with_image_base_url(url);
        }
        let client = FavoritesClient::new(config);
        Box::into_raw(Box::new(FfiFavoritesClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `fav_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fav_client_free(client: *mut FfiFavoritesClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Read the client and session arguments shared by the build functions.
///
/// # Safety
/// `client` must be null or a pointer from `fav_client_new`; the strings
/// must be null or valid C strings.
unsafe fn client_and_session<'a>(
    client: *const FfiFavoritesClient,
    user_id: *const c_char,
    session_id: *const c_char,
) -> Option<(&'a FfiFavoritesClient, Session)> {
    if client.is_null() {
        return None;
    }
    let user_id = unsafe { borrow_str(user_id) }?;
    let session_id = unsafe { borrow_str(session_id) }?;
    Some((unsafe { &*client }, Session::new(user_id, session_id)))
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the request for one page (starting at 1) of the account's favorites.
///
/// Returns null when:
/// - `client`, `user_id` or `session_id` is null,
/// - `user_id` or `session_id` is not valid UTF-8,
/// - the composed URL is malformed (including an empty `user_id`).
///
/// Only the last case is logged; the return value does not say which case
/// occurred. The caller must free the returned pointer with
/// `fav_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn fav_build_favorites_query(
    client: *const FfiFavoritesClient,
    user_id: *const c_char,
    session_id: *const c_char,
    page: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some((client, session)) = (unsafe { client_and_session(client, user_id, session_id) })
        else {
            return std::ptr::null_mut();
        };
        match client.inner.build_favorites_query(&session, page) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(e) => {
                log::warn!("fav_build_favorites_query: {e}");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request that flips `current_favorite` for `movie_id`.
///
/// Returns null when:
/// - `client`, `user_id` or `session_id` is null,
/// - `user_id` or `session_id` is not valid UTF-8,
/// - the composed URL is malformed or the body cannot be serialized.
///
/// Only the last case is logged. Free the result with `fav_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn fav_build_toggle_favorite(
    client: *const FfiFavoritesClient,
    user_id: *const c_char,
    session_id: *const c_char,
    movie_id: i64,
    current_favorite: bool,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some((client, session)) = (unsafe { client_and_session(client, user_id, session_id) })
        else {
            return std::ptr::null_mut();
        };
        let movie = Movie::new(movie_id, "");
        match client
            .inner
            .build_toggle_favorite(&session, &movie, current_favorite)
        {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(e) => {
                log::warn!("fav_build_toggle_favorite: {e}");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the poster image request for `poster_path` (as returned by the API).
///
/// Returns null when:
/// - `client` or `poster_path` is null,
/// - `poster_path` is not valid UTF-8,
/// - the composed URL is malformed (including an empty `poster_path`).
///
/// Only the last case is logged. Free the result with `fav_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn fav_build_poster_request(
    client: *const FfiFavoritesClient,
    poster_path: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(path) = (unsafe { borrow_str(poster_path) }) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &*client };
        let movie = Movie::new(0, "").with_poster(path);
        match client.inner.build_poster_request(&movie) {
            Some(Ok(req)) => FfiHttpRequest::from_core(req),
            Some(Err(e)) => {
                log::warn!("fav_build_poster_request: {e}");
                std::ptr::null_mut()
            }
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Parse one page of favorites and report whether `movie_id` is on it.
///
/// If the result is `Ok`, not favorite, and `page < total_pages`, the host
/// should build and execute the next page.
#[unsafe(no_mangle)]
pub extern "C" fn fav_parse_favorites_query(
    client: *const FfiFavoritesClient,
    movie_id: i64,
    response: *const FfiHttpResponse,
) -> *mut FfiFavoriteResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiFavoriteResult::null_arg("client");
        }
        if response.is_null() {
            return FfiFavoriteResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let result = unsafe { (*response).to_core() };
        match client.inner.parse_favorites_page(result) {
            Ok(page) => {
                FfiFavoriteResult::ok_page(page.contains(movie_id), page.page, page.total_pages)
            }
            Err(e) => {
                log::warn!("favorite status query failed: {e}");
                FfiFavoriteResult::from_error(e)
            }
        }
    })
    .unwrap_or_else(|_| FfiFavoriteResult::panic("panic in fav_parse_favorites_query"))
}

/// Parse a favorite mutation acknowledgement.
///
/// On success `favorite` is the acknowledged state and `api_status_code`
/// the acknowledgement code.
#[unsafe(no_mangle)]
pub extern "C" fn fav_parse_toggle_favorite(
    client: *const FfiFavoritesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiFavoriteResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiFavoriteResult::null_arg("client");
        }
        if response.is_null() {
            return FfiFavoriteResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let result = unsafe { (*response).to_core() };
        match client.inner.parse_toggle_acknowledgement(result) {
            Ok(ack) => FfiFavoriteResult::ok_toggle(ack.favorite(), ack.code()),
            Err(e) => {
                log::warn!("favorite toggle failed: {e}");
                FfiFavoriteResult::from_error(e)
            }
        }
    })
    .unwrap_or_else(|_| FfiFavoriteResult::panic("panic in fav_parse_toggle_favorite"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `fav_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fav_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        fav_free_string(req.url);
        fav_free_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                fav_free_string(h.key);
                fav_free_string(h.value);
            }
        }
    });
}

/// Free an `FfiFavoriteResult` returned by any `fav_parse_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fav_free_result(result: *mut FfiFavoriteResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        fav_free_string(result.error_message);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fav_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
