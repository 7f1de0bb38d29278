//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer plus length instead of `Vec`,
//! and enums with explicit discriminants. Conversion functions live here to
//! keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use favorites_core::error::ApiError;
use favorites_core::http::{HttpMethod, HttpResponse, TransportResult};

/// Opaque handle to a `FavoritesClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiFavoritesClient {
    pub(crate) inner: favorites_core::FavoritesClient,
}

/// Build a C string, dropping interior NULs rather than failing.
pub(crate) fn c_string(s: String) -> *mut c_char {
    let s = CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    s.into_raw()
}

/// Borrow a caller-owned C string; `None` for null or non-UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
pub(crate) unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `fav_build_*` functions. The C caller executes the request and
/// passes the outcome back through `fav_parse_*`. `timeout_ms` is 0 when the
/// request carries no timeout of its own.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub timeout_ms: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: favorites_core::HttpRequest) -> *mut Self {
        let url = c_string(req.url);
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };
        let timeout_ms = req
            .timeout
            .map(|t| u32::try_from(t.as_millis()).unwrap_or(u32::MAX))
            .unwrap_or(0);

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
            timeout_ms,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// Outcome of an HTTP exchange, described by the C caller.
///
/// `transport_error` is null unless the exchange failed at the network
/// level. `body` may be null when `body_len` is 0. The FFI layer reads but
/// does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub transport_error: *const c_char,
    pub status: u16,
    pub body: *const u8,
    pub body_len: usize,
}

impl FfiHttpResponse {
    /// Copy the caller's buffers into a core `TransportResult`.
    ///
    /// # Safety
    /// `transport_error` must be null or a valid C string, and `body` must be
    /// null or valid for `body_len` bytes.
    pub(crate) unsafe fn to_core(&self) -> TransportResult {
        let body = if self.body.is_null() || self.body_len == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(self.body, self.body_len) }.to_vec()
        };
        let response = HttpResponse::new(self.status, body);
        if self.transport_error.is_null() {
            return TransportResult::completed(response);
        }
        let message = unsafe { CStr::from_ptr(self.transport_error) }
            .to_string_lossy()
            .into_owned();
        TransportResult::failed(message).with_response(response)
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiFavoriteResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    HttpStatus = 2,
    EmptyBody = 3,
    MalformedJson = 4,
    RemoteApi = 5,
    MissingResults = 6,
    MissingStatusCode = 7,
    Serialization = 8,
    MalformedUrl = 9,
    Panic = 10,
    NullArg = 11,
}

/// Result envelope for every parse operation.
///
/// On success `error_code` is `Ok`, `error_message` is null and `favorite`
/// holds the resolved state; `page`/`total_pages` are filled by status
/// queries so the caller knows whether to fetch the next page.
/// On failure `favorite` is false and must not be shown: the caller keeps
/// its previous state. `http_status` and `api_status_code` carry the codes
/// from `HttpStatus` and `RemoteApi` errors respectively.
#[repr(C)]
pub struct FfiFavoriteResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub api_status_code: i64,
    pub favorite: bool,
    pub page: u32,
    pub total_pages: u32,
}

impl FfiFavoriteResult {
    fn boxed(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    fn empty(error_code: FfiErrorCode, error_message: *mut c_char) -> Self {
        FfiFavoriteResult {
            error_code,
            error_message,
            http_status: 0,
            api_status_code: 0,
            favorite: false,
            page: 0,
            total_pages: 0,
        }
    }

    /// Success carrying the favorite state of a single page.
    pub(crate) fn ok_page(favorite: bool, page: u32, total_pages: u32) -> *mut Self {
        FfiFavoriteResult {
            favorite,
            page,
            total_pages,
            ..Self::empty(FfiErrorCode::Ok, std::ptr::null_mut())
        }
        .boxed()
    }

    /// Success carrying an acknowledged toggle.
    pub(crate) fn ok_toggle(favorite: bool, ack_code: i64) -> *mut Self {
        FfiFavoriteResult {
            favorite,
            api_status_code: ack_code,
            ..Self::empty(FfiErrorCode::Ok, std::ptr::null_mut())
        }
        .boxed()
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let message = c_string(err.to_string());
        let (error_code, http_status, api_status_code) = match &err {
            ApiError::TransportError(_) => (FfiErrorCode::Transport, 0, 0),
            ApiError::HttpStatusError { status, .. } => (FfiErrorCode::HttpStatus, *status, 0),
            ApiError::EmptyBodyError => (FfiErrorCode::EmptyBody, 0, 0),
            ApiError::MalformedJsonError(_) => (FfiErrorCode::MalformedJson, 0, 0),
            ApiError::RemoteApiError { code, .. } => (FfiErrorCode::RemoteApi, 0, *code),
            ApiError::MissingResultsField => (FfiErrorCode::MissingResults, 0, 0),
            ApiError::MissingStatusCodeField => (FfiErrorCode::MissingStatusCode, 0, 0),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0, 0),
            ApiError::MalformedUrl(_) => (FfiErrorCode::MalformedUrl, 0, 0),
        };
        FfiFavoriteResult {
            http_status,
            api_status_code,
            ..Self::empty(error_code, message)
        }
        .boxed()
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::empty(FfiErrorCode::NullArg, c_string(format!("null argument: {name}"))).boxed()
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::empty(FfiErrorCode::Panic, c_string(msg.to_string())).boxed()
    }
}
