//! Response sink shared by the pipeline and controller operations.
//!
//! # Responsibilities
//! - Accumulate status, headers and body for one request
//! - Follow the commit model of a streaming writer: the first body write
//!   commits the status (200 unless set earlier)
//! - Produce the final `http::Response`
//!
//! # Design Decisions
//! - Cheap to clone: every clone writes to the same response
//! - Status writes after commit are ignored and logged at debug level
//! - Header writes after commit are ignored the same way

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

/// Response type produced by the dispatcher.
pub type HttpResponse = axum::http::Response<Bytes>;

#[derive(Debug, Default)]
struct ResponseState {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
}

/// In-flight response for one request.
#[derive(Clone, Default)]
pub struct ResponseWriter {
    state: Arc<Mutex<ResponseState>>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ResponseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the status code. Has no effect once the response is committed.
    pub fn write_header(&self, status: StatusCode) {
        let mut state = self.lock();
        if state.committed {
            tracing::debug!(
                status = status.as_u16(),
                committed = ?state.status,
                "Superfluous status write ignored"
            );
            return;
        }
        state.status = Some(status);
        state.committed = true;
    }

    /// Append to the body, committing the response.
    pub fn write(&self, bytes: &[u8]) {
        let mut state = self.lock();
        if !state.committed {
            state.status.get_or_insert(StatusCode::OK);
            state.committed = true;
        }
        state.body.extend_from_slice(bytes);
    }

    /// Append a header value. Has no effect once the response is committed.
    pub fn append_header(&self, name: HeaderName, value: HeaderValue) {
        let mut state = self.lock();
        if state.committed {
            tracing::debug!(header = %name, "Header write after commit ignored");
            return;
        }
        state.headers.append(name, value);
    }

    /// Append every value of `headers`.
    pub fn merge_headers(&self, headers: &HeaderMap) {
        for (name, value) in headers {
            self.append_header(name.clone(), value.clone());
        }
    }

    /// Status committed so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.lock().status
    }

    pub fn is_committed(&self) -> bool {
        self.lock().committed
    }

    /// Body written so far.
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.lock().body)
    }

    /// Take the accumulated response, leaving this writer empty.
    pub fn take_response(&self) -> HttpResponse {
        let state = std::mem::take(&mut *self.lock());
        let mut response = HttpResponse::new(Bytes::from(state.body));
        *response.status_mut() = state.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = state.headers;
        response
    }
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ResponseWriter")
            .field("status", &state.status)
            .field("committed", &state.committed)
            .field("body_len", &state.body.len())
            .finish()
    }
}

/// Plain-text response with the given status, body = status reason.
pub fn status_response(status: StatusCode) -> HttpResponse {
    let mut response = HttpResponse::new(Bytes::from_static(
        status.canonical_reason().unwrap_or("").as_bytes(),
    ));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_commits_ok() {
        let w = ResponseWriter::new();
        w.write(b"ok");
        w.write_header(StatusCode::SERVICE_UNAVAILABLE);
        w.write(b"HandlerError");

        let res = w.take_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"okHandlerError");
    }

    #[test]
    fn test_status_before_body() {
        let w = ResponseWriter::new();
        w.append_header(
            HeaderName::from_static("x-one"),
            HeaderValue::from_static("1"),
        );
        w.write_header(StatusCode::CREATED);
        w.append_header(
            HeaderName::from_static("x-two"),
            HeaderValue::from_static("2"),
        );
        w.write(b"made");

        let res = w.take_response();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()["x-one"], "1");
        assert!(res.headers().get("x-two").is_none());
        assert_eq!(res.body().as_ref(), b"made");
    }

    #[test]
    fn test_clones_share_state() {
        let w = ResponseWriter::new();
        let other = w.clone();
        other.write(b"shared");
        assert!(w.is_committed());
        assert_eq!(w.body().as_ref(), b"shared");
    }

    #[test]
    fn test_status_response() {
        let res = status_response(StatusCode::NOT_FOUND);
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.body().as_ref(), b"Not Found");
    }
}
