use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub kind: &'a str,
    pub message: String,
}

/// Build a `{kind, message}` error response.
///
/// Does not log: tower-http TraceLayer already records method/uri/status for
/// every request, and services log their own internal errors with detail.
pub fn error_response(status: StatusCode, kind: &str, message: String) -> Response {
    (status, axum::Json(ErrorBody { kind, message })).into_response()
}
