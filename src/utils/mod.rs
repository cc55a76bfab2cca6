use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{success, message}` envelope returned by write endpoints and error paths.
#[derive(Debug, Serialize)]
pub struct HttpResult {
    pub success: bool,
    pub message: String,
}

impl HttpResult {
    pub fn success(message: impl Into<String>) -> HttpResult {
        HttpResult {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> HttpResult {
        HttpResult {
            success: false,
            message: message.into(),
        }
    }
}

impl IntoResponse for HttpResult {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{success, message, data}` envelope returned by listing endpoints.
/// `data` serializes as `null` whenever nothing is returned.
#[derive(Debug, Serialize)]
pub struct HttpListResult<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<Vec<T>>,
}

impl<T> HttpListResult<T> {
    pub fn new(message: impl Into<String>, data: Vec<T>) -> HttpListResult<T> {
        HttpListResult {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> HttpListResult<T> {
        HttpListResult {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T> IntoResponse for HttpListResult<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Trims a request parameter; missing and blank values both come back as `None`.
pub fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
