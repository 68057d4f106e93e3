use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::BAD_REQUEST, message: msg.into() }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::NOT_FOUND, message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, message: msg.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<firecamp_control::ControlError> for ApiError {
    fn from(e: firecamp_control::ControlError) -> Self {
        use firecamp_control::ControlError::*;
        match e {
            InvalidRequest(_) => ApiError::bad_request(e.to_string()),
            RecordNotFound(_) => ApiError::not_found(e.to_string()),
            ResourceExhausted(_) => {
                ApiError { status: StatusCode::SERVICE_UNAVAILABLE, message: e.to_string() }
            }
            ExternalUnavailable(_) => {
                ApiError { status: StatusCode::BAD_GATEWAY, message: e.to_string() }
            }
            Internal(_) => ApiError::internal(e.to_string()),
        }
    }
}
