//! API error type and rejection handling

use std::convert::Infallible;

use serde::Serialize;
use thiserror::Error;
use tracing::error;
use warp::{
    Reply,
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{InvalidQuery, MethodNotAllowed, Reject, Rejection},
};

use crate::state::StateError;

/// Errors surfaced through the HTTP boundary
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    State(#[from] StateError),

    /// Anything else; the detail is logged, never returned
    #[error("Internal server error")]
    Internal(String),
}

impl Reject for ApiError {}

impl ApiError {
    /// Wrap into a warp rejection
    pub fn reject(self) -> Rejection {
        warp::reject::custom(self)
    }
}

/// An API error serializable to JSON
#[derive(Debug, Serialize)]
struct ErrorResponseBody {
    code: u16,
    message: String,
}

fn status_code_to_string(code: StatusCode) -> String {
    code.canonical_reason()
        .unwrap_or_else(|| code.as_str())
        .to_string()
}

/// Convert rejections into minimal JSON error responses
///
/// Full details are logged server-side; callers never see internals.
pub async fn handle_rejection(reject: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if reject.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = status_code_to_string(code);
    } else if let Some(err) = reject.find::<ApiError>() {
        match err {
            ApiError::NotFound(msg) => {
                code = StatusCode::NOT_FOUND;
                message = msg.clone();
            }
            ApiError::BadRequest(msg) => {
                code = StatusCode::BAD_REQUEST;
                message = msg.clone();
            }
            ApiError::State(err) => {
                error!(%err, "state manager failure");
                code = StatusCode::INTERNAL_SERVER_ERROR;
                message = "Internal server error".to_string();
            }
            ApiError::Internal(detail) => {
                error!(%detail, "internal error");
                code = StatusCode::INTERNAL_SERVER_ERROR;
                message = "Internal server error".to_string();
            }
        }
    } else if let Some(err) = reject.find::<BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = err.to_string();
    } else if let Some(err) = reject.find::<InvalidQuery>() {
        code = StatusCode::BAD_REQUEST;
        message = err.to_string();
    } else if let Some(err) = reject.find::<MethodNotAllowed>() {
        // This must have the least priority, because most rejections
        // contain a MethodNotAllowed element!
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = err.to_string();
    } else {
        error!("unhandled rejection: {reject:?}");
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal server error".to_string();
    }

    let json_reply = warp::reply::json(&ErrorResponseBody {
        code: code.as_u16(),
        message,
    });

    Ok(warp::reply::with_status(json_reply, code))
}
