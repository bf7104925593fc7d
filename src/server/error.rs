//! Maps [`crate::domain::error::Error`] onto HTTP status codes and the
//! `{error:{code,message}}` body shape (spec §6, §7). Internal traces never
//! cross this boundary — only the error kind and a human message.

use crate::domain::error::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.0.code(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
        Error::UnsupportedBackend { .. } => StatusCode::BAD_REQUEST,
        Error::AlreadyIndexing { .. } => StatusCode::CONFLICT,
        Error::NotReady { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Error::AlreadyRunning { .. } => StatusCode::CONFLICT,
        Error::NoPortAvailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Error::Config { .. }
        | Error::DimensionMismatch { .. }
        | Error::Embedding { .. }
        | Error::Summarizer { .. }
        | Error::Store { .. }
        | Error::Io(_)
        | Error::Json(_)
        | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
