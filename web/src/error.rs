use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::*;
use serde_json::json;

use domain::error::{DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Config => {
                    error!("Authentication configuration error: {:?}", self.0.source);
                    message(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Authentication is not configured",
                    )
                }
                InternalErrorKind::Other(detail) => {
                    error!("Internal error: {detail}");
                    message(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Network => {
                    warn!("Upstream network error: {:?}", self.0.source);
                    message(StatusCode::BAD_GATEWAY, "BAD GATEWAY")
                }
                ExternalErrorKind::Other(detail) => {
                    warn!("Upstream error: {detail}");
                    message(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
                }
            },
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
