//! Main Crate Error

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] mt_auth::error::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /* Api Errors */
    #[error("API Forbidden")]
    ApiForbidden,

    #[error("Auth Token Creation")]
    AuthTokenCreation,

    #[error("Context Missing")]
    CtxMissing,
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        error!("Creating API error response for error: {:?}", self);
        let (status, message) = match self {
            Error::ApiForbidden => (StatusCode::FORBIDDEN, "Access forbidden"),
            Error::CtxMissing => (StatusCode::UNAUTHORIZED, "Missing credentials"),
            Error::Auth(err) => match err {
                mt_auth::error::Error::InvalidToken => {
                    (StatusCode::UNAUTHORIZED, "Invalid authentication token")
                }
                mt_auth::error::Error::TokenMissing => {
                    (StatusCode::UNAUTHORIZED, "Authentication required")
                }
                mt_auth::error::Error::TokenExpired => {
                    (StatusCode::UNAUTHORIZED, "Authentication token expired")
                }
                mt_auth::error::Error::WrongCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials")
                }
                mt_auth::error::Error::MissingCredentials
                | mt_auth::error::Error::UnknownUser => {
                    (StatusCode::UNAUTHORIZED, "Missing credentials")
                }
                mt_auth::error::Error::TokenCreation(_)
                | mt_auth::error::Error::PasswordHash(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            Error::AuthTokenCreation | Error::IO(_) | Error::Json(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "status": status.as_u16()
            }
        }));
        (status, body).into_response()
    }
}
