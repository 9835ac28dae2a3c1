use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

use zipkey_common::RegistryError;

use crate::pages;

/// Erros da camada HTTP.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("nenhum arquivo enviado")]
    MissingFile,
    #[error("multipart inválido: {0}")]
    Multipart(#[from] MultipartError),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::MissingFile => {
                (StatusCode::BAD_REQUEST, "No file uploaded.").into_response()
            }
            HttpError::Multipart(e) => (e.status(), e.body_text()).into_response(),
            HttpError::Registry(RegistryError::InvalidOrExpiredCode) => {
                (StatusCode::NOT_FOUND, Html(pages::invalid_code())).into_response()
            }
            other => {
                error!("erro no request: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.",
                )
                    .into_response()
            }
        }
    }
}
