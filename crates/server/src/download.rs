use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use zipkey_common::RegistryError;

use crate::app::AppState;
use crate::error::HttpError;
use crate::pages;

/// Buffer entre a task de transferência e o corpo da resposta.
const STREAM_BUFFER: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    code: String,
}

/// `GET /download?code=...`: redireciona para `/download/{code}`; sem dígitos, 404.
pub async fn download_form(Query(query): Query<CodeQuery>) -> Response {
    let code: String = query.code.chars().filter(char::is_ascii_digit).collect();
    if code.is_empty() {
        return (StatusCode::NOT_FOUND, Html(pages::invalid_code())).into_response();
    }
    Redirect::to(&format!("/download/{code}")).into_response()
}

/// `GET /download/{code}`: resgata o código e envia o arquivo.
///
/// O arquivo é aberto antes dos cabeçalhos: se não abrir, a resposta é 500.
/// A transferência roda numa task própria escrevendo num pipe em memória.
/// Se o cliente desconectar a escrita falha, e um código `once` continua
/// gasto com o arquivo apagado.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    let redemption = match state.registry.claim(&code) {
        Ok(r) => r,
        Err(RegistryError::InvalidOrExpiredCode) => {
            debug!("código rejeitado: {code}");
            return (StatusCode::NOT_FOUND, Html(pages::invalid_code())).into_response();
        }
        Err(e) => return HttpError::from(e).into_response(),
    };

    let redemption = match redemption.open().await {
        Ok(r) => r,
        Err(e) => return HttpError::from(e).into_response(),
    };

    let disposition = content_disposition(redemption.entry().display_name());
    let (mut writer, reader) = tokio::io::duplex(STREAM_BUFFER);

    tokio::spawn(async move {
        let name = redemption.entry().display_name().to_string();
        let policy = redemption.entry().policy();
        if let Ok(bytes) = redemption.transfer(&mut writer).await {
            info!("código {code}: '{name}' enviado ({bytes} bytes, {policy})");
        }
        let _ = writer.shutdown().await;
    });

    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response()
}

/// `attachment` com fallback ASCII e `filename*` em UTF-8 (RFC 6266).
fn content_disposition(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(name.len());
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }

    let value = format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}");
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
