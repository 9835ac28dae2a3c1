use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::response::Html;
use bytes::Bytes;
use chrono::Utc;
use rand::Rng;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use zipkey_registry::Policy;

use crate::app::AppState;
use crate::error::HttpError;
use crate::pages;

/// Arquivo já gravado em disco, ainda sem código.
struct StoredFile {
    path: PathBuf,
    original_name: String,
}

/// `POST /upload`: grava o campo `file`, registra com a política de
/// `expiryOption` e mostra o código.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Html<String>, HttpError> {
    let (stored, option) = read_form(&state.upload_dir, multipart).await?;
    let policy = Policy::from_form(option.as_deref());

    match state
        .registry
        .create(&stored.path, &stored.original_name, policy)
    {
        Ok(code) => {
            info!(
                "upload '{}' registrado com código {code} ({policy})",
                stored.original_name
            );
            Ok(Html(pages::upload_success(&code, policy)))
        }
        Err(e) => {
            discard(&stored.path).await;
            Err(e.into())
        }
    }
}

async fn read_form(
    dir: &Path,
    mut multipart: Multipart,
) -> Result<(StoredFile, Option<String>), HttpError> {
    let mut stored: Option<StoredFile> = None;
    let mut option = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                if let Some(ref s) = stored {
                    discard(&s.path).await;
                }
                return Err(e.into());
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") if stored.is_none() => {
                let original_name = field.file_name().map(display_name).unwrap_or_default();
                // Navegador manda a parte vazia quando nenhum arquivo foi escolhido
                if original_name.is_empty() {
                    continue;
                }
                let path = dir.join(storage_name(&original_name));
                save_field(&path, field).await?;
                stored = Some(StoredFile {
                    path,
                    original_name,
                });
            }
            Some("expiryOption") => match field.text().await {
                Ok(text) => option = Some(text),
                Err(e) => {
                    if let Some(ref s) = stored {
                        discard(&s.path).await;
                    }
                    return Err(e.into());
                }
            },
            _ => {}
        }
    }

    let stored = stored.ok_or(HttpError::MissingFile)?;
    Ok((stored, option))
}

/// Grava o campo em `path`; em erro apaga o arquivo parcial.
async fn save_field(path: &Path, mut field: Field<'_>) -> Result<(), HttpError> {
    let result: Result<(), HttpError> = async {
        let mut file = File::create(path).await?;
        while let Some(chunk) = field.chunk().await? {
            let chunk: Bytes = chunk;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    if result.is_err() {
        discard(path).await;
    }
    result
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("erro ao descartar upload {}: {e}", path.display());
    }
}

/// Nome no disco: `<millis>-<aleatório><.ext>`, preservando só a extensão.
pub fn storage_name(original: &str) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    let ext = Path::new(original)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{}-{suffix}{ext}", Utc::now().timestamp_millis())
}

/// Nome original sem componentes de diretório.
fn display_name(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
