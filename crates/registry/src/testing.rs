//! Dublês de teste compartilhados pelos módulos do crate.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::{FileRemover, ManualClock, Registry};

/// Conta chamadas de unlink por caminho, sem tocar no disco.
#[derive(Debug, Default)]
pub struct RecordingRemover {
    calls: Mutex<HashMap<PathBuf, usize>>,
    fail: AtomicBool,
}

impl RecordingRemover {
    pub fn failing() -> Self {
        let remover = Self::default();
        remover.fail.store(true, Ordering::SeqCst);
        remover
    }

    pub fn calls_for(&self, path: &Path) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl FileRemover for RecordingRemover {
    async fn unlink(&self, path: &Path) -> io::Result<()> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default() += 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        Ok(())
    }
}

/// Sink que falha em toda escrita, simulando um cliente desconectado.
pub struct FailingSink;

impl AsyncWrite for FailingSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "client gone")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Registro com relógio manual e remover que só registra chamadas.
pub fn test_registry() -> (Registry, Arc<ManualClock>, Arc<RecordingRemover>) {
    let clock = Arc::new(ManualClock::default());
    let remover = Arc::new(RecordingRemover::default());
    let registry = Registry::with_collaborators(clock.clone(), remover.clone());
    (registry, clock, remover)
}

/// Grava um arquivo temporário com o conteúdo dado.
pub async fn write_upload(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    tokio::fs::write(&path, data).await.unwrap();
    path
}
