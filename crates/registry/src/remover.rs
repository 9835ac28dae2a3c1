use std::io;
use std::path::Path;

use async_trait::async_trait;

/// Apaga o arquivo físico de um registro removido.
#[async_trait]
pub trait FileRemover: Send + Sync {
    async fn unlink(&self, path: &Path) -> io::Result<()>;
}

/// Remove arquivos do disco local.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRemover;

#[async_trait]
impl FileRemover for FsRemover {
    async fn unlink(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}
