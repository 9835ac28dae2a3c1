use std::io;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

use zipkey_common::{RegistryError, RegistryResult};

use crate::entry::Entry;
use crate::policy::Policy;
use crate::store::Registry;

/// Resultado de um resgate concluído.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeemed {
    pub display_name: String,
    pub policy: Policy,
    pub bytes: u64,
}

/// Um resgate validado, pronto para transferir.
///
/// Para códigos `OneTime` o registro já saiu do mapa: o código foi gasto ao
/// vencer o take, não ao terminar a transferência. O arquivo é apagado depois
/// de `transfer` (com sucesso ou não), se `open` falhar ou, se o resgate for
/// descartado sem transferir, numa task no runtime atual.
pub struct Redemption {
    registry: Registry,
    entry: Entry,
    consumed: bool,
    settled: bool,
}

impl Redemption {
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// `true` se este resgate removeu o registro (política `OneTime`).
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Abre o arquivo antes de qualquer byte ser prometido ao cliente.
    ///
    /// Falha de abertura já conta como transferência falha.
    pub async fn open(mut self) -> RegistryResult<OpenRedemption> {
        let opened = File::open(self.entry.storage_path()).await;
        match opened {
            Ok(file) => Ok(OpenRedemption {
                redemption: self,
                file,
            }),
            Err(e) => {
                self.settle(false).await;
                Err(transfer_failed(self.entry.code(), e))
            }
        }
    }

    /// Envia o arquivo para `sink` e aplica a política do registro.
    pub async fn transfer<W>(self, sink: &mut W) -> RegistryResult<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.open().await?.transfer(sink).await
    }

    /// Aplica a política: `OneTime` apaga o arquivo, os demais contam o
    /// download se deu certo.
    async fn settle(&mut self, succeeded: bool) {
        self.settled = true;
        if self.consumed {
            // Apagado mesmo em falha: o código já foi gasto
            self.registry.unlink(self.entry.storage_path()).await;
        } else if succeeded {
            self.registry.increment_download(self.entry.code());
        }
    }
}

impl Drop for Redemption {
    fn drop(&mut self) {
        if !self.consumed || self.settled {
            return;
        }

        let path = self.entry.storage_path().to_path_buf();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let registry = self.registry.clone();
                handle.spawn(async move {
                    registry.unlink(&path).await;
                });
            }
            Err(_) => warn!(
                "resgate descartado fora do runtime, arquivo não apagado: {}",
                path.display()
            ),
        }
    }
}

/// Resgate com o arquivo já aberto.
pub struct OpenRedemption {
    redemption: Redemption,
    file: File,
}

impl OpenRedemption {
    pub fn entry(&self) -> &Entry {
        self.redemption.entry()
    }

    pub async fn transfer<W>(mut self, sink: &mut W) -> RegistryResult<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let result = copy_to(&mut self.file, sink).await;
        self.redemption.settle(result.is_ok()).await;

        let code = self.redemption.entry.code();
        match result {
            Ok(bytes) => {
                debug!("código {code}: {bytes} bytes enviados");
                Ok(bytes)
            }
            Err(e) => Err(transfer_failed(code, e)),
        }
    }
}

fn transfer_failed(code: &str, e: io::Error) -> RegistryError {
    error!("código {code}: falha na transferência: {e}");
    RegistryError::TransferFailed(e)
}

async fn copy_to<W>(file: &mut File, sink: &mut W) -> io::Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let bytes = tokio::io::copy(file, sink).await?;
    sink.flush().await?;
    Ok(bytes)
}

impl Registry {
    /// Valida o código e, para `OneTime`, remove o registro atomicamente.
    ///
    /// Expiração não é checada aqui: um registro vencido continua
    /// resgatável até a próxima varredura do reaper.
    pub fn claim(&self, code: &str) -> RegistryResult<Redemption> {
        let entry = self
            .lookup(code)
            .ok_or(RegistryError::InvalidOrExpiredCode)?;

        if !entry.policy().is_one_time() {
            return Ok(Redemption {
                registry: self.clone(),
                entry,
                consumed: false,
                settled: false,
            });
        }

        // Perdeu a corrida para outro resgate ou para o reaper
        let entry = self
            .take_for_one_time(code)
            .ok_or(RegistryError::InvalidOrExpiredCode)?;
        debug!("código {code} consumido");

        Ok(Redemption {
            registry: self.clone(),
            entry,
            consumed: true,
            settled: false,
        })
    }

    /// Resgata `code` enviando o arquivo para `sink`.
    pub async fn redeem<W>(&self, code: &str, sink: &mut W) -> RegistryResult<Redeemed>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let redemption = self.claim(code)?;
        let display_name = redemption.entry().display_name().to_string();
        let policy = redemption.entry().policy();
        let bytes = redemption.transfer(sink).await?;

        Ok(Redeemed {
            display_name,
            policy,
            bytes,
        })
    }
}
