use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as Slot;
use tracing::{debug, info, warn};

use zipkey_common::{
    CODE_MAX, CODE_MIN, CODE_SPACE, MAX_CODE_ATTEMPTS, RegistryError, RegistryResult,
};

use crate::clock::{Clock, SystemClock};
use crate::code::generate_code;
use crate::entry::Entry;
use crate::policy::Policy;
use crate::remover::{FileRemover, FsRemover};

/// Estado compartilhado entre handlers e o reaper.
struct Shared {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
    remover: Arc<dyn FileRemover>,
}

/// Handle para o registro in-memory de códigos.
///
/// Operações destrutivas (`take_for_one_time`, `delete`) são um único
/// remove-and-return no mapa: para um mesmo código só uma delas vence.
/// Nenhum lock do mapa é mantido durante I/O de arquivo.
#[derive(Clone)]
pub struct Registry {
    shared: Arc<Shared>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(SystemClock), Arc::new(FsRemover))
    }

    pub fn with_collaborators(clock: Arc<dyn Clock>, remover: Arc<dyn FileRemover>) -> Self {
        Registry {
            shared: Arc::new(Shared {
                entries: DashMap::new(),
                clock,
                remover,
            }),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.shared.clock.now()
    }

    /// Registra um arquivo já persistido e devolve o código gerado.
    pub fn create(
        &self,
        storage_path: impl Into<PathBuf>,
        display_name: impl Into<String>,
        policy: Policy,
    ) -> RegistryResult<String> {
        let storage_path = storage_path.into();
        let display_name = display_name.into();
        let created_at = self.now();

        // sorteios primeiro; se todos colidirem, varre o espaço em ordem
        let draws = (0..MAX_CODE_ATTEMPTS).map(|_| generate_code());
        let scan = (CODE_MIN..=CODE_MAX).map(|n| n.to_string());
        self.insert_first_free(
            draws.chain(scan),
            storage_path,
            display_name,
            created_at,
            policy,
        )
    }

    /// Insere a entry no primeiro candidato livre.
    pub(crate) fn insert_first_free(
        &self,
        candidates: impl IntoIterator<Item = String>,
        storage_path: PathBuf,
        display_name: String,
        created_at: DateTime<Utc>,
        policy: Policy,
    ) -> RegistryResult<String> {
        for code in candidates {
            if self.shared.entries.len() >= CODE_SPACE {
                break;
            }

            // entry() trava o shard: checar e inserir é um passo só
            match self.shared.entries.entry(code.clone()) {
                Slot::Occupied(_) => {
                    debug!("colisão de código {code}, tentando outro");
                }
                Slot::Vacant(slot) => {
                    let entry = Entry::new(
                        code.clone(),
                        storage_path,
                        display_name,
                        created_at,
                        policy,
                    );
                    info!(
                        "código {code} criado ({policy}, expira em {})",
                        entry.expires_at()
                    );
                    slot.insert(entry);
                    return Ok(code);
                }
            }
        }

        warn!("não foi possível gerar um código livre");
        Err(RegistryError::RegistryExhausted)
    }

    /// Cópia do registro, sem filtro de expiração.
    pub fn lookup(&self, code: &str) -> Option<Entry> {
        self.shared.entries.get(code).map(|e| e.clone())
    }

    /// Remove atomicamente um registro `OneTime` e o devolve.
    ///
    /// Entre chamadas concorrentes para o mesmo código, só uma recebe `Some`.
    pub fn take_for_one_time(&self, code: &str) -> Option<Entry> {
        self.shared
            .entries
            .remove_if(code, |_, e| e.policy().is_one_time())
            .map(|(_, e)| e)
    }

    /// Incrementa o contador de downloads. Informativo apenas.
    pub fn increment_download(&self, code: &str) {
        if let Some(mut entry) = self.shared.entries.get_mut(code) {
            entry.record_download();
        }
    }

    /// Remove atomicamente o registro, qualquer que seja a política.
    pub fn delete(&self, code: &str) -> Option<Entry> {
        self.shared.entries.remove(code).map(|(_, e)| e)
    }

    /// Remove o registro apenas se ainda estiver expirado em `now`.
    ///
    /// Usado pelo reaper: entre o snapshot e a remoção o código pode ter sido
    /// consumido e reatribuído a um upload novo.
    pub(crate) fn delete_if_expired(&self, code: &str, now: DateTime<Utc>) -> Option<Entry> {
        self.shared
            .entries
            .remove_if(code, |_, e| e.is_expired(now))
            .map(|(_, e)| e)
    }

    /// Cópia pontual de todos os registros.
    pub fn snapshot(&self) -> Vec<(String, Entry)> {
        self.shared
            .entries
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Exclusão manual: remove o registro e apaga o arquivo.
    pub async fn remove(&self, code: &str) -> Option<Entry> {
        let entry = self.delete(code)?;
        self.unlink(entry.storage_path()).await;
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.entries.is_empty()
    }

    /// Apaga o arquivo de um registro já removido. Falhas só são logadas.
    pub(crate) async fn unlink(&self, path: &Path) -> bool {
        match self.shared.remover.unlink(path).await {
            Ok(()) => {
                debug!("arquivo apagado: {}", path.display());
                true
            }
            Err(e) => {
                warn!("erro ao apagar arquivo {}: {e}", path.display());
                false
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
