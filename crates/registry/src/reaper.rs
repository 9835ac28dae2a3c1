use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

use crate::store::Registry;

/// Resumo de uma varredura.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub evicted: usize,
    pub unlink_failures: usize,
}

impl Registry {
    /// Remove todos os registros vencidos e apaga seus arquivos.
    ///
    /// Registros `OneTime` nunca resgatados caem aqui pela janela de carência.
    /// Falha ao apagar um arquivo não impede a remoção do registro nem
    /// interrompe a varredura.
    pub async fn sweep(&self) -> SweepReport {
        let now = self.now();
        let snapshot = self.snapshot();
        let mut report = SweepReport {
            scanned: snapshot.len(),
            ..SweepReport::default()
        };

        for (code, entry) in snapshot {
            if !entry.is_expired(now) {
                continue;
            }

            // Só apaga o arquivo quem venceu a remoção
            let Some(removed) = self.delete_if_expired(&code, now) else {
                continue;
            };
            report.evicted += 1;
            debug!("código {code} expirado removido");

            if !self.unlink(removed.storage_path()).await {
                report.unlink_failures += 1;
            }
        }

        report
    }
}

/// Handle da task de varredura periódica.
///
/// Descartar o handle sem chamar `shutdown` também encerra a task, que
/// vê o canal fechado no próximo ciclo.
pub struct ReaperHandle {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Para de agendar varreduras e espera a atual terminar.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            error!("reaper terminou com erro: {e}");
        }
    }
}

/// Inicia o reaper com o período dado (o primeiro ciclo roda após `period`).
pub fn spawn_reaper(registry: Registry, period: Duration) -> ReaperHandle {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(run_reaper(registry, period, shutdown_rx));
    info!("reaper iniciado, período de {period:?}");
    ReaperHandle { shutdown_tx, task }
}

async fn run_reaper(registry: Registry, period: Duration, mut shutdown: broadcast::Receiver<()>) {
    let mut tick = interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = shutdown.recv() => {
                info!("reaper encerrado");
                return;
            }
        }

        // A varredura não concorre com o shutdown: termina antes de checar de novo
        let report = registry.sweep().await;
        if report.evicted > 0 {
            info!(
                "varredura: {} de {} registros expirados removidos ({} falhas ao apagar)",
                report.evicted, report.scanned, report.unlink_failures
            );
        } else {
            debug!("varredura: nada expirado em {} registros", report.scanned);
        }
    }
}
