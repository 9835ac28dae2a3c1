use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::Duration;
use tracing::info;

use zipkey_common::{
    DEFAULT_HOST, DEFAULT_MAX_UPLOAD_MB, DEFAULT_PORT, DEFAULT_REAP_INTERVAL_SECS,
    DEFAULT_UPLOAD_DIR,
};
use zipkey_registry::{Registry, spawn_reaper};
use zipkey_server::{AppState, serve};

#[derive(Parser, Debug)]
#[command(name = "zipkey-server", about = "ZipKey — compartilhamento de arquivos por código")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, value_name = "DIR", default_value = DEFAULT_UPLOAD_DIR)]
    upload_dir: PathBuf,
    #[arg(long, default_value_t = DEFAULT_REAP_INTERVAL_SECS, value_parser = parse_interval)]
    reap_interval_secs: u64,
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    max_upload_mb: usize,
}

fn parse_interval(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("intervalo deve ser maior que zero".into()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("valor inválido: '{s}'")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zipkey_server=info,zipkey_registry=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    tokio::fs::create_dir_all(&args.upload_dir).await?;

    let registry = Registry::new();
    let reaper = spawn_reaper(
        registry.clone(),
        Duration::from_secs(args.reap_interval_secs),
    );

    let state = Arc::new(AppState::new(
        registry,
        args.upload_dir.clone(),
        args.max_upload_mb.saturating_mul(1024 * 1024),
    ));

    let listener = TcpListener::bind(&addr).await?;
    info!("ZipKey escutando em http://{addr}, uploads em {:?}", args.upload_dir);

    serve(listener, state, async {
        let _ = signal::ctrl_c().await;
        info!("shutdown signal recebido");
    })
    .await?;

    reaper.shutdown().await;
    info!("servidor encerrado");

    Ok(())
}
