use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use trestle_core::storage::store::Store;
use trestle_server::config::ServerConfig;
use trestle_server::server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Database file; overrides TRESTLE_DB_PATH
    #[arg(long)]
    db: Option<PathBuf>,
}

use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = ServerConfig::from_env();

    init_logging(&cfg.log_level);

    let db = args.db.unwrap_or_else(|| cfg.db_path.clone());
    let store = Store::open(&db)?;
    store.init_schema()?;

    tracing::info!(
        event = "server_start",
        db = ?db,
        config = ?cfg
    );

    server::run(cfg, store).await
}
