//! `chirpd`: the social feed server binary.
//!
//! Usage:
//!   chirpd -c <context-name-or-path> [--listen <addr>] [--seed] [--repair-counters]
//!
//! The context name resolves to `/etc/chirp/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod config;
mod routes;
mod seed;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use chirp_core::{Module, SystemClock, TrustedHeader};
use chirp_social::SocialModule;
use config::ServerConfig;

/// Social feed server.
#[derive(Parser, Debug)]
#[command(name = "chirpd", about = "Social feed server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Load demo users, tweets, likes and follows into an empty store.
    #[arg(long = "seed")]
    seed: bool,

    /// Rewrite drifted counters found by the startup audit.
    #[arg(long = "repair-counters")]
    repair_counters: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    let service_config = server_config.service_config(&cli.listen);
    std::fs::create_dir_all(&server_config.storage.data_dir)?;

    let db_path = service_config.resolve_db_path();
    let kv: Arc<dyn chirp_kv::KVStore> = Arc::new(
        chirp_kv::RedbStore::open(&db_path)
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    info!("Opened store at {}", db_path.display());

    let social = SocialModule::new(
        kv,
        Arc::new(SystemClock),
        server_config.feed.clone(),
        Arc::new(TrustedHeader::new(server_config.identity.header.clone())),
    );
    info!("Social module initialized");

    if cli.seed {
        seed::apply_demo(social.service())?;
    }

    let drift = social.service().audit_counters()?;
    if !drift.is_empty() {
        if cli.repair_counters {
            social.service().repair_counters()?;
        } else {
            for d in &drift {
                warn!(
                    entity = d.entity.as_str(),
                    id = d.id,
                    field = d.field.as_str(),
                    stored = d.stored,
                    actual = d.actual,
                    "counter drift"
                );
            }
            warn!("run with --repair-counters to fix {} drifted counters", drift.len());
        }
    }

    let app = routes::build_router(vec![(social.name(), social.routes())]);

    let listener = tokio::net::TcpListener::bind(&service_config.listen).await?;
    info!("chirpd listening on {}", service_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
