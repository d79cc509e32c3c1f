//! STAKEBOOK — Funded Betting-Challenge Ledger & Compliance Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the JSON document store, and serves the ledger API.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stakebook::api;
use stakebook::api::routes::ApiState;
use stakebook::config::AppConfig;
use stakebook::engine::LedgerEngine;
use stakebook::storage::Storage;

const BANNER: &str = r#"
 ____  _____  _    _  _______ ____   ___   ___  _  __
/ ___||_   _|/ \  | |/ / ____| __ ) / _ \ / _ \| |/ /
\___ \  | | / _ \ | ' /|  _| |  _ \| | | | | | | ' /
 ___) | | |/ ___ \| . \| |___| |_) | |_| | |_| | . \
|____/  |_/_/   \_\_|\_\_____|____/ \___/ \___/|_|\_\

  Funded Betting-Challenge Ledger & Compliance Engine
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        app_name = %cfg.app.name,
        data_dir = %cfg.storage.data_dir,
        port = cfg.server.port,
        "STAKEBOOK starting up"
    );

    let storage = Storage::new(&cfg.storage.data_dir)?;
    let engine = LedgerEngine::new(storage);

    let accounts = engine.list_accounts()?;
    info!(accounts = accounts.len(), "Accounts index loaded");

    let state = Arc::new(ApiState::new(engine));
    api::serve(state, cfg.server.port).await
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stakebook=info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
