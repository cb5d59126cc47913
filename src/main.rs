//! counter-watch
//!
//! Client-side lifecycle manager for an on-chain counter program.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌─────────────┐  submit / poll   ┌──────────────┐
//!   │ action loop │ ───────────────▶ │ RPC gateway  │──▶ node (HTTP)
//!   └──────┬──────┘                  └──────────────┘
//!          │ upsert_merge
//!          ▼
//!   ┌──────────────────┐   snapshot/remove   ┌─────────┐
//!   │ reconcile table  │ ◀─────────────────▶ │ janitor │──▶ latency metrics
//!   └──────▲───────────┘                     └─────────┘
//!          │ upsert_merge
//!   ┌──────┴──────┐  accountSubscribe  ┌──────────────┐
//!   │ WS listener │ ◀───────────────── │ node (WS)    │
//!   └─────────────┘                    └──────────────┘
//! ```

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use counter_watch::config::{self, validation::validate_config, ClientConfig};
use counter_watch::lifecycle::Shutdown;
use counter_watch::observability::metrics;
use counter_watch::reconcile::{Janitor, ReconcileTable};
use counter_watch::rpc::{HttpGateway, Wallet};
use counter_watch::workflow::{self, AccountListener, ActionLoop};

/// Counter program transaction lifecycle client.
#[derive(Parser, Debug)]
#[command(name = "counter-watch", version)]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RPC HTTP endpoint override.
    #[arg(short = 'u', long)]
    url: Option<String>,

    /// RPC WebSocket endpoint override.
    #[arg(short = 'w', long)]
    ws: Option<String>,

    /// Path to the funding keypair file.
    #[arg(short = 'k', long)]
    keypair: Option<String>,

    /// Path to the program keypair file.
    #[arg(short = 'p', long)]
    program_keypair: Option<String>,

    /// Seconds to sleep between counter increments.
    #[arg(short = 's', long)]
    sleep_time: Option<u64>,

    /// Skip creating the data account at startup.
    #[arg(long)]
    no_create_data_account: bool,
}

fn build_config(args: &Args) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => ClientConfig::default(),
    };

    if let Some(url) = &args.url {
        config.rpc.http_url = url.clone();
    }
    if let Some(ws) = &args.ws {
        config.rpc.ws_url = ws.clone();
    }
    if let Some(keypair) = &args.keypair {
        config.keys.keypair_path = keypair.clone();
    }
    if let Some(program_keypair) = &args.program_keypair {
        config.keys.program_keypair_path = program_keypair.clone();
    }
    if let Some(sleep_time) = args.sleep_time {
        config.action.sleep_secs = sleep_time;
    }
    if args.no_create_data_account {
        config.action.create_data_account = false;
    }

    validate_config(&config).map_err(|errors| {
        format!(
            "invalid configuration: {}",
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    tracing::info!(
        http_url = %config.rpc.http_url,
        ws_url = %config.rpc.ws_url,
        iterations = config.action.iterations,
        "counter-watch starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let payer = Arc::new(Wallet::from_file(Path::new(&config.keys.keypair_path))?);
    let program = Arc::new(Wallet::from_file(Path::new(
        &config.keys.program_keypair_path,
    ))?);
    tracing::info!(payer = %payer.pubkey(), program = %program.pubkey(), "Keypairs loaded");

    let gateway = Arc::new(HttpGateway::new(&config.rpc));
    let data_account =
        workflow::prepare(gateway.as_ref(), &payer, &program, &config.action).await?;

    let table = ReconcileTable::new();
    let shutdown = Shutdown::new();

    let janitor = Janitor::new(
        table.clone(),
        Duration::from_secs(config.reconcile.janitor_interval_secs),
        Duration::from_secs(config.reconcile.stale_after_secs),
    );
    let janitor_handle = tokio::spawn(janitor.run(shutdown.subscribe()));

    let listener = AccountListener::new(&config.rpc, &config.action, data_account, table.clone());
    let listener_handle = tokio::spawn(listener.run(shutdown.subscribe()));

    let action = ActionLoop::new(
        gateway,
        payer,
        program,
        config.action.clone(),
        table.clone(),
    );
    let mut action_handle = tokio::spawn(action.run(shutdown.subscribe()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, shutting down");
            shutdown.trigger();
            let _ = action_handle.await;
        }
        _ = &mut action_handle => {
            tracing::info!(
                remaining = table.len(),
                "Action loop complete, letting the janitor drain"
            );
            tokio::time::sleep(Duration::from_secs(config.reconcile.janitor_interval_secs)).await;
            shutdown.trigger();
        }
    }

    let _ = listener_handle.await;
    let _ = janitor_handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
