//! chatwarden - Telegram group moderation and instant-answer search bot.

mod config;
mod db;
mod error;
mod handlers;
mod http;
mod metrics;
mod platform;
mod security;
mod services;
mod state;
mod telemetry;

use crate::config::Config;
use crate::db::StoreHandle;
use crate::platform::{Poller, TelegramApi};
use crate::state::Warden;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let mut config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validate(&config) {
        let mut fatal = false;
        for e in &errors {
            if e.is_fatal() {
                error!(error = %e, "Invalid configuration");
                fatal = true;
            } else {
                warn!(error = %e, "Questionable configuration");
            }
        }
        if fatal {
            anyhow::bail!("refusing to start with invalid configuration ({config_path})");
        }
    }

    // Counters are always registered; the endpoint is optional.
    metrics::init();
    let metrics_port = config.metrics.port;
    if metrics_port == 0 {
        info!("Metrics endpoint disabled");
    } else {
        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let poll_timeout = Duration::from_secs(config.telegram.poll_timeout_secs);
    let api = Arc::new(TelegramApi::new(
        &config.telegram.api_url,
        &config.bot.token,
        poll_timeout,
    ));

    if config.bot.username.is_none() {
        match api.get_me().await {
            Ok(me) => {
                info!(username = ?me.username, "Resolved bot identity");
                config.bot.username = me.username;
            }
            Err(e) => {
                error!(error = %e, "getMe failed");
                return Err(e.into());
            }
        }
    }

    let store = StoreHandle::open(&config.store.path).await;
    let warden = Arc::new(Warden::new(&config, api.clone(), store));

    info!(
        username = config.bot.username.as_deref().unwrap_or("-"),
        store = %config.store.path,
        "Starting chatwarden"
    );

    let poller = Poller::new(api, warden, poll_timeout);
    tokio::select! {
        _ = poller.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
        }
    }

    Ok(())
}
