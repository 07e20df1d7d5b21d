use dotenv::dotenv;
use std::sync::Arc;
use stock_notifier::{Config, HeartbeatService, Notifier, SerenityApi};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Loaded configuration: {}", config.summary());

    if config.heartbeat_webhook_url.is_none() {
        log::error!("DISCORD_HEARTBEAT_WEBHOOK_URL (or DISCORD_STOCK_WEBHOOK_URL) must be set");
        std::process::exit(1);
    }

    let api = Arc::new(SerenityApi::new(config.bot_token.as_deref()));
    let interval = config.heartbeat_interval;
    let notifier = Notifier::new(config, api);

    let cancel = CancellationToken::new();
    let heartbeat = HeartbeatService::new(notifier, interval).spawn(cancel.clone());

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
    log::info!("Shutting down");
    cancel.cancel();
    if let Err(e) = heartbeat.await {
        log::error!("Heartbeat task panicked: {}", e);
    }
}
