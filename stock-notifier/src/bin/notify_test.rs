//! Notification Test Fixture
//!
//! Sends a single notification using the normal configuration, so webhooks
//! and bot permissions can be checked by hand.
//!
//! Usage:
//!   NOTIFY_TEST_KIND="stock_alert" cargo run --bin notify_test
//!   NOTIFY_TEST_KIND="heartbeat" cargo run --bin notify_test
//!   NOTIFY_TEST_KIND="captcha" cargo run --bin notify_test
//!
//! `NOTIFY_TEST_PAYLOAD` may hold a JSON `StockAlert` or `CaptchaPrompt` to
//! send instead of the built-in sample.

use dotenv::dotenv;
use serde::de::DeserializeOwned;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use stock_notifier::{
    CaptchaOutcome, CaptchaPrompt, Config, Heartbeat, NotificationKind, Notifier, SerenityApi,
    StockAlert,
};

fn payload_or<T: DeserializeOwned>(sample: T) -> Result<T, String> {
    match env::var("NOTIFY_TEST_PAYLOAD") {
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| format!("Invalid NOTIFY_TEST_PAYLOAD: {}", e)),
        Err(_) => Ok(sample),
    }
}

async fn run(notifier: &Notifier, kind: NotificationKind) -> Result<(), String> {
    match kind {
        NotificationKind::StockAlert => {
            let alert = payload_or(
                StockAlert::new(
                    "Test Product",
                    "Test Retailer",
                    "https://example.com/products/test",
                )
                .with_price("$0.00")
                .with_sku("TEST-0001"),
            )?;
            let posted = notifier
                .send_stock_alert(&alert)
                .await
                .map_err(|e| e.to_string())?;
            println!("Stock alert sent: {:?}", posted);
        }
        NotificationKind::Heartbeat => {
            let heartbeat = Heartbeat::new(chrono::Utc::now(), 0).with_note("Test heartbeat");
            let posted = notifier
                .send_heartbeat(&heartbeat)
                .await
                .map_err(|e| e.to_string())?;
            println!("Heartbeat sent: {:?}", posted);
        }
        NotificationKind::Captcha => {
            let mut sample = CaptchaPrompt::new("Test Retailer", "https://example.com/captcha");
            sample.instructions = Some("This is a test. Reply with anything.".to_string());
            let prompt = payload_or(sample)?;
            let outcome = notifier
                .request_captcha(&prompt)
                .await
                .map_err(|e| e.to_string())?;
            match outcome {
                CaptchaOutcome::Answered { reply, author_id } => {
                    println!("Captcha answered by {}: {}", author_id, reply)
                }
                CaptchaOutcome::TimedOut => println!("Captcha timed out"),
                CaptchaOutcome::Unattended => println!("Captcha prompt sent (no bot to read replies)"),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let kind_raw = env::var("NOTIFY_TEST_KIND").unwrap_or_else(|_| "heartbeat".to_string());
    let kind = match NotificationKind::from_str(&kind_raw) {
        Ok(kind) => kind,
        Err(_) => {
            eprintln!(
                "Unknown NOTIFY_TEST_KIND '{}'; expected stock_alert, heartbeat or captcha",
                kind_raw
            );
            std::process::exit(2);
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    println!("Configuration: {}", config.summary());

    let api = Arc::new(SerenityApi::new(config.bot_token.as_deref()));
    let notifier = Notifier::new(config, api);

    if let Err(e) = run(&notifier, kind).await {
        eprintln!("{} failed: {}", kind, e);
        std::process::exit(1);
    }
}
