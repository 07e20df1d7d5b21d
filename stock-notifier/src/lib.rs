//! Discord notifications for a stock monitor: restock alerts, heartbeats and
//! captcha prompts that wait for a human reply.

pub mod config;
pub mod discord;
pub mod error;
pub mod heartbeat;
pub mod models;
pub mod notifier;
pub mod retry;

pub use config::Config;
pub use discord::{DiscordApi, SerenityApi};
pub use error::{ConfigError, NotifyError};
pub use heartbeat::{CheckCounter, HeartbeatService};
pub use models::{CaptchaOutcome, CaptchaPrompt, Heartbeat, NotificationKind, StockAlert};
pub use notifier::Notifier;
