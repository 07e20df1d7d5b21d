mod alert;
mod captcha;
mod heartbeat;

pub use alert::StockAlert;
pub use captcha::{CaptchaOutcome, CaptchaPrompt};
pub use heartbeat::{format_uptime, Heartbeat};

use strum::{AsRefStr, Display, EnumString};

/// Kind of notification, used for log prefixes and embed colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    StockAlert,
    Heartbeat,
    Captcha,
}
