use crate::error::ConfigError;
use std::env;
use std::time::Duration;
use url::Url;

const DEFAULT_USERNAME: &str = "Stock Notifier";
const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 3600;
const DEFAULT_CAPTCHA_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_CAPTCHA_TIMEOUT_SECS: u64 = 300;
/// Upper bound for every interval and timeout setting (30 days)
pub const MAX_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Hosts Discord serves webhooks from
const WEBHOOK_HOSTS: &[&str] = &[
    "discord.com",
    "discordapp.com",
    "canary.discord.com",
    "ptb.discord.com",
];

#[derive(Clone)]
#[cfg_attr(test, derive(Debug))]
pub struct Config {
    pub stock_webhook_url: Option<String>,
    pub heartbeat_webhook_url: Option<String>,
    pub captcha_webhook_url: Option<String>,
    pub bot_token: Option<String>,
    pub captcha_channel_id: Option<u64>,
    /// User mentioned on alerts and captcha prompts. When set, only this
    /// user's reply answers a captcha.
    pub user_id: Option<u64>,
    pub username: String,
    pub avatar_url: Option<String>,
    pub heartbeat_interval: Duration,
    pub captcha_poll_interval: Duration,
    pub captcha_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stock_webhook_url: None,
            heartbeat_webhook_url: None,
            captcha_webhook_url: None,
            bot_token: None,
            captcha_channel_id: None,
            user_id: None,
            username: DEFAULT_USERNAME.to_string(),
            avatar_url: None,
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECS),
            captcha_poll_interval: Duration::from_secs(DEFAULT_CAPTCHA_POLL_INTERVAL_SECS),
            captcha_timeout: Duration::from_secs(DEFAULT_CAPTCHA_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if the
    /// caller ran `dotenv` first)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let stock_webhook_url = get("DISCORD_STOCK_WEBHOOK_URL")
            .map(|u| validate_webhook_url("DISCORD_STOCK_WEBHOOK_URL", u))
            .transpose()?;
        let heartbeat_webhook_url = get("DISCORD_HEARTBEAT_WEBHOOK_URL")
            .map(|u| validate_webhook_url("DISCORD_HEARTBEAT_WEBHOOK_URL", u))
            .transpose()?
            .or_else(|| stock_webhook_url.clone());
        let captcha_webhook_url = get("DISCORD_CAPTCHA_WEBHOOK_URL")
            .map(|u| validate_webhook_url("DISCORD_CAPTCHA_WEBHOOK_URL", u))
            .transpose()?
            .or_else(|| stock_webhook_url.clone());

        let bot_token = get("DISCORD_BOT_TOKEN").or_else(|| get("DISCORD_TOKEN"));

        let captcha_channel_id = get("DISCORD_CAPTCHA_CHANNEL_ID")
            .map(|v| parse_snowflake("DISCORD_CAPTCHA_CHANNEL_ID", &v))
            .transpose()?;
        let user_id = get("DISCORD_USER_ID")
            .map(|v| parse_snowflake("DISCORD_USER_ID", &v))
            .transpose()?;

        let username = get("NOTIFIER_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        let avatar_url = get("NOTIFIER_AVATAR_URL");

        let heartbeat_interval = parse_secs(
            "HEARTBEAT_INTERVAL_SECS",
            get("HEARTBEAT_INTERVAL_SECS"),
            DEFAULT_HEARTBEAT_INTERVAL_SECS,
        )?;
        let captcha_poll_interval = parse_secs(
            "CAPTCHA_POLL_INTERVAL_SECS",
            get("CAPTCHA_POLL_INTERVAL_SECS"),
            DEFAULT_CAPTCHA_POLL_INTERVAL_SECS,
        )?;
        let captcha_timeout = parse_secs(
            "CAPTCHA_TIMEOUT_SECS",
            get("CAPTCHA_TIMEOUT_SECS"),
            DEFAULT_CAPTCHA_TIMEOUT_SECS,
        )?;
        if captcha_timeout < captcha_poll_interval {
            return Err(ConfigError::invalid(
                "CAPTCHA_TIMEOUT_SECS",
                "must not be shorter than CAPTCHA_POLL_INTERVAL_SECS",
            ));
        }

        Ok(Self {
            stock_webhook_url,
            heartbeat_webhook_url,
            captcha_webhook_url,
            bot_token,
            captcha_channel_id,
            user_id,
            username,
            avatar_url,
            heartbeat_interval,
            captcha_poll_interval,
            captcha_timeout,
        })
    }

    /// Whether captcha prompts can be posted by the bot and their thread polled
    pub fn can_poll_captcha(&self) -> bool {
        self.bot_token.is_some() && self.captcha_channel_id.is_some()
    }

    /// Short human-readable summary, safe to log
    pub fn summary(&self) -> String {
        let describe = |url: &Option<String>| match url {
            Some(u) => redact_webhook_url(u),
            None => "unset".to_string(),
        };
        format!(
            "stock={}, heartbeat={}, captcha={}, bot={}, captcha_channel={:?}, heartbeat_every={}s",
            describe(&self.stock_webhook_url),
            describe(&self.heartbeat_webhook_url),
            describe(&self.captcha_webhook_url),
            if self.bot_token.is_some() { "set" } else { "unset" },
            self.captcha_channel_id,
            self.heartbeat_interval.as_secs(),
        )
    }
}

/// Check that a URL points at a Discord webhook: `https://discord.com/api/webhooks/<id>/<token>`
fn validate_webhook_url(key: &'static str, raw: String) -> Result<String, ConfigError> {
    let parsed = Url::parse(&raw).map_err(|e| ConfigError::invalid(key, e.to_string()))?;

    if parsed.scheme() != "https" {
        return Err(ConfigError::invalid(key, "webhook URL must use https"));
    }

    let host = parsed.host_str().unwrap_or_default();
    if !WEBHOOK_HOSTS.contains(&host) {
        return Err(ConfigError::invalid(
            key,
            format!("'{}' is not a Discord host", host),
        ));
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    let well_formed = segments.len() >= 4
        && segments[0] == "api"
        && segments[1] == "webhooks"
        && segments[2].parse::<u64>().is_ok();
    if !well_formed {
        return Err(ConfigError::invalid(
            key,
            "expected a path of the form /api/webhooks/<id>/<token>",
        ));
    }

    Ok(raw)
}

fn parse_snowflake(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(key, "must be non-zero")),
        Ok(id) => Ok(id),
        Err(_) => Err(ConfigError::invalid(
            key,
            format!("'{}' is not a Discord id", value),
        )),
    }
}

fn parse_secs(key: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let secs = match value {
        Some(v) => v
            .parse::<u64>()
            .map_err(|_| ConfigError::invalid(key, format!("'{}' is not a number of seconds", v)))?,
        None => default,
    };
    if secs == 0 {
        return Err(ConfigError::invalid(key, "must be greater than zero"));
    }
    if secs > MAX_DURATION_SECS {
        return Err(ConfigError::invalid(
            key,
            format!("must be at most {} seconds", MAX_DURATION_SECS),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Hide the token part of a webhook URL so it can be logged
pub fn redact_webhook_url(raw: &str) -> String {
    match raw.find("/api/webhooks/") {
        Some(idx) => {
            let rest = &raw[idx + "/api/webhooks/".len()..];
            let id = rest.split('/').next().unwrap_or_default();
            format!("{}/api/webhooks/{}/***", &raw[..idx], id)
        }
        None => "***".to_string(),
    }
}
