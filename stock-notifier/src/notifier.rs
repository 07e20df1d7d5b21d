use crate::config::{redact_webhook_url, Config, MAX_DURATION_SECS};
use crate::discord::format::{self, clamp_message, colour_for, mention, truncate};
use crate::discord::{DiscordApi, Embed, OutgoingMessage, PostedMessage, ThreadMessage};
use crate::error::NotifyError;
use crate::models::{format_uptime, CaptchaOutcome, CaptchaPrompt, Heartbeat, NotificationKind, StockAlert};
use crate::retry::{DeliveryBackoff, MAX_DELIVERY_ATTEMPTS};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Sends notifications to Discord. Cheap to clone and share across tasks.
#[derive(Clone)]
pub struct Notifier {
    config: Arc<Config>,
    api: Arc<dyn DiscordApi>,
    backoff: Arc<DeliveryBackoff>,
}

impl Notifier {
    pub fn new(config: Config, api: Arc<dyn DiscordApi>) -> Self {
        Self {
            config: Arc::new(config),
            api,
            backoff: Arc::new(DeliveryBackoff::new()),
        }
    }

    /// Post a stock alert through the stock webhook
    pub async fn send_stock_alert(&self, alert: &StockAlert) -> Result<Option<PostedMessage>, NotifyError> {
        let url = self
            .config
            .stock_webhook_url
            .as_deref()
            .ok_or(NotifyError::NotConfigured("DISCORD_STOCK_WEBHOOK_URL"))?;

        let message = self.stock_alert_message(alert)?;
        let posted = self.deliver(NotificationKind::StockAlert, url, &message).await?;
        log::info!(
            "[{}] Sent alert for '{}' at {}",
            NotificationKind::StockAlert,
            alert.product,
            alert.retailer
        );
        Ok(posted)
    }

    /// Post a heartbeat through the heartbeat webhook
    pub async fn send_heartbeat(&self, heartbeat: &Heartbeat) -> Result<Option<PostedMessage>, NotifyError> {
        let url = self
            .config
            .heartbeat_webhook_url
            .as_deref()
            .ok_or(NotifyError::NotConfigured("DISCORD_HEARTBEAT_WEBHOOK_URL"))?;

        let message = self.heartbeat_message(heartbeat);
        let posted = self.deliver(NotificationKind::Heartbeat, url, &message).await?;
        log::debug!(
            "[{}] Sent heartbeat, uptime {}, {} checks",
            NotificationKind::Heartbeat,
            format_uptime(heartbeat.uptime()),
            heartbeat.checks_completed
        );
        Ok(posted)
    }

    /// Ask a human to solve a captcha.
    ///
    /// With a bot token and captcha channel the prompt is posted by the bot,
    /// a thread is opened on it, and the thread is polled until a reply
    /// arrives or the captcha timeout passes. Otherwise the prompt goes out
    /// through the captcha webhook and nobody waits for an answer.
    pub async fn request_captcha(&self, prompt: &CaptchaPrompt) -> Result<CaptchaOutcome, NotifyError> {
        let message = self.captcha_message(prompt)?;

        let poll_channel = self
            .config
            .captcha_channel_id
            .filter(|_| self.config.can_poll_captcha());
        if let Some(channel_id) = poll_channel {
            return self.request_captcha_in_thread(channel_id, prompt, &message).await;
        }

        let url = self
            .config
            .captcha_webhook_url
            .as_deref()
            .ok_or(NotifyError::NotConfigured("DISCORD_CAPTCHA_WEBHOOK_URL"))?;
        self.deliver(NotificationKind::Captcha, url, &message).await?;
        log::warn!(
            "[{}] Prompt for {} sent via webhook; no bot configured to read the reply",
            NotificationKind::Captcha,
            prompt.retailer
        );
        Ok(CaptchaOutcome::Unattended)
    }

    async fn request_captcha_in_thread(
        &self,
        channel_id: u64,
        prompt: &CaptchaPrompt,
        message: &OutgoingMessage,
    ) -> Result<CaptchaOutcome, NotifyError> {
        let posted = self.api.send_channel_message(channel_id, message).await?;
        let thread_name = truncate(
            &format!("Captcha: {}", prompt.retailer),
            format::MAX_THREAD_NAME_LEN,
        );
        let thread_id = self
            .api
            .create_thread(channel_id, posted.id, &thread_name)
            .await?;

        log::info!(
            "[{}] Waiting up to {}s for a reply in thread {}",
            NotificationKind::Captcha,
            self.config.captcha_timeout.as_secs(),
            thread_id
        );

        match self.poll_for_reply(thread_id).await? {
            Some(reply) => {
                log::info!(
                    "[{}] Got reply from user {} for {}",
                    NotificationKind::Captcha,
                    reply.author_id,
                    prompt.retailer
                );
                if let Err(e) = self
                    .api
                    .send_thread_message(thread_id, "✅ Got it, submitting your answer.")
                    .await
                {
                    log::warn!("[{}] Failed to acknowledge reply: {}", NotificationKind::Captcha, e);
                }
                Ok(CaptchaOutcome::Answered {
                    reply: reply.content.trim().to_string(),
                    author_id: reply.author_id,
                })
            }
            None => {
                log::warn!(
                    "[{}] No reply for {} within {}s",
                    NotificationKind::Captcha,
                    prompt.retailer,
                    self.config.captcha_timeout.as_secs()
                );
                let note = format!(
                    "⌛ No answer within {}s, giving up on this captcha.",
                    self.config.captcha_timeout.as_secs()
                );
                if let Err(e) = self.api.send_thread_message(thread_id, &note).await {
                    log::warn!("[{}] Failed to post timeout note: {}", NotificationKind::Captcha, e);
                }
                Ok(CaptchaOutcome::TimedOut)
            }
        }
    }

    /// Poll a thread until an acceptable reply shows up or the timeout passes.
    /// Transient read failures are skipped; anything else aborts.
    async fn poll_for_reply(&self, thread_id: u64) -> Result<Option<ThreadMessage>, NotifyError> {
        // Config fields are public, so the bound is applied here as well
        let timeout = self
            .config
            .captcha_timeout
            .min(Duration::from_secs(MAX_DURATION_SECS));
        let deadline = Instant::now() + timeout;
        let mut cursor: Option<u64> = None;

        loop {
            match self.api.messages_after(thread_id, cursor).await {
                Ok(messages) => {
                    for message in messages {
                        cursor = Some(cursor.map_or(message.id, |c| c.max(message.id)));
                        if self.is_acceptable_reply(&message) {
                            return Ok(Some(message));
                        }
                    }
                }
                Err(e) if e.is_retryable() => {
                    log::warn!(
                        "[{}] Transient error polling thread {}: {}",
                        NotificationKind::Captcha,
                        thread_id,
                        e
                    );
                }
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let wait = self.config.captcha_poll_interval.min(deadline - now);
            tokio::time::sleep(wait).await;
        }
    }

    fn is_acceptable_reply(&self, message: &ThreadMessage) -> bool {
        if message.author_is_bot || message.content.trim().is_empty() {
            return false;
        }
        match self.config.user_id {
            Some(user_id) => message.author_id == user_id,
            None => true,
        }
    }

    /// Execute a webhook, retrying transient failures with backoff
    async fn deliver(
        &self,
        kind: NotificationKind,
        url: &str,
        message: &OutgoingMessage,
    ) -> Result<Option<PostedMessage>, NotifyError> {
        let key = redact_webhook_url(url);
        let mut attempt = 1;

        loop {
            match self.api.execute_webhook(url, message).await {
                Ok(posted) => {
                    self.backoff.record_success(&key);
                    return Ok(posted);
                }
                Err(e) if e.is_retryable() && attempt < MAX_DELIVERY_ATTEMPTS => {
                    let delay = self.backoff.record_error(&key);
                    log::warn!(
                        "[{}] Attempt {}/{} to {} failed: {}; retrying in {}s",
                        kind,
                        attempt,
                        MAX_DELIVERY_ATTEMPTS,
                        key,
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("[{}] Delivery to {} failed: {}", kind, key, e);
                    return Err(e);
                }
            }
        }
    }

    fn webhook_message(&self, content: Option<String>, embed: Embed) -> OutgoingMessage {
        let mention_user_ids = match (&content, self.config.user_id) {
            (Some(_), Some(user_id)) => vec![user_id],
            _ => Vec::new(),
        };
        clamp_message(OutgoingMessage {
            content,
            embeds: vec![embed],
            username: Some(self.config.username.clone()),
            avatar_url: self.config.avatar_url.clone(),
            mention_user_ids,
        })
    }

    fn stock_alert_message(&self, alert: &StockAlert) -> Result<OutgoingMessage, NotifyError> {
        if alert.product.trim().is_empty() {
            return Err(NotifyError::InvalidPayload("stock alert has no product name".to_string()));
        }
        if alert.url.trim().is_empty() {
            return Err(NotifyError::InvalidPayload("stock alert has no product link".to_string()));
        }

        let mut embed = Embed {
            title: Some(alert.product.clone()),
            description: Some(format!("In stock at **{}**", alert.retailer)),
            url: Some(alert.url.clone()),
            colour: colour_for(NotificationKind::StockAlert),
            thumbnail_url: alert.image_url.clone(),
            footer: Some(self.config.username.clone()),
            timestamp: Some(alert.detected_at),
            ..Default::default()
        }
        .field("Retailer", &alert.retailer, true);
        if let Some(price) = &alert.price {
            embed = embed.field("Price", price, true);
        }
        if let Some(sku) = &alert.sku {
            embed = embed.field("SKU", sku, true);
        }
        embed = embed.field("Link", format!("[Open product page]({})", alert.url), false);

        let content = self
            .config
            .user_id
            .map(|id| format!("{} {} is in stock!", mention(id), alert.product));
        Ok(self.webhook_message(content, embed))
    }

    fn heartbeat_message(&self, heartbeat: &Heartbeat) -> OutgoingMessage {
        let mut embed = Embed {
            title: Some("Heartbeat".to_string()),
            description: Some("Monitor is running.".to_string()),
            colour: colour_for(NotificationKind::Heartbeat),
            timestamp: Some(heartbeat.sent_at),
            ..Default::default()
        }
        .field("Uptime", format_uptime(heartbeat.uptime()), true)
        .field("Checks", heartbeat.checks_completed.to_string(), true);
        if let Some(note) = &heartbeat.note {
            embed = embed.field("Note", note, false);
        }
        self.webhook_message(None, embed)
    }

    fn captcha_message(&self, prompt: &CaptchaPrompt) -> Result<OutgoingMessage, NotifyError> {
        if prompt.url.trim().is_empty() {
            return Err(NotifyError::InvalidPayload("captcha prompt has no link".to_string()));
        }

        let reply_hint = if self.config.can_poll_captcha() {
            "Reply in the thread below with the answer."
        } else {
            "Open the link and solve it."
        };
        let description = match &prompt.instructions {
            Some(instructions) => format!("{}\n\n{}", instructions, reply_hint),
            None => reply_hint.to_string(),
        };

        let embed = Embed {
            title: Some(format!("Captcha required: {}", prompt.retailer)),
            description: Some(description),
            url: Some(prompt.url.clone()),
            colour: colour_for(NotificationKind::Captcha),
            image_url: prompt.image_url.clone(),
            timestamp: Some(chrono::Utc::now()),
            ..Default::default()
        };

        let content = Some(match self.config.user_id {
            Some(id) => format!("{} captcha needed for {}", mention(id), prompt.retailer),
            None => format!("Captcha needed for {}", prompt.retailer),
        });
        Ok(self.webhook_message(content, embed))
    }
}
