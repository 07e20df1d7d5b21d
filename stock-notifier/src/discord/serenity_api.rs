use super::format::{split_message, MAX_CONTENT_LEN};
use super::{DiscordApi, Embed, OutgoingMessage, PostedMessage, ThreadMessage};
use crate::error::NotifyError;
use crate::retry::{is_retryable_error, is_retryable_status};
use async_trait::async_trait;
use serenity::all::{
    ChannelId, CreateAllowedMentions, CreateEmbed, CreateEmbedFooter, CreateMessage, CreateThread,
    ExecuteWebhook, GetMessages, MessageId, Timestamp, UserId, WebhookId,
};
use serenity::http::Http;
use std::sync::Arc;
use url::Url;

/// Page size when reading thread messages (Discord's maximum)
const MESSAGES_PAGE_LIMIT: u8 = 100;

/// `DiscordApi` over serenity's REST client.
/// Webhook calls work without a bot token; channel and thread calls need one.
pub struct SerenityApi {
    http: Arc<Http>,
    has_bot_token: bool,
}

impl SerenityApi {
    pub fn new(bot_token: Option<&str>) -> Self {
        Self {
            http: Arc::new(Http::new(bot_token.unwrap_or_default())),
            has_bot_token: bot_token.is_some(),
        }
    }

    fn require_bot(&self) -> Result<(), NotifyError> {
        if self.has_bot_token {
            Ok(())
        } else {
            Err(NotifyError::NotConfigured("DISCORD_BOT_TOKEN"))
        }
    }
}

fn map_error(err: serenity::Error) -> NotifyError {
    let status = match &err {
        serenity::Error::Http(http_err) => http_err.status_code().map(|s| s.as_u16()),
        _ => None,
    };
    let retryable = match status {
        Some(code) => is_retryable_status(code),
        None => is_retryable_error(&err.to_string()),
    };
    NotifyError::discord(err.to_string(), retryable)
}

/// Split a webhook URL into its id and token so deliveries go straight to
/// the execute endpoint without fetching the webhook first
fn webhook_parts(raw: &str) -> Result<(WebhookId, String), NotifyError> {
    let invalid = || NotifyError::discord("webhook URL is not of the form /api/webhooks/<id>/<token>", false);

    let url = Url::parse(raw).map_err(|_| invalid())?;
    let mut segments = url.path_segments().ok_or_else(invalid)?;
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some("api"), Some("webhooks"), Some(id), Some(token)) if !token.is_empty() => {
            let id = id.parse::<u64>().ok().filter(|id| *id != 0).ok_or_else(invalid)?;
            Ok((WebhookId::new(id), token.to_string()))
        }
        _ => Err(invalid()),
    }
}

fn to_create_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new().colour(embed.colour);
    if let Some(title) = &embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description);
    }
    if let Some(url) = &embed.url {
        builder = builder.url(url);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(thumbnail) = &embed.thumbnail_url {
        builder = builder.thumbnail(thumbnail);
    }
    if let Some(image) = &embed.image_url {
        builder = builder.image(image);
    }
    if let Some(footer) = &embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(ts) = embed
        .timestamp
        .and_then(|t| Timestamp::from_unix_timestamp(t.timestamp()).ok())
    {
        builder = builder.timestamp(ts);
    }
    builder
}

fn allowed_mentions(message: &OutgoingMessage) -> CreateAllowedMentions {
    CreateAllowedMentions::new().users(message.mention_user_ids.iter().map(|id| UserId::new(*id)))
}

#[async_trait]
impl DiscordApi for SerenityApi {
    async fn execute_webhook(
        &self,
        url: &str,
        message: &OutgoingMessage,
    ) -> Result<Option<PostedMessage>, NotifyError> {
        let (webhook_id, token) = webhook_parts(url)?;

        let mut builder = ExecuteWebhook::new()
            .embeds(message.embeds.iter().map(to_create_embed).collect())
            .allowed_mentions(allowed_mentions(message));
        if let Some(content) = &message.content {
            builder = builder.content(content);
        }
        if let Some(username) = &message.username {
            builder = builder.username(username);
        }
        if let Some(avatar_url) = &message.avatar_url {
            builder = builder.avatar_url(avatar_url);
        }

        // wait=true so Discord returns the created message
        let posted = self
            .http
            .execute_webhook(webhook_id, None, &token, true, Vec::new(), &builder)
            .await
            .map_err(map_error)?;

        Ok(posted.map(|m| PostedMessage {
            id: m.id.get(),
            channel_id: m.channel_id.get(),
        }))
    }

    async fn send_channel_message(
        &self,
        channel_id: u64,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage, NotifyError> {
        self.require_bot()?;

        let mut builder = CreateMessage::new()
            .embeds(message.embeds.iter().map(to_create_embed).collect())
            .allowed_mentions(allowed_mentions(message));
        if let Some(content) = &message.content {
            builder = builder.content(content);
        }

        let sent = ChannelId::new(channel_id)
            .send_message(&self.http, builder)
            .await
            .map_err(map_error)?;

        Ok(PostedMessage {
            id: sent.id.get(),
            channel_id: sent.channel_id.get(),
        })
    }

    async fn create_thread(
        &self,
        channel_id: u64,
        message_id: u64,
        name: &str,
    ) -> Result<u64, NotifyError> {
        self.require_bot()?;

        let thread = ChannelId::new(channel_id)
            .create_thread_from_message(&self.http, MessageId::new(message_id), CreateThread::new(name))
            .await
            .map_err(map_error)?;

        Ok(thread.id.get())
    }

    async fn messages_after(
        &self,
        channel_id: u64,
        after: Option<u64>,
    ) -> Result<Vec<ThreadMessage>, NotifyError> {
        self.require_bot()?;

        let mut request = GetMessages::new().limit(MESSAGES_PAGE_LIMIT);
        if let Some(after) = after {
            request = request.after(MessageId::new(after));
        }

        let messages = ChannelId::new(channel_id)
            .messages(&self.http, request)
            .await
            .map_err(map_error)?;

        let mut out: Vec<ThreadMessage> = messages
            .into_iter()
            .map(|m| ThreadMessage {
                id: m.id.get(),
                author_id: m.author.id.get(),
                author_is_bot: m.author.bot,
                content: m.content,
            })
            .collect();
        // Discord returns newest first
        out.sort_by_key(|m| m.id);
        Ok(out)
    }

    async fn send_thread_message(&self, thread_id: u64, content: &str) -> Result<(), NotifyError> {
        self.require_bot()?;

        let thread = ChannelId::new(thread_id);
        for chunk in split_message(content, MAX_CONTENT_LEN) {
            thread.say(&self.http, chunk).await.map_err(map_error)?;
        }
        Ok(())
    }
}
