//! Discord seam
//!
//! Payloads are built as plain records (`OutgoingMessage`, `Embed`) and handed
//! to a `DiscordApi` implementation. `SerenityApi` is the real one; tests use
//! a scripted double so payload and polling logic run without the network.

pub mod format;
mod serenity_api;

pub use serenity_api::SerenityApi;

use crate::error::NotifyError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A single embed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Embed payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub colour: u32,
    pub fields: Vec<EmbedField>,
    pub thumbnail_url: Option<String>,
    pub image_url: Option<String>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Message payload sent through a webhook or by the bot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    /// Webhook display name override (ignored for bot messages)
    pub username: Option<String>,
    /// Webhook avatar override (ignored for bot messages)
    pub avatar_url: Option<String>,
    /// Users allowed to be pinged by the content. Everything else is suppressed.
    pub mention_user_ids: Vec<u64>,
}

/// Identifiers of a message Discord accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedMessage {
    pub id: u64,
    pub channel_id: u64,
}

/// A message read back from a channel or thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub id: u64,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub content: String,
}

/// Operations the notifier needs from Discord
#[async_trait]
pub trait DiscordApi: Send + Sync {
    /// Post through a webhook. Returns the created message when Discord reports it.
    async fn execute_webhook(
        &self,
        url: &str,
        message: &OutgoingMessage,
    ) -> Result<Option<PostedMessage>, NotifyError>;

    /// Post as the bot into a channel
    async fn send_channel_message(
        &self,
        channel_id: u64,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage, NotifyError>;

    /// Open a thread on an existing message, returning the thread's channel id
    async fn create_thread(
        &self,
        channel_id: u64,
        message_id: u64,
        name: &str,
    ) -> Result<u64, NotifyError>;

    /// Messages in a channel newer than `after`, oldest first
    async fn messages_after(
        &self,
        channel_id: u64,
        after: Option<u64>,
    ) -> Result<Vec<ThreadMessage>, NotifyError>;

    /// Post plain text into a thread as the bot
    async fn send_thread_message(&self, thread_id: u64, content: &str) -> Result<(), NotifyError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// A recorded call against the scripted API
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Webhook { url: String, message: OutgoingMessage },
        ChannelMessage { channel_id: u64, message: OutgoingMessage },
        CreateThread { channel_id: u64, message_id: u64, name: String },
        MessagesAfter { channel_id: u64, after: Option<u64> },
        ThreadMessage { thread_id: u64, content: String },
    }

    /// In-memory `DiscordApi` that records calls and replays scripted results
    #[derive(Default)]
    pub struct ScriptedApi {
        calls: Mutex<Vec<Call>>,
        webhook_results: Mutex<VecDeque<Result<Option<PostedMessage>, NotifyError>>>,
        poll_results: Mutex<VecDeque<Result<Vec<ThreadMessage>, NotifyError>>>,
        next_id: Mutex<u64>,
    }

    impl ScriptedApi {
        pub fn new() -> Self {
            Self {
                next_id: Mutex::new(1000),
                ..Default::default()
            }
        }

        /// Queue a result for the next webhook call. Unscripted calls succeed.
        pub fn push_webhook_result(&self, result: Result<Option<PostedMessage>, NotifyError>) {
            self.webhook_results.lock().push_back(result);
        }

        /// Queue a result for the next poll. Unscripted polls return nothing.
        pub fn push_poll(&self, result: Result<Vec<ThreadMessage>, NotifyError>) {
            self.poll_results.lock().push_back(result);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        pub fn webhook_calls(&self) -> Vec<(String, OutgoingMessage)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Webhook { url, message } => Some((url, message)),
                    _ => None,
                })
                .collect()
        }

        pub fn poll_cursors(&self) -> Vec<Option<u64>> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::MessagesAfter { after, .. } => Some(after),
                    _ => None,
                })
                .collect()
        }

        pub fn thread_messages(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::ThreadMessage { content, .. } => Some(content),
                    _ => None,
                })
                .collect()
        }

        fn next_id(&self) -> u64 {
            let mut id = self.next_id.lock();
            *id += 1;
            *id
        }
    }

    #[async_trait]
    impl DiscordApi for ScriptedApi {
        async fn execute_webhook(
            &self,
            url: &str,
            message: &OutgoingMessage,
        ) -> Result<Option<PostedMessage>, NotifyError> {
            self.calls.lock().push(Call::Webhook {
                url: url.to_string(),
                message: message.clone(),
            });
            match self.webhook_results.lock().pop_front() {
                Some(result) => result,
                None => Ok(Some(PostedMessage {
                    id: self.next_id(),
                    channel_id: 1,
                })),
            }
        }

        async fn send_channel_message(
            &self,
            channel_id: u64,
            message: &OutgoingMessage,
        ) -> Result<PostedMessage, NotifyError> {
            self.calls.lock().push(Call::ChannelMessage {
                channel_id,
                message: message.clone(),
            });
            Ok(PostedMessage {
                id: self.next_id(),
                channel_id,
            })
        }

        async fn create_thread(
            &self,
            channel_id: u64,
            message_id: u64,
            name: &str,
        ) -> Result<u64, NotifyError> {
            self.calls.lock().push(Call::CreateThread {
                channel_id,
                message_id,
                name: name.to_string(),
            });
            // Discord gives a thread started from a message the message's id
            Ok(message_id)
        }

        async fn messages_after(
            &self,
            channel_id: u64,
            after: Option<u64>,
        ) -> Result<Vec<ThreadMessage>, NotifyError> {
            self.calls
                .lock()
                .push(Call::MessagesAfter { channel_id, after });
            self.poll_results.lock().pop_front().unwrap_or(Ok(Vec::new()))
        }

        async fn send_thread_message(&self, thread_id: u64, content: &str) -> Result<(), NotifyError> {
            self.calls.lock().push(Call::ThreadMessage {
                thread_id,
                content: content.to_string(),
            });
            Ok(())
        }
    }
}
