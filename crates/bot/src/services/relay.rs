//! Message relay into the review channel.
//!
//! Two delivery strategies share one endpoint:
//! - [`BotDelivery`] posts through the bot's own session
//! - [`WebhookDelivery`] posts to a static Discord webhook URL

use std::sync::Arc;

use async_trait::async_trait;
use nonogram_relay_core::ChannelId;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::config::DeliveryConfig;
use crate::discord::{Attachment, ChatPlatform, DiscordError, OutgoingMessage};

/// Errors that can occur while relaying a message.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The review channel is not visible to the bot.
    #[error("channel {0} not found")]
    ChannelNotFound(ChannelId),

    /// The Discord call failed.
    #[error("transport failure: {0}")]
    Transport(#[from] DiscordError),

    /// The webhook request could not be sent or its response read.
    #[error("webhook request failed: {0}")]
    WebhookRequest(String),

    /// The webhook answered with a non-success status.
    #[error("webhook returned {status}")]
    Webhook { status: u16, body: String },
}

/// The JSON carried in the `payload_json` multipart field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayPayload {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub embeds: Option<Vec<Value>>,
}

impl RelayPayload {
    /// Build the outgoing message, defaulting missing content and embeds.
    #[must_use]
    pub fn into_message(self, attachment: Option<Attachment>) -> OutgoingMessage {
        OutgoingMessage {
            content: self.content.unwrap_or_default(),
            embeds: self.embeds.unwrap_or_default(),
            attachment,
        }
    }
}

/// How relayed messages reach the channel.
#[async_trait]
pub trait RelayDelivery: Send + Sync {
    /// Short name used in logs and the HTTP confirmation.
    fn name(&self) -> &'static str;

    /// Deliver one message.
    async fn deliver(&self, message: OutgoingMessage) -> Result<(), RelayError>;
}

/// Build the strategy selected by configuration.
#[must_use]
pub fn from_config(
    config: &DeliveryConfig,
    chat: Arc<dyn ChatPlatform>,
    channel_id: ChannelId,
) -> Arc<dyn RelayDelivery> {
    match config {
        DeliveryConfig::Bot => Arc::new(BotDelivery::new(chat, channel_id)),
        DeliveryConfig::Webhook { url } => Arc::new(WebhookDelivery::new(url.clone())),
    }
}

/// Posts through the bot session after checking the channel exists.
pub struct BotDelivery {
    chat: Arc<dyn ChatPlatform>,
    channel_id: ChannelId,
}

impl BotDelivery {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatPlatform>, channel_id: ChannelId) -> Self {
        Self { chat, channel_id }
    }
}

#[async_trait]
impl RelayDelivery for BotDelivery {
    fn name(&self) -> &'static str {
        "bot"
    }

    #[instrument(skip(self, message), fields(channel = %self.channel_id))]
    async fn deliver(&self, message: OutgoingMessage) -> Result<(), RelayError> {
        if self.chat.fetch_channel(&self.channel_id).await?.is_none() {
            warn!("Relay channel not found");
            return Err(RelayError::ChannelNotFound(self.channel_id.clone()));
        }

        let posted = self.chat.send_message(&self.channel_id, message).await?;
        debug!(message = %posted.id, "Relayed message via bot");

        Ok(())
    }
}

/// Posts to a Discord webhook as multipart.
#[derive(Clone)]
pub struct WebhookDelivery {
    client: Client,
    url: SecretString,
}

impl std::fmt::Debug for WebhookDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDelivery")
            .field("url", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl WebhookDelivery {
    #[must_use]
    pub fn new(url: SecretString) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl RelayDelivery for WebhookDelivery {
    fn name(&self) -> &'static str {
        "webhook"
    }

    #[instrument(skip(self, message), fields(has_file = message.attachment.is_some()))]
    async fn deliver(&self, message: OutgoingMessage) -> Result<(), RelayError> {
        let payload = serde_json::json!({
            "content": message.content,
            "embeds": message.embeds,
        });

        let mut form = Form::new().text("payload_json", payload.to_string());
        if let Some(attachment) = message.attachment {
            form = form.part("file", file_part(attachment)?);
        }

        let response = self
            .client
            .post(self.url.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| RelayError::WebhookRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Webhook rejected relayed message");
            return Err(RelayError::Webhook {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Relayed message via webhook");

        Ok(())
    }
}

/// The uploaded file as a multipart part, keeping its declared type.
fn file_part(attachment: Attachment) -> Result<Part, RelayError> {
    let part = Part::bytes(attachment.bytes).file_name(attachment.filename);
    match attachment.content_type {
        Some(mime) => part
            .mime_str(&mime)
            .map_err(|e| RelayError::WebhookRequest(format!("invalid attachment type: {e}"))),
        None => Ok(part),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{FakeChat, user};

    fn channel() -> ChannelId {
        ChannelId::from("1236906035932041286")
    }

    #[test]
    fn test_payload_defaults() {
        let payload: RelayPayload = serde_json::from_str("{}").expect("valid payload");
        let message = payload.into_message(None);
        assert_eq!(message.content, "");
        assert!(message.embeds.is_empty());
    }

    #[test]
    fn test_payload_keeps_embeds() {
        let payload: RelayPayload = serde_json::from_value(json!({
            "content": "New puzzle",
            "embeds": [{ "title": "Cat", "fields": [{ "name": "ID", "value": "puzzle_1" }] }]
        }))
        .expect("valid payload");

        let message = payload.into_message(None);
        assert_eq!(message.content, "New puzzle");
        assert_eq!(message.embeds[0]["fields"][0]["value"], "puzzle_1");
    }

    #[tokio::test]
    async fn test_bot_delivery_missing_channel() {
        let chat = Arc::new(FakeChat::new(user("1", "relay", true)));
        let delivery = BotDelivery::new(chat.clone(), channel());

        let result = delivery.deliver(OutgoingMessage::text("hi")).await;

        assert!(matches!(result, Err(RelayError::ChannelNotFound(_))));
        assert!(chat.sent().is_empty());
    }

    #[tokio::test]
    async fn test_bot_delivery_sends_once() {
        let chat = Arc::new(FakeChat::new(user("1", "relay", true)).with_channel(channel()));
        let delivery = BotDelivery::new(chat.clone(), channel());

        delivery
            .deliver(OutgoingMessage::text("hi"))
            .await
            .expect("delivered");

        let sent = chat.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, channel());
        assert_eq!(sent[0].1.content, "hi");
    }

    #[test]
    fn test_file_part_rejects_bad_mime() {
        let attachment = Attachment {
            filename: "grid.png".to_string(),
            content_type: Some("not a mime".to_string()),
            bytes: vec![0],
        };
        assert!(matches!(
            file_part(attachment),
            Err(RelayError::WebhookRequest(_))
        ));
    }

    #[test]
    fn test_file_part_without_type() {
        let attachment = Attachment {
            filename: "grid.png".to_string(),
            content_type: None,
            bytes: vec![0],
        };
        assert!(file_part(attachment).is_ok());
    }

    #[test]
    fn test_webhook_debug_redacts_url() {
        let delivery = WebhookDelivery::new(SecretString::from(
            "https://discord.com/api/webhooks/1/secret-token",
        ));
        assert!(!format!("{delivery:?}").contains("secret-token"));
    }
}
