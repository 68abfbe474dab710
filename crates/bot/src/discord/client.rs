//! Discord REST API client.
//!
//! Covers the handful of endpoints the bot needs: channel lookup, posting
//! (with optional file upload), reactions, message fetch and member lookup.
//! Requests go through serenity's [`Http`], which queues calls per
//! rate-limit bucket, so back-to-back reactions on one message wait their
//! turn instead of failing with 429.

use std::sync::Arc;

use async_trait::async_trait;
use nonogram_relay_core::{ChannelId, GuildId, MessageId, UserId};
use secrecy::{ExposeSecret, SecretString};
use serenity::builder::CreateAttachment;
use serenity::http::{Http, HttpError};
use serenity::model::channel::ReactionType;
use tracing::{debug, instrument, warn};

use super::convert::snowflake;
use super::error::DiscordError;
use super::platform::ChatPlatform;
use super::types::{Channel, Guild, GuildMember, Message, OutgoingMessage, Reviewer, User};

/// Discord REST client authenticated with a bot token.
#[derive(Clone)]
pub struct DiscordClient {
    http: Arc<Http>,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("bot_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    /// Create a new Discord client.
    #[must_use]
    pub fn new(bot_token: &SecretString) -> Self {
        Self {
            http: Arc::new(Http::new(bot_token.expose_secret())),
        }
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<User, DiscordError> {
        let me = self
            .http
            .get_current_user()
            .await
            .map_err(|e| map_error(e, "current user"))?;

        Ok(User::from(&*me))
    }

    #[instrument(skip(self), fields(channel = %channel_id))]
    async fn fetch_channel(&self, channel_id: &ChannelId) -> Result<Option<Channel>, DiscordError> {
        match self
            .http
            .get_channel(snowflake(channel_id.as_str())?)
            .await
            .map_err(|e| map_error(e, "channel"))
        {
            Ok(channel) => Ok(Some(Channel::from(channel))),
            Err(DiscordError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, message), fields(channel = %channel_id, has_file = message.attachment.is_some()))]
    async fn send_message(
        &self,
        channel_id: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<Message, DiscordError> {
        let payload = message.payload_json();
        let files = message
            .attachment
            .map(|attachment| CreateAttachment::bytes(attachment.bytes, attachment.filename))
            .into_iter()
            .collect();

        let posted = self
            .http
            .send_message(snowflake(channel_id.as_str())?, files, &payload)
            .await
            .map_err(|e| map_error(e, "channel"))?;

        debug!(message = %posted.id, "Message posted to Discord");

        Ok(Message::from(&posted))
    }

    #[instrument(skip(self), fields(channel = %channel_id, message = %message_id))]
    async fn add_reaction(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), DiscordError> {
        self.http
            .create_reaction(
                snowflake(channel_id.as_str())?,
                snowflake(message_id.as_str())?,
                &ReactionType::Unicode(emoji.to_string()),
            )
            .await
            .map_err(|e| map_error(e, "message"))
    }

    #[instrument(skip(self), fields(channel = %channel_id, message = %message_id))]
    async fn clear_reactions(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<(), DiscordError> {
        self.http
            .delete_message_reactions(
                snowflake(channel_id.as_str())?,
                snowflake(message_id.as_str())?,
            )
            .await
            .map_err(|e| map_error(e, "message"))?;

        debug!("Reactions cleared");

        Ok(())
    }

    #[instrument(skip(self), fields(channel = %channel_id, message = %message_id))]
    async fn fetch_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<Message, DiscordError> {
        let message = self
            .http
            .get_message(
                snowflake(channel_id.as_str())?,
                snowflake(message_id.as_str())?,
            )
            .await
            .map_err(|e| map_error(e, "message"))?;

        Ok(Message::from(&message))
    }

    #[instrument(skip(self), fields(guild = %guild_id, user = %user_id))]
    async fn fetch_member(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Reviewer, DiscordError> {
        let guild_snowflake = snowflake(guild_id.as_str())?;

        let member = self
            .http
            .get_member(guild_snowflake, snowflake(user_id.as_str())?)
            .await
            .map_err(|e| map_error(e, "member"))?;
        let guild = self
            .http
            .get_guild(guild_snowflake)
            .await
            .map_err(|e| map_error(e, "guild"))?;

        let member = GuildMember::from(&member);
        let permissions = Guild::from(&guild).member_permissions(&member);

        Ok(Reviewer {
            user: member.user,
            permissions,
        })
    }
}

/// Map serenity failures to [`DiscordError`].
fn map_error(error: serenity::Error, what: &str) -> DiscordError {
    match error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            let status = response.status_code.as_u16();
            if status == 404 {
                return DiscordError::NotFound(what.to_string());
            }

            warn!(status, message = %response.error.message, "Discord API error");
            DiscordError::Api {
                status,
                message: response.error.message,
            }
        }
        serenity::Error::Json(e) => DiscordError::Response(e.to_string()),
        other => DiscordError::Request(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let client = DiscordClient::new(&SecretString::from("super-secret-token"));
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_transport_errors_map_to_request() {
        let error = map_error(serenity::Error::Other("connection reset"), "message");
        assert!(matches!(error, DiscordError::Request(message) if message.contains("connection reset")));
    }

    #[test]
    fn test_decode_errors_map_to_response() {
        let json_error =
            serde_json::from_str::<serde_json::Value>("{").expect_err("truncated json");
        let error = map_error(serenity::Error::Json(json_error), "message");
        assert!(matches!(error, DiscordError::Response(_)));
    }

    #[tokio::test]
    async fn test_invalid_channel_id_fails_before_request() {
        let client = DiscordClient::new(&SecretString::from("token"));
        let result = client
            .add_reaction(&ChannelId::from("general"), &MessageId::from("1"), "✅")
            .await;
        assert!(matches!(result, Err(DiscordError::Request(_))));
    }
}
