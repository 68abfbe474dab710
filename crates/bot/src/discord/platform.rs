//! Chat platform seam used by the review workflow and bot delivery.

use async_trait::async_trait;
use nonogram_relay_core::{ChannelId, GuildId, MessageId, UserId};

use super::error::DiscordError;
use super::types::{Channel, Message, OutgoingMessage, Reviewer, User};

/// Operations the bot performs against the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// The account the bot is authenticated as.
    async fn current_user(&self) -> Result<User, DiscordError>;

    /// Look a channel up. `Ok(None)` when it does not exist or is hidden.
    async fn fetch_channel(&self, channel_id: &ChannelId) -> Result<Option<Channel>, DiscordError>;

    /// Post a message, uploading its attachment if it has one.
    async fn send_message(
        &self,
        channel_id: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<Message, DiscordError>;

    /// Add a reaction as the bot.
    async fn add_reaction(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), DiscordError>;

    /// Remove every reaction from a message.
    async fn clear_reactions(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<(), DiscordError>;

    /// Load the full current state of a message.
    async fn fetch_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<Message, DiscordError>;

    /// Load a guild member and resolve their roles and permissions.
    async fn fetch_member(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Reviewer, DiscordError>;

    /// Post a simple text message (convenience method).
    async fn post_text(&self, channel_id: &ChannelId, text: &str) -> Result<Message, DiscordError> {
        self.send_message(channel_id, OutgoingMessage::text(text))
            .await
    }
}
