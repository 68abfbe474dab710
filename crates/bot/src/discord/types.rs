//! Discord REST wire types.
//!
//! Only the subset of the Discord object model the review flow and the relay
//! need. Unknown fields are ignored on deserialization.
//!
//! See: <https://discord.com/developers/docs/resources/message>

use nonogram_relay_core::{
    ChannelId, EmbedView, GuildId, MemberPermissions, MessageId, RoleId, UserId, WebhookId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Discord user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Legacy four-digit discriminator, `"0"` for migrated accounts.
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Display tag used in notices: `name#1234`, or just `name` for accounts
    /// without a legacy discriminator.
    #[must_use]
    pub fn tag(&self) -> String {
        match self.discriminator.as_str() {
            "" | "0" => self.username.clone(),
            discriminator => format!("{}#{discriminator}", self.username),
        }
    }
}

/// A field inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Rich embed attached to a message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl EmbedView for Embed {
    fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|field| (field.name.as_str(), field.value.as_str()))
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A message as returned by `GET /channels/{id}/messages/{id}` or carried by
/// a gateway `MESSAGE_CREATE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    /// Only present on gateway events; REST responses omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    pub author: User,
    /// Set when the message was posted through a webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<WebhookId>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

impl Message {
    /// Whether the message came from a bot account or a webhook.
    #[must_use]
    pub const fn is_automated(&self) -> bool {
        self.author.bot || self.webhook_id.is_some()
    }
}

/// A channel. Only the id matters for existence checks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(default)]
    pub name: Option<String>,
}

/// A guild member (`GET /guilds/{id}/members/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuildMember {
    pub user: User,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

/// A guild role. Permissions arrive as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub permissions: String,
}

impl Role {
    /// Permission bits of this role. Unparseable values count as none.
    #[must_use]
    pub fn permission_bits(&self) -> u64 {
        self.permissions.parse().unwrap_or(0)
    }
}

/// A guild (`GET /guilds/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub owner_id: UserId,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Guild {
    /// Resolve what a member may do in this guild.
    ///
    /// The `@everyone` role shares the guild's id and applies to every member.
    #[must_use]
    pub fn member_permissions(&self, member: &GuildMember) -> MemberPermissions {
        let roles = self
            .roles
            .iter()
            .filter(|role| role.id.as_str() == self.id.as_str() || member.roles.contains(&role.id))
            .map(|role| (role.name.as_str(), role.permission_bits()));

        MemberPermissions::from_roles(roles, member.user.id == self.owner_id)
    }
}

/// The member who reacted, with resolved permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reviewer {
    pub user: User,
    pub permissions: MemberPermissions,
}

/// A file uploaded alongside a message.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A message to post, from the bot or through a webhook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutgoingMessage {
    pub content: String,
    /// Embeds are forwarded untouched, so they stay raw JSON.
    pub embeds: Vec<Value>,
    pub attachment: Option<Attachment>,
}

impl OutgoingMessage {
    /// A plain text message.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// The `payload_json` document sent with multipart uploads.
    #[must_use]
    pub fn payload_json(&self) -> Value {
        let mut payload = serde_json::json!({
            "content": self.content,
            "embeds": self.embeds,
        });
        if let Some(attachment) = &self.attachment {
            payload["attachments"] = serde_json::json!([
                { "id": 0, "filename": attachment.filename }
            ]);
        }
        payload
    }
}

/// A reaction added to a message (gateway `MESSAGE_REACTION_ADD`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionAdd {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub guild_id: Option<GuildId>,
    pub user_id: UserId,
    /// Whether the reacting account is a bot, when the gateway says so.
    pub user_is_bot: bool,
    /// Unicode emoji, or the name of a custom emoji.
    pub emoji: String,
}

/// Gateway events the review flow reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    MessageCreated(Message),
    ReactionAdded(ReactionAdd),
}
