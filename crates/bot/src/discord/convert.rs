//! Conversions between serenity's models and the bot's own Discord types.
//!
//! Serenity ids are non-zero integers while ours are strings, so going the
//! other way (ours into serenity's) can fail.

use std::num::NonZeroU64;

use nonogram_relay_core::RoleId;
use serenity::model::channel::{
    Channel as SerenityChannel, Embed as SerenityEmbed, Message as SerenityMessage, Reaction,
    ReactionType,
};
use serenity::model::guild::{Member, PartialGuild};
use serenity::model::user::User as SerenityUser;

use super::error::DiscordError;
use super::types::{Channel, Embed, EmbedField, Guild, GuildMember, Message, ReactionAdd, Role, User};

/// Parse a string snowflake into a serenity id.
pub fn snowflake<T: From<NonZeroU64>>(id: &str) -> Result<T, DiscordError> {
    id.parse::<NonZeroU64>()
        .map(T::from)
        .map_err(|_| DiscordError::Request(format!("invalid snowflake {id:?}")))
}

/// Text of a reaction emoji: the character itself, or a custom emoji's name.
pub fn emoji_text(emoji: &ReactionType) -> String {
    match emoji {
        ReactionType::Unicode(emoji) => emoji.clone(),
        ReactionType::Custom { name, .. } => name.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

impl From<&SerenityUser> for User {
    fn from(user: &SerenityUser) -> Self {
        Self {
            id: user.id.get().into(),
            username: user.name.clone(),
            discriminator: user
                .discriminator
                .map_or_else(|| "0".to_string(), |d| format!("{:04}", d.get())),
            bot: user.bot,
        }
    }
}

impl From<&SerenityEmbed> for Embed {
    fn from(embed: &SerenityEmbed) -> Self {
        Self {
            title: embed.title.clone(),
            description: embed.description.clone(),
            fields: embed
                .fields
                .iter()
                .map(|field| EmbedField {
                    name: field.name.clone(),
                    value: field.value.clone(),
                    inline: field.inline,
                })
                .collect(),
        }
    }
}

impl From<&SerenityMessage> for Message {
    fn from(msg: &SerenityMessage) -> Self {
        Self {
            id: msg.id.get().into(),
            channel_id: msg.channel_id.get().into(),
            guild_id: msg.guild_id.map(|id| id.get().into()),
            author: User::from(&msg.author),
            webhook_id: msg.webhook_id.map(|id| id.get().into()),
            content: msg.content.clone(),
            embeds: msg.embeds.iter().map(Embed::from).collect(),
        }
    }
}

impl From<SerenityChannel> for Channel {
    fn from(channel: SerenityChannel) -> Self {
        let id = channel.id().get().into();
        Self {
            id,
            name: channel.guild().map(|guild_channel| guild_channel.name),
        }
    }
}

impl From<&Member> for GuildMember {
    fn from(member: &Member) -> Self {
        Self {
            user: User::from(&member.user),
            roles: member
                .roles
                .iter()
                .map(|role| RoleId::from(role.get()))
                .collect(),
        }
    }
}

impl From<&PartialGuild> for Guild {
    fn from(guild: &PartialGuild) -> Self {
        Self {
            id: guild.id.get().into(),
            owner_id: guild.owner_id.get().into(),
            roles: guild
                .roles
                .values()
                .map(|role| Role {
                    id: role.id.get().into(),
                    name: role.name.clone(),
                    permissions: role.permissions.bits().to_string(),
                })
                .collect(),
        }
    }
}

impl TryFrom<&Reaction> for ReactionAdd {
    type Error = &'static str;

    fn try_from(reaction: &Reaction) -> Result<Self, Self::Error> {
        let user_id = reaction.user_id.ok_or("reaction without user")?;

        Ok(Self {
            channel_id: reaction.channel_id.get().into(),
            message_id: reaction.message_id.get().into(),
            guild_id: reaction.guild_id.map(|id| id.get().into()),
            user_id: user_id.get().into(),
            user_is_bot: reaction
                .member
                .as_ref()
                .is_some_and(|member| member.user.bot),
            emoji: emoji_text(&reaction.emoji),
        })
    }
}
