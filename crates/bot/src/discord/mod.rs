//! Discord integration for the review flow and the relay.
//!
//! This module provides:
//! - [`DiscordClient`] for the REST calls the bot makes, over serenity's
//!   rate-limited HTTP client
//! - [`ChatPlatform`], the seam the workflow and relay are written against
//! - [`Gateway`] for receiving message and reaction events
//! - Notice builders for review outcomes
//!
//! # Flow
//!
//! 1. A submission lands in the review channel and gets ✅ and ❌ markers
//! 2. An admin reacts with one of them
//! 3. The pending record is approved or rejected in the store
//! 4. A notice is posted and the markers are cleared

mod client;
mod convert;
mod error;
pub mod gateway;
pub mod messages;
mod platform;
mod types;

pub use client::DiscordClient;
pub use error::DiscordError;
pub use gateway::Gateway;
pub use platform::ChatPlatform;
pub use types::{
    Attachment, Channel, ChatEvent, Embed, EmbedField, Guild, GuildMember, Message,
    OutgoingMessage, ReactionAdd, Reviewer, Role, User,
};
