//! Discord-related errors.

use thiserror::Error;

/// Errors that can occur when interacting with Discord.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// HTTP request failed before a response arrived.
    #[error("Discord request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Discord response error: {0}")]
    Response(String),

    /// Discord answered with a non-success status.
    #[error("Discord API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The channel, message, guild or member does not exist (or is hidden).
    #[error("Discord resource not found: {0}")]
    NotFound(String),

    /// Gateway session could not be started.
    #[error("Discord gateway error: {0}")]
    Gateway(String),
}
