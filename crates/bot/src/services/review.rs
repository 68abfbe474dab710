//! Reaction-driven review of Nonogram submissions.
//!
//! This service runs the review flow in the channel:
//! 1. A bot or webhook posts a submission carrying a puzzle id
//! 2. The bot attaches ✅ and ❌ markers
//! 3. An admin reacts with one of them
//! 4. The pending record is approved or rejected, a notice is posted and the
//!    markers are cleared
//!
//! Every handled event yields a [`ReviewOutcome`].

use std::sync::Arc;

use nonogram_relay_core::review::{self, ReviewDecision, ReviewError};
use nonogram_relay_core::{
    ChannelId, NonogramStatus, PuzzleId, UserId, extract_puzzle_id, has_identifier_signal,
};
use tracing::{debug, error, info, instrument, warn};

use crate::db::{NonogramRepository, RepositoryError};
use crate::discord::messages::{
    build_already_processed_message, build_decision_message, build_denied_message,
    build_error_message, build_missing_id_message, build_not_found_message,
};
use crate::discord::{ChatEvent, ChatPlatform, Message, ReactionAdd};

/// Why an event was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Posted or reacted outside the review channel.
    WrongChannel,
    /// Message author is a human.
    HumanAuthor,
    /// Message carries no puzzle id.
    NoIdentifier,
    /// Reaction came from the bot itself or another bot.
    BotReactor,
    /// Emoji is not one of the markers.
    UnknownEmoji,
    /// Reaction outside a guild, so there are no roles to check.
    NotInGuild,
}

/// What handling an event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Ignored(IgnoreReason),
    /// Markers attached to a new submission.
    Marked,
    /// A marker could not be attached.
    MarkFailed,
    /// Reactor lacks review rights.
    Denied,
    /// Reacted message has no extractable id.
    MissingIdentifier,
    /// No pending record for the id.
    NotFound(PuzzleId),
    /// Record already left the pending state.
    AlreadyProcessed(PuzzleId, NonogramStatus),
    Approved(PuzzleId),
    Rejected(PuzzleId),
    /// A Discord or store call failed.
    Failed,
}

/// Runs the review flow for one channel.
pub struct ReviewWorkflow {
    chat: Arc<dyn ChatPlatform>,
    repository: Arc<dyn NonogramRepository>,
    channel_id: ChannelId,
    bot_user_id: UserId,
}

impl ReviewWorkflow {
    /// Create a workflow for `channel_id`, acting as `bot_user_id`.
    #[must_use]
    pub fn new(
        chat: Arc<dyn ChatPlatform>,
        repository: Arc<dyn NonogramRepository>,
        channel_id: ChannelId,
        bot_user_id: UserId,
    ) -> Self {
        Self {
            chat,
            repository,
            channel_id,
            bot_user_id,
        }
    }

    /// Dispatch a gateway event.
    pub async fn handle(&self, event: &ChatEvent) -> ReviewOutcome {
        match event {
            ChatEvent::MessageCreated(message) => self.on_message(message).await,
            ChatEvent::ReactionAdded(reaction) => self.on_reaction(reaction).await,
        }
    }

    /// Attach the markers to a new submission.
    #[instrument(skip(self, message), fields(message = %message.id))]
    pub async fn on_message(&self, message: &Message) -> ReviewOutcome {
        if message.channel_id != self.channel_id {
            return ReviewOutcome::Ignored(IgnoreReason::WrongChannel);
        }

        if !message.is_automated() {
            return ReviewOutcome::Ignored(IgnoreReason::HumanAuthor);
        }

        if !has_identifier_signal(&message.content, &message.embeds) {
            debug!("Message has no Nonogram ID, skipping");
            return ReviewOutcome::Ignored(IgnoreReason::NoIdentifier);
        }

        for decision in ReviewDecision::ALL {
            if let Err(e) = self
                .chat
                .add_reaction(&message.channel_id, &message.id, decision.emoji())
                .await
            {
                error!(error = %e, emoji = decision.emoji(), "Failed to add review marker");
                return ReviewOutcome::MarkFailed;
            }
        }

        info!("Submission marked for review");
        ReviewOutcome::Marked
    }

    /// Apply an admin's ✅ or ❌.
    #[instrument(skip(self, reaction), fields(message = %reaction.message_id, user = %reaction.user_id))]
    pub async fn on_reaction(&self, reaction: &ReactionAdd) -> ReviewOutcome {
        if reaction.user_is_bot || reaction.user_id == self.bot_user_id {
            return ReviewOutcome::Ignored(IgnoreReason::BotReactor);
        }

        if reaction.channel_id != self.channel_id {
            return ReviewOutcome::Ignored(IgnoreReason::WrongChannel);
        }

        let Some(decision) = ReviewDecision::from_emoji(&reaction.emoji) else {
            return ReviewOutcome::Ignored(IgnoreReason::UnknownEmoji);
        };

        let Some(guild_id) = &reaction.guild_id else {
            return ReviewOutcome::Ignored(IgnoreReason::NotInGuild);
        };

        let reviewer = match self.chat.fetch_member(guild_id, &reaction.user_id).await {
            Ok(reviewer) => reviewer,
            Err(e) => {
                error!(error = %e, "Failed to fetch reacting member");
                return ReviewOutcome::Failed;
            }
        };

        let tag = reviewer.user.tag();
        if !reviewer.permissions.is_authorized() {
            warn!(user = %tag, "Unauthorized review attempt");
            self.notify(&build_denied_message(&tag)).await;
            return ReviewOutcome::Denied;
        }

        let message = match self
            .chat
            .fetch_message(&reaction.channel_id, &reaction.message_id)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "Failed to fetch reacted message");
                return ReviewOutcome::Failed;
            }
        };

        let Some(puzzle_id) = extract_puzzle_id(&message.content, &message.embeds) else {
            self.notify(build_missing_id_message()).await;
            return ReviewOutcome::MissingIdentifier;
        };

        let outcome = self.decide(&puzzle_id, decision, &tag).await;

        if matches!(
            outcome,
            ReviewOutcome::Approved(_) | ReviewOutcome::Rejected(_)
        ) {
            if let Err(e) = self
                .chat
                .clear_reactions(&message.channel_id, &message.id)
                .await
            {
                error!(error = %e, "Failed to clear review markers");
            }
        }

        outcome
    }

    /// Load the record, run the state machine and persist the result.
    async fn decide(
        &self,
        puzzle_id: &PuzzleId,
        decision: ReviewDecision,
        tag: &str,
    ) -> ReviewOutcome {
        let record = match self.repository.get_pending(puzzle_id).await {
            Ok(record) => record,
            Err(e) => return self.store_failure(puzzle_id, &e).await,
        };

        let transition = match review::apply(record.as_ref(), decision) {
            Ok(transition) => transition,
            Err(ReviewError::NotFound) => return self.not_found(puzzle_id).await,
            Err(ReviewError::AlreadyProcessed(status)) => {
                return self.already_processed(puzzle_id, status).await;
            }
        };

        let written = match transition.approved {
            Some(approved) => self.repository.approve(approved).await.map(|_| ()),
            None => self.repository.reject(puzzle_id).await,
        };

        match written {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return self.not_found(puzzle_id).await,
            Err(RepositoryError::NotPending(status)) => {
                return self.already_processed(puzzle_id, status).await;
            }
            Err(e) => return self.store_failure(puzzle_id, &e).await,
        }

        let title = record
            .as_ref()
            .map_or_else(|| puzzle_id.as_str(), |record| record.display_title());
        info!(puzzle_id = %puzzle_id, status = %transition.status, reviewer = %tag, "Nonogram reviewed");
        self.notify(&build_decision_message(decision, title, tag))
            .await;

        match decision {
            ReviewDecision::Approve => ReviewOutcome::Approved(puzzle_id.clone()),
            ReviewDecision::Reject => ReviewOutcome::Rejected(puzzle_id.clone()),
        }
    }

    async fn not_found(&self, puzzle_id: &PuzzleId) -> ReviewOutcome {
        info!(puzzle_id = %puzzle_id, "No pending Nonogram for reaction");
        self.notify(build_not_found_message()).await;
        ReviewOutcome::NotFound(puzzle_id.clone())
    }

    async fn already_processed(
        &self,
        puzzle_id: &PuzzleId,
        status: NonogramStatus,
    ) -> ReviewOutcome {
        info!(puzzle_id = %puzzle_id, status = %status, "Nonogram already processed");
        self.notify(build_already_processed_message()).await;
        ReviewOutcome::AlreadyProcessed(puzzle_id.clone(), status)
    }

    async fn store_failure(&self, puzzle_id: &PuzzleId, e: &RepositoryError) -> ReviewOutcome {
        error!(puzzle_id = %puzzle_id, error = %e, "Store failure during review");
        self.notify(build_error_message()).await;
        ReviewOutcome::Failed
    }

    /// Post a notice to the review channel. Failures are only logged.
    async fn notify(&self, text: &str) {
        if let Err(e) = self.chat.post_text(&self.channel_id, text).await {
            error!(error = %e, "Failed to post review notice");
        }
    }
}
