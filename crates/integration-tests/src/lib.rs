//! Integration tests for Nonogram Relay.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nonogram-relay-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `review_flow` - Gateway events through the worker queue into the store
//! - `relay_endpoint` - `POST /send-message` through the router and delivery
//!
//! Everything runs against the in-memory collaborators from the bot's
//! `testing` module, so no Discord account or database is needed.

use std::sync::Arc;

use nonogram_relay_bot::discord::{ChatEvent, Message};
use nonogram_relay_bot::services::{ReviewWorkflow, run_event_loop};
use nonogram_relay_bot::testing::{FakeChat, MemoryRepository, message, reviewer, user};
use nonogram_relay_core::{ChannelId, GuildId, UserId};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

/// Review channel used throughout the tests.
pub const CHANNEL_ID: &str = "1236906035932041286";

/// Guild the review channel belongs to.
pub const GUILD_ID: &str = "777";

/// The bot's own user id.
pub const BOT_ID: &str = "100";

/// An admin (by role name) and a plain member.
pub const ADMIN_ID: &str = "1";
pub const MEMBER_ID: &str = "2";

/// A running review worker with in-memory collaborators.
pub struct ReviewHarness {
    pub chat: Arc<FakeChat>,
    pub repository: Arc<MemoryRepository>,
    events: UnboundedSender<ChatEvent>,
    worker: JoinHandle<()>,
}

impl ReviewHarness {
    /// Start a worker draining a fresh event queue.
    #[must_use]
    pub fn start() -> Self {
        let chat = Arc::new(
            FakeChat::new(user(BOT_ID, "relay", true))
                .with_channel(channel())
                .with_member(guild(), reviewer(ADMIN_ID, "alice", &["admin"]))
                .with_member(guild(), reviewer(MEMBER_ID, "mallory", &["Member"])),
        );
        let repository = Arc::new(MemoryRepository::new());
        let workflow = Arc::new(ReviewWorkflow::new(
            chat.clone(),
            repository.clone(),
            channel(),
            UserId::from(BOT_ID),
        ));

        let (events, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_event_loop(workflow, rx));

        Self {
            chat,
            repository,
            events,
            worker,
        }
    }

    /// Queue a gateway event.
    ///
    /// # Panics
    ///
    /// Panics if the worker has stopped.
    pub fn send(&self, event: ChatEvent) {
        self.events.send(event).expect("worker running");
    }

    /// Post `message` as a gateway `MESSAGE_CREATE` and make it fetchable.
    pub fn post(&self, message: Message) {
        self.chat.store_message(message.clone());
        self.send(ChatEvent::MessageCreated(message));
    }

    /// Close the queue and wait until every queued event was handled.
    ///
    /// # Panics
    ///
    /// Panics if the worker panicked.
    pub async fn drain(self) -> (Arc<FakeChat>, Arc<MemoryRepository>) {
        drop(self.events);
        self.worker.await.expect("worker finished");
        (self.chat, self.repository)
    }
}

/// The review channel.
#[must_use]
pub fn channel() -> ChannelId {
    ChannelId::from(CHANNEL_ID)
}

/// The review guild.
#[must_use]
pub fn guild() -> GuildId {
    GuildId::from(GUILD_ID)
}

/// A submission posted by another bot account.
#[must_use]
pub fn bot_submission(id: &str, content: &str) -> Message {
    message(id, &channel(), user("200", "submitter", true), content)
}
