//! In-memory collaborators for tests.
//!
//! Enabled for this crate's unit tests and, through the `testing` feature,
//! for the integration test crate.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use nonogram_relay_core::{
    ApprovedNonogram, ChannelId, GuildId, MemberPermissions, MessageId, NewApprovedNonogram,
    NonogramFields, NonogramStatus, PendingNonogram, PuzzleId, UserId,
};

use crate::db::{NonogramRepository, RepositoryError};
use crate::discord::{
    Channel, ChatPlatform, DiscordError, Embed, EmbedField, Message, OutgoingMessage, Reviewer,
    User,
};
use crate::services::relay::{RelayDelivery, RelayError};

/// Build a user.
#[must_use]
pub fn user(id: &str, username: &str, bot: bool) -> User {
    User {
        id: UserId::from(id),
        username: username.to_string(),
        discriminator: "0".to_string(),
        bot,
    }
}

/// A reviewer with the given role names and no permission bits.
#[must_use]
pub fn reviewer(id: &str, username: &str, roles: &[&str]) -> Reviewer {
    Reviewer {
        user: user(id, username, false),
        permissions: MemberPermissions::from_roles(roles.iter().map(|name| (*name, 0)), false),
    }
}

/// A message posted by `author` into `channel_id`.
#[must_use]
pub fn message(id: &str, channel_id: &ChannelId, author: User, content: &str) -> Message {
    Message {
        id: MessageId::from(id),
        channel_id: channel_id.clone(),
        guild_id: None,
        author,
        webhook_id: None,
        content: content.to_string(),
        embeds: Vec::new(),
    }
}

/// An embed with a single `ID` field.
#[must_use]
pub fn id_embed(puzzle_id: &str) -> Embed {
    Embed {
        title: Some("New Nonogram".to_string()),
        description: None,
        fields: vec![EmbedField {
            name: "ID".to_string(),
            value: puzzle_id.to_string(),
            inline: true,
        }],
    }
}

/// A pending record with a title and some opaque fields.
#[must_use]
pub fn pending(id: &str, title: &str, status: NonogramStatus) -> PendingNonogram {
    let fields = NonogramFields::from_document(serde_json::json!({
        "title": title,
        "imageUrl": "https://img.example/grid.png",
        "width": 10,
        "height": 10,
    }))
    .expect("valid document");

    PendingNonogram {
        id: PuzzleId::from(id),
        status,
        fields,
    }
}

/// Scripted [`ChatPlatform`] that records every call.
pub struct FakeChat {
    me: User,
    channels: HashSet<ChannelId>,
    members: HashMap<(GuildId, UserId), Reviewer>,
    messages: Mutex<HashMap<MessageId, Message>>,
    reactions: Mutex<HashMap<MessageId, Vec<String>>>,
    sent: Mutex<Vec<(ChannelId, OutgoingMessage)>>,
    fail_reactions: AtomicBool,
    next_id: AtomicU64,
}

impl FakeChat {
    /// A platform where the bot is logged in as `me`.
    #[must_use]
    pub fn new(me: User) -> Self {
        Self {
            me,
            channels: HashSet::new(),
            members: HashMap::new(),
            messages: Mutex::new(HashMap::new()),
            reactions: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            fail_reactions: AtomicBool::new(false),
            next_id: AtomicU64::new(9_000),
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel_id: ChannelId) -> Self {
        self.channels.insert(channel_id);
        self
    }

    #[must_use]
    pub fn with_member(mut self, guild_id: GuildId, reviewer: Reviewer) -> Self {
        self.members
            .insert((guild_id, reviewer.user.id.clone()), reviewer);
        self
    }

    /// Make a message fetchable.
    pub fn store_message(&self, message: Message) {
        self.messages
            .lock()
            .expect("messages lock")
            .insert(message.id.clone(), message);
    }

    /// Make every `add_reaction` call fail.
    pub fn fail_reactions(&self) {
        self.fail_reactions.store(true, Ordering::SeqCst);
    }

    /// Reactions currently on a message, in the order they were added.
    #[must_use]
    pub fn reactions(&self, message_id: &MessageId) -> Vec<String> {
        self.reactions
            .lock()
            .expect("reactions lock")
            .get(message_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Everything sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<(ChannelId, OutgoingMessage)> {
        self.sent.lock().expect("sent lock").clone()
    }

    /// Text of everything sent so far.
    #[must_use]
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|(_, message)| message.content)
            .collect()
    }
}

#[async_trait]
impl ChatPlatform for FakeChat {
    async fn current_user(&self) -> Result<User, DiscordError> {
        Ok(self.me.clone())
    }

    async fn fetch_channel(&self, channel_id: &ChannelId) -> Result<Option<Channel>, DiscordError> {
        Ok(self.channels.contains(channel_id).then(|| Channel {
            id: channel_id.clone(),
            name: None,
        }))
    }

    async fn send_message(
        &self,
        channel_id: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<Message, DiscordError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let posted = Message {
            id: MessageId::from(id),
            channel_id: channel_id.clone(),
            guild_id: None,
            author: self.me.clone(),
            webhook_id: None,
            content: message.content.clone(),
            embeds: Vec::new(),
        };

        self.sent
            .lock()
            .expect("sent lock")
            .push((channel_id.clone(), message));

        Ok(posted)
    }

    async fn add_reaction(
        &self,
        _channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), DiscordError> {
        if self.fail_reactions.load(Ordering::SeqCst) {
            return Err(DiscordError::Api {
                status: 403,
                message: "Missing Permissions".to_string(),
            });
        }

        self.reactions
            .lock()
            .expect("reactions lock")
            .entry(message_id.clone())
            .or_default()
            .push(emoji.to_string());
        Ok(())
    }

    async fn clear_reactions(
        &self,
        _channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<(), DiscordError> {
        self.reactions
            .lock()
            .expect("reactions lock")
            .remove(message_id);
        Ok(())
    }

    async fn fetch_message(
        &self,
        _channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<Message, DiscordError> {
        self.messages
            .lock()
            .expect("messages lock")
            .get(message_id)
            .cloned()
            .ok_or_else(|| DiscordError::NotFound("message".to_string()))
    }

    async fn fetch_member(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Reviewer, DiscordError> {
        self.members
            .get(&(guild_id.clone(), user_id.clone()))
            .cloned()
            .ok_or_else(|| DiscordError::NotFound("member".to_string()))
    }
}

/// [`NonogramRepository`] over two hash maps, with the same guarded writes
/// as the Postgres one.
#[derive(Default)]
pub struct MemoryRepository {
    pending: Mutex<HashMap<PuzzleId, PendingNonogram>>,
    approved: Mutex<HashMap<PuzzleId, ApprovedNonogram>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pending record.
    pub fn insert_pending(&self, record: PendingNonogram) {
        self.pending
            .lock()
            .expect("pending lock")
            .insert(record.id.clone(), record);
    }

    /// Status of a pending record.
    #[must_use]
    pub fn status(&self, id: &str) -> Option<NonogramStatus> {
        self.pending
            .lock()
            .expect("pending lock")
            .get(&PuzzleId::from(id))
            .map(|record| record.status)
    }

    /// The approved copy of a puzzle.
    #[must_use]
    pub fn approved(&self, id: &str) -> Option<ApprovedNonogram> {
        self.approved
            .lock()
            .expect("approved lock")
            .get(&PuzzleId::from(id))
            .cloned()
    }

    /// Number of successful writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every call fail as if the database were down.
    pub fn go_offline(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn transition(&self, id: &PuzzleId, status: NonogramStatus) -> Result<(), RepositoryError> {
        let mut pending = self.pending.lock().expect("pending lock");
        let record = pending.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if record.status != NonogramStatus::Pending {
            return Err(RepositoryError::NotPending(record.status));
        }
        record.status = status;
        Ok(())
    }
}

#[async_trait]
impl NonogramRepository for MemoryRepository {
    async fn get_pending(&self, id: &PuzzleId) -> Result<Option<PendingNonogram>, RepositoryError> {
        self.check_online()?;
        Ok(self.pending.lock().expect("pending lock").get(id).cloned())
    }

    async fn get_approved(
        &self,
        id: &PuzzleId,
    ) -> Result<Option<ApprovedNonogram>, RepositoryError> {
        self.check_online()?;
        Ok(self.approved.lock().expect("approved lock").get(id).cloned())
    }

    async fn approve(
        &self,
        approved: NewApprovedNonogram,
    ) -> Result<ApprovedNonogram, RepositoryError> {
        self.check_online()?;
        self.transition(&approved.id, NonogramStatus::Approved)?;

        let stored = ApprovedNonogram {
            id: approved.id,
            fields: approved.fields,
            approved_at: Utc::now(),
        };
        self.approved
            .lock()
            .expect("approved lock")
            .insert(stored.id.clone(), stored.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(stored)
    }

    async fn reject(&self, id: &PuzzleId) -> Result<(), RepositoryError> {
        self.check_online()?;
        self.transition(id, NonogramStatus::Rejected)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_online()
    }
}

/// [`RelayDelivery`] that keeps what it was asked to deliver.
#[derive(Default)]
pub struct RecordingDelivery {
    delivered: Mutex<Vec<OutgoingMessage>>,
}

impl RecordingDelivery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far.
    #[must_use]
    pub fn delivered(&self) -> Vec<OutgoingMessage> {
        self.delivered.lock().expect("delivered lock").clone()
    }
}

#[async_trait]
impl RelayDelivery for RecordingDelivery {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, message: OutgoingMessage) -> Result<(), RelayError> {
        self.delivered
            .lock()
            .expect("delivered lock")
            .push(message);
        Ok(())
    }
}
