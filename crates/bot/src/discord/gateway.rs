//! Discord gateway session.
//!
//! Serenity keeps the websocket alive and delivers events to
//! [`GatewayHandler`], which converts them into [`ChatEvent`]s and queues them
//! for the review worker. Nothing is processed on the gateway task itself.
//!
//! [`Gateway::start`] only returns once Discord has sent `READY`, and
//! [`Gateway::stopped`] resolves if the session later dies, so a rejected
//! token or a missing privileged intent stops the process instead of leaving
//! the relay running without reviews.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serenity::async_trait;
use serenity::gateway::ShardManager;
use serenity::model::channel::{Message as GatewayMessage, Reaction};
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler, GatewayIntents};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use super::error::DiscordError;
use super::types::{ChatEvent, Message, ReactionAdd};

/// How long to wait for `READY` after connecting.
const READY_TIMEOUT: Duration = Duration::from_secs(60);

type SessionTask = JoinHandle<Result<(), DiscordError>>;

/// Intents the review flow needs. `MESSAGE_CONTENT` is privileged and must
/// be enabled for the application.
#[must_use]
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT
}

/// Forwards gateway events onto the review queue.
pub struct GatewayHandler {
    events: UnboundedSender<ChatEvent>,
    ready: Mutex<Option<oneshot::Sender<()>>>,
}

impl GatewayHandler {
    #[must_use]
    pub const fn new(events: UnboundedSender<ChatEvent>, ready: oneshot::Sender<()>) -> Self {
        Self {
            events,
            ready: Mutex::new(Some(ready)),
        }
    }

    fn forward(&self, event: ChatEvent) {
        if self.events.send(event).is_err() {
            warn!("Review queue closed, dropping gateway event");
        }
    }

    /// Signal the first `READY`. Later ones (after reconnects) are no-ops.
    fn mark_ready(&self) {
        let sender = self.ready.lock().ok().and_then(|mut slot| slot.take());
        if let Some(sender) = sender {
            if sender.send(()).is_err() {
                debug!("Nobody waiting for gateway READY");
            }
        }
    }
}

#[async_trait]
impl EventHandler for GatewayHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "Discord gateway ready");
        self.mark_ready();
    }

    async fn message(&self, _ctx: Context, msg: GatewayMessage) {
        self.forward(ChatEvent::MessageCreated(Message::from(&msg)));
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        match ReactionAdd::try_from(&reaction) {
            Ok(event) => self.forward(ChatEvent::ReactionAdded(event)),
            Err(reason) => warn!(reason, "Dropping reaction event"),
        }
    }
}

/// A running gateway session.
pub struct Gateway {
    shard_manager: Arc<ShardManager>,
    task: SessionTask,
}

impl Gateway {
    /// Connect to the gateway and start delivering events to `events`.
    ///
    /// # Errors
    ///
    /// Returns error if the client cannot be built, or if the session ends
    /// or stays silent before Discord sends `READY`.
    pub async fn start(
        token: &SecretString,
        events: UnboundedSender<ChatEvent>,
    ) -> Result<Self, DiscordError> {
        let (ready_tx, ready_rx) = oneshot::channel();

        let mut client = serenity::Client::builder(token.expose_secret(), intents())
            .event_handler(GatewayHandler::new(events, ready_tx))
            .await
            .map_err(|e| DiscordError::Gateway(e.to_string()))?;

        let shard_manager = Arc::clone(&client.shard_manager);
        let mut task = tokio::spawn(async move {
            client
                .start()
                .await
                .map_err(|e| DiscordError::Gateway(e.to_string()))
        });

        if let Err(e) = await_ready(ready_rx, &mut task, READY_TIMEOUT).await {
            shard_manager.shutdown_all().await;
            task.abort();
            return Err(e);
        }

        Ok(Self {
            shard_manager,
            task,
        })
    }

    /// Resolves when the session ends on its own, with the reason.
    ///
    /// Do not call [`Gateway::shutdown`] after this has resolved.
    pub async fn stopped(&mut self) -> DiscordError {
        session_end((&mut self.task).await)
    }

    /// Close every shard and wait for the session task to finish.
    pub async fn shutdown(self) {
        self.shard_manager.shutdown_all().await;
        match self.task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Gateway closed with error"),
            Err(e) => error!(error = %e, "Gateway task panicked"),
        }
        info!("Discord gateway closed");
    }
}

/// Wait for `READY`, failing if the session task finishes first.
async fn await_ready(
    ready: oneshot::Receiver<()>,
    task: &mut SessionTask,
    timeout: Duration,
) -> Result<(), DiscordError> {
    let waited = tokio::time::timeout(timeout, async {
        tokio::select! {
            biased;
            joined = &mut *task => Err(session_end(joined)),
            received = ready => received
                .map_err(|_| DiscordError::Gateway("gateway closed before READY".to_string())),
        }
    })
    .await;

    waited.unwrap_or_else(|_| {
        Err(DiscordError::Gateway(format!(
            "no READY within {}s",
            timeout.as_secs()
        )))
    })
}

/// Why a session task finished.
fn session_end(joined: Result<Result<(), DiscordError>, JoinError>) -> DiscordError {
    match joined {
        Ok(Ok(())) => DiscordError::Gateway("session ended".to_string()),
        Ok(Err(e)) => e,
        Err(e) => DiscordError::Gateway(format!("gateway task failed: {e}")),
    }
}
