//! Review event worker.
//!
//! Gateway events are queued on an unbounded channel and handled one at a
//! time, so reactions on a message are processed in arrival order.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use super::review::{ReviewOutcome, ReviewWorkflow};
use crate::discord::ChatEvent;

/// Drain `events` until every sender is dropped.
pub async fn run_event_loop(workflow: Arc<ReviewWorkflow>, mut events: UnboundedReceiver<ChatEvent>) {
    info!("Review worker started");

    while let Some(event) = events.recv().await {
        let outcome = workflow.handle(&event).await;
        if !matches!(outcome, ReviewOutcome::Ignored(_)) {
            debug!(?outcome, "Review event handled");
        }
    }

    info!("Review worker stopped");
}

#[cfg(test)]
mod tests {
    use nonogram_relay_core::{ChannelId, UserId};
    use tokio::sync::mpsc;

    use super::*;
    use crate::testing::{FakeChat, MemoryRepository, id_embed, message, user};

    #[tokio::test]
    async fn test_worker_handles_queued_events_in_order() {
        let channel = ChannelId::from("1");
        let chat = Arc::new(FakeChat::new(user("100", "relay", true)));
        let workflow = Arc::new(ReviewWorkflow::new(
            chat.clone(),
            Arc::new(MemoryRepository::new()),
            channel.clone(),
            UserId::from("100"),
        ));

        let (tx, rx) = mpsc::unbounded_channel();
        for id in ["10", "11"] {
            let mut msg = message(id, &channel, user("200", "submitter", true), "");
            msg.embeds.push(id_embed("puzzle_1"));
            tx.send(ChatEvent::MessageCreated(msg)).expect("queue open");
        }
        drop(tx);

        run_event_loop(workflow, rx).await;

        assert_eq!(chat.reactions(&"10".into()), vec!["✅", "❌"]);
        assert_eq!(chat.reactions(&"11".into()), vec!["✅", "❌"]);
    }
}
