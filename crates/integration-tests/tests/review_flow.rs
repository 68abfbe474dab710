//! End-to-end review flow: gateway events through the worker into the store.

use nonogram_relay_bot::discord::{ChatEvent, ReactionAdd};
use nonogram_relay_bot::testing::{id_embed, pending};
use nonogram_relay_core::{MessageId, NonogramStatus, UserId};
use nonogram_relay_integration_tests::{
    ADMIN_ID, BOT_ID, MEMBER_ID, ReviewHarness, bot_submission, channel, guild,
};

fn reaction(message_id: &str, user_id: &str, emoji: &str) -> ChatEvent {
    ChatEvent::ReactionAdded(ReactionAdd {
        channel_id: channel(),
        message_id: MessageId::from(message_id),
        guild_id: Some(guild()),
        user_id: UserId::from(user_id),
        user_is_bot: false,
        emoji: emoji.to_string(),
    })
}

#[tokio::test]
async fn test_admin_approval_end_to_end() {
    let harness = ReviewHarness::start();
    harness
        .repository
        .insert_pending(pending("puzzle_7", "Heart", NonogramStatus::Pending));

    let mut submission = bot_submission("10", "");
    submission.embeds.push(id_embed("puzzle_7"));
    harness.post(submission);
    // The bot's own markers come back through the gateway too
    harness.send(reaction("10", BOT_ID, "✅"));
    harness.send(reaction("10", ADMIN_ID, "✅"));

    let (chat, repository) = harness.drain().await;

    assert_eq!(repository.status("puzzle_7"), Some(NonogramStatus::Approved));
    let approved = repository.approved("puzzle_7").expect("approved copy");
    assert_eq!(approved.fields.title.as_deref(), Some("Heart"));
    assert_eq!(approved.fields.image_url, "https://img.example/grid.png");
    assert_eq!(approved.fields.cover_url, "");
    assert_eq!(approved.fields.extra.get("width"), Some(&serde_json::json!(10)));
    assert_eq!(
        chat.sent_texts(),
        vec!["Nonogram \"Heart\" was approved by alice!"]
    );
    assert!(chat.reactions(&MessageId::from("10")).is_empty());
}

#[tokio::test]
async fn test_admin_rejection_end_to_end() {
    let harness = ReviewHarness::start();
    harness
        .repository
        .insert_pending(pending("puzzle_8", "Boat", NonogramStatus::Pending));

    harness.post(bot_submission("11", "New submission ID: puzzle_8"));
    harness.send(reaction("11", ADMIN_ID, "❌"));

    let (chat, repository) = harness.drain().await;

    assert_eq!(repository.status("puzzle_8"), Some(NonogramStatus::Rejected));
    assert!(repository.approved("puzzle_8").is_none());
    assert_eq!(
        chat.sent_texts(),
        vec!["Nonogram \"Boat\" was rejected by alice."]
    );
    assert!(chat.reactions(&MessageId::from("11")).is_empty());
}

#[tokio::test]
async fn test_non_admin_cannot_review() {
    let harness = ReviewHarness::start();
    harness
        .repository
        .insert_pending(pending("puzzle_9", "Tree", NonogramStatus::Pending));

    harness.post(bot_submission("12", "ID: puzzle_9"));
    harness.send(reaction("12", MEMBER_ID, "✅"));

    let (chat, repository) = harness.drain().await;

    assert_eq!(repository.status("puzzle_9"), Some(NonogramStatus::Pending));
    assert_eq!(repository.writes(), 0);
    assert_eq!(
        chat.sent_texts(),
        vec!["mallory, you need the Admin role to approve or reject Nonograms."]
    );
    assert_eq!(chat.reactions(&MessageId::from("12")), vec!["✅", "❌"]);
}

#[tokio::test]
async fn test_racing_admins_single_winner() {
    let harness = ReviewHarness::start();
    harness
        .repository
        .insert_pending(pending("puzzle_10", "Star", NonogramStatus::Pending));

    harness.post(bot_submission("13", "ID: puzzle_10"));
    harness.send(reaction("13", ADMIN_ID, "❌"));
    harness.send(reaction("13", ADMIN_ID, "✅"));

    let (chat, repository) = harness.drain().await;

    assert_eq!(repository.status("puzzle_10"), Some(NonogramStatus::Rejected));
    assert!(repository.approved("puzzle_10").is_none());
    assert_eq!(repository.writes(), 1);
    assert_eq!(
        chat.sent_texts(),
        vec![
            "Nonogram \"Star\" was rejected by alice.",
            "This Nonogram has already been processed.",
        ]
    );
}
