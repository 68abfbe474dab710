//! Business logic services for the bot.
//!
//! # Services
//!
//! - `review` - Reaction-driven approve/reject flow
//! - `events` - Worker draining the gateway event queue
//! - `relay` - Delivery strategies for the relay endpoint

pub mod events;
pub mod relay;
pub mod review;

pub use events::run_event_loop;
pub use relay::{BotDelivery, RelayDelivery, RelayError, RelayPayload, WebhookDelivery};
pub use review::{IgnoreReason, ReviewOutcome, ReviewWorkflow};
