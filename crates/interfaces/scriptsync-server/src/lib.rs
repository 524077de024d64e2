//! HTTP bridge and composition root for the sync engine.
//!
//! The bridge is a stateless adapter over the session operations, keyed by an
//! externally supplied connection identifier (`socketId`). The socket
//! transport that owns the real connection lifecycle is an external
//! collaborator; it shares the same [`SessionRegistry`] and subscribes to
//! push events through the [`notifier::BroadcastNotifier`].

pub mod bridge;
pub mod notifier;

pub use bridge::router;
pub use notifier::{AddressedEvent, BroadcastNotifier, PushEvent};
