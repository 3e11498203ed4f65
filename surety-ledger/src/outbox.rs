//! Post-commit fact emission.
//!
//! The outbox is deliberately decoupled from the transactional boundary:
//! facts are stamped under the write guard (so sequence numbers follow
//! application order) but pushed onto the channel only after the guard
//! drops, and a missing or closed consumer never rolls back a commit.

use surety_core::EmittedFact;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Append-only sink for committed facts.
#[derive(Clone)]
pub struct EventOutbox {
    tx: Option<UnboundedSender<EmittedFact>>,
}

impl EventOutbox {
    /// An outbox with a consumer end.
    pub fn channel() -> (Self, UnboundedReceiver<EmittedFact>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// An outbox that drops every fact; for callers without an observer.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Append committed facts. Send failures are ignored: the transition
    /// has already committed and observers are advisory.
    pub fn send_all(&self, facts: Vec<EmittedFact>) {
        for fact in facts {
            debug!(
                sequence_no = fact.sequence_no,
                kind = fact.event.kind(),
                "fact committed"
            );
            if let Some(tx) = &self.tx {
                let _ = tx.send(fact);
            }
        }
    }
}
