mod approval;
mod replace;

pub use approval::{ApprovalEngine, RevokeSummary};
pub use replace::ReplaceEngine;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use crate::core::types::{OutcomeStatus, ReplaceMatch};

/// Fixed delay between sequential write calls, keeping the client under
/// Crowdin's request quota without a token-bucket abstraction.
pub const WRITE_DELAY: Duration = Duration::from_millis(50);

/// Cooldown observed after a rate-limit signal before the single retry.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(10);

/// Callbacks for batch runs, so the engines stay free of presentation
/// concerns. The CLI reporter subscribes; the MCP layer ignores them.
pub trait BatchObserver: Send + Sync {
    fn on_progress(&self, _processed: usize, _total: usize) {}
    fn on_replacement(&self, _item: &ReplaceMatch, _outcome: &OutcomeStatus) {}
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl BatchObserver for NullObserver {}
