mod queue;
mod types;

pub use queue::{EventQueue, QueuedEvent};
pub use types::{CloseReason, GameAction, MatchEvent, MatchOutcome};
