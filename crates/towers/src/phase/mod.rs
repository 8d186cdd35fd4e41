mod machine;
mod types;

pub use machine::{PhaseMachine, PhaseTimings};
pub use types::{Phase, PhaseTimer, PhaseTransition, PhaseTrigger};
