pub mod config;
pub mod error;
pub mod event;
pub mod orchestrator;
pub mod phase;
pub mod presentation;
pub mod session;
pub mod team;

pub type PlayerId = u32;
pub type MatchId = u64;
pub type TeamId = u8;
pub type ArenaId = String;

pub use config::{MatchSettings, RegistrySettings, TieBreak};
pub use error::MatchError;
pub use event::{CloseReason, EventQueue, GameAction, MatchEvent, MatchOutcome, QueuedEvent};
pub use orchestrator::{
    FlushStats, Match, PlayerRef, PlayerSlot, SharedPolicy, Standing, Standings, Verdict,
};
pub use phase::{Phase, PhaseMachine, PhaseTimer, PhaseTimings, PhaseTransition, PhaseTrigger};
pub use presentation::{
    DisguiseProfile, PacketView, PresentationCommand, PresentationPacket, PresentationTable,
    PresentedView, RecordingView, SendFailure, Subject, TabEntry, TowersVisibility,
    VisibilityPolicy, WireError,
};
pub use session::SessionRegistry;
pub use team::{Rebalance, Team, TeamColor, TeamMove, TeamRegistry};
