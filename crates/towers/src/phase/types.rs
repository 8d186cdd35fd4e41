use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Lobby,
    Countdown,
    Active,
    Overtime,
    Ended,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Self::Lobby,
        Self::Countdown,
        Self::Active,
        Self::Overtime,
        Self::Ended,
    ];

    pub fn allows_combat(&self) -> bool {
        matches!(self, Self::Active | Self::Overtime)
    }

    /// Players joining in these phases are put on a team.
    pub fn accepts_players(&self) -> bool {
        matches!(self, Self::Lobby | Self::Countdown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Countdown => "countdown",
            Self::Active => "active",
            Self::Overtime => "overtime",
            Self::Ended => "ended",
        }
    }

    /// The phase table. `None` means the trigger does nothing in this phase.
    pub fn next(self, trigger: PhaseTrigger) -> Option<Phase> {
        use PhaseTrigger::*;

        match (self, trigger) {
            (_, AdminReset) => Some(Self::Lobby),
            (Self::Lobby, PlayersSufficient) => Some(Self::Countdown),
            (Self::Countdown, PlayersInsufficient) => Some(Self::Lobby),
            (Self::Countdown, CountdownElapsed) => Some(Self::Active),
            (Self::Active, WinReached { decisive: false }) => Some(Self::Overtime),
            (Self::Active, WinReached { decisive: true }) => Some(Self::Ended),
            (Self::Overtime, WinReached { .. }) => Some(Self::Ended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseTrigger {
    PlayersSufficient,
    PlayersInsufficient,
    CountdownElapsed,
    /// `decisive: false` asks for a tie-break extension.
    WinReached { decisive: bool },
    AdminReset,
}

impl PhaseTrigger {
    pub const ALL: [PhaseTrigger; 6] = [
        Self::PlayersSufficient,
        Self::PlayersInsufficient,
        Self::CountdownElapsed,
        Self::WinReached { decisive: false },
        Self::WinReached { decisive: true },
        Self::AdminReset,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub trigger: PhaseTrigger,
    pub tick: u64,
    /// Requested by the administrative layer rather than game flow.
    pub forced: bool,
}

/// A phase deadline that has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTimer {
    CountdownElapsed,
    RoundElapsed,
    OvertimeElapsed,
    PostMatchElapsed,
}
