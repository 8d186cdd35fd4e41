use crate::phase::{Phase, PhaseTransition};
use crate::{ArenaId, MatchId, PlayerId, TeamId};

/// Game-action callbacks from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameAction {
    /// Adds a point to the player's team.
    ObjectiveCaptured { player_id: PlayerId },
    TeamEliminated { team_id: TeamId },
    /// The player began a scored action and must not be moved until it ends.
    ActionStarted { player_id: PlayerId },
    ActionCompleted { player_id: PlayerId },
    HealthChanged { player_id: PlayerId, health: f32 },
    ToggleNameTag { player_id: PlayerId },
}

impl GameAction {
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            Self::ObjectiveCaptured { player_id }
            | Self::ActionStarted { player_id }
            | Self::ActionCompleted { player_id }
            | Self::HealthChanged { player_id, .. }
            | Self::ToggleNameTag { player_id } => Some(*player_id),
            Self::TeamEliminated { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// `None` is a draw.
    pub winner: Option<TeamId>,
    pub points: Vec<(TeamId, u32)>,
    pub decided_in: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    PostMatchElapsed,
    EmptyGrace,
    Removed,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::PostMatchElapsed => "post-match delay elapsed",
            CloseReason::EmptyGrace => "empty for too long",
            CloseReason::Removed => "removed",
        }
    }
}

/// Events published for the host and for scoring or reward systems.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    SessionCreated {
        match_id: MatchId,
        arena: ArenaId,
    },
    PlayerJoined {
        match_id: MatchId,
        player_id: PlayerId,
        team_id: Option<TeamId>,
    },
    PlayerLeft {
        match_id: MatchId,
        player_id: PlayerId,
    },
    TeamChanged {
        match_id: MatchId,
        player_id: PlayerId,
        from: Option<TeamId>,
        to: Option<TeamId>,
    },
    PhaseChanged {
        match_id: MatchId,
        transition: PhaseTransition,
    },
    MatchEnded {
        match_id: MatchId,
        outcome: MatchOutcome,
    },
    SessionClosed {
        match_id: MatchId,
        reason: CloseReason,
        players: Vec<PlayerId>,
    },
}

impl MatchEvent {
    pub fn match_id(&self) -> MatchId {
        match self {
            Self::SessionCreated { match_id, .. }
            | Self::PlayerJoined { match_id, .. }
            | Self::PlayerLeft { match_id, .. }
            | Self::TeamChanged { match_id, .. }
            | Self::PhaseChanged { match_id, .. }
            | Self::MatchEnded { match_id, .. }
            | Self::SessionClosed { match_id, .. } => *match_id,
        }
    }
}
