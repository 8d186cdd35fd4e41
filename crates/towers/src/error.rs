use crate::phase::Phase;
use crate::{ArenaId, MatchId, PlayerId, TeamId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("arena '{arena}' already has an active session ({existing})")]
    DuplicateSession { arena: ArenaId, existing: MatchId },
    #[error("session {0} not found")]
    SessionNotFound(MatchId),
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("player {player} is already in session {session}")]
    AlreadyInSession { player: PlayerId, session: MatchId },
    #[error("every team is at capacity")]
    ArenaFull,
    #[error("team {0} not found")]
    TeamNotFound(TeamId),
    #[error("team {0} is at capacity")]
    TeamFull(TeamId),
    #[error("invalid team name '{0}'")]
    InvalidTeamName(String),
    #[error("team name '{0}' is already taken")]
    DuplicateTeamName(String),
    #[error("match {0} has already started")]
    MatchInProgress(MatchId),
    #[error("invalid phase transition {from:?} -> {to:?}")]
    InvalidTransition { from: Phase, to: Phase },
    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),
}
