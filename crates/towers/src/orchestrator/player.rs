use crate::presentation::Subject;
use crate::team::TeamRegistry;
use crate::PlayerId;

/// A connected player as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
}

impl PlayerRef {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Transient per-player state held by a match.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSlot {
    pub name: String,
    pub spectator: bool,
    /// Disguise profile shown to opponents; defaults to the player's own skin.
    pub disguise_id: String,
    pub health: f32,
    pub name_hidden: bool,
    /// In the middle of a scored action.
    pub busy: bool,
    pub joined_at: u64,
}

impl PlayerSlot {
    pub const FULL_HEALTH: f32 = 20.0;

    pub fn new(player: &PlayerRef, spectator: bool, joined_at: u64) -> Self {
        Self {
            name: player.name.clone(),
            spectator,
            disguise_id: player.name.clone(),
            health: Self::FULL_HEALTH,
            name_hidden: false,
            busy: false,
            joined_at,
        }
    }

    pub fn subject<'a>(&'a self, id: PlayerId, teams: &'a TeamRegistry) -> Subject<'a> {
        Subject {
            id,
            name: &self.name,
            team: teams.team_of(id).and_then(|team_id| teams.get(team_id)),
            spectator: self.spectator,
            disguise_id: &self.disguise_id,
            health: self.health,
            name_hidden: self.name_hidden,
        }
    }
}
