use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::team::TeamColor;

/// What happens when a win condition is reached without a unique leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreak {
    /// Extend the match with a sudden-death overtime of the given length.
    Overtime { ticks: u32 },
    /// End the match immediately with no winner.
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettings {
    pub team_count: u8,
    pub team_capacity: u8,
    pub min_players: u8,
    pub countdown_ticks: u32,
    /// Round length; `None` runs until a decisive result.
    pub round_ticks: Option<u32>,
    pub points_to_win: Option<u32>,
    pub tie_break: TieBreak,
    pub post_match_ticks: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            team_count: 2,
            team_capacity: 4,
            min_players: 2,
            countdown_ticks: 30 * 20,
            round_ticks: Some(15 * 60 * 20),
            points_to_win: None,
            tie_break: TieBreak::Overtime { ticks: 3 * 60 * 20 },
            post_match_ticks: 10 * 20,
        }
    }
}

impl MatchSettings {
    /// Team setups the arenas are built for.
    pub const TEAM_SETUPS: [u8; 3] = [2, 4, 6];

    pub fn validate(&self) -> Result<(), MatchError> {
        if !Self::TEAM_SETUPS.contains(&self.team_count) {
            return Err(MatchError::InvalidSettings("team count must be 2, 4 or 6"));
        }
        if self.team_count as usize > TeamColor::ALL.len() {
            return Err(MatchError::InvalidSettings("not enough team colors"));
        }
        if self.team_capacity == 0 {
            return Err(MatchError::InvalidSettings("team capacity must be positive"));
        }
        if self.min_players == 0 {
            return Err(MatchError::InvalidSettings("minimum players must be positive"));
        }
        if self.min_players as usize > self.max_players() {
            return Err(MatchError::InvalidSettings(
                "minimum players exceeds total team capacity",
            ));
        }
        if self.countdown_ticks == 0 {
            return Err(MatchError::InvalidSettings("countdown must last at least one tick"));
        }
        if self.round_ticks == Some(0) || self.points_to_win == Some(0) {
            return Err(MatchError::InvalidSettings("round limits must be positive"));
        }
        if self.tie_break == (TieBreak::Overtime { ticks: 0 }) {
            return Err(MatchError::InvalidSettings("overtime must last at least one tick"));
        }
        Ok(())
    }

    pub fn max_players(&self) -> usize {
        self.team_count as usize * self.team_capacity as usize
    }

    /// Short form like `4v4` or `2v2v2v2`.
    pub fn team_setup_label(&self) -> String {
        vec![self.team_capacity.to_string(); self.team_count as usize].join("v")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// How long a session may stay without players before it is torn down.
    pub empty_grace_ticks: u32,
    /// Settings for sessions created implicitly by a player joining an arena.
    pub default_match: MatchSettings,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            empty_grace_ticks: 60 * 20,
            default_match: MatchSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(MatchSettings::default().validate().is_ok());
        assert_eq!(MatchSettings::default().team_setup_label(), "4v4");
    }

    #[test]
    fn rejects_unsupported_team_setup() {
        let settings = MatchSettings {
            team_count: 3,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(MatchError::InvalidSettings(_))
        ));
    }

    #[test]
    fn rejects_unreachable_minimum() {
        let settings = MatchSettings {
            team_capacity: 1,
            min_players: 3,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
