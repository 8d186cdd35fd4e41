use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::{PlayerId, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TeamColor {
    Red,
    Blue,
    Green,
    Yellow,
    Orange,
    Purple,
}

impl TeamColor {
    pub const ALL: [TeamColor; 6] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Yellow,
        Self::Orange,
        Self::Purple,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Purple => "purple",
        }
    }

    pub fn primary_hex(&self) -> &'static str {
        match self {
            Self::Red => "CC3933",
            Self::Blue => "0094FF",
            Self::Green => "4FCC33",
            Self::Yellow => "D5CC59",
            Self::Orange => "E56F19",
            Self::Purple => "C126D9",
        }
    }

    pub fn secondary_hex(&self) -> &'static str {
        match self {
            Self::Red => "FE6C67",
            Self::Blue => "66BFFF",
            Self::Green => "95E085",
            Self::Yellow => "E0D985",
            Self::Orange => "F0A875",
            Self::Purple => "E093EC",
        }
    }

    fn default_tag(&self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::Green => "GREEN",
            Self::Yellow => "YELLO",
            Self::Orange => "ORNGE",
            Self::Purple => "PURPL",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone)]
pub struct Team {
    pub id: TeamId,
    pub color: TeamColor,
    tag: String,
    members: Vec<PlayerId>,
    capacity: u8,
}

impl Team {
    pub const MIN_TAG_LEN: usize = 2;
    pub const MAX_TAG_LEN: usize = 5;

    fn new(id: TeamId, color: TeamColor, capacity: u8) -> Self {
        Self {
            id,
            color,
            tag: color.default_tag().to_string(),
            members: Vec::with_capacity(capacity as usize),
            capacity,
        }
    }

    pub fn is_valid_tag(tag: &str) -> bool {
        let len = tag.chars().count();
        (Self::MIN_TAG_LEN..=Self::MAX_TAG_LEN).contains(&len)
            && tag.chars().all(|c| c.is_ascii_alphanumeric())
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Members in join order.
    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity as usize
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.members.contains(&player_id)
    }

    pub fn display_name(&self) -> String {
        format!("[{}]", self.tag)
    }

    fn add_member(&mut self, player_id: PlayerId) -> bool {
        if self.is_full() || self.contains(player_id) {
            return false;
        }
        self.members.push(player_id);
        true
    }

    fn remove_member(&mut self, player_id: PlayerId) -> bool {
        if let Some(pos) = self.members.iter().position(|&p| p == player_id) {
            self.members.remove(pos);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamMove {
    pub player_id: PlayerId,
    pub from: TeamId,
    pub to: TeamId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rebalance {
    pub moves: Vec<TeamMove>,
    /// Set when the remaining imbalance can only be fixed by moving players
    /// that are in the middle of a scored action.
    pub deferred: bool,
}

/// Team membership for a single match.
#[derive(Debug, Clone)]
pub struct TeamRegistry {
    teams: Vec<Team>,
    player_teams: HashMap<PlayerId, TeamId>,
}

impl TeamRegistry {
    pub fn new(team_count: u8, capacity: u8) -> Self {
        let teams = TeamColor::ALL
            .into_iter()
            .take(team_count as usize)
            .enumerate()
            .map(|(id, color)| Team::new(id as TeamId, color, capacity))
            .collect();

        Self {
            teams,
            player_teams: HashMap::new(),
        }
    }

    /// Puts the player on the smallest non-full team, lowest id first.
    ///
    /// A player that already has a team keeps it.
    pub fn assign(&mut self, player_id: PlayerId) -> Result<TeamId, MatchError> {
        if let Some(team_id) = self.team_of(player_id) {
            return Ok(team_id);
        }

        let team = self
            .teams
            .iter_mut()
            .filter(|t| !t.is_full())
            .min_by_key(|t| (t.len(), t.id))
            .ok_or(MatchError::ArenaFull)?;

        team.add_member(player_id);
        self.player_teams.insert(player_id, team.id);

        Ok(team.id)
    }

    /// Puts the player on a specific team, leaving any previous one.
    pub fn assign_to(&mut self, player_id: PlayerId, team_id: TeamId) -> Result<TeamId, MatchError> {
        let current = self.team_of(player_id);
        if current == Some(team_id) {
            return Ok(team_id);
        }

        let team = self
            .teams
            .get(team_id as usize)
            .ok_or(MatchError::TeamNotFound(team_id))?;
        if team.is_full() {
            return Err(MatchError::TeamFull(team_id));
        }

        self.remove(player_id);
        self.teams[team_id as usize].add_member(player_id);
        self.player_teams.insert(player_id, team_id);

        Ok(team_id)
    }

    pub fn remove(&mut self, player_id: PlayerId) -> Option<TeamId> {
        let team_id = self.player_teams.remove(&player_id)?;
        if let Some(team) = self.teams.get_mut(team_id as usize) {
            team.remove_member(player_id);
        }
        Some(team_id)
    }

    /// Moves players until no two teams differ by more than one member.
    ///
    /// The most recent joiner of an oversized team moves first. Players for
    /// which `is_busy` returns true are never moved.
    pub fn rebalance(&mut self, is_busy: impl Fn(PlayerId) -> bool) -> Rebalance {
        self.rebalance_among(|_| true, is_busy)
    }

    /// Like [`rebalance`](Self::rebalance), restricted to the teams for
    /// which `is_open` returns true. Closed teams neither give nor receive.
    pub fn rebalance_among(
        &mut self,
        is_open: impl Fn(TeamId) -> bool,
        is_busy: impl Fn(PlayerId) -> bool,
    ) -> Rebalance {
        let mut report = Rebalance::default();

        loop {
            let Some(smallest) = self
                .teams
                .iter()
                .filter(|t| is_open(t.id))
                .min_by_key(|t| (t.len(), t.id))
            else {
                break;
            };
            let (to, floor) = (smallest.id, smallest.len());

            let mut donors: Vec<&Team> = self
                .teams
                .iter()
                .filter(|t| is_open(t.id) && t.len() > floor + 1)
                .collect();
            if donors.is_empty() {
                break;
            }
            donors.sort_by_key(|t| (std::cmp::Reverse(t.len()), t.id));

            let candidate = donors.iter().find_map(|team| {
                team.members
                    .iter()
                    .rev()
                    .find(|&&p| !is_busy(p))
                    .map(|&p| (p, team.id))
            });

            let Some((player_id, from)) = candidate else {
                report.deferred = true;
                break;
            };

            self.teams[from as usize].remove_member(player_id);
            self.teams[to as usize].add_member(player_id);
            self.player_teams.insert(player_id, to);
            report.moves.push(TeamMove { player_id, from, to });
        }

        report
    }

    pub fn rename(&mut self, team_id: TeamId, tag: &str) -> Result<(), MatchError> {
        if !Team::is_valid_tag(tag) {
            return Err(MatchError::InvalidTeamName(tag.to_string()));
        }
        if self.teams.iter().any(|t| t.id != team_id && t.tag == tag) {
            return Err(MatchError::DuplicateTeamName(tag.to_string()));
        }

        let team = self
            .teams
            .get_mut(team_id as usize)
            .ok_or(MatchError::TeamNotFound(team_id))?;
        team.tag = tag.to_string();
        Ok(())
    }

    pub fn team_of(&self, player_id: PlayerId) -> Option<TeamId> {
        self.player_teams.get(&player_id).copied()
    }

    pub fn get(&self, team_id: TeamId) -> Option<&Team> {
        self.teams.get(team_id as usize)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn player_count(&self) -> usize {
        self.player_teams.len()
    }

    pub fn is_full(&self) -> bool {
        self.teams.iter().all(Team::is_full)
    }

    pub fn same_team(&self, a: PlayerId, b: PlayerId) -> bool {
        match (self.team_of(a), self.team_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        for team in &mut self.teams {
            team.members.clear();
        }
        self.player_teams.clear();
    }
}
