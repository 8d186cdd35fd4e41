use std::collections::BTreeMap;

use crate::phase::Phase;
use crate::TeamId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Standing {
    pub points: u32,
    pub eliminated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Winner(TeamId),
    /// Leaders are tied; the tie-break policy decides.
    Tie,
    /// Nobody is left; the match ends without a winner.
    Draw,
}

/// Points and eliminations of the teams contending in the running round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Standings {
    teams: BTreeMap<TeamId, Standing>,
}

impl Standings {
    pub fn begin(contenders: impl IntoIterator<Item = TeamId>) -> Self {
        Self {
            teams: contenders
                .into_iter()
                .map(|id| (id, Standing::default()))
                .collect(),
        }
    }

    pub fn enlist(&mut self, team_id: TeamId) {
        self.teams.entry(team_id).or_default();
    }

    pub fn get(&self, team_id: TeamId) -> Option<&Standing> {
        self.teams.get(&team_id)
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn add_point(&mut self, team_id: TeamId) -> bool {
        match self.teams.get_mut(&team_id) {
            Some(standing) if !standing.eliminated => {
                standing.points += 1;
                true
            }
            _ => false,
        }
    }

    /// Returns true when the team was contending and is newly eliminated.
    pub fn eliminate(&mut self, team_id: TeamId) -> bool {
        match self.teams.get_mut(&team_id) {
            Some(standing) if !standing.eliminated => {
                standing.eliminated = true;
                true
            }
            _ => false,
        }
    }

    pub fn remaining(&self) -> Vec<TeamId> {
        self.teams
            .iter()
            .filter(|(_, s)| !s.eliminated)
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn points(&self) -> Vec<(TeamId, u32)> {
        self.teams.iter().map(|(&id, s)| (id, s.points)).collect()
    }

    fn leaders(&self) -> Vec<TeamId> {
        let best = self
            .teams
            .values()
            .filter(|s| !s.eliminated)
            .map(|s| s.points)
            .max();
        self.teams
            .iter()
            .filter(|(_, s)| !s.eliminated && Some(s.points) == best)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Checks the win condition for the current phase.
    ///
    /// `timer_elapsed` is set when the round or overtime clock ran out.
    pub fn resolve(
        &self,
        phase: Phase,
        points_to_win: Option<u32>,
        timer_elapsed: bool,
    ) -> Option<Verdict> {
        if !phase.allows_combat() {
            return None;
        }
        if self.teams.is_empty() {
            return timer_elapsed.then_some(Verdict::Draw);
        }

        let remaining = self.remaining();
        match remaining.as_slice() {
            [] => return Some(Verdict::Draw),
            [last] => return Some(Verdict::Winner(*last)),
            _ => {}
        }

        if let Some(target) = points_to_win {
            if let Some(&id) = remaining
                .iter()
                .find(|&&id| self.teams[&id].points >= target)
            {
                return Some(Verdict::Winner(id));
            }
        }

        let leaders = self.leaders();
        let sudden_death = phase == Phase::Overtime;
        match leaders.as_slice() {
            [leader] if timer_elapsed || sudden_death => Some(Verdict::Winner(*leader)),
            _ if timer_elapsed => Some(Verdict::Tie),
            _ => None,
        }
    }
}
