mod player;
mod standings;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub use player::{PlayerRef, PlayerSlot};
pub use standings::{Standing, Standings, Verdict};

use crate::config::{MatchSettings, TieBreak};
use crate::error::MatchError;
use crate::event::{EventQueue, GameAction, MatchEvent, MatchOutcome};
use crate::phase::{Phase, PhaseMachine, PhaseTimer, PhaseTimings, PhaseTransition, PhaseTrigger};
use crate::presentation::{
    DisguiseProfile, PacketView, PresentationTable, TowersVisibility, VisibilityPolicy,
};
use crate::team::{Rebalance, TeamRegistry};
use crate::{ArenaId, MatchId, PlayerId, TeamId};

pub type SharedPolicy = Arc<dyn VisibilityPolicy + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub pairs: u32,
    pub sent: u32,
    pub failed: u32,
}

/// One running instance of the game mode, bound to one arena.
///
/// Every mutation happens on the host's tick thread. Host callbacks update
/// teams and phase immediately; presentation changes are only recorded as
/// dirty players and materialized once per tick by [`Match::flush`].
pub struct Match {
    id: MatchId,
    arena: ArenaId,
    settings: MatchSettings,
    teams: TeamRegistry,
    phase: PhaseMachine,
    players: BTreeMap<PlayerId, PlayerSlot>,
    standings: Standings,
    outcome: Option<MatchOutcome>,
    presentation: PresentationTable,
    pending_clears: Vec<(PlayerId, PlayerId, DisguiseProfile)>,
    dirty_observers: BTreeSet<PlayerId>,
    dirty_targets: BTreeSet<PlayerId>,
    rebalance_pending: bool,
    empty_since: Option<u64>,
    now: u64,
    events: EventQueue,
    policy: SharedPolicy,
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("id", &self.id)
            .field("arena", &self.arena)
            .field("phase", &self.phase.phase())
            .field("players", &self.players.len())
            .finish_non_exhaustive()
    }
}

impl Match {
    pub fn new(
        id: MatchId,
        arena: impl Into<ArenaId>,
        settings: MatchSettings,
        now: u64,
    ) -> Result<Self, MatchError> {
        Self::with_policy(id, arena, settings, now, Arc::new(TowersVisibility))
    }

    pub fn with_policy(
        id: MatchId,
        arena: impl Into<ArenaId>,
        settings: MatchSettings,
        now: u64,
        policy: SharedPolicy,
    ) -> Result<Self, MatchError> {
        settings.validate()?;

        Ok(Self {
            id,
            arena: arena.into(),
            teams: TeamRegistry::new(settings.team_count, settings.team_capacity),
            phase: PhaseMachine::new(PhaseTimings::from(&settings), now),
            settings,
            players: BTreeMap::new(),
            standings: Standings::default(),
            outcome: None,
            presentation: PresentationTable::new(),
            pending_clears: Vec::new(),
            dirty_observers: BTreeSet::new(),
            dirty_targets: BTreeSet::new(),
            rebalance_pending: false,
            empty_since: Some(now),
            now,
            events: EventQueue::default(),
            policy,
        })
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn arena(&self) -> &str {
        &self.arena
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn phase_entered_at(&self) -> u64 {
        self.phase.entered_at()
    }

    pub fn remaining_ticks(&self) -> Option<u64> {
        self.phase.remaining_ticks(self.now)
    }

    pub fn teams(&self) -> &TeamRegistry {
        &self.teams
    }

    pub fn standings(&self) -> &Standings {
        &self.standings
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    pub fn presentation(&self) -> &PresentationTable {
        &self.presentation
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerSlot> {
        self.players.get(&player_id)
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.keys().copied()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn spectators(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players
            .iter()
            .filter(|(_, slot)| slot.spectator)
            .map(|(&id, _)| id)
    }

    pub fn rebalance_pending(&self) -> bool {
        self.rebalance_pending
    }

    /// Ticks spent without any player, if currently empty.
    pub fn empty_for(&self, now: u64) -> Option<u64> {
        self.empty_since.map(|since| now.saturating_sub(since))
    }

    /// The match has ended and its post-match delay is over.
    pub fn is_expired(&self, now: u64) -> bool {
        self.phase.poll_timer(now) == Some(PhaseTimer::PostMatchElapsed)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = MatchEvent> + '_ {
        self.events.drain().map(|queued| queued.event)
    }

    pub(crate) fn take_events(&mut self, into: &mut EventQueue) {
        into.append(&mut self.events);
    }

    /// Adds a player. Before the match starts they are put on the smallest
    /// team; afterwards they join as a spectator.
    pub fn join(&mut self, player: PlayerRef) -> Result<Option<TeamId>, MatchError> {
        if self.players.contains_key(&player.id) {
            return Err(MatchError::AlreadyInSession {
                player: player.id,
                session: self.id,
            });
        }

        let team_id = if self.phase().accepts_players() {
            Some(self.teams.assign(player.id)?)
        } else {
            None
        };
        self.insert_player(player, team_id)
    }

    pub fn join_spectator(&mut self, player: PlayerRef) -> Result<(), MatchError> {
        if self.players.contains_key(&player.id) {
            return Err(MatchError::AlreadyInSession {
                player: player.id,
                session: self.id,
            });
        }
        self.insert_player(player, None).map(|_| ())
    }

    fn insert_player(
        &mut self,
        player: PlayerRef,
        team_id: Option<TeamId>,
    ) -> Result<Option<TeamId>, MatchError> {
        let player_id = player.id;
        log::debug!(
            "Player {} ({}) joined match {} on team {:?}",
            player_id,
            player.name,
            self.id,
            team_id
        );

        self.players
            .insert(player_id, PlayerSlot::new(&player, team_id.is_none(), self.now));
        self.empty_since = None;
        self.mark_player(player_id);
        self.emit(MatchEvent::PlayerJoined {
            match_id: self.id,
            player_id,
            team_id,
        });

        self.check_player_threshold();
        Ok(team_id)
    }

    pub fn leave(&mut self, player_id: PlayerId) -> Result<(), MatchError> {
        let slot = self
            .players
            .remove(&player_id)
            .ok_or(MatchError::PlayerNotFound(player_id))?;
        let team_id = self.teams.remove(player_id);

        self.presentation.remove_player(player_id);
        self.pending_clears
            .retain(|(observer, target, _)| *observer != player_id && *target != player_id);
        self.dirty_observers.remove(&player_id);
        self.dirty_targets.remove(&player_id);

        log::debug!("Player {} ({}) left match {}", player_id, slot.name, self.id);
        self.emit(MatchEvent::PlayerLeft {
            match_id: self.id,
            player_id,
        });

        if self.players.is_empty() {
            self.empty_since = Some(self.now);
        }

        if let Some(team_id) = team_id {
            self.on_team_shrunk(team_id);
        }
        if slot.busy && self.rebalance_pending {
            self.apply_rebalance();
        }
        self.check_player_threshold();
        Ok(())
    }

    /// Moves a player between playing and spectating.
    pub fn set_spectator(&mut self, player_id: PlayerId, spectator: bool) -> Result<(), MatchError> {
        let slot = self
            .players
            .get(&player_id)
            .ok_or(MatchError::PlayerNotFound(player_id))?;
        if slot.spectator == spectator {
            return Ok(());
        }

        if spectator {
            let from = self.teams.remove(player_id);
            self.set_slot_spectator(player_id, true);
            self.emit(MatchEvent::TeamChanged {
                match_id: self.id,
                player_id,
                from,
                to: None,
            });
            if let Some(team_id) = from {
                self.on_team_shrunk(team_id);
            }
        } else {
            if !self.phase().accepts_players() {
                return Err(MatchError::MatchInProgress(self.id));
            }
            let to = self.teams.assign(player_id)?;
            self.set_slot_spectator(player_id, false);
            self.emit(MatchEvent::TeamChanged {
                match_id: self.id,
                player_id,
                from: None,
                to: Some(to),
            });
        }

        self.check_player_threshold();
        Ok(())
    }

    /// Puts a player on a chosen team. Only possible before the match starts.
    pub fn assign_to(&mut self, player_id: PlayerId, team_id: TeamId) -> Result<(), MatchError> {
        if !self.players.contains_key(&player_id) {
            return Err(MatchError::PlayerNotFound(player_id));
        }
        if !self.phase().accepts_players() {
            return Err(MatchError::MatchInProgress(self.id));
        }

        let from = self.teams.team_of(player_id);
        if from == Some(team_id) {
            return Ok(());
        }
        self.teams.assign_to(player_id, team_id)?;
        self.set_slot_spectator(player_id, false);
        self.emit(MatchEvent::TeamChanged {
            match_id: self.id,
            player_id,
            from,
            to: Some(team_id),
        });

        self.check_player_threshold();
        Ok(())
    }

    /// Evens out team sizes. Players in a scored action stay put; if that
    /// leaves teams uneven, the rest is retried when their action completes.
    pub fn rebalance(&mut self) -> Rebalance {
        self.apply_rebalance()
    }

    fn apply_rebalance(&mut self) -> Rebalance {
        let players = &self.players;
        let standings = &self.standings;
        let combat = self.phase().allows_combat();
        let report = self.teams.rebalance_among(
            |t| !combat || standings.get(t).is_none_or(|s| !s.eliminated),
            |p| players.get(&p).is_some_and(|slot| slot.busy),
        );

        for team_move in &report.moves {
            if self.phase().allows_combat() {
                self.standings.enlist(team_move.to);
            }
            self.mark_player(team_move.player_id);
            self.emit(MatchEvent::TeamChanged {
                match_id: self.id,
                player_id: team_move.player_id,
                from: Some(team_move.from),
                to: Some(team_move.to),
            });
        }

        if !report.moves.is_empty() {
            log::info!(
                "Rebalanced match {}: moved {} player(s){}",
                self.id,
                report.moves.len(),
                if report.deferred { ", rest deferred" } else { "" }
            );
        }
        self.rebalance_pending = report.deferred;
        report
    }

    pub fn rename_team(&mut self, team_id: TeamId, tag: &str) -> Result<(), MatchError> {
        self.teams.rename(team_id, tag)?;
        let members = self
            .teams
            .get(team_id)
            .map(|team| team.members().to_vec())
            .unwrap_or_default();
        for member in members {
            self.dirty_targets.insert(member);
        }
        Ok(())
    }

    /// Sets the disguise profile opponents see; `None` restores the player's own.
    pub fn set_disguise_profile(
        &mut self,
        player_id: PlayerId,
        profile_id: Option<String>,
    ) -> Result<(), MatchError> {
        let slot = self
            .players
            .get_mut(&player_id)
            .ok_or(MatchError::PlayerNotFound(player_id))?;
        slot.disguise_id = profile_id.unwrap_or_else(|| slot.name.clone());
        self.dirty_targets.insert(player_id);
        Ok(())
    }

    pub fn action(&mut self, action: GameAction) -> Result<(), MatchError> {
        if let Some(player_id) = action.player_id() {
            if !self.players.contains_key(&player_id) {
                return Err(MatchError::PlayerNotFound(player_id));
            }
        }
        let frozen = self.phase() == Phase::Ended;

        match action {
            GameAction::ObjectiveCaptured { player_id } => {
                let Some(team_id) = self.teams.team_of(player_id) else {
                    return Ok(());
                };
                if self.phase().allows_combat() && self.standings.add_point(team_id) {
                    log::debug!("Team {} scored in match {}", team_id, self.id);
                    self.evaluate_win(false);
                }
            }
            GameAction::TeamEliminated { team_id } => {
                if self.teams.get(team_id).is_none() {
                    return Err(MatchError::TeamNotFound(team_id));
                }
                if self.phase().allows_combat() && self.standings.eliminate(team_id) {
                    log::info!("Team {} eliminated from match {}", team_id, self.id);
                    self.evaluate_win(false);
                }
            }
            GameAction::ActionStarted { player_id } => {
                if let Some(slot) = self.players.get_mut(&player_id).filter(|_| !frozen) {
                    slot.busy = true;
                }
            }
            GameAction::ActionCompleted { player_id } => {
                if let Some(slot) = self.players.get_mut(&player_id) {
                    slot.busy = false;
                }
                if self.rebalance_pending {
                    self.apply_rebalance();
                }
            }
            GameAction::HealthChanged { player_id, health } => {
                if let Some(slot) = self.players.get_mut(&player_id).filter(|_| !frozen) {
                    slot.health = health.max(0.0);
                    self.dirty_targets.insert(player_id);
                }
            }
            GameAction::ToggleNameTag { player_id } => {
                if let Some(slot) = self.players.get_mut(&player_id).filter(|_| !frozen) {
                    slot.name_hidden = !slot.name_hidden;
                    self.dirty_targets.insert(player_id);
                }
            }
        }
        Ok(())
    }

    /// Administrative reset to `Lobby` from any phase.
    ///
    /// Presentation state is discarded at once; disguises still shown are
    /// cleared on the next flush.
    pub fn reset(&mut self) -> PhaseTransition {
        let transition = self.phase.reset(self.now);
        self.on_transition(transition);
        transition
    }

    /// Administrative phase change along an edge of the phase table.
    pub fn request_phase(&mut self, target: Phase) -> Result<PhaseTransition, MatchError> {
        let transition = self.phase.request(target, self.now)?;
        self.on_transition(transition);
        if transition.to == Phase::Ended {
            self.record_outcome(None, transition.from);
        }
        Ok(transition)
    }

    /// Advances timed phase transitions. Called once per host tick.
    pub fn tick(&mut self, now: u64) {
        self.now = now;

        match self.phase.poll_timer(now) {
            Some(PhaseTimer::CountdownElapsed) => {
                self.fire(PhaseTrigger::CountdownElapsed);
            }
            Some(PhaseTimer::RoundElapsed) | Some(PhaseTimer::OvertimeElapsed) => {
                self.evaluate_win(true);
            }
            Some(PhaseTimer::PostMatchElapsed) | None => {}
        }

        self.check_player_threshold();
    }

    /// Sends the presentation changes accumulated since the last flush.
    ///
    /// Each dirty `(observer, target)` pair is recomputed once, however many
    /// times it changed during the tick.
    pub fn flush<V: PacketView + ?Sized>(&mut self, view: &mut V) -> FlushStats {
        let mut stats = FlushStats::default();

        for (observer, target, profile) in std::mem::take(&mut self.pending_clears) {
            stats.pairs += 1;
            match view.clear_disguise(observer, target) {
                Ok(()) => stats.sent += 1,
                Err(e) => {
                    stats.failed += 1;
                    log::warn!(
                        "Clearing disguise of {} for observer {} failed: {}",
                        target,
                        observer,
                        e
                    );
                    self.presentation.restore_stale(observer, target, profile);
                }
            }
        }

        if self.dirty_observers.is_empty() && self.dirty_targets.is_empty() {
            return stats;
        }

        let phase = self.phase();
        for (&observer_id, observer_slot) in &self.players {
            let observer_dirty = self.dirty_observers.contains(&observer_id);
            let observer = observer_slot.subject(observer_id, &self.teams);

            for (&target_id, target_slot) in &self.players {
                if !observer_dirty && !self.dirty_targets.contains(&target_id) {
                    continue;
                }
                let target = target_slot.subject(target_id, &self.teams);
                let desired = self.policy.present(phase, &observer, &target);

                let result = self
                    .presentation
                    .reconcile(observer_id, target_id, &desired, view);
                stats.pairs += 1;
                stats.sent += result.sent;
                if result.failed {
                    stats.failed += 1;
                }
            }
        }

        self.dirty_observers.clear();
        self.dirty_targets.clear();

        if stats.failed > 0 {
            log::warn!(
                "Match {}: {} presentation update(s) failed, will resend on next change",
                self.id,
                stats.failed
            );
        }
        stats
    }

    fn fire(&mut self, trigger: PhaseTrigger) -> Option<PhaseTransition> {
        let transition = self.phase.fire(trigger, self.now)?;
        self.on_transition(transition);
        Some(transition)
    }

    fn on_transition(&mut self, transition: PhaseTransition) {
        log::info!(
            "Match {} ({}): {} -> {}{}",
            self.id,
            self.arena,
            transition.from.as_str(),
            transition.to.as_str(),
            if transition.forced { " (forced)" } else { "" }
        );

        match transition.to {
            Phase::Lobby => {
                self.standings = Standings::default();
                self.outcome = None;
                if transition.trigger == PhaseTrigger::AdminReset {
                    self.pending_clears.extend(self.presentation.clear());
                }
            }
            Phase::Active if transition.from == Phase::Countdown => {
                let contenders = self
                    .teams
                    .teams()
                    .iter()
                    .filter(|team| !team.is_empty())
                    .map(|team| team.id);
                self.standings = Standings::begin(contenders);
            }
            Phase::Ended => {
                for slot in self.players.values_mut() {
                    slot.busy = false;
                }
                self.rebalance_pending = false;
            }
            _ => {}
        }

        self.dirty_observers.extend(self.players.keys().copied());
        self.emit(MatchEvent::PhaseChanged {
            match_id: self.id,
            transition,
        });

        // A match started with fewer than two contending teams is decided at once.
        if transition.to == Phase::Active {
            self.evaluate_win(false);
        }
    }

    fn evaluate_win(&mut self, timer_elapsed: bool) {
        let phase = self.phase();
        let Some(verdict) =
            self.standings
                .resolve(phase, self.settings.points_to_win, timer_elapsed)
        else {
            return;
        };

        match verdict {
            Verdict::Winner(team_id) => self.finish(Some(team_id), phase),
            Verdict::Tie => match (phase, self.settings.tie_break) {
                (Phase::Active, TieBreak::Overtime { .. }) => {
                    self.fire(PhaseTrigger::WinReached { decisive: false });
                }
                _ => self.finish(None, phase),
            },
            Verdict::Draw => self.finish(None, phase),
        }
    }

    fn finish(&mut self, winner: Option<TeamId>, decided_in: Phase) {
        if self
            .fire(PhaseTrigger::WinReached { decisive: true })
            .is_some()
        {
            self.record_outcome(winner, decided_in);
        }
    }

    fn record_outcome(&mut self, winner: Option<TeamId>, decided_in: Phase) {
        let outcome = MatchOutcome {
            winner,
            points: self.standings.points(),
            decided_in,
        };
        log::info!(
            "Match {} ended: {}",
            self.id,
            match winner {
                Some(team_id) => format!("team {} won", team_id),
                None => "draw".to_string(),
            }
        );
        self.outcome = Some(outcome.clone());
        self.emit(MatchEvent::MatchEnded {
            match_id: self.id,
            outcome,
        });
    }

    fn on_team_shrunk(&mut self, team_id: TeamId) {
        let emptied = self.teams.get(team_id).is_some_and(|team| team.is_empty());
        if emptied && self.phase().allows_combat() && self.standings.eliminate(team_id) {
            log::info!(
                "Team {} in match {} has no players left",
                team_id,
                self.id
            );
            self.evaluate_win(false);
        }
    }

    fn check_player_threshold(&mut self) {
        let enough = self.teams.player_count() >= self.settings.min_players as usize;
        match self.phase() {
            Phase::Lobby if enough => {
                self.fire(PhaseTrigger::PlayersSufficient);
            }
            Phase::Countdown if !enough => {
                self.fire(PhaseTrigger::PlayersInsufficient);
            }
            _ => {}
        }
    }

    fn set_slot_spectator(&mut self, player_id: PlayerId, spectator: bool) {
        if let Some(slot) = self.players.get_mut(&player_id) {
            slot.spectator = spectator;
        }
        self.mark_player(player_id);
    }

    /// Everything this player sees, and how everyone sees them, must be redone.
    fn mark_player(&mut self, player_id: PlayerId) {
        self.dirty_observers.insert(player_id);
        self.dirty_targets.insert(player_id);
    }

    fn emit(&mut self, event: MatchEvent) {
        self.events.push(self.now, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::RecordingView;

    fn settings() -> MatchSettings {
        MatchSettings {
            team_count: 2,
            team_capacity: 2,
            min_players: 2,
            countdown_ticks: 10,
            round_ticks: Some(100),
            points_to_win: None,
            tie_break: TieBreak::Overtime { ticks: 20 },
            post_match_ticks: 5,
        }
    }

    fn started() -> Match {
        let mut game = Match::new(1, "alpha", settings(), 0).unwrap();
        game.join(PlayerRef::new(1, "alice")).unwrap();
        game.join(PlayerRef::new(2, "bob")).unwrap();
        game.tick(10);
        assert_eq!(game.phase(), Phase::Active);
        game
    }

    #[test]
    fn rejects_invalid_settings() {
        let bad = MatchSettings {
            team_count: 5,
            ..settings()
        };
        assert!(Match::new(1, "alpha", bad, 0).is_err());
    }

    #[test]
    fn double_join_is_rejected() {
        let mut game = Match::new(1, "alpha", settings(), 0).unwrap();
        game.join(PlayerRef::new(1, "alice")).unwrap();
        assert_eq!(
            game.join(PlayerRef::new(1, "alice")),
            Err(MatchError::AlreadyInSession {
                player: 1,
                session: 1
            })
        );
    }

    #[test]
    fn late_joiner_spectates() {
        let mut game = started();
        assert_eq!(game.join(PlayerRef::new(3, "carol")).unwrap(), None);
        assert!(game.player(3).unwrap().spectator);
        assert_eq!(
            game.set_spectator(3, false),
            Err(MatchError::MatchInProgress(1))
        );
    }

    #[test]
    fn capture_target_ends_match() {
        let mut game = Match::new(
            1,
            "alpha",
            MatchSettings {
                points_to_win: Some(2),
                ..settings()
            },
            0,
        )
        .unwrap();
        game.join(PlayerRef::new(1, "alice")).unwrap();
        game.join(PlayerRef::new(2, "bob")).unwrap();
        game.tick(10);

        game.action(GameAction::ObjectiveCaptured { player_id: 2 }).unwrap();
        assert_eq!(game.phase(), Phase::Active);
        game.action(GameAction::ObjectiveCaptured { player_id: 2 }).unwrap();
        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.outcome().unwrap().winner, Some(1));

        game.tick(14);
        assert!(!game.is_expired(14));
        assert!(game.is_expired(15));
    }

    #[test]
    fn last_player_leaving_eliminates_team() {
        let mut game = started();
        game.leave(2).unwrap();
        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.outcome().unwrap().winner, Some(0));
    }

    #[test]
    fn timeout_tie_goes_to_overtime_then_draw() {
        let mut game = started();
        game.tick(110);
        assert_eq!(game.phase(), Phase::Overtime);
        game.tick(130);
        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.outcome().unwrap().winner, None);
        assert_eq!(game.outcome().unwrap().decided_in, Phase::Overtime);
    }

    #[test]
    fn draw_policy_skips_overtime() {
        let mut game = Match::new(
            1,
            "alpha",
            MatchSettings {
                tie_break: TieBreak::Draw,
                ..settings()
            },
            0,
        )
        .unwrap();
        game.join(PlayerRef::new(1, "alice")).unwrap();
        game.join(PlayerRef::new(2, "bob")).unwrap();
        game.tick(10);
        game.tick(110);
        assert_eq!(game.phase(), Phase::Ended);
    }

    #[test]
    fn admin_stop_records_draw() {
        let mut game = started();
        game.request_phase(Phase::Ended).unwrap();
        assert_eq!(game.outcome().unwrap().winner, None);
        assert!(game.request_phase(Phase::Active).is_err());
    }

    #[test]
    fn frozen_after_end() {
        let mut game = started();
        game.request_phase(Phase::Ended).unwrap();
        game.action(GameAction::HealthChanged {
            player_id: 1,
            health: 3.0,
        })
        .unwrap();
        assert_eq!(game.player(1).unwrap().health, PlayerSlot::FULL_HEALTH);
    }

    #[test]
    fn flush_coalesces_changes_within_a_tick() {
        let mut game = started();
        let mut view = RecordingView::new();
        game.flush(&mut view);
        view.drain();

        for health in [18.0, 15.0, 12.0] {
            game.action(GameAction::HealthChanged {
                player_id: 2,
                health,
            })
            .unwrap();
        }
        let stats = game.flush(&mut view);

        assert_eq!(stats.failed, 0);
        let updates: Vec<_> = view.commands_between(1, 2).collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(game.flush(&mut view).pairs, 0);
    }

    #[test]
    fn rebalance_deferred_until_action_completes() {
        let mut game = Match::new(
            1,
            "alpha",
            MatchSettings {
                team_capacity: 4,
                min_players: 4,
                ..settings()
            },
            0,
        )
        .unwrap();
        for id in 1..=3 {
            game.join(PlayerRef::new(id, format!("p{id}"))).unwrap();
            game.assign_to(id, 0).unwrap();
        }
        for id in 1..=3 {
            game.action(GameAction::ActionStarted { player_id: id }).unwrap();
        }

        let report = game.rebalance();
        assert!(report.moves.is_empty());
        assert!(game.rebalance_pending());

        game.action(GameAction::ActionCompleted { player_id: 3 }).unwrap();
        assert!(!game.rebalance_pending());
        assert_eq!(game.teams().team_of(3), Some(1));
        assert_eq!(game.teams().team_of(2), Some(0));
    }
}
