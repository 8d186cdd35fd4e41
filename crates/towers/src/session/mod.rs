use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::{MatchSettings, RegistrySettings};
use crate::error::MatchError;
use crate::event::{CloseReason, EventQueue, GameAction, MatchEvent, QueuedEvent};
use crate::orchestrator::{FlushStats, Match, PlayerRef, SharedPolicy};
use crate::phase::{Phase, PhaseTransition};
use crate::presentation::{PacketView, TowersVisibility};
use crate::team::Rebalance;
use crate::{ArenaId, MatchId, PlayerId, TeamId};

/// Owns every live match, at most one per arena, and tracks which match
/// each player is in.
pub struct SessionRegistry {
    settings: RegistrySettings,
    policy: SharedPolicy,
    matches: BTreeMap<MatchId, Match>,
    arenas: HashMap<ArenaId, MatchId>,
    player_sessions: HashMap<PlayerId, MatchId>,
    next_match_id: MatchId,
    tick: u64,
    events: EventQueue,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistrySettings::default())
    }
}

impl SessionRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self::with_policy(settings, Arc::new(TowersVisibility))
    }

    pub fn with_policy(settings: RegistrySettings, policy: SharedPolicy) -> Self {
        Self {
            settings,
            policy,
            matches: BTreeMap::new(),
            arenas: HashMap::new(),
            player_sessions: HashMap::new(),
            next_match_id: 1,
            tick: 0,
            events: EventQueue::default(),
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Match> {
        self.matches.values()
    }

    pub fn create_session(&mut self, arena: impl Into<ArenaId>) -> Result<MatchId, MatchError> {
        let settings = self.settings.default_match.clone();
        self.create_session_with(arena, settings)
    }

    pub fn create_session_with(
        &mut self,
        arena: impl Into<ArenaId>,
        settings: MatchSettings,
    ) -> Result<MatchId, MatchError> {
        let arena = arena.into();
        if let Some(&existing) = self.arenas.get(&arena) {
            return Err(MatchError::DuplicateSession { arena, existing });
        }

        let match_id = self.next_match_id;
        let game = Match::with_policy(
            match_id,
            arena.clone(),
            settings,
            self.tick,
            Arc::clone(&self.policy),
        )?;
        self.next_match_id += 1;

        log::info!(
            "Created match {} in arena {} ({})",
            match_id,
            arena,
            game.settings().team_setup_label()
        );
        self.events.push(
            self.tick,
            MatchEvent::SessionCreated {
                match_id,
                arena: arena.clone(),
            },
        );
        self.arenas.insert(arena, match_id);
        self.matches.insert(match_id, game);
        Ok(match_id)
    }

    pub fn get_session(&self, match_id: MatchId) -> Result<&Match, MatchError> {
        self.matches
            .get(&match_id)
            .ok_or(MatchError::SessionNotFound(match_id))
    }

    pub fn get_session_mut(&mut self, match_id: MatchId) -> Result<&mut Match, MatchError> {
        self.matches
            .get_mut(&match_id)
            .ok_or(MatchError::SessionNotFound(match_id))
    }

    pub fn session_for_arena(&self, arena: &str) -> Option<MatchId> {
        self.arenas.get(arena).copied()
    }

    pub fn session_of(&self, player_id: PlayerId) -> Option<MatchId> {
        self.player_sessions.get(&player_id).copied()
    }

    /// Tears a match down. Removing an unknown match is a no-op.
    pub fn remove_session(&mut self, match_id: MatchId) -> bool {
        self.close(match_id, CloseReason::Removed)
    }

    fn close(&mut self, match_id: MatchId, reason: CloseReason) -> bool {
        let Some(mut game) = self.matches.remove(&match_id) else {
            return false;
        };
        self.arenas.remove(game.arena());

        let players: Vec<PlayerId> = game.player_ids().collect();
        for player_id in &players {
            self.player_sessions.remove(player_id);
        }

        game.take_events(&mut self.events);
        log::info!(
            "Closed match {} in arena {}: {}",
            match_id,
            game.arena(),
            reason.as_str()
        );
        self.events.push(
            self.tick,
            MatchEvent::SessionClosed {
                match_id,
                reason,
                players,
            },
        );
        true
    }

    /// Puts a player into the match running in `arena`, creating one if needed.
    pub fn join(&mut self, arena: &str, player: PlayerRef) -> Result<MatchId, MatchError> {
        if let Some(&session) = self.player_sessions.get(&player.id) {
            return Err(MatchError::AlreadyInSession {
                player: player.id,
                session,
            });
        }

        let match_id = match self.session_for_arena(arena) {
            Some(id) => id,
            None => self.create_session(arena)?,
        };
        let player_id = player.id;
        self.get_session_mut(match_id)?.join(player)?;
        self.player_sessions.insert(player_id, match_id);
        Ok(match_id)
    }

    pub fn join_spectator(&mut self, match_id: MatchId, player: PlayerRef) -> Result<(), MatchError> {
        if let Some(&session) = self.player_sessions.get(&player.id) {
            return Err(MatchError::AlreadyInSession {
                player: player.id,
                session,
            });
        }
        let player_id = player.id;
        self.get_session_mut(match_id)?.join_spectator(player)?;
        self.player_sessions.insert(player_id, match_id);
        Ok(())
    }

    pub fn leave(&mut self, player_id: PlayerId) -> Result<MatchId, MatchError> {
        let match_id = self
            .session_of(player_id)
            .ok_or(MatchError::PlayerNotFound(player_id))?;
        self.get_session_mut(match_id)?.leave(player_id)?;
        self.player_sessions.remove(&player_id);
        Ok(match_id)
    }

    pub fn action(&mut self, match_id: MatchId, action: GameAction) -> Result<(), MatchError> {
        self.get_session_mut(match_id)?.action(action)
    }

    pub fn assign_to(
        &mut self,
        match_id: MatchId,
        player_id: PlayerId,
        team_id: TeamId,
    ) -> Result<(), MatchError> {
        self.get_session_mut(match_id)?.assign_to(player_id, team_id)
    }

    pub fn rebalance(&mut self, match_id: MatchId) -> Result<Rebalance, MatchError> {
        Ok(self.get_session_mut(match_id)?.rebalance())
    }

    pub fn reset(&mut self, match_id: MatchId) -> Result<PhaseTransition, MatchError> {
        Ok(self.get_session_mut(match_id)?.reset())
    }

    pub fn request_phase(
        &mut self,
        match_id: MatchId,
        target: Phase,
    ) -> Result<PhaseTransition, MatchError> {
        self.get_session_mut(match_id)?.request_phase(target)
    }

    /// Runs one host tick: advances every match in id order, flushes its
    /// presentation changes and closes matches that are done.
    pub fn tick<V: PacketView + ?Sized>(&mut self, view: &mut V) -> FlushStats {
        self.tick += 1;
        let now = self.tick;
        let mut total = FlushStats::default();

        for game in self.matches.values_mut() {
            game.tick(now);
            let stats = game.flush(view);
            total.pairs += stats.pairs;
            total.sent += stats.sent;
            total.failed += stats.failed;
            game.take_events(&mut self.events);
        }

        self.sweep(now);
        total
    }

    /// Closes matches whose post-match delay is over and matches that stayed
    /// empty longer than the grace window.
    pub fn sweep(&mut self, now: u64) -> Vec<(MatchId, CloseReason)> {
        let grace = self.settings.empty_grace_ticks as u64;
        let closing: Vec<(MatchId, CloseReason)> = self
            .matches
            .values()
            .filter_map(|game| {
                if game.is_expired(now) {
                    Some((game.id(), CloseReason::PostMatchElapsed))
                } else if game.empty_for(now).is_some_and(|ticks| ticks >= grace) {
                    Some((game.id(), CloseReason::EmptyGrace))
                } else {
                    None
                }
            })
            .collect();

        for &(match_id, reason) in &closing {
            self.close(match_id, reason);
        }
        closing
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = QueuedEvent> + '_ {
        for game in self.matches.values_mut() {
            game.take_events(&mut self.events);
        }
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::RecordingView;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(RegistrySettings {
            empty_grace_ticks: 3,
            default_match: MatchSettings {
                countdown_ticks: 2,
                round_ticks: Some(10),
                post_match_ticks: 2,
                ..MatchSettings::default()
            },
        })
    }

    #[test]
    fn one_session_per_arena() {
        let mut sessions = registry();
        let id = sessions.create_session("alpha").unwrap();
        assert_eq!(
            sessions.create_session("alpha"),
            Err(MatchError::DuplicateSession {
                arena: "alpha".to_string(),
                existing: id
            })
        );
        assert!(sessions.create_session("beta").is_ok());
    }

    #[test]
    fn unknown_session() {
        let mut sessions = registry();
        assert!(matches!(
            sessions.get_session(9),
            Err(MatchError::SessionNotFound(9))
        ));
        assert!(!sessions.remove_session(9));
        assert_eq!(
            sessions.action(9, GameAction::TeamEliminated { team_id: 0 }),
            Err(MatchError::SessionNotFound(9))
        );
    }

    #[test]
    fn player_in_one_session_at_a_time() {
        let mut sessions = registry();
        let alpha = sessions.join("alpha", PlayerRef::new(1, "alice")).unwrap();
        assert_eq!(
            sessions.join("beta", PlayerRef::new(1, "alice")),
            Err(MatchError::AlreadyInSession {
                player: 1,
                session: alpha
            })
        );
        assert_eq!(sessions.leave(1), Ok(alpha));
        assert!(sessions.join("beta", PlayerRef::new(1, "alice")).is_ok());
    }

    #[test]
    fn empty_session_closes_after_grace() {
        let mut sessions = registry();
        let mut view = RecordingView::new();
        let id = sessions.create_session("alpha").unwrap();

        sessions.tick(&mut view);
        sessions.tick(&mut view);
        assert!(sessions.get_session(id).is_ok());
        sessions.tick(&mut view);
        assert!(sessions.get_session(id).is_err());
        assert_eq!(sessions.session_for_arena("alpha"), None);

        let closed = sessions
            .drain_events()
            .any(|e| matches!(e.event, MatchEvent::SessionClosed { reason: CloseReason::EmptyGrace, .. }));
        assert!(closed);
    }

    #[test]
    fn removal_releases_players() {
        let mut sessions = registry();
        let id = sessions.join("alpha", PlayerRef::new(1, "alice")).unwrap();
        assert!(sessions.remove_session(id));
        assert_eq!(sessions.session_of(1), None);
        assert!(sessions.join("alpha", PlayerRef::new(1, "alice")).is_ok());
    }
}
