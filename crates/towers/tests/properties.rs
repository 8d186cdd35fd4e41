use std::collections::HashSet;

use proptest::prelude::*;
use towers::{
    GameAction, MatchEvent, MatchSettings, Phase, PlayerRef, PresentationCommand, RecordingView,
    RegistrySettings, SessionRegistry, TeamRegistry, TieBreak,
};

#[derive(Debug, Clone)]
enum Op {
    Join(u32),
    Leave(u32),
    Capture(u32),
    Health(u32, u8),
    Busy(u32),
    Done(u32),
    Spectate(u32, bool),
    Rebalance,
    Reset,
    Tick,
}

fn op() -> impl Strategy<Value = Op> {
    let player = 1u32..10;
    prop_oneof![
        3 => player.clone().prop_map(Op::Join),
        1 => player.clone().prop_map(Op::Leave),
        2 => player.clone().prop_map(Op::Capture),
        1 => (player.clone(), 0u8..20).prop_map(|(p, h)| Op::Health(p, h)),
        1 => player.clone().prop_map(Op::Busy),
        1 => player.clone().prop_map(Op::Done),
        1 => (player, any::<bool>()).prop_map(|(p, s)| Op::Spectate(p, s)),
        1 => Just(Op::Rebalance),
        1 => Just(Op::Reset),
        4 => Just(Op::Tick),
    ]
}

fn registry() -> SessionRegistry {
    SessionRegistry::new(RegistrySettings {
        empty_grace_ticks: 6,
        default_match: MatchSettings {
            team_count: 2,
            team_capacity: 3,
            min_players: 2,
            countdown_ticks: 3,
            round_ticks: Some(12),
            points_to_win: Some(4),
            tie_break: TieBreak::Overtime { ticks: 4 },
            post_match_ticks: 2,
        },
    })
}

/// Applies the script and returns everything the host would have observed.
fn play(ops: &[Op]) -> (Vec<PresentationCommand>, Vec<MatchEvent>) {
    let mut sessions = registry();
    let mut view = RecordingView::new();

    for op in ops {
        let current = sessions.session_for_arena("arena");
        match (op, current) {
            (Op::Join(p), _) => {
                let _ = sessions.join("arena", PlayerRef::new(*p, format!("p{p}")));
            }
            (Op::Leave(p), _) => {
                let _ = sessions.leave(*p);
            }
            (Op::Capture(p), Some(id)) => {
                let _ = sessions.action(id, GameAction::ObjectiveCaptured { player_id: *p });
            }
            (Op::Health(p, h), Some(id)) => {
                let _ = sessions.action(
                    id,
                    GameAction::HealthChanged {
                        player_id: *p,
                        health: *h as f32,
                    },
                );
            }
            (Op::Busy(p), Some(id)) => {
                let _ = sessions.action(id, GameAction::ActionStarted { player_id: *p });
            }
            (Op::Done(p), Some(id)) => {
                let _ = sessions.action(id, GameAction::ActionCompleted { player_id: *p });
            }
            (Op::Spectate(p, s), Some(id)) => {
                if let Ok(game) = sessions.get_session_mut(id) {
                    let _ = game.set_spectator(*p, *s);
                }
            }
            (Op::Rebalance, Some(id)) => {
                let _ = sessions.rebalance(id);
            }
            (Op::Reset, Some(id)) => {
                let _ = sessions.reset(id);
            }
            (Op::Tick, _) => {
                sessions.tick(&mut view);
            }
            _ => {}
        }
        check_invariants(&sessions);
    }

    let events = sessions.drain_events().map(|e| e.event).collect();
    (view.drain(), events)
}

fn check_invariants(sessions: &SessionRegistry) {
    for game in sessions.sessions() {
        let mut seen = HashSet::new();
        for team in game.teams().teams() {
            assert!(team.len() <= 3);
            for &member in team.members() {
                assert!(seen.insert(member), "player {} on two teams", member);
                assert!(!game.player(member).unwrap().spectator);
            }
        }
        for spectator in game.spectators() {
            assert_eq!(game.teams().team_of(spectator), None);
        }
        if game.phase() == Phase::Lobby {
            assert!(game.standings().is_empty());
        }
    }
}

proptest! {
    #[test]
    fn prop_invariants_hold_under_any_script(ops in prop::collection::vec(op(), 0..80)) {
        play(&ops);
    }

    #[test]
    fn prop_same_script_same_output(ops in prop::collection::vec(op(), 0..60)) {
        let first = play(&ops);
        let second = play(&ops);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_phase_changes_follow_table(ops in prop::collection::vec(op(), 0..80)) {
        let (_, events) = play(&ops);
        for event in events {
            if let MatchEvent::PhaseChanged { transition, .. } = event {
                prop_assert_eq!(transition.from.next(transition.trigger), Some(transition.to));
            }
        }
    }

    #[test]
    fn prop_auto_assignment_picks_a_smallest_team(
        ops in prop::collection::vec((any::<bool>(), 0u32..12), 0..60)
    ) {
        let mut teams = TeamRegistry::new(4, 3);
        for (join, player) in ops {
            if !join {
                teams.remove(player);
                continue;
            }
            if teams.team_of(player).is_some() {
                continue;
            }
            let smallest = teams
                .teams()
                .iter()
                .filter(|t| !t.is_full())
                .map(|t| t.len())
                .min();
            match teams.assign(player) {
                Ok(team_id) => {
                    let len = teams.get(team_id).unwrap().len();
                    prop_assert_eq!(Some(len - 1), smallest);
                }
                Err(_) => prop_assert_eq!(smallest, None),
            }
        }
        prop_assert!(teams.player_count() <= 12);
    }

    #[test]
    fn prop_rebalance_evens_out_idle_teams(stacked in 0u32..6) {
        let mut teams = TeamRegistry::new(2, 6);
        for player in 0..stacked {
            teams.assign_to(player, 0).unwrap();
        }
        let report = teams.rebalance(|_| false);
        prop_assert!(!report.deferred);
        let a = teams.get(0).unwrap().len();
        let b = teams.get(1).unwrap().len();
        prop_assert!(a.abs_diff(b) <= 1);
    }
}
