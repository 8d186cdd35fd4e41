use super::state::{DisguiseProfile, PresentedView, TabEntry};
use crate::phase::Phase;
use crate::team::Team;
use crate::PlayerId;

/// A player as seen by the visibility policy.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub id: PlayerId,
    pub name: &'a str,
    pub team: Option<&'a Team>,
    pub spectator: bool,
    pub disguise_id: &'a str,
    pub health: f32,
    pub name_hidden: bool,
}

impl Subject<'_> {
    pub fn is_teammate_of(&self, other: &Subject<'_>) -> bool {
        match (self.team, other.team) {
            (Some(a), Some(b)) => a.id == b.id,
            _ => false,
        }
    }
}

/// Decides, per observer, how a target should be presented.
pub trait VisibilityPolicy {
    fn present(&self, phase: Phase, observer: &Subject<'_>, target: &Subject<'_>) -> PresentedView;
}

/// Opponents are disguised while combat is allowed; teammates and
/// spectators always see the real player. Spectators are hidden from the
/// tab list of everyone still playing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TowersVisibility;

impl TowersVisibility {
    fn nameplate(target: &Subject<'_>) -> Vec<String> {
        if target.name_hidden {
            return Vec::new();
        }
        match target.team {
            Some(team) => vec![
                format!("<#{}>{}", team.color.primary_hex(), team.display_name()),
                target.name.to_string(),
                format!("<red>{:.1} <dark_red>\u{2764}", target.health),
            ],
            None => vec![target.name.to_string()],
        }
    }

    fn tab_name(target: &Subject<'_>) -> String {
        match target.team {
            Some(team) => format!("{} {}", team.display_name(), target.name),
            None => target.name.to_string(),
        }
    }
}

impl VisibilityPolicy for TowersVisibility {
    fn present(&self, phase: Phase, observer: &Subject<'_>, target: &Subject<'_>) -> PresentedView {
        let is_self = observer.id == target.id;

        let disguised = !is_self
            && phase.allows_combat()
            && !observer.spectator
            && !target.spectator
            && !observer.is_teammate_of(target);

        let disguise = disguised.then(|| DisguiseProfile {
            id: target.disguise_id.to_string(),
            display_name: target.name.to_string(),
            nameplate: Self::nameplate(target),
        });

        let tab = TabEntry {
            display_name: Self::tab_name(target),
            visible: is_self || observer.spectator || !target.spectator,
        };

        PresentedView { disguise, tab }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::TeamRegistry;

    fn subject<'a>(id: PlayerId, name: &'a str, team: Option<&'a Team>) -> Subject<'a> {
        Subject {
            id,
            name,
            team,
            spectator: team.is_none(),
            disguise_id: name,
            health: 20.0,
            name_hidden: false,
        }
    }

    #[test]
    fn opponents_disguised_only_in_combat() {
        let teams = TeamRegistry::new(2, 4);
        let red = teams.get(0);
        let blue = teams.get(1);
        let alice = subject(1, "alice", red);
        let bob = subject(2, "bob", blue);
        let carol = subject(3, "carol", red);

        let policy = TowersVisibility;
        assert!(policy.present(Phase::Lobby, &alice, &bob).disguise.is_none());

        let view = policy.present(Phase::Active, &alice, &bob);
        let profile = view.disguise.unwrap();
        assert_eq!(profile.id, "bob");
        assert_eq!(profile.nameplate[0], "<#0094FF>[BLUE]");
        assert_eq!(profile.nameplate[2], "<red>20.0 <dark_red>\u{2764}");
        assert_eq!(view.tab.display_name, "[BLUE] bob");

        assert!(policy.present(Phase::Active, &alice, &carol).disguise.is_none());
        assert!(policy.present(Phase::Active, &alice, &alice).disguise.is_none());
        assert!(policy.present(Phase::Ended, &alice, &bob).disguise.is_none());
    }

    #[test]
    fn spectators_see_everything_and_are_hidden() {
        let teams = TeamRegistry::new(2, 4);
        let alice = subject(1, "alice", teams.get(0));
        let ghost = subject(9, "ghost", None);

        let policy = TowersVisibility;
        let seen_by_ghost = policy.present(Phase::Active, &ghost, &alice);
        assert!(seen_by_ghost.disguise.is_none());
        assert!(seen_by_ghost.tab.visible);

        let ghost_seen = policy.present(Phase::Active, &alice, &ghost);
        assert!(!ghost_seen.tab.visible);
        assert!(policy.present(Phase::Active, &ghost, &ghost).tab.visible);
    }

    #[test]
    fn hidden_name_empties_nameplate() {
        let teams = TeamRegistry::new(2, 4);
        let alice = subject(1, "alice", teams.get(0));
        let mut bob = subject(2, "bob", teams.get(1));
        bob.name_hidden = true;

        let view = TowersVisibility.present(Phase::Overtime, &alice, &bob);
        assert!(view.disguise.unwrap().nameplate.is_empty());
    }
}
