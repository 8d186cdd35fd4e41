use std::collections::BTreeMap;

use super::view::PacketView;
use crate::PlayerId;

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize,
)]
#[rkyv(derive(Debug))]
pub struct DisguiseProfile {
    pub id: String,
    pub display_name: String,
    /// Lines shown above the target's head, top to bottom.
    pub nameplate: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabEntry {
    pub display_name: String,
    pub visible: bool,
}

/// What an observer should currently see of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedView {
    pub disguise: Option<DisguiseProfile>,
    pub tab: TabEntry,
}

/// What an observer was last sent about a target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationState {
    pub disguise: Option<DisguiseProfile>,
    pub tab: Option<TabEntry>,
    /// A send failed; the next reconcile resends regardless of equality.
    pub stale: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub sent: u32,
    pub failed: bool,
}

/// Presentation state keyed by `(observer, target)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationTable {
    entries: BTreeMap<(PlayerId, PlayerId), PresentationState>,
}

impl PresentationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, observer: PlayerId, target: PlayerId) -> Option<&PresentationState> {
        self.entries.get(&(observer, target))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(PlayerId, PlayerId), &PresentationState)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stale_count(&self) -> usize {
        self.entries.values().filter(|s| s.stale).count()
    }

    /// Drops every entry where the player is the observer or the target.
    pub fn remove_player(&mut self, player_id: PlayerId) {
        self.entries
            .retain(|&(observer, target), _| observer != player_id && target != player_id);
    }

    /// Empties the table, returning the disguises still shown.
    pub fn clear(&mut self) -> Vec<(PlayerId, PlayerId, DisguiseProfile)> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .filter_map(|((observer, target), state)| {
                state.disguise.map(|profile| (observer, target, profile))
            })
            .collect()
    }

    /// Records that `profile` may still be shown although a clear was
    /// attempted. The next reconcile of the pair resends everything.
    pub fn restore_stale(&mut self, observer: PlayerId, target: PlayerId, profile: DisguiseProfile) {
        self.entries.insert(
            (observer, target),
            PresentationState {
                disguise: Some(profile),
                tab: None,
                stale: true,
            },
        );
    }

    /// Sends whatever differs between the last sent state and `desired`.
    pub fn reconcile<V: PacketView + ?Sized>(
        &mut self,
        observer: PlayerId,
        target: PlayerId,
        desired: &PresentedView,
        view: &mut V,
    ) -> Reconciled {
        let entry = self.entries.entry((observer, target)).or_default();
        let force = entry.stale;
        let mut result = Reconciled::default();

        if force || entry.disguise != desired.disguise {
            let sent = match (&desired.disguise, &entry.disguise) {
                (Some(profile), _) => Some(view.set_disguise(observer, target, profile)),
                (None, Some(_)) => Some(view.clear_disguise(observer, target)),
                (None, None) => None,
            };
            match sent {
                Some(Ok(())) => {
                    entry.disguise = desired.disguise.clone();
                    result.sent += 1;
                }
                Some(Err(e)) => {
                    log::warn!(
                        "Disguise update for observer {} about {} failed: {}",
                        observer,
                        target,
                        e
                    );
                    result.failed = true;
                }
                None => {}
            }
        }

        if force || entry.tab.as_ref() != Some(&desired.tab) {
            match view.set_tab_entry(
                observer,
                target,
                &desired.tab.display_name,
                desired.tab.visible,
            ) {
                Ok(()) => {
                    entry.tab = Some(desired.tab.clone());
                    result.sent += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Tab entry update for observer {} about {} failed: {}",
                        observer,
                        target,
                        e
                    );
                    result.failed = true;
                }
            }
        }

        entry.stale = result.failed;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{PresentationCommand, RecordingView};

    fn profile() -> DisguiseProfile {
        DisguiseProfile {
            id: "knight".to_string(),
            display_name: "Knight".to_string(),
            nameplate: vec!["[RED]".to_string()],
        }
    }

    fn tab(name: &str) -> TabEntry {
        TabEntry {
            display_name: name.to_string(),
            visible: true,
        }
    }

    #[test]
    fn reconcile_sends_only_changes() {
        let mut table = PresentationTable::new();
        let mut view = RecordingView::new();
        let desired = PresentedView {
            disguise: Some(profile()),
            tab: tab("alice"),
        };

        assert_eq!(table.reconcile(1, 2, &desired, &mut view).sent, 2);
        assert_eq!(table.reconcile(1, 2, &desired, &mut view).sent, 0);

        let revealed = PresentedView {
            disguise: None,
            tab: tab("alice"),
        };
        assert_eq!(table.reconcile(1, 2, &revealed, &mut view).sent, 1);
        assert_eq!(
            view.commands().last(),
            Some(&PresentationCommand::ClearDisguise {
                observer: 1,
                target: 2
            })
        );
    }

    #[test]
    fn failed_send_marks_stale_and_resends() {
        let mut table = PresentationTable::new();
        let mut view = RecordingView::new();
        let desired = PresentedView {
            disguise: Some(profile()),
            tab: tab("alice"),
        };

        view.disconnect(1);
        let result = table.reconcile(1, 2, &desired, &mut view);
        assert!(result.failed);
        assert_eq!(table.stale_count(), 1);
        assert_eq!(table.get(1, 2).unwrap().disguise, None);

        view.reconnect(1);
        let result = table.reconcile(1, 2, &desired, &mut view);
        assert!(!result.failed);
        assert_eq!(result.sent, 2);
        assert_eq!(table.stale_count(), 0);
    }

    #[test]
    fn clear_reports_disguised_pairs() {
        let mut table = PresentationTable::new();
        let mut view = RecordingView::new();
        let disguised = PresentedView {
            disguise: Some(profile()),
            tab: tab("alice"),
        };
        let plain = PresentedView {
            disguise: None,
            tab: tab("bob"),
        };

        table.reconcile(1, 2, &disguised, &mut view);
        table.reconcile(2, 1, &plain, &mut view);
        table.reconcile(3, 1, &plain, &mut view);
        table.remove_player(3);
        assert_eq!(table.len(), 2);

        assert_eq!(table.clear(), vec![(1, 2, profile())]);
        assert!(table.is_empty());
    }

    #[test]
    fn restored_entry_resends_clear() {
        let mut table = PresentationTable::new();
        let mut view = RecordingView::new();
        table.restore_stale(1, 2, profile());
        assert_eq!(table.stale_count(), 1);

        let plain = PresentedView {
            disguise: None,
            tab: tab("bob"),
        };
        let result = table.reconcile(1, 2, &plain, &mut view);
        assert_eq!(result.sent, 2);
        assert_eq!(
            view.commands().first(),
            Some(&PresentationCommand::ClearDisguise {
                observer: 1,
                target: 2
            })
        );
        assert_eq!(table.stale_count(), 0);
    }
}
