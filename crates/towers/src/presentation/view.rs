use std::collections::HashSet;

use super::command::PresentationCommand;
use super::state::DisguiseProfile;
use crate::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendFailure {
    #[error("observer {0} is not connected")]
    ObserverDisconnected(PlayerId),
    #[error("presentation queue closed")]
    QueueClosed,
}

/// Per-observer presentation sink backed by the host's packet layer.
///
/// Sends are fire-and-forget. A failure only means the observer's client may
/// now be out of date; the match marks the entry stale and resends on the
/// next change.
pub trait PacketView {
    fn send(&mut self, command: PresentationCommand) -> Result<(), SendFailure>;

    fn set_disguise(
        &mut self,
        observer: PlayerId,
        target: PlayerId,
        profile: &DisguiseProfile,
    ) -> Result<(), SendFailure> {
        self.send(PresentationCommand::SetDisguise {
            observer,
            target,
            profile: profile.clone(),
        })
    }

    fn clear_disguise(&mut self, observer: PlayerId, target: PlayerId) -> Result<(), SendFailure> {
        self.send(PresentationCommand::ClearDisguise { observer, target })
    }

    fn set_tab_entry(
        &mut self,
        observer: PlayerId,
        target: PlayerId,
        display_name: &str,
        visible: bool,
    ) -> Result<(), SendFailure> {
        self.send(PresentationCommand::SetTabEntry {
            observer,
            target,
            display_name: display_name.to_string(),
            visible,
        })
    }
}

/// Keeps every command in send order. Observers marked disconnected fail.
#[derive(Debug, Default)]
pub struct RecordingView {
    commands: Vec<PresentationCommand>,
    disconnected: HashSet<PlayerId>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disconnect(&mut self, observer: PlayerId) {
        self.disconnected.insert(observer);
    }

    pub fn reconnect(&mut self, observer: PlayerId) {
        self.disconnected.remove(&observer);
    }

    pub fn commands(&self) -> &[PresentationCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> Vec<PresentationCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn commands_between(
        &self,
        observer: PlayerId,
        target: PlayerId,
    ) -> impl Iterator<Item = &PresentationCommand> {
        self.commands
            .iter()
            .filter(move |c| c.observer() == observer && c.target() == target)
    }
}

impl PacketView for RecordingView {
    fn send(&mut self, command: PresentationCommand) -> Result<(), SendFailure> {
        let observer = command.observer();
        if self.disconnected.contains(&observer) {
            return Err(SendFailure::ObserverDisconnected(observer));
        }
        self.commands.push(command);
        Ok(())
    }
}
