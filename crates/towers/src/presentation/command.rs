use rkyv::{Archive, Deserialize, Serialize};

use super::state::DisguiseProfile;
use crate::PlayerId;

/// One presentation packet for one observer. Immutable once built, so it can
/// cross to an I/O thread without sharing any match state.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PresentationCommand {
    SetDisguise {
        observer: PlayerId,
        target: PlayerId,
        profile: DisguiseProfile,
    },
    ClearDisguise {
        observer: PlayerId,
        target: PlayerId,
    },
    SetTabEntry {
        observer: PlayerId,
        target: PlayerId,
        display_name: String,
        visible: bool,
    },
}

impl PresentationCommand {
    pub fn observer(&self) -> PlayerId {
        match self {
            Self::SetDisguise { observer, .. }
            | Self::ClearDisguise { observer, .. }
            | Self::SetTabEntry { observer, .. } => *observer,
        }
    }

    pub fn target(&self) -> PlayerId {
        match self {
            Self::SetDisguise { target, .. }
            | Self::ClearDisguise { target, .. }
            | Self::SetTabEntry { target, .. } => *target,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetDisguise { .. } => "set_disguise",
            Self::ClearDisguise { .. } => "clear_disguise",
            Self::SetTabEntry { .. } => "set_tab_entry",
        }
    }
}
