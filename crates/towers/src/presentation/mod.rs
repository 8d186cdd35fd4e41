mod command;
mod policy;
mod state;
mod view;
mod wire;

pub use command::PresentationCommand;
pub use policy::{Subject, TowersVisibility, VisibilityPolicy};
pub use state::{
    DisguiseProfile, PresentationState, PresentationTable, PresentedView, Reconciled, TabEntry,
};
pub use view::{PacketView, RecordingView, SendFailure};
pub use wire::{
    PresentationHeader, PresentationPacket, WireError, PRESENTATION_MAGIC, PRESENTATION_VERSION,
};
