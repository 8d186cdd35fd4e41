use std::collections::HashSet;

use tokio::sync::mpsc::UnboundedSender;
use towers::{PacketView, PlayerId, PresentationCommand, SendFailure};

/// Hands presentation commands to the I/O task in send order.
///
/// Commands are plain values; no match state crosses the channel.
pub struct ChannelView {
    tx: UnboundedSender<PresentationCommand>,
    connected: HashSet<PlayerId>,
}

impl ChannelView {
    pub fn new(tx: UnboundedSender<PresentationCommand>) -> Self {
        Self {
            tx,
            connected: HashSet::new(),
        }
    }

    pub fn connect(&mut self, player_id: PlayerId) {
        self.connected.insert(player_id);
    }

    pub fn disconnect(&mut self, player_id: PlayerId) {
        self.connected.remove(&player_id);
    }
}

impl PacketView for ChannelView {
    fn send(&mut self, command: PresentationCommand) -> Result<(), SendFailure> {
        let observer = command.observer();
        if !self.connected.contains(&observer) {
            return Err(SendFailure::ObserverDisconnected(observer));
        }
        self.tx.send(command).map_err(|_| SendFailure::QueueClosed)
    }
}
