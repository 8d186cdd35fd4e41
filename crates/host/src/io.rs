use tokio::sync::mpsc::UnboundedReceiver;
use towers::{PresentationCommand, PresentationPacket};

#[derive(Debug, Clone, Copy, Default)]
pub struct IoStats {
    pub packets: u64,
    pub bytes: u64,
    pub errors: u64,
}

/// Encodes queued presentation commands until every sender is dropped.
pub async fn run_encoder(mut rx: UnboundedReceiver<PresentationCommand>) -> IoStats {
    let mut stats = IoStats::default();
    let mut sequence: u32 = 0;

    while let Some(command) = rx.recv().await {
        let observer = command.observer();
        let kind = command.kind();
        let packet = PresentationPacket::new(sequence, command);
        sequence = sequence.wrapping_add(1);

        match packet.encode() {
            Ok(bytes) => {
                stats.packets += 1;
                stats.bytes += bytes.len() as u64;
                log::trace!(
                    "Packet {} to {}: {} ({} bytes)",
                    packet.header.sequence,
                    observer,
                    kind,
                    bytes.len()
                );
            }
            Err(e) => {
                stats.errors += 1;
                log::warn!("Failed to encode {} for {}: {}", kind, observer, e);
            }
        }
    }

    stats
}
