use rkyv::{rancor, Archive, Deserialize, Serialize};

use super::command::PresentationCommand;

pub const PRESENTATION_MAGIC: u32 = 0x5457_5253;
pub const PRESENTATION_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PresentationHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u32,
}

impl PresentationHeader {
    pub fn new(sequence: u32) -> Self {
        Self {
            magic: PRESENTATION_MAGIC,
            version: PRESENTATION_VERSION,
            sequence,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PRESENTATION_MAGIC && self.version == PRESENTATION_VERSION
    }
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PresentationPacket {
    pub header: PresentationHeader,
    pub command: PresentationCommand,
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("unexpected packet header")]
    BadHeader,
}

impl PresentationPacket {
    pub fn new(sequence: u32, command: PresentationCommand) -> Self {
        Self {
            header: PresentationHeader::new(sequence),
            command,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(WireError::Serialize)
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        let packet =
            rkyv::from_bytes::<Self, rancor::Error>(data).map_err(WireError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(WireError::BadHeader);
        }
        Ok(packet)
    }
}
