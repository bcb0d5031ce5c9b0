pub mod codec;
pub mod connection;
pub mod frame;
pub mod interpolation;
pub mod transport;

pub use connection::{ConnectionState, SessionEvent, SyncController};
pub use frame::{
    decode_frame, encode_frame, FlagContext, FrameError, PlayerFact, PlayerFlag, PlayerIntent,
    HEADER_LEN,
};
pub use transport::{MemoryHub, MemoryTransport, Transport, TransportStatus};
