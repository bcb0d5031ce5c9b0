pub mod config;
pub mod net;
pub mod player;
pub mod session;

pub use config::{
    ProtocolConfig, DEFAULT_INTERP_WINDOW_TICKS, DEFAULT_SEND_INTERVAL_TICKS, MAX_PLAYERS,
};
pub use net::{
    decode_frame, encode_frame, ConnectionState, FlagContext, FrameError, MemoryHub,
    MemoryTransport, PlayerFact, PlayerFlag, PlayerIntent, SessionEvent, SyncController,
    Transport, TransportStatus, HEADER_LEN,
};
pub use player::{InterpBuffer, Pawn, PlayerId, PlayerSlot, Role};
pub use session::{LobbyOrder, MatchStatus, Roster, WinResult};
