use serde::{Deserialize, Serialize};

/// Hard cap on tracked players; the lobby order is wired as exactly
/// this many ints.
pub const MAX_PLAYERS: usize = 4;

pub const DEFAULT_SEND_INTERVAL_TICKS: u32 = 12;
pub const DEFAULT_INTERP_WINDOW_TICKS: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Local update ticks between outgoing frames.
    pub send_interval_ticks: u32,
    /// Ticks over which a received position is blended in.
    pub interp_window_ticks: u32,
    /// Shuffle the lobby role order instead of using the fixed
    /// canonical assignment.
    pub randomize_lobby_order: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            send_interval_ticks: DEFAULT_SEND_INTERVAL_TICKS,
            interp_window_ticks: DEFAULT_INTERP_WINDOW_TICKS,
            randomize_lobby_order: false,
        }
    }
}
