use crate::config::MAX_PLAYERS;
use crate::player::{Pawn, PlayerId, PlayerSlot, Role};

/// Match phase as carried in every frame's metadata byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    None,
    Waiting,
    InProgress,
    Paused,
    Ended,
}

impl MatchStatus {
    pub fn as_u8(self) -> u8 {
        match self {
            MatchStatus::None => 0,
            MatchStatus::Waiting => 1,
            MatchStatus::InProgress => 2,
            MatchStatus::Paused => 3,
            MatchStatus::Ended => 4,
        }
    }

    /// Unknown bytes are malformed input, not a default.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MatchStatus::None),
            1 => Some(MatchStatus::Waiting),
            2 => Some(MatchStatus::InProgress),
            3 => Some(MatchStatus::Paused),
            4 => Some(MatchStatus::Ended),
            _ => None,
        }
    }
}

/// Outcome decided solely by the host and mirrored by everyone else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WinResult {
    #[default]
    Undefined,
    RunnersWin,
    ShadesWin,
}

impl WinResult {
    pub fn as_u8(self) -> u8 {
        match self {
            WinResult::Undefined => 0,
            WinResult::RunnersWin => 1,
            WinResult::ShadesWin => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(WinResult::Undefined),
            1 => Some(WinResult::RunnersWin),
            2 => Some(WinResult::ShadesWin),
            _ => None,
        }
    }
}

/// Role assignment order, decided once by the host and broadcast while
/// the lobby is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobbyOrder(pub [i32; MAX_PLAYERS]);

impl LobbyOrder {
    /// The canonical assignment used while randomization is switched
    /// off.
    pub fn fixed() -> Self {
        Self([3, 0, 1, 2])
    }

    pub fn shuffled() -> Self {
        let mut order = [0, 1, 2, 3];
        for i in (1..order.len()).rev() {
            let j = (rand_u64() % (i as u64 + 1)) as usize;
            order.swap(i, j);
        }
        Self(order)
    }
}

fn rand_u64() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::time::Instant;

    let mut hasher = DefaultHasher::new();
    Instant::now().hash(&mut hasher);
    hasher.finish()
}

/// The match-state model: every tracked player plus the host-owned
/// session facts. Serializer calls borrow it explicitly; nothing in the
/// protocol layer keeps ambient state.
#[derive(Debug)]
pub struct Roster<P: Pawn> {
    slots: Vec<PlayerSlot<P>>,
    local_id: Option<PlayerId>,
    host_id: PlayerId,
    status: MatchStatus,
    lobby_order: Option<LobbyOrder>,
    win_result: WinResult,
}

impl<P: Pawn> Roster<P> {
    pub fn new(host_id: PlayerId) -> Self {
        Self {
            slots: Vec::with_capacity(MAX_PLAYERS),
            local_id: None,
            host_id,
            status: MatchStatus::None,
            lobby_order: None,
            win_result: WinResult::Undefined,
        }
    }

    /// Add a player at match start. The slot set is fixed for the
    /// match; departures are surfaced upward, never repaired here.
    pub fn register(&mut self, id: PlayerId, role: Role, pawn: P) {
        assert!(id >= 0, "player ids are non-negative, got {id}");
        assert!(self.slot(id).is_none(), "duplicate player id {id}");
        assert!(self.slots.len() < MAX_PLAYERS, "roster is full");
        self.slots.push(PlayerSlot::new(id, role, pawn));
    }

    pub fn local_id(&self) -> Option<PlayerId> {
        self.local_id
    }

    pub fn set_local_id(&mut self, id: PlayerId) {
        self.local_id = Some(id);
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn is_host(&self) -> bool {
        self.local_id == Some(self.host_id)
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Local transitions, e.g. the host starting the match. These are
    /// sent, not received.
    pub fn set_status(&mut self, status: MatchStatus) {
        self.status = status;
    }

    /// Apply a status carried by an incoming frame. A differing status
    /// is adopted only from the host; from anyone else the frame must
    /// be discarded, which the `false` return signals.
    pub fn adopt_status(&mut self, status: MatchStatus, sender: PlayerId) -> bool {
        if status == self.status {
            return true;
        }
        if sender != self.host_id {
            return false;
        }
        self.status = status;
        true
    }

    pub fn lobby_order(&self) -> Option<LobbyOrder> {
        self.lobby_order
    }

    /// First write wins; a cached order is never overwritten.
    pub fn cache_lobby_order(&mut self, order: LobbyOrder) {
        if self.lobby_order.is_none() {
            self.lobby_order = Some(order);
        }
    }

    pub fn win_result(&self) -> WinResult {
        self.win_result
    }

    pub fn set_win_result(&mut self, result: WinResult) {
        self.win_result = result;
    }

    pub fn slot(&self, id: PlayerId) -> Option<&PlayerSlot<P>> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn slot_mut(&mut self, id: PlayerId) -> Option<&mut PlayerSlot<P>> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }

    pub fn slots(&self) -> &[PlayerSlot<P>] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [PlayerSlot<P>] {
        &mut self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Latch or clear the local intent about another player.
    pub fn set_intent(&mut self, target: PlayerId, active: bool) {
        if let Some(slot) = self.slot_mut(target) {
            slot.outgoing_intent = active;
        }
    }
}
