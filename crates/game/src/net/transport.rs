//! The transport seam. Connection establishment, relaying, and NAT
//! traversal live in an external component; the protocol layer only
//! needs the narrow surface below plus an in-process double for tests
//! and headless runs.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::player::PlayerId;

/// Transport lifecycle plus the failure codes surfaced to the owning
/// scene. The controller never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Offline,
    Connecting,
    Connected,
    VersionMismatch,
    RoomNotFound,
    Failed,
    PeerDisconnected,
}

impl TransportStatus {
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            TransportStatus::VersionMismatch
                | TransportStatus::RoomNotFound
                | TransportStatus::Failed
                | TransportStatus::PeerDisconnected
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportStatus::Offline => "offline",
            TransportStatus::Connecting => "connecting",
            TransportStatus::Connected => "connected",
            TransportStatus::VersionMismatch => "protocol version mismatch",
            TransportStatus::RoomNotFound => "room not found",
            TransportStatus::Failed => "transport failure",
            TransportStatus::PeerDisconnected => "peer disconnected",
        }
    }
}

/// What the external transport component must provide.
///
/// `receive` drains synchronously into the callback, zero or more
/// messages per call; an empty tick is simply no invocations. Nothing
/// here blocks and nothing spawns threads.
pub trait Transport {
    fn connect(&mut self, room_id: Option<&str>);
    fn send(&mut self, bytes: &[u8]);
    fn receive(&mut self, sink: &mut dyn FnMut(&[u8]));
    fn is_connected(&self) -> bool;
    fn room_id(&self) -> Option<String>;
    fn player_id(&self) -> Option<PlayerId>;
    fn status(&self) -> TransportStatus;
    fn peer_count(&self) -> usize;
}

#[derive(Debug, Default)]
struct HubState {
    queues: HashMap<PlayerId, VecDeque<Vec<u8>>>,
    room_id: String,
}

/// In-process stand-in for the relay: every endpoint's send fans out to
/// all other endpoints' inbound queues. Single logical thread, shared
/// queues behind `Rc<RefCell>`.
#[derive(Debug, Clone)]
pub struct MemoryHub {
    state: Rc<RefCell<HubState>>,
}

impl MemoryHub {
    pub fn new(room_id: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(HubState {
                queues: HashMap::new(),
                room_id: room_id.to_string(),
            })),
        }
    }

    pub fn endpoint(&self, id: PlayerId) -> MemoryTransport {
        MemoryTransport {
            state: Rc::clone(&self.state),
            id,
            status: TransportStatus::Offline,
        }
    }
}

#[derive(Debug)]
pub struct MemoryTransport {
    state: Rc<RefCell<HubState>>,
    id: PlayerId,
    status: TransportStatus,
}

impl MemoryTransport {
    /// Drop out of the hub; remaining endpoints see the peer count
    /// shrink.
    pub fn disconnect(&mut self) {
        self.state.borrow_mut().queues.remove(&self.id);
        self.status = TransportStatus::Offline;
    }

    /// Force a status, e.g. to exercise failure handling in tests.
    pub fn inject_status(&mut self, status: TransportStatus) {
        self.status = status;
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self, room_id: Option<&str>) {
        let mut hub = self.state.borrow_mut();
        if let Some(room) = room_id
            && hub.room_id != room
        {
            self.status = TransportStatus::RoomNotFound;
            return;
        }
        hub.queues.entry(self.id).or_default();
        self.status = TransportStatus::Connected;
    }

    fn send(&mut self, bytes: &[u8]) {
        if self.status != TransportStatus::Connected {
            log::debug!("dropping send while {}", self.status.as_str());
            return;
        }
        let mut hub = self.state.borrow_mut();
        for (&id, queue) in hub.queues.iter_mut() {
            if id != self.id {
                queue.push_back(bytes.to_vec());
            }
        }
    }

    fn receive(&mut self, sink: &mut dyn FnMut(&[u8])) {
        // Drain first so the callback can touch other endpoints on the
        // same hub without re-borrowing it.
        let drained: Vec<Vec<u8>> = {
            let mut hub = self.state.borrow_mut();
            match hub.queues.get_mut(&self.id) {
                Some(queue) => queue.drain(..).collect(),
                None => Vec::new(),
            }
        };
        for message in &drained {
            sink(message);
        }
    }

    fn is_connected(&self) -> bool {
        self.status == TransportStatus::Connected
    }

    fn room_id(&self) -> Option<String> {
        self.is_connected()
            .then(|| self.state.borrow().room_id.clone())
    }

    fn player_id(&self) -> Option<PlayerId> {
        self.is_connected().then_some(self.id)
    }

    fn status(&self) -> TransportStatus {
        self.status
    }

    fn peer_count(&self) -> usize {
        self.state.borrow().queues.len()
    }
}
