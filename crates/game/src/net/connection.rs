//! Tick scheduler and connection controller.
//!
//! Owns the transport handle and the roster, drains inbound frames
//! every local tick, runs the interpolator, and transmits the local
//! frame on a fixed tick cadence. Everything is tick-counted rather
//! than wall-clock so behavior is deterministic under test.

use crate::config::ProtocolConfig;
use crate::player::{Pawn, PlayerId};
use crate::session::Roster;

use super::frame;
use super::interpolation;
use super::transport::{Transport, TransportStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Pending,
    Connected,
}

/// Surfaced to the owning scene each tick. The controller never acts on
/// these itself: reconnecting, fallback scenes, and reconnect UI are
/// the caller's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected { player_id: PlayerId },
    Disconnected { status: TransportStatus },
    PeerCountDropped { expected: usize, actual: usize },
}

pub struct SyncController<P: Pawn, T: Transport> {
    transport: T,
    roster: Roster<P>,
    config: ProtocolConfig,
    state: ConnectionState,
    send_counter: u32,
    last_peer_count: usize,
}

impl<P: Pawn, T: Transport> SyncController<P, T> {
    pub fn new(transport: T, roster: Roster<P>, config: ProtocolConfig) -> Self {
        Self {
            transport,
            roster,
            config,
            state: ConnectionState::Disconnected,
            send_counter: 0,
            last_peer_count: 0,
        }
    }

    pub fn connect(&mut self, room_id: Option<&str>) {
        if self.state != ConnectionState::Disconnected {
            return;
        }
        log::info!("connecting to room {}", room_id.unwrap_or("<default>"));
        self.transport.connect(room_id);
        self.state = ConnectionState::Pending;
    }

    /// A state transition, not an interrupt; the transport handle is
    /// simply no longer driven.
    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.send_counter = 0;
    }

    /// One local update tick. Returns the events the owning scene must
    /// react to.
    pub fn update(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match self.state {
            ConnectionState::Disconnected => {}
            ConnectionState::Pending => self.poll_handshake(&mut events),
            ConnectionState::Connected => self.tick(&mut events),
        }
        events
    }

    fn poll_handshake(&mut self, events: &mut Vec<SessionEvent>) {
        let status = self.transport.status();
        if status.is_failure() {
            log::warn!("connection failed: {}", status.as_str());
            self.state = ConnectionState::Disconnected;
            events.push(SessionEvent::Disconnected { status });
            return;
        }
        if !self.transport.is_connected() {
            return;
        }

        self.state = ConnectionState::Connected;
        self.send_counter = 0;
        self.last_peer_count = self.transport.peer_count();
        if let Some(player_id) = self.transport.player_id() {
            self.roster.set_local_id(player_id);
            log::info!("connected as player {player_id}");
            events.push(SessionEvent::Connected { player_id });
        }
    }

    fn tick(&mut self, events: &mut Vec<SessionEvent>) {
        let status = self.transport.status();
        if status.is_failure() || !self.transport.is_connected() {
            log::warn!("connection lost: {}", status.as_str());
            self.state = ConnectionState::Disconnected;
            events.push(SessionEvent::Disconnected { status });
            return;
        }

        self.drain_inbound();
        interpolation::advance(&mut self.roster, &self.config);

        self.send_counter += 1;
        if self.send_counter >= self.config.send_interval_ticks {
            self.send_counter = 0;
            let bytes = frame::encode_frame(&mut self.roster, &self.config);
            if !bytes.is_empty() {
                self.transport.send(&bytes);
            }
        }

        // Shrinkage is reported once per drop, never repaired here.
        let peers = self.transport.peer_count();
        if peers < self.last_peer_count {
            log::warn!(
                "peer count dropped to {peers}, expected {}",
                self.roster.len()
            );
            events.push(SessionEvent::PeerCountDropped {
                expected: self.roster.len(),
                actual: peers,
            });
        }
        self.last_peer_count = peers;
    }

    fn drain_inbound(&mut self) {
        let Self {
            transport, roster, ..
        } = self;
        transport.receive(&mut |bytes| {
            if let Err(err) = frame::decode_frame(bytes, roster) {
                log::debug!("dropping frame: {err}");
            }
        });
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn room_id(&self) -> Option<String> {
        self.transport.room_id()
    }

    pub fn num_players(&self) -> usize {
        self.roster.len()
    }

    pub fn roster(&self) -> &Roster<P> {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster<P> {
        &mut self.roster
    }
}
