//! One frame per cadence tick: 5 bytes of metadata followed by a
//! payload picked by the match phase.
//!
//! ```text
//! [1B status][4B sender id] | payload(status)
//! Waiting:     [16B lobby order]                    host only, else absent
//! InProgress:  [8B position][8B direction][1B per other player][map]
//! Paused:      absent
//! Ended:       [1B winner code]
//! ```

use crate::config::ProtocolConfig;
use crate::player::{Pawn, PlayerId, Role};
use crate::session::{LobbyOrder, MatchStatus, Roster, WinResult};

use super::codec;

/// Wire metadata: 1-byte status plus 4-byte sender id.
pub const HEADER_LEN: usize = 1 + codec::INT_WIDTH;

const LOBBY_ORDER_LEN: usize = crate::config::MAX_PLAYERS * codec::INT_WIDTH;

/// Reasons an incoming frame is dropped. The controller logs these and
/// moves on; none of them are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame shorter than the {HEADER_LEN}-byte header")]
    Truncated,
    #[error("unknown match status byte {0}")]
    UnknownStatus(u8),
    #[error("negative sender id {0}")]
    InvalidSender(PlayerId),
    #[error("status change from non-host player {0}")]
    NotAuthoritative(PlayerId),
}

/// Who a flag byte came from; decides how it may be interpreted.
#[derive(Debug, Clone, Copy)]
pub struct FlagContext {
    pub sender_is_host: bool,
    pub sender_role: Role,
}

/// Ground truth broadcast by the host, typed by the target's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerFact {
    Frozen(bool),
    Revealed(bool),
}

/// A client request, typed by the sender's own role. Only the host may
/// act on these, and only after checking them against its own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerIntent {
    Thaw(bool),
    Reveal(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerFlag {
    Fact(PlayerFact),
    Intent(PlayerIntent),
}

impl PlayerFlag {
    /// The same wire bit means a different thing depending on who sent
    /// it. Clients never assert global truth; only the host's bytes
    /// decode to facts.
    pub fn interpret(raw: bool, ctx: FlagContext, target_role: Role) -> Self {
        if ctx.sender_is_host {
            PlayerFlag::Fact(match target_role {
                Role::Runner => PlayerFact::Frozen(raw),
                Role::Shade => PlayerFact::Revealed(raw),
            })
        } else {
            PlayerFlag::Intent(match ctx.sender_role {
                Role::Runner => PlayerIntent::Thaw(raw),
                Role::Shade => PlayerIntent::Reveal(raw),
            })
        }
    }
}

/// Serialize the local state into a fresh frame. An unset or negative
/// local id is a misconfiguration on this machine, not a network
/// error: it is logged and yields an empty frame that must not be
/// sent.
pub fn encode_frame<P: Pawn>(roster: &mut Roster<P>, config: &ProtocolConfig) -> Vec<u8> {
    let sender = match roster.local_id() {
        Some(id) if id >= 0 => id,
        _ => {
            log::warn!("cannot serialize a frame without a local player id");
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(HEADER_LEN + LOBBY_ORDER_LEN);
    codec::write_u8(&mut out, roster.status().as_u8());
    codec::write_i32(&mut out, sender);

    match roster.status() {
        MatchStatus::None | MatchStatus::Paused => {}
        MatchStatus::Waiting => encode_lobby_payload(roster, config, &mut out),
        MatchStatus::InProgress => encode_player_payload(roster, sender, &mut out),
        MatchStatus::Ended => {
            let code = if roster.is_host() {
                roster.win_result().as_u8()
            } else {
                // Placeholder byte; receivers ignore it.
                0
            };
            codec::write_u8(&mut out, code);
        }
    }

    out
}

/// The host is the sole producer of lobby data. Its first ever
/// serialization invents the order and caches it.
fn encode_lobby_payload<P: Pawn>(
    roster: &mut Roster<P>,
    config: &ProtocolConfig,
    out: &mut Vec<u8>,
) {
    if !roster.is_host() {
        return;
    }

    let order = match roster.lobby_order() {
        Some(order) => order,
        None => {
            let order = if config.randomize_lobby_order {
                LobbyOrder::shuffled()
            } else {
                LobbyOrder::fixed()
            };
            roster.cache_lobby_order(order);
            order
        }
    };

    for value in order.0 {
        codec::write_i32(out, value);
    }
}

fn encode_player_payload<P: Pawn>(roster: &Roster<P>, sender: PlayerId, out: &mut Vec<u8>) {
    let Some(local) = roster.slot(sender) else {
        log::warn!("local player {sender} is not on the roster");
        return;
    };

    codec::write_vec2(out, local.pawn.position());
    codec::write_vec2(out, local.pawn.direction());

    let as_host = roster.is_host();
    for slot in roster.slots() {
        if slot.id == sender {
            continue;
        }
        let flag = if as_host {
            match slot.role {
                Role::Runner => slot.frozen,
                Role::Shade => slot.revealed,
            }
        } else {
            slot.outgoing_intent
        };
        codec::write_bool(out, flag);
    }

    // Reserved map segment, currently zero bytes.
}

/// Apply one incoming frame to the roster.
///
/// A status differing from the local one is adopted only when the
/// sender is the host; otherwise the whole frame is discarded. Payload
/// decoding is defensive: short segments mean "absent", never a panic.
pub fn decode_frame<P: Pawn>(bytes: &[u8], roster: &mut Roster<P>) -> Result<(), FrameError> {
    if bytes.len() < HEADER_LEN {
        return Err(FrameError::Truncated);
    }

    let status_byte = codec::read_u8(&bytes[..1]);
    let sender = codec::read_i32(&bytes[1..HEADER_LEN]);
    let status = MatchStatus::from_u8(status_byte).ok_or(FrameError::UnknownStatus(status_byte))?;
    if sender < 0 {
        return Err(FrameError::InvalidSender(sender));
    }
    // Relays may echo our own frames back.
    if roster.local_id() == Some(sender) {
        return Ok(());
    }
    if !roster.adopt_status(status, sender) {
        return Err(FrameError::NotAuthoritative(sender));
    }

    let payload = &bytes[HEADER_LEN..];
    match status {
        MatchStatus::None | MatchStatus::Paused => {}
        MatchStatus::Waiting => decode_lobby_payload(payload, sender, roster),
        MatchStatus::InProgress => decode_player_payload(payload, sender, roster),
        MatchStatus::Ended => decode_win_payload(payload, sender, roster),
    }

    Ok(())
}

fn decode_lobby_payload<P: Pawn>(payload: &[u8], sender: PlayerId, roster: &mut Roster<P>) {
    if sender != roster.host_id() || payload.len() < LOBBY_ORDER_LEN {
        return;
    }
    let values = codec::read_i32_list_n(&payload[..LOBBY_ORDER_LEN], crate::config::MAX_PLAYERS);
    let mut order = [0; crate::config::MAX_PLAYERS];
    order.copy_from_slice(&values);
    roster.cache_lobby_order(LobbyOrder(order));
}

fn decode_player_payload<P: Pawn>(payload: &[u8], sender: PlayerId, roster: &mut Roster<P>) {
    let segments = codec::split_sizes(payload, &[codec::VEC2_WIDTH, codec::VEC2_WIDTH]);
    if segments.len() < 2 {
        log::debug!("short player payload from {sender}");
        return;
    }
    let position = codec::read_vec2(segments[0]);
    let direction = codec::read_vec2(segments[1]);

    let Some(sender_role) = roster.slot(sender).map(|slot| slot.role) else {
        log::debug!("player payload from unknown sender {sender}");
        return;
    };
    if let Some(slot) = roster.slot_mut(sender) {
        slot.receive_position(position);
        slot.pawn.set_direction(direction);
    }

    // Flag bytes follow in roster order with the sender's slot skipped;
    // anything past them belongs to the reserved map segment.
    let Some(flags) = segments.get(2).copied() else {
        return;
    };
    let ctx = FlagContext {
        sender_is_host: sender == roster.host_id(),
        sender_role,
    };
    let targets: Vec<PlayerId> = roster
        .slots()
        .iter()
        .map(|slot| slot.id)
        .filter(|&id| id != sender)
        .collect();

    for (index, target) in targets.into_iter().enumerate() {
        let Some(&raw) = flags.get(index) else {
            break;
        };
        let Some(target_role) = roster.slot(target).map(|slot| slot.role) else {
            continue;
        };
        match PlayerFlag::interpret(raw != 0, ctx, target_role) {
            PlayerFlag::Fact(fact) => apply_fact(roster, target, fact),
            PlayerFlag::Intent(intent) => {
                if roster.is_host() {
                    apply_intent(roster, target, intent);
                }
            }
        }
    }
}

fn apply_fact<P: Pawn>(roster: &mut Roster<P>, target: PlayerId, fact: PlayerFact) {
    let Some(slot) = roster.slot_mut(target) else {
        return;
    };
    match fact {
        PlayerFact::Frozen(value) => slot.frozen = value,
        PlayerFact::Revealed(value) => slot.revealed = value,
    }
}

/// Host authority: a request only goes through when it is consistent
/// with the host's own view of the target.
fn apply_intent<P: Pawn>(roster: &mut Roster<P>, target: PlayerId, intent: PlayerIntent) {
    let Some(slot) = roster.slot_mut(target) else {
        return;
    };
    match intent {
        PlayerIntent::Thaw(true) if slot.role == Role::Runner && slot.frozen => {
            slot.frozen = false;
        }
        PlayerIntent::Reveal(true) if slot.role == Role::Shade && !slot.revealed => {
            slot.revealed = true;
        }
        _ => {}
    }
}

fn decode_win_payload<P: Pawn>(payload: &[u8], sender: PlayerId, roster: &mut Roster<P>) {
    if sender != roster.host_id() || payload.is_empty() {
        return;
    }
    if let Some(result) = WinResult::from_u8(payload[0]) {
        roster.set_win_result(result);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    #[derive(Debug, Default)]
    struct StubPawn {
        position: Vec2,
        direction: Vec2,
        idle: bool,
    }

    impl Pawn for StubPawn {
        fn position(&self) -> Vec2 {
            self.position
        }
        fn set_position(&mut self, position: Vec2) {
            self.position = position;
        }
        fn direction(&self) -> Vec2 {
            self.direction
        }
        fn set_direction(&mut self, direction: Vec2) {
            self.direction = direction;
        }
        fn set_idle(&mut self, idle: bool) {
            self.idle = idle;
        }
    }

    fn roster_with_local(local: PlayerId) -> Roster<StubPawn> {
        let mut roster = Roster::new(0);
        roster.register(0, Role::Runner, StubPawn::default());
        roster.register(1, Role::Runner, StubPawn::default());
        roster.register(2, Role::Shade, StubPawn::default());
        roster.register(3, Role::Shade, StubPawn::default());
        roster.set_local_id(local);
        roster
    }

    #[test]
    fn test_unset_sender_yields_empty_frame() {
        let mut roster: Roster<StubPawn> = Roster::new(0);
        assert!(encode_frame(&mut roster, &ProtocolConfig::default()).is_empty());
    }

    #[test]
    fn test_paused_frame_is_metadata_only() {
        let mut roster = roster_with_local(1);
        roster.set_status(MatchStatus::Paused);
        let bytes = encode_frame(&mut roster, &ProtocolConfig::default());
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(bytes[0], MatchStatus::Paused.as_u8());
    }

    #[test]
    fn test_host_waiting_frame_carries_fixed_order() {
        let mut roster = roster_with_local(0);
        roster.set_status(MatchStatus::Waiting);
        let bytes = encode_frame(&mut roster, &ProtocolConfig::default());

        assert_eq!(bytes.len(), HEADER_LEN + LOBBY_ORDER_LEN);
        let order = codec::read_i32_list_n(&bytes[HEADER_LEN..], 4);
        assert_eq!(order, vec![3, 0, 1, 2]);
        assert_eq!(roster.lobby_order(), Some(LobbyOrder::fixed()));
    }

    #[test]
    fn test_non_host_waiting_frame_is_bare() {
        let mut roster = roster_with_local(2);
        roster.set_status(MatchStatus::Waiting);
        let bytes = encode_frame(&mut roster, &ProtocolConfig::default());
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(roster.lobby_order(), None);
    }

    #[test]
    fn test_status_adopted_from_host_frame_only() {
        let config = ProtocolConfig::default();

        let mut host = roster_with_local(0);
        host.set_status(MatchStatus::InProgress);
        let host_frame = encode_frame(&mut host, &config);

        let mut peer = roster_with_local(3);
        peer.set_status(MatchStatus::InProgress);
        let peer_frame = encode_frame(&mut peer, &config);

        let mut client = roster_with_local(1);
        client.set_status(MatchStatus::Waiting);

        assert_eq!(
            decode_frame(&peer_frame, &mut client),
            Err(FrameError::NotAuthoritative(3))
        );
        assert_eq!(client.status(), MatchStatus::Waiting);

        assert_eq!(decode_frame(&host_frame, &mut client), Ok(()));
        assert_eq!(client.status(), MatchStatus::InProgress);
    }

    #[test]
    fn test_in_progress_frame_updates_sender_slot_only() {
        let config = ProtocolConfig::default();

        let mut host = roster_with_local(0);
        host.set_status(MatchStatus::InProgress);
        {
            let slot = host.slot_mut(0).unwrap();
            slot.pawn.set_position(Vec2::new(5.0, 5.0));
            slot.pawn.set_direction(Vec2::new(0.0, -1.0));
        }
        let frame = encode_frame(&mut host, &config);
        // 5B header, 16B position and direction, 3 flag bytes.
        assert_eq!(frame.len(), HEADER_LEN + 16 + 3);

        let mut client = roster_with_local(1);
        client.set_status(MatchStatus::InProgress);
        decode_frame(&frame, &mut client).unwrap();

        let slot = client.slot(0).unwrap();
        assert_eq!(slot.interp.new_position, Some(Vec2::new(5.0, 5.0)));
        assert_eq!(slot.pawn.direction, Vec2::new(0.0, -1.0));
        for id in [2, 3] {
            assert_eq!(client.slot(id).unwrap().interp.new_position, None);
        }
    }

    #[test]
    fn test_host_flags_decode_as_facts() {
        let config = ProtocolConfig::default();

        let mut host = roster_with_local(0);
        host.set_status(MatchStatus::InProgress);
        host.slot_mut(1).unwrap().frozen = true;
        host.slot_mut(3).unwrap().revealed = true;
        let frame = encode_frame(&mut host, &config);

        let mut client = roster_with_local(2);
        client.set_status(MatchStatus::InProgress);
        decode_frame(&frame, &mut client).unwrap();

        assert!(client.slot(1).unwrap().frozen);
        assert!(!client.slot(2).unwrap().revealed);
        assert!(client.slot(3).unwrap().revealed);
    }

    #[test]
    fn test_host_applies_thaw_intent_with_authority() {
        let config = ProtocolConfig::default();

        // Runner 2 wants to thaw runner 1; shade 3 is untouched.
        let mut sender = Roster::new(0);
        sender.register(0, Role::Runner, StubPawn::default());
        sender.register(1, Role::Runner, StubPawn::default());
        sender.register(2, Role::Runner, StubPawn::default());
        sender.register(3, Role::Shade, StubPawn::default());
        sender.set_local_id(2);
        sender.set_status(MatchStatus::InProgress);
        sender.set_intent(1, true);
        let frame = encode_frame(&mut sender, &config);

        let mut host = Roster::new(0);
        host.register(0, Role::Runner, StubPawn::default());
        host.register(1, Role::Runner, StubPawn::default());
        host.register(2, Role::Runner, StubPawn::default());
        host.register(3, Role::Shade, StubPawn::default());
        host.set_local_id(0);
        host.set_status(MatchStatus::InProgress);
        host.slot_mut(1).unwrap().frozen = true;

        decode_frame(&frame, &mut host).unwrap();
        assert!(!host.slot(1).unwrap().frozen);

        // The same intent against a never-frozen target changes nothing.
        decode_frame(&frame, &mut host).unwrap();
        assert!(!host.slot(1).unwrap().frozen);
    }

    #[test]
    fn test_client_ignores_peer_intents() {
        let config = ProtocolConfig::default();

        let mut sender = roster_with_local(1);
        sender.set_status(MatchStatus::InProgress);
        sender.set_intent(0, true);
        let frame = encode_frame(&mut sender, &config);

        let mut client = roster_with_local(2);
        client.set_status(MatchStatus::InProgress);
        client.slot_mut(0).unwrap().frozen = true;
        decode_frame(&frame, &mut client).unwrap();

        assert!(client.slot(0).unwrap().frozen);
    }

    #[test]
    fn test_win_result_mirrored_from_host_only() {
        let config = ProtocolConfig::default();

        let mut host = roster_with_local(0);
        host.set_status(MatchStatus::Ended);
        host.set_win_result(WinResult::ShadesWin);
        let host_frame = encode_frame(&mut host, &config);

        let mut peer = roster_with_local(3);
        peer.set_status(MatchStatus::Ended);
        peer.set_win_result(WinResult::RunnersWin);
        let peer_frame = encode_frame(&mut peer, &config);
        // Non-host ended payload is a zero placeholder.
        assert_eq!(peer_frame[HEADER_LEN], 0);

        let mut client = roster_with_local(1);
        client.set_status(MatchStatus::Ended);
        decode_frame(&peer_frame, &mut client).unwrap();
        assert_eq!(client.win_result(), WinResult::Undefined);

        decode_frame(&host_frame, &mut client).unwrap();
        assert_eq!(client.win_result(), WinResult::ShadesWin);
    }

    #[test]
    fn test_short_and_malformed_frames_are_tolerated() {
        let mut client = roster_with_local(1);
        client.set_status(MatchStatus::InProgress);

        assert_eq!(decode_frame(&[2], &mut client), Err(FrameError::Truncated));
        assert_eq!(
            decode_frame(&[9, 0, 0, 0, 0], &mut client),
            Err(FrameError::UnknownStatus(9))
        );

        // In-progress frame from the host with a truncated payload.
        let mut short = Vec::new();
        codec::write_u8(&mut short, MatchStatus::InProgress.as_u8());
        codec::write_i32(&mut short, 0);
        short.extend_from_slice(&[0; 7]);
        assert_eq!(decode_frame(&short, &mut client), Ok(()));
        assert_eq!(client.slot(0).unwrap().interp.new_position, None);
    }

    #[test]
    fn test_own_echoed_frame_is_dropped() {
        let config = ProtocolConfig::default();
        let mut roster = roster_with_local(1);
        roster.set_status(MatchStatus::InProgress);
        roster.slot_mut(1).unwrap().pawn.set_position(Vec2::new(9.0, 9.0));
        let frame = encode_frame(&mut roster, &config);

        decode_frame(&frame, &mut roster).unwrap();
        assert_eq!(roster.slot(1).unwrap().interp.new_position, None);
    }
}
