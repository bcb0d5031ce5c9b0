//! Dead-reckoning between network snapshots.
//!
//! Remote players only get a fresh position every send cadence, while
//! rendering runs every local frame. Each frame the displayed position
//! slides from the previous snapshot toward the newest one over a fixed
//! tick window, which hides the gap between the two rates.

use crate::config::ProtocolConfig;
use crate::player::Pawn;
use crate::session::Roster;

/// Advance every remote player's displayed position by one local tick.
/// Runs whether or not a message arrived this frame.
pub fn advance<P: Pawn>(roster: &mut Roster<P>, config: &ProtocolConfig) {
    let local_id = roster.local_id();
    let window = config.interp_window_ticks.max(1);

    for slot in roster.slots_mut() {
        if slot.id < 0 || Some(slot.id) == local_id {
            continue;
        }
        // No snapshot yet: hold the last known position.
        let Some(target) = slot.interp.new_position else {
            continue;
        };

        slot.interp.ticks_since_snapshot += 1;
        let progress = (slot.interp.ticks_since_snapshot as f32 / window as f32).min(1.0);
        slot.pawn
            .set_position(slot.interp.old_position.lerp(target, progress));
        if progress >= 1.0 {
            slot.pawn.set_idle(true);
        }
    }
}
