use glam::Vec2;

pub type PlayerId = i32;

/// The two match archetypes. Runners can be frozen and thawed by their
/// teammates; shades stay hidden until revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Runner,
    Shade,
}

/// Seam to the engine-owned entity a slot steers. The protocol layer
/// only pushes positions and the idle flag through this trait; movement
/// logic and ownership stay on the engine side.
pub trait Pawn {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    fn direction(&self) -> Vec2;
    fn set_direction(&mut self, direction: Vec2);
    fn set_idle(&mut self, idle: bool);
}

/// Dead-reckoning window for one remote player.
///
/// `ticks_since_snapshot` resets to 0 only when a fresh position
/// arrives. A slot that has never received a position keeps
/// `new_position` unset and holds its last known spot instead of
/// blending.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpBuffer {
    pub ticks_since_snapshot: u32,
    pub old_position: Vec2,
    pub new_position: Option<Vec2>,
}

#[derive(Debug)]
pub struct PlayerSlot<P: Pawn> {
    pub id: PlayerId,
    pub role: Role,
    pub pawn: P,
    pub frozen: bool,
    pub revealed: bool,
    /// Level signal the local game sets about this player, re-sent on
    /// every cadence until cleared so a dropped frame cannot eat it.
    pub outgoing_intent: bool,
    pub interp: InterpBuffer,
}

impl<P: Pawn> PlayerSlot<P> {
    pub fn new(id: PlayerId, role: Role, pawn: P) -> Self {
        Self {
            id,
            role,
            pawn,
            frozen: false,
            revealed: false,
            outgoing_intent: false,
            interp: InterpBuffer::default(),
        }
    }

    /// Record a freshly received snapshot position. The interpolation
    /// window restarts from the currently displayed position.
    pub fn receive_position(&mut self, position: Vec2) {
        self.interp.old_position = self.pawn.position();
        self.interp.new_position = Some(position);
        self.interp.ticks_since_snapshot = 0;
        self.pawn.set_idle(false);
    }
}
