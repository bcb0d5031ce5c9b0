use anyhow::Result;
use clap::Parser;
use glam::Vec2;

use lantern::{
    MatchStatus, MemoryHub, MemoryTransport, Pawn, PlayerId, ProtocolConfig, Role, Roster,
    SyncController, WinResult,
};

#[derive(Parser)]
#[command(name = "lantern-demo")]
#[command(about = "Headless loopback run of the lantern sync protocol")]
struct Args {
    #[arg(long, default_value_t = 240, help = "Ticks to simulate")]
    ticks: u32,

    #[arg(long, help = "Shuffle the lobby order instead of the fixed assignment")]
    randomize_lobby: bool,
}

#[derive(Debug, Default)]
struct DemoPawn {
    position: Vec2,
    direction: Vec2,
    idle: bool,
}

impl Pawn for DemoPawn {
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

const ROOM: &str = "demo";
const HOST: PlayerId = 0;

fn build_roster() -> Roster<DemoPawn> {
    let mut roster = Roster::new(HOST);
    roster.register(0, Role::Runner, DemoPawn::default());
    roster.register(1, Role::Runner, DemoPawn::default());
    roster.register(2, Role::Shade, DemoPawn::default());
    roster.register(3, Role::Shade, DemoPawn::default());
    roster
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = ProtocolConfig {
        randomize_lobby_order: args.randomize_lobby,
        ..ProtocolConfig::default()
    };

    let hub = MemoryHub::new(ROOM);
    let mut controllers: Vec<SyncController<DemoPawn, MemoryTransport>> = (0..4)
        .map(|id| {
            let mut controller =
                SyncController::new(hub.endpoint(id), build_roster(), config.clone());
            controller.connect(Some(ROOM));
            controller
        })
        .collect();

    let lobby_until = args.ticks / 3;
    let play_until = args.ticks * 2 / 3;

    for tick in 0..args.ticks {
        match tick {
            0 => {
                controllers[HOST as usize]
                    .roster_mut()
                    .set_status(MatchStatus::Waiting);
            }
            t if t == lobby_until => {
                log::info!("host starts the match");
                controllers[HOST as usize]
                    .roster_mut()
                    .set_status(MatchStatus::InProgress);
            }
            t if t == play_until => {
                log::info!("host ends the match");
                let roster = controllers[HOST as usize].roster_mut();
                roster.set_status(MatchStatus::Ended);
                roster.set_win_result(WinResult::RunnersWin);
            }
            _ => {}
        }

        // The host player walks a circle; everyone else stands still.
        if tick >= lobby_until && tick < play_until {
            let angle = tick as f32 * 0.05;
            let roster = controllers[HOST as usize].roster_mut();
            if let Some(slot) = roster.slot_mut(HOST) {
                slot.pawn
                    .set_position(Vec2::new(angle.cos(), angle.sin()) * 10.0);
                slot.pawn.set_direction(Vec2::new(-angle.sin(), angle.cos()));
            }
        }

        for controller in controllers.iter_mut() {
            for event in controller.update() {
                log::info!("session event: {event:?}");
            }
        }
    }

    for controller in &controllers {
        let roster = controller.roster();
        let id = roster.local_id().unwrap_or(-1);
        let (host_seen, host_idle) = roster
            .slot(HOST)
            .map(|slot| (slot.pawn.position(), slot.pawn.idle))
            .unwrap_or((Vec2::ZERO, false));
        log::info!(
            "player {id}: status {:?}, win {:?}, order {:?}, sees host at ({:.2}, {:.2}){}",
            roster.status(),
            roster.win_result(),
            roster.lobby_order(),
            host_seen.x,
            host_seen.y,
            if host_idle { " idle" } else { "" },
        );
    }

    Ok(())
}
