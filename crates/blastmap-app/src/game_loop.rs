//! Game loop thread: runs the simulation engine at TICK_RATE and publishes
//! snapshots.
//!
//! The engine is created inside this thread so it never crosses threads.
//! Host commands arrive on an `mpsc` channel. Terrain builds run on the tokio
//! runtime and report back on a second channel carrying the `BuildTicket`,
//! so each completion is applied at most once.

use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tracing::{info, warn};

use blastmap_core::constants::TICK_RATE;
use blastmap_core::state::SceneSnapshot;
use blastmap_sim::{SimConfig, SimulationEngine};
use blastmap_terrain::elevation::build_grid;
use blastmap_terrain::{BuildTicket, ElevationSource, TerrainConfig, TerrainError, TerrainGrid};

use crate::state::{GameLoopCommand, SharedEvents, SharedSnapshot};

/// Nominal duration of one tick.
const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

/// Everything the loop owns besides its channels.
pub struct GameLoopContext {
    pub config: SimConfig,
    /// Runtime the terrain builds are spawned on.
    pub runtime: Handle,
    pub elevation: Arc<dyn ElevationSource>,
    pub latest_snapshot: SharedSnapshot,
    pub event_log: SharedEvents,
}

struct TerrainCompletion {
    ticket: BuildTicket,
    result: Result<TerrainGrid, TerrainError>,
}

/// Spawns the game loop in a new thread.
///
/// Returns the command sender for the host to use.
pub fn spawn_game_loop(ctx: GameLoopContext) -> io::Result<mpsc::Sender<GameLoopCommand>> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameLoopCommand>();

    std::thread::Builder::new()
        .name("blastmap-game-loop".into())
        .spawn(move || {
            run_game_loop(ctx, cmd_rx);
        })?;

    Ok(cmd_tx)
}

/// The game loop. Runs until Shutdown command or channel disconnect.
fn run_game_loop(ctx: GameLoopContext, cmd_rx: mpsc::Receiver<GameLoopCommand>) {
    let mut engine = SimulationEngine::new(ctx.config.clone());
    let (done_tx, done_rx) = mpsc::channel::<TerrainCompletion>();
    let mut next_tick_time = Instant::now();

    loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(GameLoopCommand::Shutdown) => return,
                Ok(command) => handle_command(&mut engine, command, &ctx, &done_tx),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return,
            }
        }

        // 2. Apply finished terrain builds
        while let Ok(TerrainCompletion { ticket, result }) = done_rx.try_recv() {
            if let Err(err) = engine.complete_terrain_build(ticket, result) {
                warn!("terrain build not applied: {err}");
            }
        }

        // 3. Advance one tick
        let snapshot = engine.tick();

        // 4. Publish for polling
        publish(snapshot, &ctx);

        // 5. Sleep until next tick
        next_tick_time += TICK_DURATION;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > TICK_DURATION * 2 {
            // Too far behind, reset to avoid catch-up spiral
            next_tick_time = now;
        }
    }
}

fn handle_command(
    engine: &mut SimulationEngine,
    command: GameLoopCommand,
    ctx: &GameLoopContext,
    done_tx: &mpsc::Sender<TerrainCompletion>,
) {
    match command {
        GameLoopCommand::Sim(cmd) => engine.queue_command(cmd),
        GameLoopCommand::SetScene(bbox) => {
            if let Err(err) = engine.set_scene(bbox) {
                warn!("scene rejected: {err}");
            }
        }
        GameLoopCommand::LoadFeatures(features) => {
            if let Err(err) = engine.load_features(&features) {
                warn!("features not loaded: {err}");
            }
        }
        GameLoopCommand::BuildTerrain(config) => match engine.begin_terrain_build() {
            Ok(ticket) => spawn_terrain_build(ticket, config, ctx, done_tx.clone()),
            Err(err) => warn!("terrain build refused: {err}"),
        },
        // handled by the drain loop
        GameLoopCommand::Shutdown => {}
    }
}

fn spawn_terrain_build(
    ticket: BuildTicket,
    config: TerrainConfig,
    ctx: &GameLoopContext,
    done_tx: mpsc::Sender<TerrainCompletion>,
) {
    let source = Arc::clone(&ctx.elevation);
    let bbox = ticket.bbox();
    info!(
        generation = ticket.generation(),
        source = source.name(),
        grid_size = config.grid_size,
        "terrain build started"
    );
    ctx.runtime.spawn(async move {
        let result = build_grid(source.as_ref(), &bbox, &config).await;
        // The loop may already be gone; the grid is dropped then.
        let _ = done_tx.send(TerrainCompletion { ticket, result });
    });
}

fn publish(snapshot: SceneSnapshot, ctx: &GameLoopContext) {
    if !snapshot.events.is_empty() {
        if let Ok(mut log) = ctx.event_log.lock() {
            log.extend(snapshot.events.iter().cloned());
        }
    }
    if let Ok(mut lock) = ctx.latest_snapshot.lock() {
        *lock = Some(snapshot);
    }
}
