//! Application state shared between the host and the game loop thread.

use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;

use blastmap_core::commands::SimCommand;
use blastmap_core::events::SimEvent;
use blastmap_core::state::SceneSnapshot;
use blastmap_core::types::BoundingBox;
use blastmap_features::ClassifiedFeatures;
use blastmap_sim::SimConfig;
use blastmap_terrain::{ElevationSource, TerrainConfig};

use crate::game_loop::{spawn_game_loop, GameLoopContext};

/// Latest snapshot, written by the game loop after each tick.
pub type SharedSnapshot = Arc<Mutex<Option<SceneSnapshot>>>;

/// Every event emitted since the loop started, in tick order.
pub type SharedEvents = Arc<Mutex<Vec<SimEvent>>>;

/// Commands sent from the host to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// Forward to the engine's command queue.
    Sim(SimCommand),
    /// Start a new scene over a region.
    SetScene(BoundingBox),
    /// Project classified features into the current scene.
    LoadFeatures(ClassifiedFeatures),
    /// Start an asynchronous terrain build for the current scene.
    BuildTerrain(TerrainConfig),
    /// Shut down the game loop thread gracefully.
    Shutdown,
}

/// Shared application state.
///
/// - `mpsc::Sender` is wrapped in a `Mutex` (Sender is Send but not Sync)
/// - `Mutex<Option<...>>` for the sender, which only exists once started
/// - `Arc<Mutex<...>>` for state shared with the game loop thread
pub struct AppState {
    /// `None` before `start` is called.
    pub command_tx: Mutex<Option<mpsc::Sender<GameLoopCommand>>>,
    pub latest_snapshot: SharedSnapshot,
    pub event_log: SharedEvents,
    pub running: Mutex<bool>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            command_tx: Mutex::new(None),
            latest_snapshot: Arc::new(Mutex::new(None)),
            event_log: Arc::new(Mutex::new(Vec::new())),
            running: Mutex::new(false),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the game loop. Does nothing if it is already running.
    pub fn start(
        &self,
        config: SimConfig,
        runtime: Handle,
        elevation: Arc<dyn ElevationSource>,
    ) -> io::Result<()> {
        let mut running = self
            .running
            .lock()
            .map_err(|_| io::Error::other("app state lock poisoned"))?;
        if *running {
            return Ok(());
        }
        let tx = spawn_game_loop(GameLoopContext {
            config,
            runtime,
            elevation,
            latest_snapshot: Arc::clone(&self.latest_snapshot),
            event_log: Arc::clone(&self.event_log),
        })?;
        if let Ok(mut slot) = self.command_tx.lock() {
            *slot = Some(tx);
        }
        *running = true;
        Ok(())
    }

    /// Send a command to the game loop. Returns false if it is not running.
    pub fn send(&self, command: GameLoopCommand) -> bool {
        let Ok(guard) = self.command_tx.lock() else {
            return false;
        };
        match guard.as_ref() {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }

    pub fn snapshot(&self) -> Option<SceneSnapshot> {
        self.latest_snapshot.lock().ok().and_then(|s| s.clone())
    }

    /// Copy of the event log.
    pub fn events(&self) -> Vec<SimEvent> {
        self.event_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Ask the game loop to stop and forget its sender.
    pub fn stop(&self) {
        if let Ok(mut slot) = self.command_tx.lock() {
            if let Some(tx) = slot.take() {
                let _ = tx.send(GameLoopCommand::Shutdown);
            }
        }
        if let Ok(mut running) = self.running.lock() {
            *running = false;
        }
    }
}
