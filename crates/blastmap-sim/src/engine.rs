//! Simulation engine: the explicit context of one scene.
//!
//! `SimulationEngine` owns the hecs world (buildings, impacts, effects), the
//! scene projection and the terrain field. It processes commands, runs the
//! systems and produces `SceneSnapshot`s. Completely headless, so it can be
//! driven deterministically from tests.

use std::collections::VecDeque;

use glam::DVec3;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use blastmap_core::commands::SimCommand;
use blastmap_core::components::{AffectedBuilding, BuildingDamage, BuildingId, Footprint, Impact};
use blastmap_core::constants::{DEBRIS_COUNT, DT, ORIGIN_TOLERANCE_DEG, PARTICLE_COUNT};
use blastmap_core::events::SimEvent;
use blastmap_core::state::SceneSnapshot;
use blastmap_core::types::{BoundingBox, GeoPoint, Origin, SimTime, Weapon};
use blastmap_features::ClassifiedFeatures;
use blastmap_terrain::{BuildTicket, GeoProjection, TerrainError, TerrainField, TerrainGrid};

use crate::error::SimError;
use crate::impact;
use crate::scene::{self, LocalFeature};
use crate::systems;

/// Configuration for a new engine.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same effects.
    pub seed: u64,
    /// Glow particles per blast.
    pub particle_count: usize,
    /// Debris shards per blast.
    pub debris_count: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            particle_count: PARTICLE_COUNT,
            debris_count: DEBRIS_COUNT,
        }
    }
}

/// Region and frame shared by every entity of a scene.
#[derive(Debug, Clone, Copy)]
struct Scene {
    bbox: BoundingBox,
    projection: GeoProjection,
}

fn same_origin(a: &Origin, b: &Origin) -> bool {
    (a.lat - b.lat).abs() <= ORIGIN_TOLERANCE_DEG
        && (a.lon - b.lon).abs() <= ORIGIN_TOLERANCE_DEG
}

/// The simulation engine. Owns the ECS world and all scene state.
pub struct SimulationEngine {
    world: World,
    time: SimTime,
    rng: ChaCha8Rng,
    config: SimConfig,
    scene: Option<Scene>,
    terrain: TerrainField,
    features: Vec<LocalFeature>,
    next_impact_id: u32,
    next_building_id: u32,
    command_queue: VecDeque<SimCommand>,
    despawn_buffer: Vec<Entity>,
    events: Vec<SimEvent>,
}

impl SimulationEngine {
    pub fn new(config: SimConfig) -> Self {
        Self {
            world: World::new(),
            time: SimTime::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            scene: None,
            terrain: TerrainField::new(),
            features: Vec::new(),
            next_impact_id: 0,
            next_building_id: 0,
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Start a new scene over `bbox`. The bbox center becomes the origin of
    /// every local coordinate. Clears buildings, impacts, effects and terrain.
    pub fn set_scene(&mut self, bbox: BoundingBox) -> Result<Origin, SimError> {
        if !bbox.is_valid() {
            return Err(TerrainError::InvalidBounds.into());
        }
        let origin = bbox.center();
        self.world.clear();
        self.terrain.clear();
        self.features.clear();
        self.command_queue.clear();
        self.next_impact_id = 0;
        self.next_building_id = 0;
        self.scene = Some(Scene {
            bbox,
            projection: GeoProjection::new(origin),
        });
        info!(lat = origin.lat, lon = origin.lon, "scene origin set");
        Ok(origin)
    }

    /// Project classified features into the scene and spawn buildings,
    /// replacing whatever an earlier call loaded. Returns the number of
    /// buildings spawned.
    ///
    /// Building ids keep counting across reloads, so impacts registered
    /// before the reload never name a new building.
    pub fn load_features(&mut self, features: &ClassifiedFeatures) -> Result<usize, SimError> {
        let scene = self.scene.ok_or(SimError::NoScene)?;
        let removed = scene::despawn_buildings(&mut self.world, &mut self.despawn_buffer);
        if removed > 0 {
            info!(removed, "replacing previously loaded buildings");
        }
        self.features.clear();

        let local = scene::project_features(features, &scene.projection);
        let spawned = scene::spawn_buildings(
            &mut self.world,
            &local,
            &self.terrain,
            &mut self.next_building_id,
        );
        info!(
            features = local.len(),
            buildings = spawned,
            "features loaded into scene"
        );
        self.features.extend(local);
        Ok(spawned)
    }

    /// Reserve the terrain build slot for the scene region.
    pub fn begin_terrain_build(&mut self) -> Result<BuildTicket, SimError> {
        let scene = self.scene.ok_or(SimError::NoScene)?;
        Ok(self.terrain.begin_build(scene.bbox)?)
    }

    /// Apply the outcome of a terrain build. A grid built around another
    /// origin is rejected; on any rejection the previous terrain stays live.
    pub fn complete_terrain_build(
        &mut self,
        ticket: BuildTicket,
        result: Result<TerrainGrid, TerrainError>,
    ) -> Result<(), SimError> {
        let scene_origin = self.origin();
        let checked = result.and_then(|grid| match scene_origin {
            Some(origin) if same_origin(&grid.origin(), &origin) => Ok(grid),
            _ => Err(TerrainError::OriginMismatch),
        });

        let applied = self
            .terrain
            .complete(ticket, checked)
            .map(|grid| (grid.nx, grid.ny));
        match applied {
            Ok((nx, ny)) => {
                scene::rebase_buildings(&mut self.world, &self.terrain);
                self.events.push(SimEvent::TerrainApplied { nx, ny });
                Ok(())
            }
            Err(err) => {
                self.events.push(SimEvent::TerrainRejected {
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Give up on an outstanding terrain build.
    pub fn abandon_terrain_build(&mut self, ticket: BuildTicket) {
        self.terrain.abandon(ticket);
    }

    /// Simulate an impact right now: test every building, accumulate damage,
    /// register the impact and start its blast effect.
    pub fn simulate_impact(
        &mut self,
        weapon: Weapon,
        lat: f64,
        lon: f64,
    ) -> Result<Impact, SimError> {
        let scene = self.scene.ok_or(SimError::NoScene)?;
        let geo = GeoPoint::new(lat, lon);
        let local = scene.projection.to_local(&geo);
        let ground_z = self.terrain.query(local.x, local.y);

        let mut affected = Vec::new();
        for (_entity, (id, footprint, damage)) in self
            .world
            .query_mut::<(&BuildingId, &Footprint, &mut BuildingDamage)>()
        {
            let test = impact::test_footprint(&footprint.ring, &local, &weapon);
            if test.impacted {
                damage.total += test.damage;
                damage.hits += 1;
                affected.push(AffectedBuilding {
                    building: *id,
                    damage: test.damage,
                });
            }
        }
        affected.sort_by_key(|a| a.building);

        let id = self.next_impact_id;
        self.next_impact_id += 1;
        let impact = Impact {
            id,
            weapon,
            geo,
            local,
            ground_z,
            affected,
        };
        self.world.spawn((impact.clone(),));
        systems::blast::spawn(
            &mut self.world,
            &mut self.rng,
            id,
            DVec3::new(local.x, local.y, ground_z),
            &weapon,
            self.config.particle_count,
            self.config.debris_count,
        );

        let total_damage: f64 = impact.affected.iter().map(|a| a.damage).sum();
        info!(
            impact = id,
            x = local.x,
            y = local.y,
            buildings_hit = impact.affected.len(),
            "impact simulated"
        );
        self.events.push(SimEvent::ImpactSimulated {
            impact_id: id,
            buildings_hit: impact.affected.len(),
            total_damage,
        });
        Ok(impact)
    }

    /// Remove every impact and effect and reset building damage.
    pub fn clear_impacts(&mut self) -> usize {
        let count = systems::cleanup::clear_impacts(&mut self.world, &mut self.despawn_buffer);
        info!(count, "impacts cleared");
        self.events.push(SimEvent::ImpactsCleared { count });
        count
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: SimCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = SimCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance by `dt` seconds and return the resulting snapshot.
    /// Negative or non-finite `dt` only processes commands.
    pub fn update(&mut self, dt: f64) -> SceneSnapshot {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.process_commands();
        self.run_systems(dt);
        self.time.advance(dt);

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(
            &self.world,
            &self.time,
            self.origin(),
            self.terrain.status(),
            events,
        )
    }

    /// Advance by one fixed tick.
    pub fn tick(&mut self) -> SceneSnapshot {
        self.update(DT)
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Scene origin, once a scene is set.
    pub fn origin(&self) -> Option<Origin> {
        self.scene.map(|s| s.projection.origin())
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.scene.map(|s| s.bbox)
    }

    pub fn projection(&self) -> Option<&GeoProjection> {
        self.scene.as_ref().map(|s| &s.projection)
    }

    pub fn terrain(&self) -> &TerrainField {
        &self.terrain
    }

    /// Features projected into the scene frame.
    pub fn features(&self) -> &[LocalFeature] {
        &self.features
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Cumulative damage of one building.
    pub fn building_damage(&self, building: BuildingId) -> Option<BuildingDamage> {
        self.world
            .query::<(&BuildingId, &BuildingDamage)>()
            .iter()
            .find(|(_, (id, _))| **id == building)
            .map(|(_, (_, damage))| *damage)
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: SimCommand) {
        match command {
            SimCommand::SimulateImpact { weapon, lat, lon } => {
                if let Err(err) = self.simulate_impact(weapon, lat, lon) {
                    warn!("dropping impact command: {err}");
                }
            }
            SimCommand::ClearImpacts => {
                self.clear_impacts();
            }
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64) {
        // 1. Blast effect scheduler
        systems::blast::run(&mut self.world, &self.terrain, dt);
        // 2. Cleanup (expired effects)
        systems::cleanup::run(&mut self.world, &mut self.despawn_buffer, &mut self.events);
    }
}
