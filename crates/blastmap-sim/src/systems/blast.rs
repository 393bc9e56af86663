//! Blast effect scheduler: advances the animation parameters of every live
//! effect. Owns no rendering state; a renderer reads the results from the
//! snapshot.
//!
//! With `t = clamp(age / life, 0, 1)` the flash (glow, light, particles,
//! blast sphere, label) fades linearly over `life`; the smoke column runs on
//! its own clock over `smoke_life`; debris falls under reduced gravity,
//! bounces once it reaches the terrain, then fades out.

use glam::DVec3;
use hecs::{Entity, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use blastmap_core::components::{DebrisField, DebrisShard, EffectState, Particle, ParticleCloud};
use blastmap_core::constants::*;
use blastmap_core::types::Weapon;
use blastmap_terrain::HeightField;

/// Durations and size of one blast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectTiming {
    pub life: f64,
    pub smoke_life: f64,
    pub max_scale: f64,
}

impl EffectTiming {
    /// Timing derived from the weapon radius. Bigger blasts burn longer.
    pub fn for_weapon(weapon: &Weapon) -> Self {
        let radius = weapon.radius.max(0.0);
        let life = (EFFECT_BASE_LIFE + radius * EFFECT_LIFE_PER_METER).min(EFFECT_MAX_LIFE);
        Self {
            life,
            smoke_life: life * SMOKE_LIFE_FACTOR,
            max_scale: radius.max(1.0),
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Fresh effect state at age 0.
pub fn initial_state(impact_id: u32, center: DVec3, timing: EffectTiming) -> EffectState {
    EffectState {
        impact_id,
        center,
        age: 0.0,
        life: timing.life,
        smoke_life: timing.smoke_life,
        max_scale: timing.max_scale,
        glow_scale: GLOW_START_SCALE,
        glow_opacity: GLOW_OPACITY,
        light_intensity: LIGHT_INTENSITY,
        particle_opacity: GLOW_OPACITY,
        smoke_progress: 0.0,
        smoke_position: center,
        smoke_scale: timing.max_scale * SMOKE_START_SCALE_FACTOR,
        smoke_opacity: SMOKE_OPACITY,
        sphere_scale: timing.max_scale,
        sphere_opacity: BLAST_SPHERE_OPACITY,
        label_opacity: 1.0,
    }
}

/// Spawn an effect entity with its particles and debris.
pub fn spawn(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    impact_id: u32,
    center: DVec3,
    weapon: &Weapon,
    particle_count: usize,
    debris_count: usize,
) -> Entity {
    let timing = EffectTiming::for_weapon(weapon);
    let state = initial_state(impact_id, center, timing);

    let spread = timing.max_scale / timing.life;
    let particles = (0..particle_count)
        .map(|_| {
            let azimuth = rng.gen_range(0.0..std::f64::consts::TAU);
            let elevation = rng.gen_range(0.0..std::f64::consts::FRAC_PI_2);
            let speed = rng.gen_range(0.3..1.0) * spread;
            let direction = DVec3::new(
                elevation.cos() * azimuth.cos(),
                elevation.cos() * azimuth.sin(),
                elevation.sin(),
            );
            Particle {
                position: center,
                velocity: direction * speed,
            }
        })
        .collect();

    let kick = (weapon.radius / 40.0).sqrt().clamp(0.5, 4.0);
    let shards = (0..debris_count)
        .map(|_| {
            let azimuth = rng.gen_range(0.0..std::f64::consts::TAU);
            let horizontal = rng.gen_range(2.0..8.0) * kick;
            DebrisShard {
                position: center,
                velocity: DVec3::new(
                    azimuth.cos() * horizontal,
                    azimuth.sin() * horizontal,
                    rng.gen_range(4.0..10.0) * kick,
                ),
                rotation: DVec3::ZERO,
                angular_velocity: DVec3::new(
                    rng.gen_range(-4.0..4.0),
                    rng.gen_range(-4.0..4.0),
                    rng.gen_range(-4.0..4.0),
                ),
                opacity: 1.0,
                grounded: false,
            }
        })
        .collect();

    world.spawn((
        state,
        ParticleCloud { particles },
        DebrisField { shards },
    ))
}

/// Advance the scalar parameters of one effect by `dt` seconds.
pub fn advance(state: &mut EffectState, dt: f64) {
    state.age += dt;
    let t = if state.life > 0.0 {
        (state.age / state.life).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let fade = 1.0 - t;

    state.glow_scale = lerp(GLOW_START_SCALE, state.max_scale, t);
    state.glow_opacity = (GLOW_OPACITY * fade).max(0.0);
    state.light_intensity = (LIGHT_INTENSITY * fade).max(0.0);
    state.particle_opacity = (GLOW_OPACITY * fade).max(0.0);

    state.smoke_progress = if state.smoke_life > 0.0 {
        (state.age / state.smoke_life).min(1.0)
    } else {
        1.0
    };
    state.smoke_position.z += SMOKE_RISE_SPEED * dt;
    state.smoke_scale = lerp(
        state.max_scale * SMOKE_START_SCALE_FACTOR,
        state.max_scale * SMOKE_SCALE_FACTOR,
        state.smoke_progress,
    );
    state.smoke_opacity = (SMOKE_OPACITY * (1.0 - state.smoke_progress)).max(0.0);

    state.sphere_opacity = (BLAST_SPHERE_OPACITY * fade).max(0.0);
    state.sphere_scale *= 1.0 + BLAST_SPHERE_GROWTH * t;

    state.label_opacity = fade.max(0.0);
}

/// Integrate glow particles.
pub fn step_particles(cloud: &mut ParticleCloud, dt: f64) {
    for p in &mut cloud.particles {
        p.position += p.velocity * dt;
        p.velocity.z -= PARTICLE_FALL_ACCEL * dt;
    }
}

/// Integrate debris against the terrain. Shards are discarded once the
/// effect is older than `life + DEBRIS_LINGER_SECS`.
pub fn step_debris<H>(field: &mut DebrisField, state: &EffectState, terrain: &H, dt: f64)
where
    H: HeightField + ?Sized,
{
    if state.age > state.life + DEBRIS_LINGER_SECS {
        field.shards.clear();
        return;
    }

    for shard in &mut field.shards {
        shard.position += shard.velocity * dt;
        shard.velocity.z -= GRAVITY * DEBRIS_GRAVITY_FACTOR * dt;
        shard.rotation += shard.angular_velocity * dt;

        let ground = terrain.height_at(shard.position.x, shard.position.y);
        if shard.position.z <= ground {
            shard.position.z = ground;
            shard.velocity.x *= DEBRIS_BOUNCE_HORIZONTAL;
            shard.velocity.y *= DEBRIS_BOUNCE_HORIZONTAL;
            shard.velocity.z *= -DEBRIS_BOUNCE_VERTICAL;
            shard.grounded = true;
        }
        if shard.grounded {
            shard.opacity = (shard.opacity - DEBRIS_FADE_RATE * dt).max(0.0);
        }
    }
}

/// Total time an effect stays alive.
pub fn total_lifetime(state: &EffectState) -> f64 {
    state.life + state.smoke_life.max(EFFECT_MIN_TAIL_SECS)
}

/// Whether the effect can be removed.
pub fn is_expired(state: &EffectState) -> bool {
    state.age >= total_lifetime(state)
}

/// Advance every live effect by `dt` seconds.
pub fn run<H>(world: &mut World, terrain: &H, dt: f64)
where
    H: HeightField + ?Sized,
{
    for (_entity, (state, cloud, debris)) in
        world.query_mut::<(&mut EffectState, &mut ParticleCloud, &mut DebrisField)>()
    {
        advance(state, dt);
        step_particles(cloud, dt);
        step_debris(debris, state, terrain, dt);
    }
}
