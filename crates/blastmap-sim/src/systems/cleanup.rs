//! Cleanup system: removes expired effects, and clears the impact scenario
//! on request.

use hecs::{Entity, World};

use blastmap_core::components::{BuildingDamage, EffectState, Impact};
use blastmap_core::events::SimEvent;

use super::blast;

/// Despawn effects whose total lifetime has elapsed.
/// Uses a pre-allocated buffer to avoid per-tick allocation.
pub fn run(world: &mut World, despawn_buffer: &mut Vec<Entity>, events: &mut Vec<SimEvent>) {
    despawn_buffer.clear();

    let mut expired: Vec<u32> = Vec::new();
    for (entity, state) in world.query_mut::<&EffectState>() {
        if blast::is_expired(state) {
            despawn_buffer.push(entity);
            expired.push(state.impact_id);
        }
    }

    expired.sort_unstable();
    events.extend(
        expired
            .into_iter()
            .map(|impact_id| SimEvent::EffectExpired { impact_id }),
    );

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
}

/// Remove every impact and effect and reset building damage.
/// Returns the number of impacts removed.
pub fn clear_impacts(world: &mut World, despawn_buffer: &mut Vec<Entity>) -> usize {
    despawn_buffer.clear();

    for (entity, _impact) in world.query_mut::<&Impact>() {
        despawn_buffer.push(entity);
    }
    let count = despawn_buffer.len();

    for (entity, _state) in world.query_mut::<&EffectState>() {
        despawn_buffer.push(entity);
    }
    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }

    for (_entity, damage) in world.query_mut::<&mut BuildingDamage>() {
        *damage = BuildingDamage::default();
    }
    count
}
