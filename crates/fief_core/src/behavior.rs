//! Per-unit behavioral state machine.
//!
//! One dispatch pass over the tick snapshot. Idle and attack-moving units
//! scan for enemies; attacking units run an engagement step; gatherers and
//! builders run their economy steps. Moving units have nothing to do here -
//! arrival handling lives in the movement pass.

use std::collections::HashSet;

use crate::data::{ATTACK_MOVE_DETECT_RADIUS, IDLE_DETECT_RADIUS};
use crate::entity::{Entity, EntityId, EntityStore, Owner, UnitState};
use crate::math::Fixed;
use crate::player::Players;
use crate::{combat, economy};

/// Run the state machine for every unit in the tick snapshot.
pub(crate) fn run(
    store: &mut EntityStore,
    players: &mut Players,
    ids: &[EntityId],
    removals: &mut HashSet<EntityId>,
    now_ms: u64,
) {
    for &id in ids {
        if removals.contains(&id) {
            continue;
        }
        let Some(entity) = store.get(id) else {
            continue;
        };
        if entity.health.is_dead() || entity.owner == Owner::Neutral {
            continue;
        }
        let Some(unit) = entity.as_unit() else {
            continue;
        };

        match unit.state {
            UnitState::Idle => {
                auto_acquire(store, ids, id, IDLE_DETECT_RADIUS, true, removals);
            }
            UnitState::AttackMoving => {
                auto_acquire(store, ids, id, ATTACK_MOVE_DETECT_RADIUS, false, removals);
            }
            UnitState::Attacking => combat::engage(store, id, removals, now_ms),
            UnitState::Gathering => economy::gather(store, players, id, removals, now_ms),
            UnitState::Building => economy::tend_building(store, id, removals),
            UnitState::Moving => {}
        }
    }
}

/// Scan and, on a hit, switch to Attacking.
///
/// An idle unit drops its movement destination; an attack-mover keeps it,
/// so the march can resume once the fight resolves.
fn auto_acquire(
    store: &mut EntityStore,
    ids: &[EntityId],
    id: EntityId,
    radius: i32,
    clear_destination: bool,
    removals: &HashSet<EntityId>,
) {
    let Some(found) = combat::acquire_target(store, ids, id, Fixed::from_num(radius), removals)
    else {
        return;
    };
    if let Some(unit) = store.get_mut(id).and_then(Entity::as_unit_mut) {
        unit.state = UnitState::Attacking;
        unit.target = Some(found);
        if clear_destination {
            unit.move_target = None;
        }
    }
}
