//! Movement and local steering.
//!
//! Two independent effects per unit per tick:
//!
//! 1. A separation impulse: overlapping units push each other apart
//!    proportionally to the overlap, damped, applied directly to
//!    position. Prevents stacking without full collision resolution.
//! 2. Destination pursuit: a unit with an active `move_target` advances
//!    one `move_speed` step along the straight-line bearing, snapping to
//!    the destination once within a step.

use crate::data::{PURSUIT_STEP, SEPARATION_DAMPING_DIVISOR};
use crate::entity::{EntityId, EntityKind, EntityStore, UnitState};
use crate::math::{Fixed, Vec2Fixed};

/// Steer a unit toward `target` by rewriting its movement destination to
/// a waypoint at most one pursuit step along the bearing. Used by combat
/// and gathering whenever a unit is out of interaction range.
pub(crate) fn pursue(store: &mut EntityStore, id: EntityId, target: Vec2Fixed) {
    if let Some(entity) = store.get_mut(id) {
        let position = entity.position;
        if let EntityKind::Unit(unit) = &mut entity.kind {
            unit.move_target = Some(position.step_toward(target, Fixed::from_num(PURSUIT_STEP)));
        }
    }
}

/// Run movement for every unit in the tick snapshot.
///
/// Mutates positions in place: later-processed units see the already
/// updated positions of earlier ones. The snapshot `ids` is also the
/// neighbor set for separation, so units spawned mid-tick exert no push
/// until next tick.
pub(crate) fn run(store: &mut EntityStore, ids: &[EntityId]) {
    for &id in ids {
        let Some(entity) = store.get(id) else {
            continue;
        };
        let Some(unit) = entity.as_unit() else {
            continue;
        };

        let position = entity.position;
        let radius = entity.radius;
        let speed = unit.move_speed;

        let push = separation_impulse(store, ids, id, position, radius);

        let Some(entity) = store.get_mut(id) else {
            continue;
        };
        entity.position += push;

        let position = entity.position;
        let EntityKind::Unit(unit) = &mut entity.kind else {
            continue;
        };

        if let Some(destination) = unit.move_target {
            let distance = position.distance(destination);
            if distance > speed {
                entity.position = position.step_toward(destination, speed);
            } else {
                // Arrival: snap and settle.
                unit.move_target = None;
                if unit.state == UnitState::Moving && unit.target.is_none() {
                    unit.state = UnitState::Idle;
                }
                entity.position = destination;
            }
        }
    }
}

/// Summed, damped push-apart offset for one unit against all other units.
fn separation_impulse(
    store: &EntityStore,
    ids: &[EntityId],
    id: EntityId,
    position: Vec2Fixed,
    radius: Fixed,
) -> Vec2Fixed {
    let mut push = Vec2Fixed::ZERO;

    for &other_id in ids {
        if other_id == id {
            continue;
        }
        let Some(other) = store.get(other_id) else {
            continue;
        };
        if !matches!(other.kind, EntityKind::Unit(_)) {
            continue;
        }

        let min_distance = radius + other.radius;
        let delta = position - other.position;
        let distance = delta.length();
        if distance >= min_distance {
            continue;
        }

        let overlap = min_distance - distance;
        if distance > Fixed::ZERO {
            push += delta.scale(overlap / distance);
        } else {
            // Exactly stacked: deterministic tie-break along x.
            let sign = if id > other_id { 1 } else { -1 };
            push += Vec2Fixed::from_ints(sign, 0).scale(overlap);
        }
    }

    push.scale(Fixed::from_num(1) / Fixed::from_num(SEPARATION_DAMPING_DIVISOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitType;
    use crate::entity::{Entity, Health, Owner, UnitData};

    fn unit_at(store: &mut EntityStore, owner: Owner, x: i32, y: i32) -> EntityId {
        let stats = UnitType::Militia.stats();
        store.insert(Entity {
            id: 0,
            owner,
            position: Vec2Fixed::from_ints(x, y),
            radius: stats.radius(),
            health: Health::new(stats.hp),
            kind: EntityKind::Unit(UnitData::new(UnitType::Militia)),
        })
    }

    #[test]
    fn test_unit_steps_toward_destination() {
        let mut store = EntityStore::new();
        let id = unit_at(&mut store, Owner::Human, 0, 0);
        store
            .get_mut(id)
            .unwrap()
            .as_unit_mut()
            .unwrap()
            .move_target = Some(Vec2Fixed::from_ints(100, 0));
        store.get_mut(id).unwrap().as_unit_mut().unwrap().state = UnitState::Moving;

        let ids = store.sorted_ids();
        run(&mut store, &ids);

        let entity = store.get(id).unwrap();
        let epsilon = Fixed::from_num(1) / Fixed::from_num(100);
        assert!((entity.position.x - Fixed::from_num(2)).abs() < epsilon);
        assert_eq!(entity.position.y, Fixed::ZERO);
        assert_eq!(entity.as_unit().unwrap().state, UnitState::Moving);
    }

    #[test]
    fn test_arrival_snaps_and_goes_idle() {
        let mut store = EntityStore::new();
        let id = unit_at(&mut store, Owner::Human, 99, 0);
        {
            let unit = store.get_mut(id).unwrap().as_unit_mut().unwrap();
            unit.move_target = Some(Vec2Fixed::from_ints(100, 0));
            unit.state = UnitState::Moving;
        }

        let ids = store.sorted_ids();
        run(&mut store, &ids);

        let entity = store.get(id).unwrap();
        assert_eq!(entity.position, Vec2Fixed::from_ints(100, 0));
        let unit = entity.as_unit().unwrap();
        assert_eq!(unit.state, UnitState::Idle);
        assert_eq!(unit.move_target, None);
    }

    #[test]
    fn test_arrival_with_target_keeps_state() {
        let mut store = EntityStore::new();
        let id = unit_at(&mut store, Owner::Human, 99, 0);
        let foe = unit_at(&mut store, Owner::Ai, 500, 500);
        {
            let unit = store.get_mut(id).unwrap().as_unit_mut().unwrap();
            unit.move_target = Some(Vec2Fixed::from_ints(100, 0));
            unit.state = UnitState::Attacking;
            unit.target = Some(foe);
        }

        let ids = store.sorted_ids();
        run(&mut store, &ids);

        let unit = store.get(id).unwrap().as_unit().unwrap();
        assert_eq!(unit.state, UnitState::Attacking);
    }

    #[test]
    fn test_overlapping_units_push_apart() {
        let mut store = EntityStore::new();
        let a = unit_at(&mut store, Owner::Human, 0, 0);
        let b = unit_at(&mut store, Owner::Human, 4, 0);

        let ids = store.sorted_ids();
        run(&mut store, &ids);

        let ax = store.get(a).unwrap().position.x;
        let bx = store.get(b).unwrap().position.x;
        assert!(ax < Fixed::ZERO, "left unit pushed further left: {ax:?}");
        assert!(bx > Fixed::from_num(4), "right unit pushed right: {bx:?}");
    }

    #[test]
    fn test_exactly_stacked_units_separate() {
        let mut store = EntityStore::new();
        let a = unit_at(&mut store, Owner::Human, 10, 10);
        let b = unit_at(&mut store, Owner::Human, 10, 10);

        let ids = store.sorted_ids();
        run(&mut store, &ids);

        let pa = store.get(a).unwrap().position;
        let pb = store.get(b).unwrap().position;
        assert_ne!(pa, pb, "stacked units must not remain coincident");
    }

    #[test]
    fn test_distant_units_unaffected() {
        let mut store = EntityStore::new();
        let a = unit_at(&mut store, Owner::Human, 0, 0);
        let b = unit_at(&mut store, Owner::Human, 200, 0);

        let ids = store.sorted_ids();
        run(&mut store, &ids);

        assert_eq!(store.get(a).unwrap().position, Vec2Fixed::from_ints(0, 0));
        assert_eq!(store.get(b).unwrap().position, Vec2Fixed::from_ints(200, 0));
    }
}
