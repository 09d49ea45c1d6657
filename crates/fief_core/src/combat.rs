//! Combat and targeting resolution.
//!
//! Target acquisition scans the tick snapshot in iteration order (not
//! nearest-first) and takes the first hostile within detection radius.
//! Engagement closes to range via short pursuit waypoints, then attacks
//! on cooldown: melee types damage instantly, archers loose a projectile
//! that resolves over later ticks. A missing target is never a fault -
//! the attacker reverts to Idle, a projectile removes itself.

use std::collections::HashSet;

use tracing::debug;

use crate::data::{PROJECTILE_HIT_RADIUS, PROJECTILE_RADIUS, PROJECTILE_SPEED};
use crate::entity::{
    Entity, EntityId, EntityKind, EntityStore, Health, Owner, ProjectileData, UnitState,
};
use crate::math::Fixed;

/// Check whether a back-reference no longer points at a live entity.
///
/// Entities marked for deferred removal this tick count as gone, so a
/// kill is observed by everyone processed later in the same tick.
pub(crate) fn target_lost(
    store: &EntityStore,
    target: EntityId,
    removals: &HashSet<EntityId>,
) -> bool {
    removals.contains(&target)
        || store
            .get(target)
            .map_or(true, |entity| entity.health.is_dead())
}

/// Scan for the first hostile entity within `radius` of the seeker.
///
/// Iterates the tick snapshot in id order; resource deposits, projectiles
/// and neutral entities are never candidates.
pub(crate) fn acquire_target(
    store: &EntityStore,
    ids: &[EntityId],
    seeker: EntityId,
    radius: Fixed,
    removals: &HashSet<EntityId>,
) -> Option<EntityId> {
    let seeker_entity = store.get(seeker)?;
    if seeker_entity.owner == Owner::Neutral {
        return None;
    }
    let owner = seeker_entity.owner;
    let position = seeker_entity.position;

    for &candidate in ids {
        if candidate == seeker || removals.contains(&candidate) {
            continue;
        }
        let Some(entity) = store.get(candidate) else {
            continue;
        };
        if !entity.is_attackable_by(owner) {
            continue;
        }
        if position.distance(entity.position) <= radius {
            return Some(candidate);
        }
    }
    None
}

/// Drop the unit back to Idle with no target.
pub(crate) fn revert_to_idle(store: &mut EntityStore, id: EntityId) {
    if let Some(unit) = store.get_mut(id).and_then(Entity::as_unit_mut) {
        unit.state = UnitState::Idle;
        unit.target = None;
    }
}

/// Run one engagement step for a unit in Attacking state.
pub(crate) fn engage(
    store: &mut EntityStore,
    id: EntityId,
    removals: &mut HashSet<EntityId>,
    now_ms: u64,
) {
    let Some(entity) = store.get(id) else {
        return;
    };
    let position = entity.position;
    let radius = entity.radius;
    let owner = entity.owner;
    let Some(unit) = entity.as_unit() else {
        return;
    };
    let Some(target_id) = unit.target else {
        revert_to_idle(store, id);
        return;
    };

    if target_lost(store, target_id, removals) {
        revert_to_idle(store, id);
        return;
    }
    let Some(target) = store.get(target_id) else {
        revert_to_idle(store, id);
        return;
    };

    let target_position = target.position;
    let reach = unit.attack_range + radius + target.radius;
    let distance = position.distance(target_position);

    let damage = unit.attack_damage;
    let cooldown_ms = unit.attack_cooldown_ms;
    let last_attack_ms = unit.last_attack_ms;
    let looses_arrows = unit.unit_type.uses_projectiles();

    if distance > reach {
        // Close the gap one pursuit waypoint at a time.
        crate::movement::pursue(store, id, target_position);
        return;
    }

    // In range: stop pursuing.
    if let Some(unit) = store.get_mut(id).and_then(Entity::as_unit_mut) {
        unit.move_target = None;
    }

    if now_ms.saturating_sub(last_attack_ms) < cooldown_ms {
        return;
    }
    if let Some(unit) = store.get_mut(id).and_then(Entity::as_unit_mut) {
        unit.last_attack_ms = now_ms;
    }

    if looses_arrows {
        spawn_arrow(store, owner, id, target_id, damage);
    } else if let Some(target) = store.get_mut(target_id) {
        target.health.apply_damage(damage);
        if target.health.is_dead() {
            removals.insert(target_id);
            debug!(attacker = id, target = target_id, "melee kill");
        }
    }
}

/// Spawn a projectile homing on `target`.
///
/// Inserted directly into the store; the snapshot rule means it first
/// flies on the next tick.
fn spawn_arrow(
    store: &mut EntityStore,
    owner: Owner,
    shooter: EntityId,
    target: EntityId,
    damage: u32,
) {
    let Some(origin) = store.get(shooter).map(|entity| entity.position) else {
        return;
    };
    store.insert(Entity {
        id: 0,
        owner,
        position: origin,
        radius: Fixed::from_num(PROJECTILE_RADIUS),
        health: Health::new(1),
        kind: EntityKind::Projectile(ProjectileData {
            target,
            damage,
            speed: Fixed::from_num(PROJECTILE_SPEED),
        }),
    });
}

/// Advance every projectile in the tick snapshot.
///
/// Each projectile either loses its target (self-removal), impacts
/// (damage, then self-removal), or advances along the bearing.
pub(crate) fn run_projectiles(
    store: &mut EntityStore,
    ids: &[EntityId],
    removals: &mut HashSet<EntityId>,
) {
    let hit_radius = Fixed::from_num(PROJECTILE_HIT_RADIUS);

    for &id in ids {
        if removals.contains(&id) {
            continue;
        }
        let Some(entity) = store.get(id) else {
            continue;
        };
        let EntityKind::Projectile(projectile) = &entity.kind else {
            continue;
        };
        let projectile = *projectile;
        let position = entity.position;

        if target_lost(store, projectile.target, removals) {
            removals.insert(id);
            continue;
        }
        let Some(target) = store.get(projectile.target) else {
            removals.insert(id);
            continue;
        };
        let target_position = target.position;

        if position.distance(target_position) <= hit_radius {
            if let Some(target) = store.get_mut(projectile.target) {
                target.health.apply_damage(projectile.damage);
                if target.health.is_dead() {
                    removals.insert(projectile.target);
                    debug!(projectile = id, target = projectile.target, "projectile kill");
                }
            }
            removals.insert(id);
        } else if let Some(entity) = store.get_mut(id) {
            entity.position = position.step_toward(target_position, projectile.speed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitType;
    use crate::entity::UnitData;
    use crate::math::Vec2Fixed;

    fn spawn_unit(store: &mut EntityStore, owner: Owner, unit_type: UnitType, x: i32) -> EntityId {
        let stats = unit_type.stats();
        store.insert(Entity {
            id: 0,
            owner,
            position: Vec2Fixed::from_ints(x, 0),
            radius: stats.radius(),
            health: Health::new(stats.hp),
            kind: EntityKind::Unit(UnitData::new(unit_type)),
        })
    }

    fn order_attack(store: &mut EntityStore, attacker: EntityId, target: EntityId) {
        let unit = store.get_mut(attacker).unwrap().as_unit_mut().unwrap();
        unit.state = UnitState::Attacking;
        unit.target = Some(target);
    }

    #[test]
    fn test_acquire_takes_first_in_id_order_not_nearest() {
        let mut store = EntityStore::new();
        let seeker = spawn_unit(&mut store, Owner::Human, UnitType::Militia, 0);
        let far_foe = spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 100);
        let near_foe = spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 20);

        let ids = store.sorted_ids();
        let removals = HashSet::new();
        let found = acquire_target(&store, &ids, seeker, Fixed::from_num(150), &removals);
        assert_eq!(found, Some(far_foe), "id order wins over distance");
        assert_ne!(found, Some(near_foe));
    }

    #[test]
    fn test_acquire_ignores_friends_neutrals_and_out_of_range() {
        let mut store = EntityStore::new();
        let seeker = spawn_unit(&mut store, Owner::Human, UnitType::Militia, 0);
        spawn_unit(&mut store, Owner::Human, UnitType::Militia, 10);
        spawn_unit(&mut store, Owner::Neutral, UnitType::Peasant, 20);
        spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 500);

        let ids = store.sorted_ids();
        let removals = HashSet::new();
        assert_eq!(
            acquire_target(&store, &ids, seeker, Fixed::from_num(150), &removals),
            None
        );
    }

    #[test]
    fn test_acquire_skips_marked_dead() {
        let mut store = EntityStore::new();
        let seeker = spawn_unit(&mut store, Owner::Human, UnitType::Militia, 0);
        let foe = spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 30);

        let ids = store.sorted_ids();
        let mut removals = HashSet::new();
        removals.insert(foe);
        assert_eq!(
            acquire_target(&store, &ids, seeker, Fixed::from_num(150), &removals),
            None
        );
    }

    #[test]
    fn test_melee_attack_cadence() {
        // Militia: 8 damage, 1000ms cooldown, vs 40hp target in range.
        let mut store = EntityStore::new();
        let attacker = spawn_unit(&mut store, Owner::Human, UnitType::Militia, 0);
        let target = spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 10);
        store.get_mut(target).unwrap().health = Health::new(40);
        order_attack(&mut store, attacker, target);

        let mut removals = HashSet::new();

        // t=0: cooldown not yet elapsed since last_attack_ms=0.
        engage(&mut store, attacker, &mut removals, 0);
        assert_eq!(store.get(target).unwrap().health.current, 40);

        for (now, expected_hp) in [(1000, 32), (2000, 24), (3000, 16), (4000, 8)] {
            engage(&mut store, attacker, &mut removals, now);
            assert_eq!(store.get(target).unwrap().health.current, expected_hp);
        }

        engage(&mut store, attacker, &mut removals, 5000);
        assert_eq!(store.get(target).unwrap().health.current, 0);
        assert!(removals.contains(&target));
    }

    #[test]
    fn test_cooldown_blocks_double_hits() {
        let mut store = EntityStore::new();
        let attacker = spawn_unit(&mut store, Owner::Human, UnitType::Militia, 0);
        let target = spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 10);
        order_attack(&mut store, attacker, target);

        let mut removals = HashSet::new();
        engage(&mut store, attacker, &mut removals, 1000);
        let hp_after_first = store.get(target).unwrap().health.current;
        engage(&mut store, attacker, &mut removals, 1500);
        assert_eq!(store.get(target).unwrap().health.current, hp_after_first);
    }

    #[test]
    fn test_out_of_range_sets_pursuit_waypoint() {
        let mut store = EntityStore::new();
        let attacker = spawn_unit(&mut store, Owner::Human, UnitType::Militia, 0);
        let target = spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 300);
        order_attack(&mut store, attacker, target);

        let mut removals = HashSet::new();
        engage(&mut store, attacker, &mut removals, 1000);

        let unit = store.get(attacker).unwrap().as_unit().unwrap();
        let waypoint = unit.move_target.expect("pursuit waypoint set");
        let epsilon = Fixed::from_num(1) / Fixed::from_num(100);
        assert!((waypoint.x - Fixed::from_num(20)).abs() < epsilon);
        assert_eq!(waypoint.y, Fixed::ZERO);
        // No damage from out of range.
        assert!(store.get(target).unwrap().health.is_full());
    }

    #[test]
    fn test_entering_range_clears_destination() {
        let mut store = EntityStore::new();
        let attacker = spawn_unit(&mut store, Owner::Human, UnitType::Militia, 0);
        let target = spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 10);
        order_attack(&mut store, attacker, target);
        store
            .get_mut(attacker)
            .unwrap()
            .as_unit_mut()
            .unwrap()
            .move_target = Some(Vec2Fixed::from_ints(900, 900));

        let mut removals = HashSet::new();
        engage(&mut store, attacker, &mut removals, 0);

        let unit = store.get(attacker).unwrap().as_unit().unwrap();
        assert_eq!(unit.move_target, None);
    }

    #[test]
    fn test_lost_target_reverts_to_idle() {
        let mut store = EntityStore::new();
        let attacker = spawn_unit(&mut store, Owner::Human, UnitType::Militia, 0);
        order_attack(&mut store, attacker, 999);

        let mut removals = HashSet::new();
        engage(&mut store, attacker, &mut removals, 1000);

        let unit = store.get(attacker).unwrap().as_unit().unwrap();
        assert_eq!(unit.state, UnitState::Idle);
        assert_eq!(unit.target, None);
    }

    #[test]
    fn test_archer_spawns_projectile_instead_of_damaging() {
        let mut store = EntityStore::new();
        let archer = spawn_unit(&mut store, Owner::Human, UnitType::Archer, 0);
        let target = spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 50);
        order_attack(&mut store, archer, target);

        let mut removals = HashSet::new();
        engage(&mut store, archer, &mut removals, 2000);

        assert!(store.get(target).unwrap().health.is_full());
        let arrows: Vec<_> = store
            .iter()
            .filter(|(_, e)| matches!(e.kind, EntityKind::Projectile(_)))
            .collect();
        assert_eq!(arrows.len(), 1);
        let (_, arrow) = arrows[0];
        assert_eq!(arrow.owner, Owner::Human);
        match &arrow.kind {
            EntityKind::Projectile(p) => {
                assert_eq!(p.target, target);
                assert_eq!(p.damage, UnitType::Archer.stats().damage);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_projectile_advances_then_impacts() {
        let mut store = EntityStore::new();
        let target = spawn_unit(&mut store, Owner::Ai, UnitType::Militia, 13);
        let arrow = store.insert(Entity {
            id: 0,
            owner: Owner::Human,
            position: Vec2Fixed::from_ints(0, 0),
            radius: Fixed::from_num(PROJECTILE_RADIUS),
            health: Health::new(1),
            kind: EntityKind::Projectile(ProjectileData {
                target,
                damage: 6,
                speed: Fixed::from_num(PROJECTILE_SPEED),
            }),
        });

        let ids = store.sorted_ids();
        let mut removals = HashSet::new();

        // 13 units away, hit radius 10: one 5-unit step closes to 8,
        // still flying; next pass is within 10 and impacts.
        run_projectiles(&mut store, &ids, &mut removals);
        assert!(!removals.contains(&arrow));
        assert!(store.get(target).unwrap().health.is_full());

        run_projectiles(&mut store, &ids, &mut removals);
        assert!(removals.contains(&arrow));
        let hp = store.get(target).unwrap().health;
        assert_eq!(hp.current, hp.max - 6);
    }

    #[test]
    fn test_projectile_with_lost_target_removes_itself() {
        let mut store = EntityStore::new();
        let arrow = store.insert(Entity {
            id: 0,
            owner: Owner::Ai,
            position: Vec2Fixed::from_ints(0, 0),
            radius: Fixed::from_num(PROJECTILE_RADIUS),
            health: Health::new(1),
            kind: EntityKind::Projectile(ProjectileData {
                target: 424_242,
                damage: 6,
                speed: Fixed::from_num(PROJECTILE_SPEED),
            }),
        });

        let ids = store.sorted_ids();
        let mut removals = HashSet::new();
        run_projectiles(&mut store, &ids, &mut removals);
        assert!(removals.contains(&arrow));
    }
}
