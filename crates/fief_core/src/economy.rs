//! Economy and production engine.
//!
//! Covers resource gathering, construction and repair, production queue
//! ticking and the farm lifecycle. Costs are debited at enqueue/placement
//! time, never at completion. All failure branches are soft: a vanished
//! deposit or finished building drops the worker back to Idle.

use std::collections::HashSet;

use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::data::{
    BuildingType, ResourceKind, FARM_GENERATION_AMOUNT, FARM_GENERATION_INTERVAL_MS, FARM_STOCK,
    FARM_WORK_AMOUNT, GATHER_AMOUNT, SPAWN_EDGE_OFFSET,
};
use crate::entity::{
    Entity, EntityId, EntityKind, EntityStore, FarmState, Health, UnitData, UnitState,
};
use crate::math::{random_direction, Fixed};
use crate::player::Players;
use crate::{combat, movement};

/// Run one gathering step for a unit in Gathering state.
///
/// Two workable targets exist: neutral resource deposits (yield their own
/// kind) and the owner's built farms with stock (yield food). Anything
/// else is a lost target.
pub(crate) fn gather(
    store: &mut EntityStore,
    players: &mut Players,
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
        combat::revert_to_idle(store, id);
        return;
    };
    let reach = unit.attack_range + radius;
    let cooldown_ms = unit.attack_cooldown_ms;
    let last_attack_ms = unit.last_attack_ms;

    if combat::target_lost(store, target_id, removals) {
        combat::revert_to_idle(store, id);
        return;
    }
    let Some(target) = store.get(target_id) else {
        combat::revert_to_idle(store, id);
        return;
    };
    let target_position = target.position;
    let reach = reach + target.radius;

    enum Work {
        Deposit,
        Farm,
    }

    let work = match &target.kind {
        EntityKind::Resource(resource) if resource.amount > 0 => Work::Deposit,
        EntityKind::Building(building)
            if building.building_type == BuildingType::Farm
                && building.is_built
                && target.owner == owner
                && building.farm.is_some_and(|farm| !farm.is_depleted()) =>
        {
            Work::Farm
        }
        // Emptied deposit, depleted farm, or a mismatched target kind.
        _ => {
            combat::revert_to_idle(store, id);
            return;
        }
    };

    if position.distance(target_position) > reach {
        movement::pursue(store, id, target_position);
        return;
    }
    if let Some(unit) = store.get_mut(id).and_then(Entity::as_unit_mut) {
        unit.move_target = None;
    }

    if now_ms.saturating_sub(last_attack_ms) < cooldown_ms {
        return;
    }
    if let Some(unit) = store.get_mut(id).and_then(Entity::as_unit_mut) {
        unit.last_attack_ms = now_ms;
    }

    match work {
        Work::Deposit => {
            let Some(target) = store.get_mut(target_id) else {
                return;
            };
            let EntityKind::Resource(resource) = &mut target.kind else {
                return;
            };
            let kind = resource.kind;
            let taken = resource.extract(GATHER_AMOUNT);
            let emptied = resource.amount <= 0;
            players.get_mut(owner).stockpile.deposit(kind, taken);
            if emptied {
                removals.insert(target_id);
                debug!(deposit = target_id, "resource deposit exhausted");
            }
        }
        Work::Farm => {
            let Some(target) = store.get_mut(target_id) else {
                return;
            };
            let Some(farm) = target.as_building_mut().and_then(|b| b.farm.as_mut()) else {
                return;
            };
            let taken = farm.extract(FARM_WORK_AMOUNT);
            players
                .get_mut(owner)
                .stockpile
                .deposit(ResourceKind::Food, taken);
        }
    }
}

/// Run one step for a unit in Building state: close to the site and stand
/// by it. Progress itself is applied building-side in [`run`], gated on a
/// builder being present.
pub(crate) fn tend_building(
    store: &mut EntityStore,
    id: EntityId,
    removals: &HashSet<EntityId>,
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
        combat::revert_to_idle(store, id);
        return;
    };
    let reach = unit.attack_range + radius;

    if combat::target_lost(store, target_id, removals) {
        combat::revert_to_idle(store, id);
        return;
    }
    let Some(target) = store.get(target_id) else {
        combat::revert_to_idle(store, id);
        return;
    };

    let site_done = match &target.kind {
        EntityKind::Building(building) if target.owner == owner => {
            building.is_built && target.health.is_full()
        }
        // Not a friendly building: treat as lost.
        _ => true,
    };
    if site_done {
        combat::revert_to_idle(store, id);
        return;
    }

    let target_position = target.position;
    if position.distance(target_position) > reach + target.radius {
        movement::pursue(store, id, target_position);
    } else if let Some(unit) = store.get_mut(id).and_then(Entity::as_unit_mut) {
        unit.move_target = None;
    }
}

/// Check whether any live unit is on site working this building.
fn has_builder_on_site(store: &EntityStore, ids: &[EntityId], building_id: EntityId) -> bool {
    let Some(building) = store.get(building_id) else {
        return false;
    };
    ids.iter().any(|&id| {
        if id == building_id {
            return false;
        }
        let Some(entity) = store.get(id) else {
            return false;
        };
        if entity.health.is_dead() || entity.owner != building.owner {
            return false;
        }
        let Some(unit) = entity.as_unit() else {
            return false;
        };
        unit.state == UnitState::Building
            && unit.target == Some(building_id)
            && entity.position.distance(building.position)
                <= unit.attack_range + entity.radius + building.radius
    })
}

/// Run the per-building economy pass over the tick snapshot:
/// construction and repair, production queues, farm auto-generation, and
/// cleanup of emptied deposits.
pub(crate) fn run(
    store: &mut EntityStore,
    players: &mut Players,
    ids: &[EntityId],
    removals: &mut HashSet<EntityId>,
    now_ms: u64,
    delta_ms: u64,
    rng: &mut SmallRng,
) {
    enum Step {
        Building,
        EmptyDeposit,
        Skip,
    }

    for &id in ids {
        if removals.contains(&id) {
            continue;
        }
        let step = match store.get(id).map(|entity| &entity.kind) {
            Some(EntityKind::Building(_)) => Step::Building,
            Some(EntityKind::Resource(resource)) if resource.amount <= 0 => Step::EmptyDeposit,
            _ => Step::Skip,
        };
        match step {
            Step::Building => {
                step_building(store, players, ids, id, now_ms, delta_ms, rng);
            }
            Step::EmptyDeposit => {
                removals.insert(id);
            }
            Step::Skip => {}
        }
    }
}

fn step_building(
    store: &mut EntityStore,
    players: &mut Players,
    ids: &[EntityId],
    id: EntityId,
    now_ms: u64,
    delta_ms: u64,
    rng: &mut SmallRng,
) {
    let Some(entity) = store.get(id) else {
        return;
    };
    let owner = entity.owner;
    let position = entity.position;
    let radius = entity.radius;
    let Some(building) = entity.as_building() else {
        return;
    };
    let building_type = building.building_type;
    let stats = building_type.stats();
    let is_built = building.is_built;
    let worked = (!is_built || !entity.health.is_full()) && has_builder_on_site(store, ids, id);

    if !is_built {
        if worked {
            let Some(entity) = store.get_mut(id) else {
                return;
            };
            entity.health.heal(stats.hp_per_tick());
            let Some(building) = entity.as_building_mut() else {
                return;
            };
            building.construction_progress += stats.progress_per_tick();
            if building.construction_progress >= Fixed::from_num(100) {
                building.construction_progress = Fixed::from_num(100);
                building.is_built = true;
                if building_type == BuildingType::Farm {
                    building.farm = Some(FarmState::full(FARM_STOCK, now_ms));
                }
                entity.health = Health::new(stats.hp);
                info!(building = id, ?building_type, ?owner, "construction complete");
            }
        }
        return;
    }

    // Finished building: repair, then production, then farm output.
    if worked {
        if let Some(entity) = store.get_mut(id) {
            entity.health.heal(stats.hp_per_tick());
        }
    }

    let completed = {
        let Some(building) = store.get_mut(id).and_then(Entity::as_building_mut) else {
            return;
        };
        match building.queue.front_mut() {
            Some(head) => {
                head.time_left_ms = head.time_left_ms.saturating_sub(delta_ms);
                if head.time_left_ms == 0 {
                    building.queue.pop_front().map(|item| item.unit_type)
                } else {
                    None
                }
            }
            None => None,
        }
    };
    if let Some(unit_type) = completed {
        let spawn_point =
            position + random_direction(rng).scale(radius + Fixed::from_num(SPAWN_EDGE_OFFSET));
        let unit_stats = unit_type.stats();
        let mut unit = UnitData::new(unit_type);
        // Settle onto the spawn point instead of drifting.
        unit.move_target = Some(spawn_point);
        let spawned = store.insert(Entity {
            id: 0,
            owner,
            position: spawn_point,
            radius: unit_stats.radius(),
            health: Health::new(unit_stats.hp),
            kind: EntityKind::Unit(unit),
        });
        info!(building = id, unit = spawned, ?unit_type, ?owner, "training complete");
    }

    // Farm auto-generation: worker-independent drain into the food bank.
    let generated = {
        let Some(building) = store.get_mut(id).and_then(Entity::as_building_mut) else {
            return;
        };
        match building.farm.as_mut() {
            Some(farm)
                if !farm.is_depleted()
                    && now_ms.saturating_sub(farm.last_generation_ms)
                        >= FARM_GENERATION_INTERVAL_MS =>
            {
                farm.last_generation_ms = now_ms;
                farm.extract(FARM_GENERATION_AMOUNT)
            }
            _ => 0,
        }
    };
    if generated > 0 {
        players
            .get_mut(owner)
            .stockpile
            .deposit(ResourceKind::Food, generated);
    }
}

/// Reseed price check plus payment, used when a worker is directed at a
/// depleted farm. Refills stock to capacity; construction state is
/// untouched.
pub(crate) fn try_reseed_farm(
    store: &mut EntityStore,
    players: &mut Players,
    farm_id: EntityId,
) -> bool {
    let Some(entity) = store.get(farm_id) else {
        return false;
    };
    let owner = entity.owner;
    let Some(building) = entity.as_building() else {
        return false;
    };
    if building.building_type != BuildingType::Farm || !building.is_built {
        return false;
    }
    if !building.farm.is_some_and(|farm| farm.is_depleted()) {
        return false;
    }
    if !players
        .get_mut(owner)
        .stockpile
        .spend(crate::data::FARM_RESEED_COST)
    {
        return false;
    }

    let last_generation_ms = building.farm.map_or(0, |farm| farm.last_generation_ms);
    if let Some(building) = store.get_mut(farm_id).and_then(Entity::as_building_mut) {
        if let Some(farm) = building.farm.as_mut() {
            farm.stock = farm.max_stock;
            farm.last_generation_ms = last_generation_ms;
        }
    }
    debug!(farm = farm_id, ?owner, "farm reseeded");
    true
}
