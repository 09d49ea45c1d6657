//! The opponent director: a scripted second player.
//!
//! Runs on a fixed decision interval, not every tick, and issues the
//! same command intents a human does - it owns no privileged mutation
//! path. Each invocation walks a fixed priority list, every step gated
//! independently by affordability and caps:
//!
//! 1. Put idle workers to work (reseed, then wood or food by need)
//! 2. Keep peasant production going at the town center
//! 3. Expand: house near the cap, farms on wood surplus, barracks
//! 4. Train army units at idle barracks
//! 5. Push the enemy town center once the army is big enough
//! 6. Pull the army back onto intruders near home

use rand::Rng;

use crate::data::{BuildingType, ResourceKind, UnitType, FARM_RESEED_COST};
use crate::entity::{EntityId, EntityKind, Owner, UnitState};
use crate::math::{random_direction, Fixed, Vec2Fixed};
use crate::simulation::Simulation;

/// Time between director invocations.
const DECISION_INTERVAL_MS: u64 = 2000;

/// Keep gathering wood until the bank holds this much.
const WOOD_RESERVE: i32 = 100;

/// Wood bank level that justifies spending on farms.
const WOOD_SURPLUS: i32 = 200;

/// Peasant head count the director works toward.
const WORKER_CAP: usize = 7;

/// Farm count cap.
const FARM_CAP: usize = 4;

/// Barracks count cap.
const BARRACKS_CAP: usize = 2;

/// Build a house when within this many units of the population cap.
const HOUSE_POP_MARGIN: u32 = 2;

/// Army size that triggers the push on the enemy base.
const ARMY_ATTACK_THRESHOLD: usize = 6;

/// Enemies inside this radius of the town center trigger a defense.
const DEFEND_RADIUS: i32 = 300;

/// Gap between the town center edge and new construction sites.
const BUILD_RING_MARGIN: i32 = 30;

/// Throttle state for the director.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DirectorState {
    pub(crate) last_run_ms: u64,
}

impl DirectorState {
    pub(crate) const fn new() -> Self {
        Self { last_run_ms: 0 }
    }
}

/// Run the director if its decision interval has elapsed.
pub(crate) fn maybe_run(sim: &mut Simulation) {
    let now = sim.game_time_ms;
    if now.saturating_sub(sim.director.last_run_ms) < DECISION_INTERVAL_MS {
        return;
    }
    sim.director.last_run_ms = now;
    run(sim);
}

/// A read-only sweep of everything the director cares about.
struct Outlook {
    idle_workers: Vec<(EntityId, Vec2Fixed)>,
    worker_count: usize,
    town_center: Option<(EntityId, Vec2Fixed, Fixed)>,
    idle_barracks: Vec<EntityId>,
    barracks_count: usize,
    farm_count: usize,
    depleted_farms: Vec<(EntityId, Vec2Fixed)>,
    stocked_farms: Vec<(EntityId, Vec2Fixed)>,
    wood_deposits: Vec<(EntityId, Vec2Fixed)>,
    food_deposits: Vec<(EntityId, Vec2Fixed)>,
    army: Vec<(EntityId, UnitState)>,
    enemy_town_center: Option<Vec2Fixed>,
    intruders: Vec<(EntityId, Vec2Fixed)>,
}

fn survey(sim: &Simulation) -> Outlook {
    let mut outlook = Outlook {
        idle_workers: Vec::new(),
        worker_count: 0,
        town_center: None,
        idle_barracks: Vec::new(),
        barracks_count: 0,
        farm_count: 0,
        depleted_farms: Vec::new(),
        stocked_farms: Vec::new(),
        wood_deposits: Vec::new(),
        food_deposits: Vec::new(),
        army: Vec::new(),
        enemy_town_center: None,
        intruders: Vec::new(),
    };

    for id in sim.entities.sorted_ids() {
        let Some(entity) = sim.entities.get(id) else {
            continue;
        };
        match (&entity.kind, entity.owner) {
            (EntityKind::Unit(unit), Owner::Ai) => match unit.unit_type {
                UnitType::Peasant => {
                    outlook.worker_count += 1;
                    if unit.state == UnitState::Idle {
                        outlook.idle_workers.push((id, entity.position));
                    }
                }
                UnitType::Militia | UnitType::Archer => {
                    outlook.army.push((id, unit.state));
                }
            },
            (EntityKind::Building(building), Owner::Ai) => match building.building_type {
                BuildingType::TownCenter => {
                    if building.is_built && outlook.town_center.is_none() {
                        outlook.town_center = Some((id, entity.position, entity.radius));
                    }
                }
                BuildingType::Barracks => {
                    outlook.barracks_count += 1;
                    if building.is_built && building.queue.is_empty() {
                        outlook.idle_barracks.push(id);
                    }
                }
                BuildingType::Farm => {
                    outlook.farm_count += 1;
                    if building.is_built {
                        match building.farm {
                            Some(farm) if farm.is_depleted() => {
                                outlook.depleted_farms.push((id, entity.position));
                            }
                            Some(_) => outlook.stocked_farms.push((id, entity.position)),
                            None => {}
                        }
                    }
                }
                BuildingType::House => {}
            },
            (EntityKind::Resource(resource), _) if resource.amount > 0 => match resource.kind {
                ResourceKind::Wood => outlook.wood_deposits.push((id, entity.position)),
                ResourceKind::Food => outlook.food_deposits.push((id, entity.position)),
            },
            (EntityKind::Building(building), Owner::Human) => {
                if building.building_type == BuildingType::TownCenter
                    && outlook.enemy_town_center.is_none()
                {
                    outlook.enemy_town_center = Some(entity.position);
                }
            }
            _ => {}
        }
    }

    if let Some((_, home, _)) = outlook.town_center {
        let radius = Fixed::from_num(DEFEND_RADIUS);
        for id in sim.entities.sorted_ids() {
            let Some(entity) = sim.entities.get(id) else {
                continue;
            };
            if entity.owner == Owner::Human
                && matches!(entity.kind, EntityKind::Unit(_))
                && entity.position.distance(home) <= radius
            {
                outlook.intruders.push((id, entity.position));
            }
        }
    }

    outlook
}

fn nearest(from: Vec2Fixed, candidates: &[(EntityId, Vec2Fixed)]) -> Option<(EntityId, Vec2Fixed)> {
    candidates
        .iter()
        .copied()
        .min_by_key(|(_, position)| position.distance_squared(from))
}

/// One director invocation over the AI faction.
fn run(sim: &mut Simulation) {
    let outlook = survey(sim);
    let mut worker_pool = outlook.idle_workers.clone();

    // 1. Reseed depleted farms first; remaining idle workers gather at
    //    the end, after construction projects have drawn their builders.
    let mut reseed_targets = outlook.depleted_farms.clone();
    while !reseed_targets.is_empty()
        && !worker_pool.is_empty()
        && sim.players.ai.stockpile.can_afford(FARM_RESEED_COST)
    {
        let (worker, from) = worker_pool.remove(0);
        let Some((farm, at)) = nearest(from, &reseed_targets) else {
            break;
        };
        reseed_targets.retain(|&(id, _)| id != farm);
        sim.command_move(Owner::Ai, &[worker], at, Some(farm));
    }

    // 2. Keep the worker line going.
    if let Some((tc_id, _, _)) = outlook.town_center {
        let queue_empty = sim
            .entities
            .get(tc_id)
            .and_then(|entity| entity.as_building())
            .is_some_and(|building| building.queue.is_empty());
        if outlook.worker_count < WORKER_CAP && queue_empty {
            sim.train(Owner::Ai, tc_id, UnitType::Peasant);
        }
    }

    // 3. Expansion projects, each drawing one builder from the pool.
    if let Some((_, home, home_radius)) = outlook.town_center {
        let mut place = |sim: &mut Simulation, pool: &mut Vec<(EntityId, Vec2Fixed)>, building_type: BuildingType| {
            if pool.is_empty() {
                return;
            }
            let stats = building_type.stats();
            if !sim.players.ai.stockpile.can_afford(stats.cost) {
                return;
            }
            let ring = home_radius + stats.radius() + Fixed::from_num(BUILD_RING_MARGIN);
            let direction = random_direction(&mut sim.rng);
            let site = home + direction.scale(ring);
            let (builder, _) = pool.remove(0);
            sim.place_building(Owner::Ai, building_type, site, &[builder]);
        };

        let player = sim.players.ai;
        let near_cap = player.population + HOUSE_POP_MARGIN >= player.max_population;
        if near_cap {
            place(sim, &mut worker_pool, BuildingType::House);
        }
        if outlook.farm_count < FARM_CAP && sim.players.ai.stockpile.wood > WOOD_SURPLUS {
            place(sim, &mut worker_pool, BuildingType::Farm);
        }
        if outlook.barracks_count < BARRACKS_CAP {
            place(sim, &mut worker_pool, BuildingType::Barracks);
        }
    }

    // 4. Army production at every idle barracks.
    for barracks in &outlook.idle_barracks {
        let unit_type = if sim.rng.gen_bool(0.5) {
            UnitType::Militia
        } else {
            UnitType::Archer
        };
        sim.train(Owner::Ai, *barracks, unit_type);
    }

    // 5. Offense: the whole uncommitted army marches on the enemy base.
    if outlook.army.len() > ARMY_ATTACK_THRESHOLD {
        if let Some(enemy_base) = outlook.enemy_town_center {
            let marchers: Vec<EntityId> = outlook
                .army
                .iter()
                .filter(|(_, state)| *state != UnitState::Attacking)
                .map(|(id, _)| *id)
                .collect();
            if !marchers.is_empty() {
                sim.attack_move(Owner::Ai, &marchers, enemy_base, None);
            }
        }
    }

    // 6. Defense: redirect the non-fighting army onto the nearest intruder.
    if let Some((_, home, _)) = outlook.town_center {
        if let Some((_, intruder_at)) = nearest(home, &outlook.intruders) {
            let defenders: Vec<EntityId> = outlook
                .army
                .iter()
                .filter(|(_, state)| *state != UnitState::Attacking)
                .map(|(id, _)| *id)
                .collect();
            if !defenders.is_empty() {
                sim.attack_move(Owner::Ai, &defenders, intruder_at, None);
            }
        }
    }

    // Leftover idle workers gather: wood while the bank is low, food
    // otherwise (berries preferred, then stocked farms).
    for (worker, from) in worker_pool {
        let wood_low = sim.players.ai.stockpile.wood < WOOD_RESERVE;
        let target = if wood_low {
            nearest(from, &outlook.wood_deposits)
        } else {
            nearest(from, &outlook.food_deposits).or_else(|| nearest(from, &outlook.stocked_farms))
        };
        if let Some((target_id, at)) = target {
            sim.command_move(Owner::Ai, &[worker], at, Some(target_id));
        }
    }
}
