//! End-to-end scenario tests against the public API.
//!
//! Each test stages a small match situation, drives whole ticks at the
//! nominal 50ms step and checks the observable outcome through
//! snapshots and accessors.

use fief_core::prelude::*;
use fief_test_utils::fixtures::{arena, run_ms};

fn human_town_center(sim: &Simulation) -> EntityId {
    sim.entities()
        .sorted_ids()
        .into_iter()
        .find(|&id| {
            let entity = sim.entities().get(id).unwrap();
            entity.owner == Owner::Human
                && matches!(&entity.kind, EntityKind::Building(b) if b.building_type == BuildingType::TownCenter)
        })
        .expect("arena has a human town center")
}

fn count_units(sim: &Simulation, owner: Owner, unit_type: UnitType) -> usize {
    sim.entities()
        .iter()
        .filter(|(_, e)| {
            e.owner == owner && e.as_unit().is_some_and(|u| u.unit_type == unit_type)
        })
        .count()
}

#[test]
fn peasant_training_debits_then_spawns_after_train_time() {
    let mut sim = arena(1);
    let tc = human_town_center(&sim);
    sim.tick(50); // derive population caps

    let food_before = sim.players().human.stockpile.food;
    sim.train(Owner::Human, tc, UnitType::Peasant);

    // Debited immediately, at enqueue time.
    assert_eq!(food_before - sim.players().human.stockpile.food, 50);
    {
        let queue = &sim.entities().get(tc).unwrap().as_building().unwrap().queue;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.front().unwrap().time_left_ms, 5000);
    }
    assert_eq!(count_units(&sim, Owner::Human, UnitType::Peasant), 0);

    run_ms(&mut sim, 5000);

    assert!(sim
        .entities()
        .get(tc)
        .unwrap()
        .as_building()
        .unwrap()
        .queue
        .is_empty());
    assert_eq!(count_units(&sim, Owner::Human, UnitType::Peasant), 1);

    // The fresh peasant stands just off the building's edge.
    let tc_entity = sim.entities().get(tc).unwrap();
    let (_, peasant) = sim
        .entities()
        .iter()
        .find(|(_, e)| e.owner == Owner::Human && e.as_unit().is_some())
        .unwrap();
    let offset = peasant.position.distance(tc_entity.position);
    assert!(
        offset < tc_entity.radius + Fixed::from_num(30),
        "spawned near the town center, got offset {offset:?}"
    );
}

#[test]
fn melee_combat_lands_hits_on_the_cooldown_cadence() {
    let mut sim = arena(2);
    let attacker = sim.spawn_unit(Owner::Human, UnitType::Militia, Vec2Fixed::from_ints(700, 100));
    let victim = sim.spawn_unit(Owner::Ai, UnitType::Militia, Vec2Fixed::from_ints(710, 100));
    sim.command_move(
        Owner::Human,
        &[attacker],
        Vec2Fixed::from_ints(710, 100),
        Some(victim),
    );

    let max = UnitType::Militia.stats().hp;

    // First swing lands once the 1000ms cooldown has elapsed.
    run_ms(&mut sim, 1100);
    assert_eq!(sim.entities().get(victim).unwrap().health.current, max - 8);

    run_ms(&mut sim, 1000);
    assert_eq!(sim.entities().get(victim).unwrap().health.current, max - 16);

    // 60hp at 8 per second: the 8th hit at t=8000 kills; the victim is
    // gone by the end of that tick. (The victim never gets its own 8th
    // swing in - the attacker is processed first and the kill is
    // observed within the same tick.)
    run_ms(&mut sim, 6000);
    assert!(sim.entities().get(victim).is_none());
    assert!(sim.entities().get(attacker).is_some());
}

#[test]
fn archers_fight_through_projectiles_not_instant_damage() {
    let mut sim = arena(3);
    let archer = sim.spawn_unit(Owner::Human, UnitType::Archer, Vec2Fixed::from_ints(600, 100));
    let victim = sim.spawn_unit(Owner::Ai, UnitType::Militia, Vec2Fixed::from_ints(680, 100));
    sim.attack_move(
        Owner::Human,
        &[archer],
        Vec2Fixed::from_ints(680, 100),
        Some(victim),
    );

    // Run past the first shot: damage has NOT landed yet, an arrow is in
    // flight instead.
    run_ms(&mut sim, 1600);
    let victim_hp = sim.entities().get(victim).unwrap().health;
    assert!(victim_hp.is_full(), "no instant damage from a ranged attack");
    let arrows = sim
        .entities()
        .iter()
        .filter(|(_, e)| matches!(e.kind, EntityKind::Projectile(_)))
        .count();
    assert!(arrows >= 1, "an arrow is in flight");

    // Give the arrow time to cross and strike.
    run_ms(&mut sim, 2000);
    let victim_hp = sim.entities().get(victim).unwrap().health;
    assert!(victim_hp.current < victim_hp.max, "impact damage landed");
}

#[test]
fn farm_drains_by_generation_and_worker_boost_additively() {
    // Unworked farm: only auto-generation at 5 food per 5000ms.
    let mut sim = arena(4);
    sim.spawn_building(
        Owner::Human,
        BuildingType::Farm,
        Vec2Fixed::from_ints(300, 350),
        true,
    );
    let food_start = sim.players().human.stockpile.food;
    run_ms(&mut sim, 5100);
    assert_eq!(sim.players().human.stockpile.food, food_start + 5);

    // Worked farm: generation plus 10 food per worker cooldown (1000ms).
    let mut sim = arena(4);
    let farm = sim.spawn_building(
        Owner::Human,
        BuildingType::Farm,
        Vec2Fixed::from_ints(300, 350),
        true,
    );
    let worker = sim.spawn_unit(Owner::Human, UnitType::Peasant, Vec2Fixed::from_ints(330, 350));
    sim.command_move(
        Owner::Human,
        &[worker],
        Vec2Fixed::from_ints(300, 350),
        Some(farm),
    );

    let food_start = sim.players().human.stockpile.food;
    run_ms(&mut sim, 5100);

    // Auto: 5 at t=5000. Worker: 10 at each of t=1000..=5000.
    let gained = sim.players().human.stockpile.food - food_start;
    assert_eq!(gained, 5 + 5 * 10);

    let stock = sim
        .entities()
        .get(farm)
        .unwrap()
        .as_building()
        .unwrap()
        .farm
        .unwrap()
        .stock;
    assert_eq!(stock, 300 - gained, "bank gain equals stock drain");
}

#[test]
fn attacker_reverts_to_idle_when_someone_else_kills_its_target() {
    let mut sim = arena(5);
    // A distant attacker that will never arrive in time.
    let far = sim.spawn_unit(Owner::Human, UnitType::Militia, Vec2Fixed::from_ints(200, 600));
    // A close attacker that does the killing.
    let near = sim.spawn_unit(Owner::Human, UnitType::Militia, Vec2Fixed::from_ints(890, 100));
    let victim = sim.spawn_unit(Owner::Ai, UnitType::Peasant, Vec2Fixed::from_ints(900, 100));

    sim.command_move(Owner::Human, &[far, near], Vec2Fixed::from_ints(900, 100), Some(victim));
    {
        let unit = sim.entities().get(far).unwrap().as_unit().unwrap();
        assert_eq!(unit.state, UnitState::Attacking);
        assert_eq!(unit.move_target, None, "direct attack order, no destination");
    }

    // Peasant: 25hp, 8 damage per second from the near attacker - four
    // hits, the last at t=4000, plus one tick for the bystander to see
    // the loss.
    run_ms(&mut sim, 4100);
    assert!(sim.entities().get(victim).is_none(), "victim died");

    let unit = sim.entities().get(far).unwrap().as_unit().unwrap();
    assert_eq!(unit.state, UnitState::Idle, "soft fallback, no error");
    assert_eq!(unit.target, None);
}

#[test]
fn losing_the_last_town_center_with_little_left_ends_the_match() {
    let mut sim = Simulation::new(6);
    let human_tc = sim.spawn_building(
        Owner::Human,
        BuildingType::TownCenter,
        Vec2Fixed::from_ints(100, 350),
        true,
    );
    sim.spawn_building(
        Owner::Ai,
        BuildingType::TownCenter,
        Vec2Fixed::from_ints(1300, 350),
        true,
    );
    // Two human peasants tucked away from the fight: 2 < the survival
    // threshold once the town center falls.
    sim.spawn_unit(Owner::Human, UnitType::Peasant, Vec2Fixed::from_ints(600, 650));
    sim.spawn_unit(Owner::Human, UnitType::Peasant, Vec2Fixed::from_ints(620, 650));

    let mut raiders = Vec::new();
    for i in 0..10 {
        raiders.push(sim.spawn_unit(
            Owner::Ai,
            UnitType::Militia,
            Vec2Fixed::from_ints(140 + (i % 5) * 15, 280 + (i / 5) * 15),
        ));
    }
    sim.attack_move(Owner::Ai, &raiders, Vec2Fixed::from_ints(100, 350), Some(human_tc));

    // 1200hp town center against 10 militia at 8 damage per second.
    run_ms(&mut sim, 30_000);

    assert!(sim.is_game_over());
    assert_eq!(sim.winner(), Some(Owner::Ai));

    // The decided match is frozen: no further resource or position
    // mutation, snapshots excepted.
    let hash = sim.state_hash();
    let snapshot = sim.snapshot();
    run_ms(&mut sim, 1000);
    assert_eq!(sim.state_hash(), hash);
    assert_eq!(sim.snapshot(), snapshot);
    assert!(snapshot.game_over);
    assert_eq!(snapshot.winner, Some(Owner::Ai));
}

#[test]
fn training_is_refused_once_population_hits_the_cap() {
    let mut sim = arena(8);
    let tc = human_town_center(&sim);
    sim.tick(50);

    let cap = sim.players().human.max_population;
    for i in 0..cap {
        sim.spawn_unit(
            Owner::Human,
            UnitType::Peasant,
            Vec2Fixed::from_ints(300 + (i as i32 % 8) * 20, 500 + (i as i32 / 8) * 20),
        );
    }
    sim.tick(50);
    assert_eq!(sim.players().human.population, cap);

    let food_before = sim.players().human.stockpile.food;
    sim.train(Owner::Human, tc, UnitType::Peasant);

    assert_eq!(sim.players().human.stockpile.food, food_before, "no debit");
    assert!(sim
        .entities()
        .get(tc)
        .unwrap()
        .as_building()
        .unwrap()
        .queue
        .is_empty());
}

#[test]
fn constructing_a_house_raises_the_population_cap() {
    let mut sim = arena(9);
    let worker = sim.spawn_unit(Owner::Human, UnitType::Peasant, Vec2Fixed::from_ints(400, 350));
    sim.tick(50);
    let cap_before = sim.players().human.max_population;

    sim.place_building(
        Owner::Human,
        BuildingType::House,
        Vec2Fixed::from_ints(420, 350),
        &[worker],
    );
    // House: 5000ms of worked construction at the nominal tick.
    run_ms(&mut sim, 8000);

    assert_eq!(
        sim.players().human.max_population,
        cap_before + 5,
        "finished house adds its bonus"
    );
}
