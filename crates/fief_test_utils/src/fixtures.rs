//! Test fixtures and helpers.
//!
//! Pre-built match setups and entity configurations for consistent
//! testing across the workspace.

use fixed::types::I32F32;

use fief_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// The standard skirmish map: both factions with a town center, three
/// peasants each, and resource deposits.
#[must_use]
pub fn skirmish(seed: u64) -> Simulation {
    Simulation::new_match(seed)
}

/// An otherwise-empty arena with a town center per faction, far apart.
///
/// The arena keeps the win evaluator quiet, so scenario tests can stage
/// whatever they need without the match ending under them.
#[must_use]
pub fn arena(seed: u64) -> Simulation {
    let mut sim = Simulation::new(seed);
    sim.spawn_building(
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
    sim
}

/// Two opposing militia lines `gap` units apart, centered mid-arena.
///
/// Returns `(human_ids, ai_ids)`.
#[must_use]
pub fn battle_line(sim: &mut Simulation, per_side: usize, gap: i32) -> (Vec<EntityId>, Vec<EntityId>) {
    let mut human = Vec::with_capacity(per_side);
    let mut ai = Vec::with_capacity(per_side);
    for i in 0..per_side {
        let y = 300 + i as i32 * 20;
        human.push(sim.spawn_unit(
            Owner::Human,
            UnitType::Militia,
            Vec2Fixed::from_ints(700 - gap / 2, y),
        ));
        ai.push(sim.spawn_unit(
            Owner::Ai,
            UnitType::Militia,
            Vec2Fixed::from_ints(700 + gap / 2, y),
        ));
    }
    (human, ai)
}

/// Advance a simulation by whole ticks of the nominal 50ms step.
pub fn run_ms(sim: &mut Simulation, ms: u64) {
    let ticks = ms / 50;
    for _ in 0..ticks {
        sim.tick(50);
    }
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;

    use fief_core::prelude::*;

    /// A position inside the standard map bounds.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (0i32..1400, 0i32..700).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// An arbitrary match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Any trainable unit type.
    pub fn arb_unit_type() -> impl Strategy<Value = UnitType> {
        prop_oneof![
            Just(UnitType::Peasant),
            Just(UnitType::Militia),
            Just(UnitType::Archer),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_does_not_self_terminate() {
        let mut sim = arena(1);
        run_ms(&mut sim, 1000);
        assert!(!sim.is_game_over());
    }

    #[test]
    fn test_battle_line_spawns_both_sides() {
        let mut sim = arena(1);
        let (human, ai) = battle_line(&mut sim, 4, 400);
        assert_eq!(human.len(), 4);
        assert_eq!(ai.len(), 4);
    }
}
