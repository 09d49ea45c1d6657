//! Read-only tuning tables and global constants.
//!
//! Unit and building stats are fixed configuration: the tables below are
//! the single source for costs, build times, combat stats and footprints.
//! Distances and speeds are stored as integers and surfaced as fixed-point
//! through accessors.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Kinds of trainable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Worker: gathers, builds, repairs. Weak in a fight.
    Peasant,
    /// Melee line infantry.
    Militia,
    /// Ranged attacker; fights with projectiles.
    Archer,
}

impl UnitType {
    /// Stat table lookup for this type.
    #[must_use]
    pub fn stats(self) -> &'static UnitStats {
        match self {
            Self::Peasant => &PEASANT,
            Self::Militia => &MILITIA,
            Self::Archer => &ARCHER,
        }
    }

    /// Whether attacks are delivered as projectiles instead of instantly.
    #[must_use]
    pub const fn uses_projectiles(self) -> bool {
        matches!(self, Self::Archer)
    }
}

/// Kinds of placeable buildings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    /// Faction headquarters; trains peasants, raises the population cap.
    /// Losing every town center is the road to defeat.
    TownCenter,
    /// Trains the army.
    Barracks,
    /// Raises the population cap.
    House,
    /// Generates food passively; workable and reseedable.
    Farm,
}

impl BuildingType {
    /// Stat table lookup for this type.
    #[must_use]
    pub fn stats(self) -> &'static BuildingStats {
        match self {
            Self::TownCenter => &TOWN_CENTER,
            Self::Barracks => &BARRACKS,
            Self::House => &HOUSE,
            Self::Farm => &FARM,
        }
    }
}

/// Gatherable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Trees; pays for buildings.
    Wood,
    /// Berries and farms; pays for units.
    Food,
}

/// A wood/food price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Wood component.
    pub wood: i32,
    /// Food component.
    pub food: i32,
}

impl Cost {
    /// Shorthand constructor.
    #[must_use]
    pub const fn new(wood: i32, food: i32) -> Self {
        Self { wood, food }
    }
}

/// Fixed per-type stats for units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Maximum hit points.
    pub hp: u32,
    /// Movement step per tick, in world units.
    speed: i32,
    /// Footprint radius.
    radius: i32,
    /// Attack/interaction range (edge to edge).
    range: i32,
    /// Damage per attack.
    pub damage: u32,
    /// Attack cooldown in milliseconds.
    pub cooldown_ms: u64,
    /// Training price.
    pub cost: Cost,
    /// Training duration in milliseconds.
    pub train_time_ms: u64,
}

impl UnitStats {
    /// Movement speed as fixed-point.
    #[must_use]
    pub fn speed(&self) -> Fixed {
        Fixed::from_num(self.speed)
    }

    /// Footprint radius as fixed-point.
    #[must_use]
    pub fn radius(&self) -> Fixed {
        Fixed::from_num(self.radius)
    }

    /// Attack range as fixed-point.
    #[must_use]
    pub fn range(&self) -> Fixed {
        Fixed::from_num(self.range)
    }
}

/// Fixed per-type stats for buildings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingStats {
    /// Maximum hit points.
    pub hp: u32,
    /// Footprint radius.
    radius: i32,
    /// Placement price.
    pub cost: Cost,
    /// Construction duration in milliseconds at the nominal tick with one
    /// builder on site.
    pub build_time_ms: u64,
    /// Population cap contribution once applicable.
    pub population_bonus: u32,
    /// Unit types this building trains.
    pub trains: &'static [UnitType],
}

impl BuildingStats {
    /// Footprint radius as fixed-point.
    #[must_use]
    pub fn radius(&self) -> Fixed {
        Fixed::from_num(self.radius)
    }

    /// Construction progress gained per worked tick (progress scale 0-100).
    #[must_use]
    pub fn progress_per_tick(&self) -> Fixed {
        Fixed::from_num(100u32 * NOMINAL_TICK_MS as u32) / Fixed::from_num(self.build_time_ms as u32)
    }

    /// Hit points gained per worked tick; ramps to max as progress hits 100.
    #[must_use]
    pub fn hp_per_tick(&self) -> u32 {
        let hp = Fixed::from_num(self.hp) * self.progress_per_tick() / Fixed::from_num(100);
        hp.ceil().to_num::<u32>().max(1)
    }

    /// Whether this building can train the given unit type.
    #[must_use]
    pub fn can_train(&self, unit_type: UnitType) -> bool {
        self.trains.contains(&unit_type)
    }
}

static PEASANT: UnitStats = UnitStats {
    hp: 25,
    speed: 2,
    radius: 5,
    range: 10,
    damage: 3,
    cooldown_ms: 1000,
    cost: Cost::new(0, 50),
    train_time_ms: 5000,
};

static MILITIA: UnitStats = UnitStats {
    hp: 60,
    speed: 2,
    radius: 6,
    range: 12,
    damage: 8,
    cooldown_ms: 1000,
    cost: Cost::new(20, 60),
    train_time_ms: 8000,
};

static ARCHER: UnitStats = UnitStats {
    hp: 45,
    speed: 3,
    radius: 6,
    range: 90,
    damage: 6,
    cooldown_ms: 1500,
    cost: Cost::new(40, 40),
    train_time_ms: 9000,
};

static TOWN_CENTER: BuildingStats = BuildingStats {
    hp: 1200,
    radius: 40,
    cost: Cost::new(250, 0),
    build_time_ms: 10_000,
    population_bonus: 10,
    trains: &[UnitType::Peasant],
};

static BARRACKS: BuildingStats = BuildingStats {
    hp: 500,
    radius: 30,
    cost: Cost::new(150, 0),
    build_time_ms: 7500,
    population_bonus: 0,
    trains: &[UnitType::Militia, UnitType::Archer],
};

static HOUSE: BuildingStats = BuildingStats {
    hp: 250,
    radius: 18,
    cost: Cost::new(80, 0),
    build_time_ms: 5000,
    population_bonus: 5,
    trains: &[],
};

static FARM: BuildingStats = BuildingStats {
    hp: 150,
    radius: 24,
    cost: Cost::new(60, 0),
    build_time_ms: 5000,
    population_bonus: 0,
    trains: &[],
};

// ============================================================================
// Global tuning constants
// ============================================================================

/// Nominal tick duration; construction increments are calibrated to it.
pub const NOMINAL_TICK_MS: u64 = 50;

/// Detection radius for idle units scanning for enemies.
pub const IDLE_DETECT_RADIUS: i32 = 150;

/// Detection radius for attack-moving units.
pub const ATTACK_MOVE_DETECT_RADIUS: i32 = 250;

/// Pursuit waypoint distance: an out-of-range attacker steers toward a
/// point at most this far along the bearing to its target, each tick.
pub const PURSUIT_STEP: i32 = 20;

/// A projectile within this distance of its target impacts.
pub const PROJECTILE_HIT_RADIUS: i32 = 10;

/// Projectile travel speed per tick.
pub const PROJECTILE_SPEED: i32 = 5;

/// Projectile footprint radius.
pub const PROJECTILE_RADIUS: i32 = 2;

/// Fresh units appear this far beyond the producing building's edge, at a
/// random angle.
pub const SPAWN_EDGE_OFFSET: i32 = 15;

/// Separation impulses are halved before being applied as a position
/// offset, to damp oscillation between overlapping units.
pub const SEPARATION_DAMPING_DIVISOR: i32 = 2;

/// Amount a worker pulls from a resource deposit per cooldown interval.
pub const GATHER_AMOUNT: i32 = 10;

/// Amount a worker pulls from a farm per cooldown interval (the worked
/// boost; independent of and additive to auto-generation).
pub const FARM_WORK_AMOUNT: i32 = 10;

/// Food a built farm converts from stock into the owner's stockpile per
/// generation interval, with no worker required.
pub const FARM_GENERATION_AMOUNT: i32 = 5;

/// Interval between automatic farm conversions.
pub const FARM_GENERATION_INTERVAL_MS: u64 = 5000;

/// Farm stock capacity, set at construction and by reseeding.
pub const FARM_STOCK: i32 = 300;

/// Wood price to reseed a depleted farm.
pub const FARM_RESEED_COST: Cost = Cost::new(50, 0);

/// Population cap floor with no completed housing.
pub const BASE_POPULATION: u32 = 5;

/// A faction with no town center and fewer than this many entities has
/// lost the match.
pub const DEFEAT_ENTITY_THRESHOLD: usize = 3;

/// Starting stockpile for both factions.
pub const STARTING_STOCKPILE: Cost = Cost::new(200, 200);

/// Initial amount in a tree deposit.
pub const TREE_AMOUNT: i32 = 150;

/// Initial amount in a berry bush deposit.
pub const BERRY_AMOUNT: i32 = 200;

/// Footprint radius of a tree deposit.
pub const TREE_RADIUS: i32 = 12;

/// Footprint radius of a berry bush deposit.
pub const BERRY_RADIUS: i32 = 14;
