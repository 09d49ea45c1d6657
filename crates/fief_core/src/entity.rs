//! Entity definitions and the entity store.
//!
//! Every simulated object - units, buildings, resource deposits,
//! projectiles - is an [`Entity`]: a small common header (id, owner,
//! position, footprint radius, health) plus a kind-specific payload in
//! [`EntityKind`]. Cross-entity links are plain [`EntityId`]s; a lookup
//! that comes back empty means the target is gone and is handled as
//! normal control flow, never as a fault.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::data::{self, BuildingType, ResourceKind, UnitType};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Unique identifier for entities.
///
/// Assigned by the store in strictly increasing order and never reused,
/// so iterating ids in sorted order equals insertion order.
pub type EntityId = u64;

/// The faction an entity belongs to.
///
/// Neutral entities (resource deposits) never participate in combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// The human player.
    Human,
    /// The scripted opponent.
    Ai,
    /// Unowned map features.
    Neutral,
}

impl Owner {
    /// The opposing faction in a two-faction match.
    ///
    /// Neutral has no opponent and returns itself.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Human => Self::Ai,
            Self::Ai => Self::Human,
            Self::Neutral => Self::Neutral,
        }
    }

    /// Check whether entities of these two owners fight each other.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        self != other && self != Self::Neutral && other != Self::Neutral
    }
}

/// Health component for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health at full value.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Create health at a partial starting value, clamped to `max`.
    #[must_use]
    pub fn starting_at(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Check if the entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Check if the entity is at full health.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Heal the entity, returning actual amount healed.
    /// Uses saturating addition to prevent overflow.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let headroom = self.max.saturating_sub(self.current);
        let actual = amount.min(headroom);
        self.current = self.current.saturating_add(actual);
        actual
    }
}

/// Behavioral state of a unit.
///
/// A unit's `state`, `target` and `move_target` are mutually constrained:
/// ATTACKING/GATHERING/BUILDING always carry a target id, and any state
/// that finds its target missing or mismatched falls back to Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UnitState {
    /// Standing; scans for nearby enemies.
    #[default]
    Idle,
    /// Walking to an ordered destination.
    Moving,
    /// Engaging a target entity.
    Attacking,
    /// Working a resource deposit or a farm.
    Gathering,
    /// Constructing or repairing a building.
    Building,
    /// Walking to a destination, engaging anything found on the way.
    AttackMoving,
}

/// Kind-specific payload for units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitData {
    /// The unit's type (fixes its combat/movement stats).
    pub unit_type: UnitType,
    /// Current behavioral state.
    pub state: UnitState,
    /// Entity this unit is attacking/gathering/building.
    pub target: Option<EntityId>,
    /// Active movement destination, if any.
    pub move_target: Option<Vec2Fixed>,
    /// Movement step per tick.
    #[serde(with = "fixed_serde")]
    pub move_speed: Fixed,
    /// Attack/interaction range in world units (edge to edge).
    #[serde(with = "fixed_serde")]
    pub attack_range: Fixed,
    /// Damage per attack.
    pub attack_damage: u32,
    /// Minimum time between attacks in milliseconds.
    pub attack_cooldown_ms: u64,
    /// Game time of the last attack or gather action.
    pub last_attack_ms: u64,
    /// Cargo currently carried. Reserved for a drop-off economy; no
    /// current rule reads it.
    pub carried_resources: u32,
    /// Resource kind this worker was last sent to gather.
    pub gather_kind: Option<ResourceKind>,
}

impl UnitData {
    /// Create unit data for a type, in Idle state with no orders.
    #[must_use]
    pub fn new(unit_type: UnitType) -> Self {
        let stats = unit_type.stats();
        Self {
            unit_type,
            state: UnitState::Idle,
            target: None,
            move_target: None,
            move_speed: stats.speed(),
            attack_range: stats.range(),
            attack_damage: stats.damage,
            attack_cooldown_ms: stats.cooldown_ms,
            last_attack_ms: 0,
            carried_resources: 0,
            gather_kind: None,
        }
    }

    /// Drop all orders and stand down.
    pub fn clear_orders(&mut self) {
        self.state = UnitState::Idle;
        self.target = None;
        self.move_target = None;
    }
}

/// One unit waiting in a production queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueuedUnit {
    /// Unit type being trained.
    pub unit_type: UnitType,
    /// Remaining training time in milliseconds.
    pub time_left_ms: u64,
}

/// Farm-specific stock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FarmState {
    /// Remaining food stock.
    pub stock: i32,
    /// Stock capacity; reseeding refills to this value.
    pub max_stock: i32,
    /// Game time of the last automatic food conversion.
    pub last_generation_ms: u64,
}

impl FarmState {
    /// A farm refilled to capacity.
    #[must_use]
    pub const fn full(max_stock: i32, now_ms: u64) -> Self {
        Self {
            stock: max_stock,
            max_stock,
            last_generation_ms: now_ms,
        }
    }

    /// Check if the stock is exhausted.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.stock <= 0
    }

    /// Take up to `amount` from the stock, returning the amount taken.
    pub fn extract(&mut self, amount: i32) -> i32 {
        let taken = amount.min(self.stock).max(0);
        self.stock -= taken;
        taken
    }
}

/// Kind-specific payload for buildings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingData {
    /// The building's type.
    pub building_type: BuildingType,
    /// Construction progress, 0-100. Monotone; never decreases.
    #[serde(with = "fixed_serde")]
    pub construction_progress: Fixed,
    /// True once progress reached 100. Set exactly once, never reverts.
    pub is_built: bool,
    /// FIFO production queue. Head item is actively training.
    pub queue: VecDeque<QueuedUnit>,
    /// Farm stock; `Some` only for farms, populated when construction
    /// completes.
    pub farm: Option<FarmState>,
}

impl BuildingData {
    /// A construction site: zero progress, empty queue.
    #[must_use]
    pub fn site(building_type: BuildingType) -> Self {
        Self {
            building_type,
            construction_progress: Fixed::ZERO,
            is_built: false,
            queue: VecDeque::new(),
            farm: None,
        }
    }

    /// A finished building (used for match setup).
    #[must_use]
    pub fn finished(building_type: BuildingType, now_ms: u64) -> Self {
        let farm = (building_type == BuildingType::Farm)
            .then(|| FarmState::full(data::FARM_STOCK, now_ms));
        Self {
            building_type,
            construction_progress: Fixed::from_num(100),
            is_built: true,
            queue: VecDeque::new(),
            farm,
        }
    }
}

/// Kind-specific payload for resource deposits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceData {
    /// What this deposit yields.
    pub kind: ResourceKind,
    /// Remaining amount; the entity is removed once it reaches 0.
    pub amount: i32,
}

impl ResourceData {
    /// Take up to `amount` from the deposit, returning the amount taken.
    pub fn extract(&mut self, amount: i32) -> i32 {
        let taken = amount.min(self.amount).max(0);
        self.amount -= taken;
        taken
    }
}

/// Kind-specific payload for projectiles in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectileData {
    /// Entity the projectile is homing on.
    pub target: EntityId,
    /// Damage applied on impact.
    pub damage: u32,
    /// Travel speed per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
}

/// Kind-specific entity payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A mobile unit.
    Unit(UnitData),
    /// A placed building or construction site.
    Building(BuildingData),
    /// A neutral resource deposit.
    Resource(ResourceData),
    /// A projectile in flight.
    Projectile(ProjectileData),
}

/// A simulated object with identity, position and health.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier, immutable for the entity's lifetime.
    pub id: EntityId,
    /// Owning faction.
    pub owner: Owner,
    /// World position.
    pub position: Vec2Fixed,
    /// Collision/interaction footprint radius.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
    /// Hit points.
    pub health: Health,
    /// Kind-specific payload.
    pub kind: EntityKind,
}

impl Entity {
    /// Unit payload accessor.
    #[must_use]
    pub fn as_unit(&self) -> Option<&UnitData> {
        match &self.kind {
            EntityKind::Unit(u) => Some(u),
            _ => None,
        }
    }

    /// Mutable unit payload accessor.
    pub fn as_unit_mut(&mut self) -> Option<&mut UnitData> {
        match &mut self.kind {
            EntityKind::Unit(u) => Some(u),
            _ => None,
        }
    }

    /// Building payload accessor.
    #[must_use]
    pub fn as_building(&self) -> Option<&BuildingData> {
        match &self.kind {
            EntityKind::Building(b) => Some(b),
            _ => None,
        }
    }

    /// Mutable building payload accessor.
    pub fn as_building_mut(&mut self) -> Option<&mut BuildingData> {
        match &mut self.kind {
            EntityKind::Building(b) => Some(b),
            _ => None,
        }
    }

    /// Check whether this entity can be the target of an attack.
    ///
    /// Resource deposits and projectiles are never combat participants.
    #[must_use]
    pub fn is_attackable_by(&self, owner: Owner) -> bool {
        matches!(self.kind, EntityKind::Unit(_) | EntityKind::Building(_))
            && owner.is_hostile_to(self.owner)
            && !self.health.is_dead()
    }
}

/// Storage for all entities in the match.
///
/// `HashMap` for O(1) lookup by id, with deterministic iteration via
/// sorted ids. Ids are monotone, so sorted order is insertion order -
/// the tick's iteration basis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    /// Map of entity id to entity data.
    entities: HashMap<EntityId, Entity>,
    /// Next entity id to assign.
    next_id: EntityId,
}

impl EntityStore {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity and return its assigned id.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Get an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Remove every entity in `ids`. The deferred-removal step at end of
    /// tick.
    pub fn remove_all(&mut self, ids: &HashSet<EntityId>) {
        for id in ids {
            self.entities.remove(id);
        }
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Sorted entity ids - the deterministic iteration snapshot for one
    /// tick. Entities inserted after the snapshot (projectiles, fresh
    /// production) are not visited until the next tick.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all entities (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }
}
