//! The match simulation aggregate and tick orchestrator.
//!
//! [`Simulation`] owns all game state: the entity store, the per-faction
//! player table, the human selection, the clock and the match outcome.
//! One call to [`Simulation::tick`] advances the world by one step in a
//! fixed subsystem order; command intents mutate state synchronously
//! between ticks. Exclusive `&mut self` access means a tick can never
//! interleave with an external read.
//!
//! # Tick order
//!
//! 1. Opponent director (throttled to its decision interval)
//! 2. Population / population cap recompute per faction
//! 3. Win evaluation - a faction with no town center and almost nothing
//!    left has lost; the match freezes on the deciding tick
//! 4. Snapshot of entity ids, then movement, unit state machine +
//!    combat, projectiles, economy/production over that snapshot
//! 5. Deferred removals applied in one sweep
//! 6. Clock advance
//!
//! # Determinism
//!
//! Fixed-point positions, millisecond integer time, seeded [`SmallRng`]
//! and sorted-id iteration: two simulations constructed with the same
//! seed and fed the same intents at the same tick boundaries stay
//! identical, which [`Simulation::state_hash`] makes checkable.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::info;

use crate::data::{
    BuildingType, ResourceKind, UnitType, BASE_POPULATION, BERRY_AMOUNT, BERRY_RADIUS,
    DEFEAT_ENTITY_THRESHOLD, TREE_AMOUNT, TREE_RADIUS,
};
use crate::director::DirectorState;
use crate::entity::{
    BuildingData, Entity, EntityId, EntityKind, EntityStore, Health, Owner, ResourceData, UnitData,
};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::player::Players;
use crate::{behavior, combat, director, economy, movement};

/// The authoritative state of one two-faction match.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) entities: EntityStore,
    pub(crate) players: Players,
    pub(crate) selection: Vec<EntityId>,
    pub(crate) pending_placement: Option<BuildingType>,
    pub(crate) game_time_ms: u64,
    pub(crate) tick: u64,
    pub(crate) game_over: bool,
    pub(crate) winner: Option<Owner>,
    pub(crate) rng: SmallRng,
    pub(crate) director: DirectorState,
}

impl Simulation {
    /// Create an empty simulation with a seeded RNG.
    ///
    /// Starts with no entities; useful for tests and custom scenarios.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            entities: EntityStore::new(),
            players: Players::new(),
            selection: Vec::new(),
            pending_placement: None,
            game_time_ms: 0,
            tick: 0,
            game_over: false,
            winner: None,
            rng: SmallRng::seed_from_u64(seed),
            director: DirectorState::new(),
        }
    }

    /// Create a standard skirmish: a town center and three peasants per
    /// faction, with tree lines near the bases and berries mid-map.
    #[must_use]
    pub fn new_match(seed: u64) -> Self {
        let mut sim = Self::new(seed);

        let human_base = Vec2Fixed::from_ints(200, 350);
        let ai_base = Vec2Fixed::from_ints(1200, 350);

        for (owner, base, facing) in [(Owner::Human, human_base, 1), (Owner::Ai, ai_base, -1)] {
            sim.spawn_building(owner, BuildingType::TownCenter, base, true);
            for i in 0..3 {
                let offset = Vec2Fixed::from_ints(facing * 60, (i - 1) * 25);
                sim.spawn_unit(owner, UnitType::Peasant, base + offset);
            }
            for i in 0..5 {
                let tree = base + Vec2Fixed::from_ints(facing * -30 * (i % 3), 90 + 30 * (i / 3));
                sim.spawn_resource(ResourceKind::Wood, tree, TREE_AMOUNT);
            }
        }

        for i in 0..4 {
            let bush = Vec2Fixed::from_ints(650 + 40 * (i % 2), 150 + 120 * (i / 2));
            sim.spawn_resource(ResourceKind::Food, bush, BERRY_AMOUNT);
        }

        sim
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    /// Spawn a unit of the given type, idle with no orders.
    pub fn spawn_unit(&mut self, owner: Owner, unit_type: UnitType, position: Vec2Fixed) -> EntityId {
        let stats = unit_type.stats();
        self.entities.insert(Entity {
            id: 0,
            owner,
            position,
            radius: stats.radius(),
            health: Health::new(stats.hp),
            kind: EntityKind::Unit(UnitData::new(unit_type)),
        })
    }

    /// Spawn a building - either a finished one or a fresh construction
    /// site at one hit point.
    pub fn spawn_building(
        &mut self,
        owner: Owner,
        building_type: BuildingType,
        position: Vec2Fixed,
        finished: bool,
    ) -> EntityId {
        let stats = building_type.stats();
        let (data, health) = if finished {
            (
                BuildingData::finished(building_type, self.game_time_ms),
                Health::new(stats.hp),
            )
        } else {
            (
                BuildingData::site(building_type),
                Health::starting_at(1, stats.hp),
            )
        };
        self.entities.insert(Entity {
            id: 0,
            owner,
            position,
            radius: stats.radius(),
            health,
            kind: EntityKind::Building(data),
        })
    }

    /// Spawn a neutral resource deposit.
    pub fn spawn_resource(
        &mut self,
        kind: ResourceKind,
        position: Vec2Fixed,
        amount: i32,
    ) -> EntityId {
        let radius = match kind {
            ResourceKind::Wood => TREE_RADIUS,
            ResourceKind::Food => BERRY_RADIUS,
        };
        self.entities.insert(Entity {
            id: 0,
            owner: Owner::Neutral,
            position,
            radius: Fixed::from_num(radius),
            health: Health::new(1),
            kind: EntityKind::Resource(ResourceData { kind, amount }),
        })
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the simulation by one tick of `delta_ms` real time.
    ///
    /// A finished match is inert: this is a no-op once the winner is set.
    pub fn tick(&mut self, delta_ms: u64) {
        if self.game_over {
            return;
        }

        director::maybe_run(self);

        self.recompute_population();

        if let Some(winner) = self.evaluate_defeat() {
            self.winner = Some(winner);
            self.game_over = true;
            info!(?winner, tick = self.tick, "match decided");
            return;
        }

        // Iteration basis for this tick; entities inserted mid-tick wait
        // until the next snapshot.
        let ids = self.entities.sorted_ids();
        let mut removals: HashSet<EntityId> = HashSet::new();

        movement::run(&mut self.entities, &ids);
        behavior::run(
            &mut self.entities,
            &mut self.players,
            &ids,
            &mut removals,
            self.game_time_ms,
        );
        combat::run_projectiles(&mut self.entities, &ids, &mut removals);
        economy::run(
            &mut self.entities,
            &mut self.players,
            &ids,
            &mut removals,
            self.game_time_ms,
            delta_ms,
            &mut self.rng,
        );

        self.entities.remove_all(&removals);

        // Refresh population figures past the removals and mid-tick
        // spawns so between-tick readers see consistent counts.
        self.recompute_population();

        self.game_time_ms += delta_ms;
        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "tick complete");
        }
    }

    /// Recompute population and population cap for both factions.
    ///
    /// Houses count toward the cap only once finished; town centers count
    /// as soon as they stand.
    fn recompute_population(&mut self) {
        for owner in [Owner::Human, Owner::Ai] {
            let mut population = 0;
            let mut max_population = BASE_POPULATION;
            for (_, entity) in self.entities.iter() {
                if entity.owner != owner {
                    continue;
                }
                match &entity.kind {
                    EntityKind::Unit(_) => population += 1,
                    EntityKind::Building(building) => {
                        let counts = building.building_type == BuildingType::TownCenter
                            || building.is_built;
                        if counts {
                            max_population += building.building_type.stats().population_bonus;
                        }
                    }
                    _ => {}
                }
            }
            let player = self.players.get_mut(owner);
            player.population = population;
            player.max_population = max_population;
        }
    }

    /// A faction with zero town centers and almost no entities left has
    /// lost; the opponent wins. First faction found losing decides.
    fn evaluate_defeat(&self) -> Option<Owner> {
        for owner in [Owner::Human, Owner::Ai] {
            let mut town_centers = 0usize;
            let mut remaining = 0usize;
            for (_, entity) in self.entities.iter() {
                if entity.owner != owner {
                    continue;
                }
                match &entity.kind {
                    EntityKind::Unit(_) => remaining += 1,
                    EntityKind::Building(building) => {
                        remaining += 1;
                        if building.building_type == BuildingType::TownCenter {
                            town_centers += 1;
                        }
                    }
                    _ => {}
                }
            }
            if town_centers == 0 && remaining < DEFEAT_ENTITY_THRESHOLD {
                return Some(owner.opponent());
            }
        }
        None
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// The entity store.
    #[must_use]
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// An entity by id, as a hard error for tooling that requires it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if the id is not live.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(id).ok_or(GameError::EntityNotFound(id))
    }

    /// The per-faction player table.
    #[must_use]
    pub fn players(&self) -> &Players {
        &self.players
    }

    /// The human player's current selection.
    #[must_use]
    pub fn selection(&self) -> &[EntityId] {
        &self.selection
    }

    /// Pending building placement marker, if the UI armed one.
    #[must_use]
    pub fn pending_placement(&self) -> Option<BuildingType> {
        self.pending_placement
    }

    /// Elapsed game time in milliseconds.
    #[must_use]
    pub const fn game_time_ms(&self) -> u64 {
        self.game_time_ms
    }

    /// Completed tick count.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Whether the match has been decided.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// The winning faction, once decided.
    #[must_use]
    pub const fn winner(&self) -> Option<Owner> {
        self.winner
    }

    /// Hash of the full simulation state, for determinism checks and
    /// divergence hunting.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.game_time_ms.hash(&mut hasher);
        self.game_over.hash(&mut hasher);
        self.winner.hash(&mut hasher);
        self.players.hash(&mut hasher);
        self.selection.hash(&mut hasher);
        self.pending_placement.hash(&mut hasher);

        let ids = self.entities.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(entity) = self.entities.get(id) {
                entity.hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}
