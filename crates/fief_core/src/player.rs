//! Per-faction resource and population accounting.

use serde::{Deserialize, Serialize};

use crate::data::{Cost, ResourceKind, STARTING_STOCKPILE};
use crate::entity::Owner;

/// A faction's wood and food stockpile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Stockpile {
    /// Banked wood.
    pub wood: i32,
    /// Banked food.
    pub food: i32,
}

impl Stockpile {
    /// Create a stockpile with initial amounts.
    #[must_use]
    pub const fn new(wood: i32, food: i32) -> Self {
        Self { wood, food }
    }

    /// Check if a price is affordable.
    #[must_use]
    pub const fn can_afford(&self, cost: Cost) -> bool {
        self.wood >= cost.wood && self.food >= cost.food
    }

    /// Pay a price if affordable.
    ///
    /// Returns true if the transaction succeeded; on false nothing changed.
    pub fn spend(&mut self, cost: Cost) -> bool {
        if self.can_afford(cost) {
            self.wood -= cost.wood;
            self.food -= cost.food;
            true
        } else {
            false
        }
    }

    /// Bank gathered resources.
    pub fn deposit(&mut self, kind: ResourceKind, amount: i32) {
        match kind {
            ResourceKind::Wood => self.wood += amount,
            ResourceKind::Food => self.food += amount,
        }
    }

    /// Amount banked of one kind.
    #[must_use]
    pub const fn amount(&self, kind: ResourceKind) -> i32 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Food => self.food,
        }
    }
}

/// A faction's live accounting: stockpile plus derived population figures.
///
/// `population` and `max_population` are recomputed every tick from the
/// entity store; they are stored here so collaborators read them from the
/// snapshot without re-deriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerState {
    /// Banked resources.
    pub stockpile: Stockpile,
    /// Live unit count.
    pub population: u32,
    /// Population cap from base + housing.
    pub max_population: u32,
}

impl PlayerState {
    /// Starting state for a playing faction.
    #[must_use]
    pub const fn starting() -> Self {
        Self {
            stockpile: Stockpile::new(STARTING_STOCKPILE.wood, STARTING_STOCKPILE.food),
            population: 0,
            max_population: 0,
        }
    }

    /// Empty state for the neutral pseudo-faction.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            stockpile: Stockpile::new(0, 0),
            population: 0,
            max_population: 0,
        }
    }

    /// Check whether another unit fits under the population cap.
    #[must_use]
    pub const fn has_population_room(&self) -> bool {
        self.population < self.max_population
    }
}

/// The per-owner player table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Players {
    /// The human player's accounting.
    pub human: PlayerState,
    /// The scripted opponent's accounting.
    pub ai: PlayerState,
    /// Neutral accounting; exists so every owner has an entry.
    pub neutral: PlayerState,
}

impl Players {
    /// Fresh table for a new match.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            human: PlayerState::starting(),
            ai: PlayerState::starting(),
            neutral: PlayerState::empty(),
        }
    }

    /// Accounting for one owner.
    #[must_use]
    pub const fn get(&self, owner: Owner) -> &PlayerState {
        match owner {
            Owner::Human => &self.human,
            Owner::Ai => &self.ai,
            Owner::Neutral => &self.neutral,
        }
    }

    /// Mutable accounting for one owner.
    pub fn get_mut(&mut self, owner: Owner) -> &mut PlayerState {
        match owner {
            Owner::Human => &mut self.human,
            Owner::Ai => &mut self.ai,
            Owner::Neutral => &mut self.neutral,
        }
    }
}

impl Default for Players {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_is_all_or_nothing() {
        let mut pile = Stockpile::new(30, 10);
        assert!(!pile.spend(Cost::new(20, 20)));
        assert_eq!(pile, Stockpile::new(30, 10));

        assert!(pile.spend(Cost::new(20, 10)));
        assert_eq!(pile, Stockpile::new(10, 0));
    }

    #[test]
    fn test_deposit_routes_by_kind() {
        let mut pile = Stockpile::default();
        pile.deposit(ResourceKind::Wood, 7);
        pile.deposit(ResourceKind::Food, 3);
        assert_eq!(pile.amount(ResourceKind::Wood), 7);
        assert_eq!(pile.amount(ResourceKind::Food), 3);
    }

    #[test]
    fn test_population_room() {
        let mut player = PlayerState::starting();
        player.population = 4;
        player.max_population = 5;
        assert!(player.has_population_room());
        player.population = 5;
        assert!(!player.has_population_room());
    }
}
