//! Read-only state snapshots for external consumers.
//!
//! Rendering and UI layers never touch the live [`Simulation`]; between
//! ticks they take a [`GameSnapshot`] - an owned, serializable view of
//! everything they may display. Snapshot bytes round-trip through
//! bincode, preserving fixed-point values exactly.

use serde::{Deserialize, Serialize};

use crate::data::BuildingType;
use crate::entity::{Entity, EntityId, Owner};
use crate::error::{GameError, Result};
use crate::player::Players;
use crate::simulation::Simulation;

/// A consistent view of the match at one tick boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Completed tick count at capture time.
    pub tick: u64,
    /// Elapsed game time in milliseconds.
    pub game_time_ms: u64,
    /// Every live entity, sorted by id.
    pub entities: Vec<Entity>,
    /// Per-faction resource and population state.
    pub players: Players,
    /// The human selection; first element is the primary selection.
    pub selection: Vec<EntityId>,
    /// Whether the match has been decided.
    pub game_over: bool,
    /// The winning faction, once decided.
    pub winner: Option<Owner>,
    /// Armed building placement, if the UI is mid-placement.
    pub pending_placement: Option<BuildingType>,
}

impl GameSnapshot {
    /// Encode to bytes for hand-off across a process or thread boundary.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Decode snapshot bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if the bytes are not a valid
    /// snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| GameError::Serialization(e.to_string()))
    }
}

impl Simulation {
    /// Capture a snapshot of the current state.
    ///
    /// Only valid between ticks, which `&self` access already enforces:
    /// a tick holds the one `&mut Simulation`.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let entities = self
            .entities
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.entities.get(id).cloned())
            .collect();

        GameSnapshot {
            tick: self.tick,
            game_time_ms: self.game_time_ms,
            entities,
            players: self.players,
            selection: self.selection.clone(),
            game_over: self.game_over,
            winner: self.winner,
            pending_placement: self.pending_placement,
        }
    }
}
