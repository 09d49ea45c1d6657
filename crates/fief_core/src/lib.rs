//! # Fief Core
//!
//! Authoritative real-time simulation core for a two-faction skirmish:
//! entity state, fixed-order tick processing, combat, economy, unit
//! behavior and the scripted opponent.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No input handling
//! - No IO in the hot path
//! - No system randomness (one seeded RNG per match)
//!
//! Rendering, input capture and UI are collaborators: they feed
//! validated command intents in through the methods on
//! [`simulation::Simulation`] and read state back out through
//! [`snapshot::GameSnapshot`] between ticks. Exclusive `&mut` access to
//! the simulation is the concurrency model - a tick can never observe a
//! half-applied command, and a reader can never observe a half-finished
//! tick.
//!
//! ## Crate Structure
//!
//! - [`entity`] - the entity store and the tagged entity model
//! - [`data`] - read-only stat tables and tuning constants
//! - [`player`] - per-faction stockpile and population accounting
//! - [`movement`] + [`combat`] + [`behavior`] + [`economy`] - the tick
//!   subsystems (module-private entry points)
//! - [`director`] - the scripted opponent
//! - [`simulation`] - the aggregate and tick orchestrator
//! - [`snapshot`] - read-only views for collaborators
//! - [`math`] - fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod behavior;
pub mod combat;
pub mod commands;
pub mod data;
pub mod director;
pub mod economy;
pub mod entity;
pub mod error;
pub mod math;
pub mod movement;
pub mod player;
pub mod simulation;
pub mod snapshot;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::data::{BuildingType, Cost, ResourceKind, UnitType};
    pub use crate::entity::{
        Entity, EntityId, EntityKind, EntityStore, Health, Owner, UnitState,
    };
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::player::{PlayerState, Players, Stockpile};
    pub use crate::simulation::Simulation;
    pub use crate::snapshot::GameSnapshot;
}
