//! Headless match execution.
//!
//! Drives a standard skirmish at a fixed tick until the match is
//! decided or the tick budget runs out. The human faction issues no
//! commands, so a healthy scripted opponent should win every seed;
//! a timeout usually means the director stalled and is worth a look.
//!
//! All loops are bounded: `max_ticks` caps wall time no matter what the
//! simulation does.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fief_core::prelude::*;

/// Configuration for one headless match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// RNG seed for the match.
    pub seed: u64,
    /// Tick duration in milliseconds.
    pub tick_ms: u64,
    /// Maximum ticks before declaring a timeout.
    pub max_ticks: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_ms: 50,
            // 10 minutes of game time at the nominal tick.
            max_ticks: 12_000,
        }
    }
}

/// How a headless match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// A faction won.
    Winner(Owner),
    /// The tick budget ran out undecided.
    Timeout,
}

/// Report for one completed match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// The seed that produced this match.
    pub seed: u64,
    /// Outcome of the match.
    pub outcome: MatchOutcome,
    /// Ticks executed.
    pub ticks: u64,
    /// Game time elapsed in milliseconds.
    pub game_time_ms: u64,
    /// Final entity count.
    pub entities: usize,
    /// Final per-faction population (human, ai).
    pub population: (u32, u32),
    /// Final state hash, for cross-run comparison.
    pub state_hash: u64,
}

/// Run one match to completion or timeout.
#[must_use]
pub fn run_match(config: &MatchConfig) -> MatchReport {
    let mut sim = Simulation::new_match(config.seed);
    info!(seed = config.seed, "match start");

    let mut ticks = 0;
    while ticks < config.max_ticks && !sim.is_game_over() {
        sim.tick(config.tick_ms);
        ticks += 1;

        if ticks % 1200 == 0 {
            debug!(
                ticks,
                entities = sim.entities().len(),
                ai_population = sim.players().ai.population,
                "match progress"
            );
        }
    }

    let outcome = match sim.winner() {
        Some(winner) => MatchOutcome::Winner(winner),
        None => MatchOutcome::Timeout,
    };
    info!(seed = config.seed, ?outcome, ticks, "match finished");

    MatchReport {
        seed: config.seed,
        outcome,
        ticks,
        game_time_ms: sim.game_time_ms(),
        entities: sim.entities().len(),
        population: (sim.players().human.population, sim.players().ai.population),
        state_hash: sim.state_hash(),
    }
}

/// Run a batch of matches over consecutive seeds.
#[must_use]
pub fn run_batch(base: &MatchConfig, count: u64) -> Vec<MatchReport> {
    (0..count)
        .map(|offset| {
            let config = MatchConfig {
                seed: base.seed + offset,
                ..base.clone()
            };
            run_match(&config)
        })
        .collect()
}
