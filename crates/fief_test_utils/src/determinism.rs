//! Determinism testing utilities.
//!
//! The simulation promises: same seed, same intents, same timings -
//! same state, tick for tick. This module provides the harness that
//! makes the promise checkable.
//!
//! Sources of non-determinism to watch for:
//!
//! - **Floating-point math**: the core uses fixed-point throughout.
//! - **HashMap iteration order**: the core iterates sorted entity ids.
//! - **System randomness**: one seeded RNG per match, nothing else.

use std::thread;

use fief_core::prelude::*;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final state hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated per run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Assert that the simulation was deterministic, with a detailed
    /// error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify identical outcomes.
///
/// Generic over the state type so non-simulation state can use the same
/// harness in tests.
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a simulation setup twice at the nominal 50ms tick and verify the
/// final state hashes match.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| sim.tick(50),
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Run N simulations in parallel threads and verify the final hashes
/// match. Catches non-determinism that only shows under scheduling and
/// memory-layout variation.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                scope.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick(50);
                    }
                    sim.state_hash()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two identical runs tick-by-tick and report the first tick at
/// which they diverge. `None` means fully deterministic.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick(50);
        b.tick(50);
        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}
