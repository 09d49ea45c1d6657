//! Headless match runner library.
//!
//! Runs seeded matches without graphics at a fixed tick, for CI checks
//! and balance smoke-testing. See [`runner`] for the match loop.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod runner;
