//! Case Engine
//!
//! Backend response simulation for the training scenarios. Each case study
//! is a pure function from a (possibly already rewritten) request to a
//! simulated response plus a flag telling the game-progression layer whether
//! the player's action satisfied the scenario's win condition. No shared
//! algorithm beyond: default status 200, a deterministic-range randomized
//! response time, and body-parse failures mapped to 400 instead of errors.

pub mod case;
pub mod cases;
pub mod registry;

pub use case::{CaseStudy, Difficulty, SimulatedOutcome, SimulatedResponse};
pub use registry::{CaseHandler, CaseRegistry};
