//! CLI command implementations.
//!
//! Commands are generic over the environment's seams; `main` hands them an
//! environment attached to the live game.

pub mod check;
pub mod monitor;
pub mod random_walk;
