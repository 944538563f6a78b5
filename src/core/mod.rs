//! Core sort engine module
//!
//! Provides copy tasks, the recursive walker that spawns them and the
//! engine that runs a whole sort.

mod engine;
mod task;
mod walker;

pub use engine::*;
pub use task::*;
pub use walker::*;
