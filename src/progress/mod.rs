//! Progress reporting module
//!
//! Optional terminal progress for sort runs.

mod reporter;

pub use reporter::*;
