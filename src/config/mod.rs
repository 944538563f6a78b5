//! Configuration module for SortCopy
//!
//! Provides CLI arguments and runtime settings.

mod settings;

pub use settings::*;
