//! File system operations module
//!
//! Directory listing, extension buckets and streamed file copies used by
//! the sort engine.

mod bucket;
mod listing;
mod operations;

pub use bucket::*;
pub use listing::*;
pub use operations::*;
