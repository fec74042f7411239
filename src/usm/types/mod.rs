//! Foundational data structures, error types, and demux options.

pub mod error;
pub mod models;
pub mod options;
