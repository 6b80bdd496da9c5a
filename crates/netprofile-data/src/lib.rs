//! Data layer for the network profiler.
//!
//! Discovers device logs, decodes their records, resolves each device's
//! observation window, runs the activity state machine and reduces the
//! result to an hour-of-day traffic profile.

pub mod aggregator;
pub mod analysis;
pub mod analyzer;
pub mod identity;
pub mod reader;
pub mod window;

pub use netprofile_core as core;
