//! Runtime layer for the network profiler.
//!
//! Runs device jobs concurrently, serializes summary writes and produces the
//! batch run report.

pub mod orchestrator;
pub mod report;
pub mod summary;

pub use netprofile_core as core;
pub use netprofile_data as data;
