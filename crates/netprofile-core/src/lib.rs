//! Shared types for netprofile.
//!
//! Holds the error type, the log/record data model, the 04:00 day-boundary
//! helpers and the command-line settings used by every other crate.

pub mod error;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{ProfileError, Result};
