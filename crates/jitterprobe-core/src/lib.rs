//! jitterprobe-core — shared types and entry configuration.
//!
//! An [`Entry`] names one HTTP endpoint to probe: how to request it
//! ([`RequestSpec`]), how often (a normal distribution around
//! `interval_ms_centre`), and what the body must match ([`ResponseSpec`]).
//! Entries are loaded from a TOML file by [`EntrySet`], which validates each
//! entry on its own so one bad table never takes the rest down.

pub mod config;
pub mod error;
pub mod types;

pub use config::{EntrySet, RejectedEntry};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
