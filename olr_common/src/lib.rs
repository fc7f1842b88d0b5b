//! OLR Common Library
//!
//! Shared constants, configuration loading and race data types for the
//! Open LED Race workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Defaults and hard limits (single source of truth)
//! - [`config`] - Configuration loading traits and the top-level `OlrConfig`
//! - [`race`] - Race configuration sections, status, errors, events, telemetry records
//! - [`led`] - Pixel colour type and the player palette
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use olr_common::prelude::*;
//!
//! let config = OlrConfig::default();
//! assert_eq!(config.race.total_laps, DEFAULT_LAPS);
//! ```

pub mod config;
pub mod consts;
pub mod led;
pub mod prelude;
pub mod race;
