//! Flat-file persistence for the site.
//!
//! # File Layout
//!
//! ```text
//! <data_dir>/
//!   views.json      # {"total_views": N}
//!   honour.json     # JSON array of honour wall entries
//!   goodbyes.json   # JSON array of goodbye entries
//! ```
//!
//! All writes replace whole files atomically (see [`atomic`]).

pub mod atomic;
pub mod counter;
pub mod document;

pub use counter::{CounterError, INCREMENT_FAILED, ViewCount, ViewCounter};
pub use document::{DocumentError, JsonDocument};
