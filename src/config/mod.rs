// src/config/mod.rs
//! Configuration store: filter settings loaded at startup and republished as
//! immutable snapshots on reload.

pub mod filter;
pub mod handle;

pub use filter::{FilterConfiguration, DEFAULT_SENSITIVITY_THRESHOLD};
pub use handle::{start_hot_reload_thread, FilterConfigHandle};
