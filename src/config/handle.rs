// src/config/handle.rs
//! Shared, swappable config snapshot + polling hot reload.

use anyhow::Result;
use metrics::{counter, gauge};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use super::filter::FilterConfiguration;

pub const ENV_FILTER_HOT_RELOAD: &str = "FILTER_HOT_RELOAD";

/// Cheap-to-clone handle. Readers take an `Arc` snapshot and keep it for the
/// whole classification call; a reload swaps in a new `Arc` and never touches
/// the old value.
#[derive(Clone, Debug)]
pub struct FilterConfigHandle {
    inner: Arc<RwLock<Arc<FilterConfiguration>>>,
}

impl FilterConfigHandle {
    pub fn new(cfg: FilterConfiguration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(cfg))),
        }
    }

    pub fn snapshot(&self) -> Arc<FilterConfiguration> {
        match self.inner.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Validate and publish a new snapshot.
    pub fn replace(&self, cfg: FilterConfiguration) -> Result<()> {
        cfg.validate()?;
        gauge!("filter_sensitivity_threshold").set(cfg.sensitivity_threshold as f64);
        let fresh = Arc::new(cfg);
        match self.inner.write() {
            Ok(mut g) => *g = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        counter!("filter_config_reloads_total").increment(1);
        Ok(())
    }

    /// Load `path` (env overrides included) and swap it in. On error the
    /// current snapshot stays.
    pub fn reload_from(&self, path: &Path) -> Result<Arc<FilterConfiguration>> {
        let cfg = FilterConfiguration::load_with_overrides(path)?;
        self.replace(cfg)?;
        info!(target: "config", path = %path.display(), "filter config reloaded");
        Ok(self.snapshot())
    }
}

/// One polling step: reload when `path`'s mtime moved past `last_mtime`.
/// The first observation only records the mtime. Returns whether a new
/// snapshot was published.
pub fn reload_if_changed(
    handle: &FilterConfigHandle,
    path: &Path,
    last_mtime: &mut Option<SystemTime>,
) -> bool {
    let Ok(mtime) = fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };
    let changed = match *last_mtime {
        None => {
            *last_mtime = Some(mtime);
            false
        }
        Some(prev) => mtime > prev,
    };
    if !changed {
        return false;
    }
    *last_mtime = Some(mtime);
    match handle.reload_from(path) {
        Ok(_) => true,
        Err(e) => {
            warn!(target: "config", error = ?e, "filter config reload failed, keeping previous snapshot");
            false
        }
    }
}

fn hot_reload_enabled() -> bool {
    std::env::var(ENV_FILTER_HOT_RELOAD)
        .ok()
        .is_some_and(|v| v == "1")
}

/// Start a polling watcher (every 2s) on `path` when `FILTER_HOT_RELOAD=1`.
/// Returns whether the watcher was started.
pub fn start_hot_reload_thread(handle: FilterConfigHandle, path: PathBuf) -> bool {
    if !hot_reload_enabled() {
        return false;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;
        loop {
            reload_if_changed(&handle, &path, &mut last_mtime);
            thread::sleep(poll);
        }
    });
    true
}
