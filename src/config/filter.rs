// src/config/filter.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::category::Category;

pub const ENV_FILTER_CONFIG_PATH: &str = "FILTER_CONFIG_PATH";
pub const ENV_SENSITIVITY_THRESHOLD: &str = "FILTER_SENSITIVITY_THRESHOLD";
pub const DEFAULT_FILTER_CONFIG_TOML: &str = "config/filter.toml";
pub const DEFAULT_FILTER_CONFIG_JSON: &str = "config/filter.json";
pub const DEFAULT_SENSITIVITY_THRESHOLD: u32 = 2;

fn default_filter_sports() -> bool {
    true
}
fn default_excluded() -> BTreeSet<Category> {
    BTreeSet::from([Category::SportsEntertainment])
}
fn default_threshold() -> u32 {
    DEFAULT_SENSITIVITY_THRESHOLD
}

/// Process-wide filter settings. Treated as an immutable snapshot: reloads
/// build a new value instead of mutating the one in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfiguration {
    /// Master switch. When false, `sports_entertainment` is never excluded.
    #[serde(default = "default_filter_sports")]
    pub filter_sports_content: bool,
    #[serde(default = "default_excluded")]
    pub excluded_categories: BTreeSet<Category>,
    /// Minimum match count for a non-default category (>= 1).
    #[serde(default = "default_threshold")]
    pub sensitivity_threshold: u32,
    /// Optional admission floor on the relevance score. Absent = diagnostic only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_relevance_score: Option<f32>,
    /// Also reject candidates with an empty title. Off: only the url is required.
    #[serde(default)]
    pub require_title: bool,
}

impl Default for FilterConfiguration {
    fn default() -> Self {
        Self {
            filter_sports_content: default_filter_sports(),
            excluded_categories: default_excluded(),
            sensitivity_threshold: default_threshold(),
            min_relevance_score: None,
            require_title: false,
        }
    }
}

impl FilterConfiguration {
    pub fn validate(&self) -> Result<()> {
        if self.sensitivity_threshold < 1 {
            bail!("sensitivity_threshold must be >= 1");
        }
        if let Some(min) = self.min_relevance_score {
            if !min.is_finite() || !(0.0..=1.0).contains(&min) {
                bail!("min_relevance_score must be within 0.0..=1.0, got {min}");
            }
        }
        Ok(())
    }

    /// Whether the gate rejects this category under the current settings.
    pub fn is_excluded(&self, category: Category) -> bool {
        if category == Category::SportsEntertainment && !self.filter_sports_content {
            return false;
        }
        self.excluded_categories.contains(&category)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: FilterConfiguration = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: FilterConfiguration = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit path. TOML or JSON, picked by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading filter config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = match ext.as_str() {
            "json" => Self::from_json_str(&content),
            "toml" => Self::from_toml_str(&content),
            _ => Self::from_toml_str(&content).or_else(|_| Self::from_json_str(&content)),
        };
        cfg.with_context(|| format!("invalid filter config {}", path.display()))
    }

    /// Resolve the config file and load it:
    /// 1) $FILTER_CONFIG_PATH (must exist)
    /// 2) config/filter.toml
    /// 3) config/filter.json
    /// 4) documented defaults
    ///
    /// `FILTER_SENSITIVITY_THRESHOLD` overrides the threshold afterwards.
    pub fn load_default() -> Result<(Self, Option<PathBuf>)> {
        match resolve_config_path()? {
            Some(p) => Ok((Self::load_with_overrides(&p)?, Some(p))),
            None => {
                tracing::info!(target: "config", "no filter config file found, using defaults");
                let mut cfg = Self::default();
                apply_env_overrides(&mut cfg, std::env::var(ENV_SENSITIVITY_THRESHOLD).ok())?;
                Ok((cfg, None))
            }
        }
    }

    /// `load_from` plus the env overrides. Startup and every reload go through here.
    pub fn load_with_overrides(path: &Path) -> Result<Self> {
        let mut cfg = Self::load_from(path)?;
        apply_env_overrides(&mut cfg, std::env::var(ENV_SENSITIVITY_THRESHOLD).ok())?;
        Ok(cfg)
    }
}

/// Path the config would be loaded from, if any.
pub fn resolve_config_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_FILTER_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_FILTER_CONFIG_PATH} points to non-existent path"));
    }
    for p in [DEFAULT_FILTER_CONFIG_TOML, DEFAULT_FILTER_CONFIG_JSON] {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
    }
    Ok(None)
}

fn apply_env_overrides(cfg: &mut FilterConfiguration, threshold: Option<String>) -> Result<()> {
    if let Some(raw) = threshold {
        let t: u32 = raw
            .trim()
            .parse()
            .with_context(|| format!("{ENV_SENSITIVITY_THRESHOLD}={raw:?} is not an integer"))?;
        cfg.sensitivity_threshold = t;
        cfg.validate()?;
    }
    Ok(())
}
