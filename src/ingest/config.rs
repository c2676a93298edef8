// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "FEEDS_CONFIG_PATH";
pub const ENV_INGEST_INTERVAL_SECS: &str = "INGEST_INTERVAL_SECS";
pub const DEFAULT_INGEST_INTERVAL_SECS: u64 = 900;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Load the feed list from an explicit path. Supports TOML or JSON formats.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedSpec>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feeds from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_feeds(&content, ext.as_str())
}

/// Load feeds using env var + fallbacks:
/// 1) $FEEDS_CONFIG_PATH
/// 2) config/feeds.toml
/// 3) config/feeds.json
pub fn load_feeds_default() -> Result<Vec<FeedSpec>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        } else {
            return Err(anyhow!("FEEDS_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/feeds.toml");
    if toml_p.exists() {
        return load_feeds_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feeds.json");
    if json_p.exists() {
        return load_feeds_from(&json_p);
    }
    Ok(Vec::new())
}

/// `$INGEST_INTERVAL_SECS`, falling back to 900s on absence or garbage.
pub fn ingest_interval_secs() -> u64 {
    std::env::var(ENV_INGEST_INTERVAL_SECS)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_INGEST_INTERVAL_SECS)
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<Vec<FeedSpec>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[feeds]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feeds config format"))
}

fn parse_toml(s: &str) -> Result<Vec<FeedSpec>> {
    #[derive(Deserialize)]
    struct TomlFeeds {
        feeds: Vec<FeedSpec>,
    }
    let v: TomlFeeds = toml::from_str(s)?;
    Ok(clean_list(v.feeds))
}

fn parse_json(s: &str) -> Result<Vec<FeedSpec>> {
    let v: Vec<FeedSpec> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim fields, drop entries without url, drop repeated urls (first wins).
fn clean_list(items: Vec<FeedSpec>) -> Vec<FeedSpec> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let url = it.url.trim().to_string();
        if url.is_empty() || !seen.insert(url.clone()) {
            continue;
        }
        let name = match it.name.trim() {
            "" => url.clone(),
            n => n.to_string(),
        };
        out.push(FeedSpec {
            name,
            url,
            language: it
                .language
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn dedup_trim_and_formats_work() {
        let toml = r#"
[[feeds]]
name = " BBC World "
url = "https://feeds.bbci.co.uk/news/world/rss.xml"

[[feeds]]
name = "dup"
url = " https://feeds.bbci.co.uk/news/world/rss.xml "

[[feeds]]
name = "El País"
url = "https://feeds.elpais.com/portada"
language = "es"

[[feeds]]
name = "no url"
url = ""
"#;
        let out = parse_toml(toml).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "BBC World");
        assert_eq!(out[1].language.as_deref(), Some("es"));

        let json = r#"[{"name": "", "url": "https://x.test/rss", "language": " "}]"#;
        let out = parse_json(json).unwrap();
        assert_eq!(out[0].name, "https://x.test/rss");
        assert!(out[0].language.is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_feeds("not a feed list", "").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Run from an empty temp dir so a real config/ in the repo does not interfere.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_PATH);
        let v = load_feeds_default().unwrap();
        assert!(v.is_empty());

        let p_json = tmp.path().join("feeds.json");
        fs::write(&p_json, r#"[{"name":"X","url":"https://x.test/rss"}]"#).unwrap();
        env::set_var(ENV_PATH, p_json.display().to_string());
        let v2 = load_feeds_default().unwrap();
        assert_eq!(v2.len(), 1);
        assert_eq!(v2[0].name, "X");

        env::set_var(ENV_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(load_feeds_default().is_err());
        env::remove_var(ENV_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
