// tests/config_loading.rs
//
// Startup config resolution (env path -> config/filter.toml -> config/filter.json
// -> defaults), env threshold override, pattern table override.
// Every test mutates process env or cwd, so all of them run serially.

use serial_test::serial;
use std::{env, fs};

use geo_news_filter::config::filter::{ENV_FILTER_CONFIG_PATH, ENV_SENSITIVITY_THRESHOLD};
use geo_news_filter::patterns::{PatternMatcher, PatternTable, ENV_PATTERN_TABLE_PATH};
use geo_news_filter::{Category, FilterConfigHandle, FilterConfiguration};

struct CwdGuard {
    old: std::path::PathBuf,
    _tmp: tempfile::TempDir,
}

impl CwdGuard {
    fn enter_empty() -> (Self, std::path::PathBuf) {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        env::set_current_dir(&root).unwrap();
        env::remove_var(ENV_FILTER_CONFIG_PATH);
        env::remove_var(ENV_SENSITIVITY_THRESHOLD);
        env::remove_var(ENV_PATTERN_TABLE_PATH);
        (Self { old, _tmp: tmp }, root)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.old);
        env::remove_var(ENV_FILTER_CONFIG_PATH);
        env::remove_var(ENV_SENSITIVITY_THRESHOLD);
        env::remove_var(ENV_PATTERN_TABLE_PATH);
    }
}

#[test]
#[serial]
fn no_file_means_documented_defaults() {
    let (_g, _root) = CwdGuard::enter_empty();
    let (cfg, path) = FilterConfiguration::load_default().unwrap();
    assert!(path.is_none());
    assert_eq!(cfg, FilterConfiguration::default());
}

#[test]
#[serial]
fn toml_wins_over_json_in_config_dir() {
    let (_g, root) = CwdGuard::enter_empty();
    fs::create_dir_all(root.join("config")).unwrap();
    fs::write(
        root.join("config/filter.json"),
        r#"{"sensitivity_threshold": 4}"#,
    )
    .unwrap();

    let (cfg, path) = FilterConfiguration::load_default().unwrap();
    assert_eq!(cfg.sensitivity_threshold, 4);
    assert!(path.unwrap().ends_with("config/filter.json"));

    fs::write(
        root.join("config/filter.toml"),
        "excluded_categories = [\"sports_entertainment\", \"cyber_security\"]\n",
    )
    .unwrap();
    let (cfg, path) = FilterConfiguration::load_default().unwrap();
    assert!(path.unwrap().ends_with("config/filter.toml"));
    assert_eq!(cfg.sensitivity_threshold, 2);
    assert!(cfg.is_excluded(Category::CyberSecurity));
}

#[test]
#[serial]
fn env_path_must_exist() {
    let (_g, root) = CwdGuard::enter_empty();
    env::set_var(ENV_FILTER_CONFIG_PATH, root.join("nope.toml"));
    assert!(FilterConfiguration::load_default().is_err());

    let p = root.join("custom.toml");
    fs::write(&p, "filter_sports_content = false\n").unwrap();
    env::set_var(ENV_FILTER_CONFIG_PATH, &p);
    let (cfg, path) = FilterConfiguration::load_default().unwrap();
    assert!(!cfg.filter_sports_content);
    assert_eq!(path.as_deref(), Some(p.as_path()));
}

#[test]
#[serial]
fn invalid_file_fails_fast() {
    let (_g, root) = CwdGuard::enter_empty();
    let p = root.join("bad.toml");
    fs::write(&p, "excluded_categories = [\"weather\"]\n").unwrap();
    env::set_var(ENV_FILTER_CONFIG_PATH, &p);
    let err = FilterConfiguration::load_default().unwrap_err();
    assert!(format!("{err:#}").contains("bad.toml"), "{err:#}");
}

#[test]
#[serial]
fn threshold_env_override() {
    let (_g, _root) = CwdGuard::enter_empty();
    env::set_var(ENV_SENSITIVITY_THRESHOLD, "1");
    let (cfg, _) = FilterConfiguration::load_default().unwrap();
    assert_eq!(cfg.sensitivity_threshold, 1);

    env::set_var(ENV_SENSITIVITY_THRESHOLD, "high");
    assert!(FilterConfiguration::load_default().is_err());
}

#[test]
#[serial]
fn pattern_table_override_adds_terms_without_code_changes() {
    let (_g, root) = CwdGuard::enter_empty();
    assert!(PatternTable::load_default().is_ok(), "built-in table");

    let p = root.join("patterns.toml");
    fs::write(
        &p,
        r#"
version = 2
[languages.it]
sports_keywords = ["calcio", "partita"]
"#,
    )
    .unwrap();
    env::set_var(ENV_PATTERN_TABLE_PATH, &p);
    let table = PatternTable::load_default().unwrap();
    assert_eq!(table.version, 2);

    let m = PatternMatcher::new(&table).unwrap();
    let hits = m.scan("Calcio: la partita di ieri", Default::default());
    assert_eq!(hits.count("sports_keywords"), 2);

    env::set_var(ENV_PATTERN_TABLE_PATH, root.join("missing.toml"));
    assert!(PatternTable::load_default().is_err());
}

#[test]
#[serial]
fn threshold_env_override_survives_reload() {
    let (_g, root) = CwdGuard::enter_empty();
    let p = root.join("filter.toml");
    fs::write(&p, "sensitivity_threshold = 2\n").unwrap();
    env::set_var(ENV_FILTER_CONFIG_PATH, &p);
    env::set_var(ENV_SENSITIVITY_THRESHOLD, "1");

    let (cfg, path) = FilterConfiguration::load_default().unwrap();
    assert_eq!(cfg.sensitivity_threshold, 1);

    let handle = FilterConfigHandle::new(cfg);
    let reloaded = handle.reload_from(path.as_deref().unwrap()).unwrap();
    assert_eq!(reloaded.sensitivity_threshold, 1);

    // Other fields still come from the file.
    fs::write(&p, "sensitivity_threshold = 3\nfilter_sports_content = false\n").unwrap();
    let reloaded = handle.reload_from(&p).unwrap();
    assert_eq!(reloaded.sensitivity_threshold, 1);
    assert!(!reloaded.filter_sports_content);

    env::remove_var(ENV_SENSITIVITY_THRESHOLD);
    assert_eq!(handle.reload_from(&p).unwrap().sensitivity_threshold, 3);
}
