// src/patterns.rs
//! Pattern matcher: tokenizer, pattern table schema (from TOML), regex
//! compilation per pattern group, and case-insensitive whole-word matching.
//!
//! The table maps `language -> group -> keywords`, plus an `[entities]` section
//! of named entities (leagues, clubs, federations) that add to a group's count.
//! All languages are scanned for every text; results are unioned per group.
//! An optional `[homographs]` section lists, per language, keywords that are
//! ordinary words in that language (German "war"); they are not counted when
//! the text's language is that one.

use anyhow::{anyhow, Context, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::category::{Category, GEOPOLITICAL_GROUP, SPORTS_GROUP};
use crate::language::Language;

pub const ENV_PATTERN_TABLE_PATH: &str = "PATTERN_TABLE_PATH";

/// Built-in table shipped with the crate.
const BUILTIN_TABLE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/patterns.toml"));

/// Origin label for terms that come from the `[entities]` section.
const ENTITY_ORIGIN: &str = "entity";

/// A single token with byte span and sequential index
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub index: usize, // 0-based token index in the sequence
}

/// Basic, Unicode-friendly tokenizer.
pub fn tokenize(input: &str) -> Vec<Token> {
    static RE: once_cell::sync::OnceCell<Regex> = once_cell::sync::OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?u)\b\w+\b").expect("tokenizer regex"));
    re.find_iter(input)
        .enumerate()
        .map(|(i, m)| Token {
            text: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            index: i,
        })
        .collect()
}

/* ----------------------------
Table schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PatternTable {
    pub version: u32,
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<String>>,
    pub languages: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// language code -> terms ignored for texts in that language
    #[serde(default)]
    pub homographs: BTreeMap<String, Vec<String>>,
}

impl PatternTable {
    /// The table embedded at build time.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_TABLE).context("parsing built-in pattern table")
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let table: PatternTable = toml::from_str(s)?;
        if table.version == 0 {
            return Err(anyhow!("pattern table version must be >= 1"));
        }
        if table.languages.is_empty() {
            return Err(anyhow!("pattern table has no [languages.*] sections"));
        }
        Ok(table)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pattern table from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing pattern table {}", path.display()))
    }

    /// `$PATTERN_TABLE_PATH` when set (the file must exist), otherwise the built-in table.
    pub fn load_default() -> Result<Self> {
        match std::env::var(ENV_PATTERN_TABLE_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_PATTERN_TABLE_PATH} points to non-existent path"));
                }
                Self::load_from(&pb)
            }
            Err(_) => Self::builtin(),
        }
    }
}

/* ----------------------------
Match results
---------------------------- */

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMatch {
    /// Non-overlapping occurrences of any of the group's terms.
    pub count: usize,
    /// Distinct matched pattern ids, `group/origin:term`, sorted.
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMatches {
    pub language: Language,
    groups: BTreeMap<String, GroupMatch>,
}

impl PatternMatches {
    pub fn count(&self, group: &str) -> usize {
        self.groups.get(group).map(|g| g.count).unwrap_or(0)
    }

    pub fn group(&self, group: &str) -> Option<&GroupMatch> {
        self.groups.get(group)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &GroupMatch)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Per-group counts, zero entries included.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.groups
            .iter()
            .map(|(k, v)| (k.clone(), v.count))
            .collect()
    }

    /// All matched ids across groups, in group order.
    pub fn matched_ids(&self) -> Vec<String> {
        self.groups
            .values()
            .flat_map(|g| g.ids.iter().cloned())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(|g| g.count).sum()
    }
}

/* ----------------------------
Compiled matcher
---------------------------- */

#[derive(Debug)]
struct CompiledGroup {
    name: String,
    re: Option<Regex>,
    /// normalized term -> origins (language codes or "entity"), sorted
    origins: HashMap<String, Vec<String>>,
}

/// Compiled pattern table. Pure and shareable across threads.
#[derive(Debug)]
pub struct PatternMatcher {
    version: u32,
    groups: Vec<CompiledGroup>,
    /// language code -> normalized terms skipped for that language
    homographs: HashMap<String, HashSet<String>>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Lowercase and collapse inner whitespace so table terms and matched text share one key.
fn normalize_term(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whole-word regex fragment for one term. `\b` is only added on sides that
/// start/end with a word character so terms like `zero-day` or `coup d'état` still work.
fn term_fragment(term: &str) -> String {
    let body = term
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let lead = if term.chars().next().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };
    let trail = if term.chars().last().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };
    format!("{lead}{body}{trail}")
}

impl PatternMatcher {
    pub fn new(table: &PatternTable) -> Result<Self> {
        // group -> term -> origins
        let mut collected: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();

        for (lang, groups) in &table.languages {
            let origin = lang.trim().to_lowercase();
            for (group, terms) in groups {
                let slot = collected.entry(group.clone()).or_default();
                for t in terms {
                    let key = normalize_term(t);
                    if key.is_empty() {
                        continue;
                    }
                    let origins = slot.entry(key).or_default();
                    if !origins.contains(&origin) {
                        origins.push(origin.clone());
                    }
                }
            }
        }
        for (group, terms) in &table.entities {
            let slot = collected.entry(group.clone()).or_default();
            for t in terms {
                let key = normalize_term(t);
                if key.is_empty() {
                    continue;
                }
                let origins = slot.entry(key).or_default();
                if !origins.iter().any(|o| o == ENTITY_ORIGIN) {
                    origins.push(ENTITY_ORIGIN.to_string());
                }
            }
        }

        // Every classifier group exists, even when the table leaves it out.
        let mut expected: Vec<&str> = vec![SPORTS_GROUP, GEOPOLITICAL_GROUP];
        expected.extend(Category::ALL.iter().filter_map(|c| c.pattern_group()));
        for g in expected {
            if !collected.contains_key(g) {
                warn!(target: "patterns", group = g, "pattern table has no terms for group");
                collected.entry(g.to_string()).or_default();
            }
        }

        let groups = collected
            .into_iter()
            .map(|(name, terms)| {
                let mut keys: Vec<&String> = terms.keys().collect();
                // Longest first: alternation is leftmost-first, so "world cup" must beat "cup".
                keys.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
                let re = if keys.is_empty() {
                    None
                } else {
                    let alternation = keys
                        .iter()
                        .map(|k| term_fragment(k))
                        .collect::<Vec<_>>()
                        .join("|");
                    let re = RegexBuilder::new(&format!("(?:{alternation})"))
                        .case_insensitive(true)
                        .unicode(true)
                        .size_limit(64 * (1 << 20))
                        .build()
                        .map_err(|e| anyhow!("group `{}` regex error: {}", name, e))?;
                    Some(re)
                };
                let origins = terms
                    .into_iter()
                    .map(|(k, mut v)| {
                        v.sort();
                        (k, v)
                    })
                    .collect();
                Ok(CompiledGroup { name, re, origins })
            })
            .collect::<Result<Vec<_>>>()?;

        let homographs = table
            .homographs
            .iter()
            .map(|(lang, terms)| {
                let set = terms
                    .iter()
                    .map(|t| normalize_term(t))
                    .filter(|t| !t.is_empty())
                    .collect::<HashSet<_>>();
                (lang.trim().to_lowercase(), set)
            })
            .collect();

        debug!(target: "patterns", version = table.version, groups = groups.len(), "pattern table compiled");
        Ok(Self {
            version: table.version,
            groups,
            homographs,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(&PatternTable::builtin()?)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// Scan `text` against every group. Empty text yields all-zero counts.
    /// The hint picks which origin an ambiguous term is reported under and
    /// which homographs are skipped.
    pub fn scan(&self, text: &str, hint: Language) -> PatternMatches {
        let mut out = PatternMatches {
            language: hint,
            groups: BTreeMap::new(),
        };
        let skip = self.homographs.get(hint.code());

        for g in &self.groups {
            let mut gm = GroupMatch::default();
            if let (Some(re), false) = (&g.re, text.trim().is_empty()) {
                for m in re.find_iter(text) {
                    let key = normalize_term(m.as_str());
                    if skip.is_some_and(|s| s.contains(&key)) {
                        continue;
                    }
                    gm.count += 1;
                    let origin = g
                        .origins
                        .get(&key)
                        .map(|os| pick_origin(os, hint))
                        .unwrap_or("unknown");
                    gm.ids.push(format!("{}/{}:{}", g.name, origin, key));
                }
                gm.ids.sort();
                gm.ids.dedup();
            }
            out.groups.insert(g.name.clone(), gm);
        }
        out
    }
}

fn pick_origin(origins: &[String], hint: Language) -> &str {
    origins
        .iter()
        .find(|o| o.as_str() == hint.code())
        .or_else(|| origins.first())
        .map(String::as_str)
        .unwrap_or("unknown")
}
