// src/language.rs
//! Language hints. Feeds often send wrong or missing language tags, so the
//! hint is informational only: the matcher always scans every language table.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Fr,
    De,
    #[default]
    Unknown,
}

impl Language {
    /// Parse a feed/HTTP language tag. Accepts ISO codes, regional variants
    /// (`en-US`, `es_ES`) and a few native/English names. Anything else is `Unknown`.
    pub fn from_hint(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        let primary = lower
            .split(['-', '_'])
            .next()
            .unwrap_or_default();
        match primary {
            "en" | "eng" | "english" => Self::En,
            "es" | "spa" | "spanish" | "español" | "espanol" => Self::Es,
            "fr" | "fra" | "fre" | "french" | "français" | "francais" => Self::Fr,
            "de" | "deu" | "ger" | "german" | "deutsch" => Self::De,
            _ => Self::Unknown,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

const STOPWORDS: &[(Language, &[&str])] = &[
    (
        Language::En,
        &["the", "and", "of", "to", "in", "is", "with", "as", "for", "at", "on"],
    ),
    (
        Language::Es,
        &["el", "la", "los", "las", "de", "del", "y", "en", "que", "por", "al", "con"],
    ),
    (
        Language::Fr,
        &["le", "la", "les", "des", "du", "et", "en", "est", "une", "pour", "dans", "sur"],
    ),
    (
        Language::De,
        &["der", "die", "das", "und", "ist", "mit", "den", "im", "von", "nicht", "auf", "zu"],
    ),
];

/// Best-effort guess from stop-word hits. Ties and texts with no hits are `Unknown`.
pub fn guess(text: &str) -> Language {
    let tokens: Vec<String> = crate::patterns::tokenize(text)
        .into_iter()
        .map(|t| t.text.to_lowercase())
        .collect();
    if tokens.is_empty() {
        return Language::Unknown;
    }

    let mut best = (Language::Unknown, 0usize);
    let mut tied = false;
    for (lang, words) in STOPWORDS {
        let hits = tokens.iter().filter(|t| words.contains(&t.as_str())).count();
        if hits > best.1 {
            best = (*lang, hits);
            tied = false;
        } else if hits == best.1 && hits > 0 {
            tied = true;
        }
    }
    if tied {
        Language::Unknown
    } else {
        best.0
    }
}

/// Use the hint when it parses to a supported language, otherwise guess from text.
pub fn resolve(hint: Option<&str>, text: &str) -> Language {
    match hint.map(Language::from_hint) {
        Some(Language::Unknown) | None => guess(text),
        Some(lang) => lang,
    }
}
