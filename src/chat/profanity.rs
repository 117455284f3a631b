use std::collections::HashSet;
use std::sync::Arc;

use crate::config::ProfanityConfig;

/// Decides whether a chat message may be relayed.
#[cfg_attr(test, mockall::automock)]
pub trait ProfanityFilter: Send + Sync {
    fn is_profane(&self, text: &str) -> bool;
}

const DEFAULT_WORDS: &[&str] = &[
    "arse", "arsehole", "ass", "asshole", "bastard", "bitch", "bollocks", "bullshit",
    "crap", "cunt", "damn", "dick", "dickhead", "fuck", "fucker", "fucking", "motherfucker",
    "piss", "prick", "shit", "shitty", "slut", "twat", "wanker", "whore",
];

/// Whole-word, case-insensitive match against a fixed list.
#[derive(Debug, Clone)]
pub struct WordListFilter {
    words: HashSet<String>,
}

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|word| word.as_ref().trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    pub fn with_default_words() -> Self {
        Self::new(DEFAULT_WORDS)
    }

    pub fn extend<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(Self::new(words).words);
        self
    }
}

impl ProfanityFilter for WordListFilter {
    fn is_profane(&self, text: &str) -> bool {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .any(|token| self.words.contains(&token.to_lowercase()))
    }
}

/// Used when filtering is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ProfanityFilter for AllowAll {
    fn is_profane(&self, _text: &str) -> bool {
        false
    }
}

pub fn from_config(config: &ProfanityConfig) -> Arc<dyn ProfanityFilter> {
    if config.enabled {
        Arc::new(WordListFilter::with_default_words().extend(&config.extra_words))
    } else {
        Arc::new(AllowAll)
    }
}
