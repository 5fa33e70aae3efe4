//! Tweet tokenizer
//!
//! Cleans short social-media text and splits it into terms: case folding,
//! URL and mention removal, hashtag splitting, character-repeat
//! normalization, length and stopword filtering, light suffix stemming.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap());

static MENTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").unwrap());

static HASHTAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());

static CAMEL_CASE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Words dropped before weighting
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does",
    "doing", "don", "down", "during", "each", "for", "from", "get", "got", "had", "has", "have",
    "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "just", "let", "like", "may", "me", "might", "more", "most", "must", "my", "no", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
    "rt", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "via", "was", "we", "were", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
];

/// Tokenizer options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Shorter tokens are dropped
    pub min_length: usize,
    /// Custom stopword list; the built-in English list is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
    pub remove_urls: bool,
    pub remove_mentions: bool,
    /// Split camel-case hashtags into words (`#WorldCup` → `world cup`)
    pub split_hashtags: bool,
    pub remove_numbers: bool,
    /// Collapse runs of three or more identical characters (`goooal` → `goal`)
    pub normalize_repeats: bool,
    pub stem: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            stopwords: None,
            remove_urls: true,
            remove_mentions: true,
            split_hashtags: true,
            remove_numbers: true,
            normalize_repeats: true,
            stem: true,
        }
    }
}

/// Configured tokenizer
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    stopwords: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        let stopwords = match &config.stopwords {
            Some(words) => words.iter().map(|w| w.to_lowercase()).collect(),
            None => STOPWORDS.iter().map(|w| w.to_string()).collect(),
        };
        Self { config, stopwords }
    }

    /// Split text into cleaned terms, keeping duplicates
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut text = text.to_string();
        if self.config.remove_urls {
            text = URL_PATTERN.replace_all(&text, " ").into_owned();
        }
        if self.config.remove_mentions {
            text = MENTION_PATTERN.replace_all(&text, " ").into_owned();
        }
        if self.config.split_hashtags {
            text = HASHTAG_PATTERN
                .replace_all(&text, |caps: &regex::Captures| {
                    CAMEL_CASE_PATTERN.replace_all(&caps[1], "$1 $2").into_owned()
                })
                .into_owned();
        }

        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .filter(|s| !(self.config.remove_numbers && s.chars().all(|c| c.is_numeric())))
            .map(|s| {
                if self.config.normalize_repeats {
                    collapse_repeats(s)
                } else {
                    s.to_string()
                }
            })
            .filter(|s| s.chars().count() >= self.config.min_length)
            .filter(|s| !self.stopwords.contains(s))
            .map(|s| if self.config.stem { stem_word(&s) } else { s })
            .collect()
    }
}

/// Collapse runs of three or more identical characters into one
fn collapse_repeats(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    let mut out = String::with_capacity(word.len());
    let mut i = 0;
    while i < chars.len() {
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == chars[i] {
            run += 1;
        }
        let keep = if run >= 3 { 1 } else { run };
        out.extend(std::iter::repeat(chars[i]).take(keep));
        i += run;
    }
    out
}

/// Basic stemming: strip common English suffixes
fn stem_word(word: &str) -> String {
    if !word.is_ascii() {
        return word.to_string();
    }

    if word.ends_with("ing") && word.len() > 5 {
        let stem = &word[..word.len() - 3];
        // running -> run
        let bytes = stem.as_bytes();
        if bytes.len() > 2 && bytes[bytes.len() - 1] == bytes[bytes.len() - 2] {
            return stem[..stem.len() - 1].to_string();
        }
        return stem.to_string();
    }

    if word.ends_with("ed") && word.len() > 4 {
        return word[..word.len() - 2].to_string();
    }

    if word.ends_with("ly") && word.len() > 4 {
        return word[..word.len() - 2].to_string();
    }

    if word.ends_with('s') && word.len() > 3 && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenize() {
        let tokenizer = Tokenizer::default();
        let tokens = tokenizer.tokenize("The striker scores a GOAL in the final minute");
        assert_eq!(tokens, vec!["striker", "score", "goal", "final", "minute"]);
    }

    #[test]
    fn test_removes_urls_and_mentions() {
        let tokenizer = Tokenizer::default();
        let tokens = tokenizer.tokenize("@fifa penalty awarded https://t.co/abc123 www.example.com");
        assert_eq!(tokens, vec!["penalty", "award"]);
    }

    #[test]
    fn test_splits_hashtags() {
        let tokenizer = Tokenizer::default();
        let tokens = tokenizer.tokenize("#WorldCup final");
        assert_eq!(tokens, vec!["world", "cup", "final"]);

        let plain = Tokenizer::new(TokenizerConfig {
            split_hashtags: false,
            ..TokenizerConfig::default()
        });
        assert_eq!(plain.tokenize("#WorldCup"), vec!["worldcup"]);
    }

    #[test]
    fn test_normalizes_repeats() {
        assert_eq!(collapse_repeats("goooal"), "goal");
        assert_eq!(collapse_repeats("ball"), "ball");
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("GOOOOAL"), vec!["goal"]);
    }

    #[test]
    fn test_drops_numbers_and_short_tokens() {
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("90 min at 2 go"), vec!["min"]);
    }

    #[test]
    fn test_custom_stopwords() {
        let tokenizer = Tokenizer::new(TokenizerConfig {
            stopwords: Some(vec!["Match".to_string()]),
            stem: false,
            ..TokenizerConfig::default()
        });
        assert_eq!(tokenizer.tokenize("the match ended"), vec!["the", "ended"]);
    }

    #[test]
    fn test_stem_word() {
        assert_eq!(stem_word("running"), "run");
        assert_eq!(stem_word("scored"), "scor");
        assert_eq!(stem_word("quickly"), "quick");
        assert_eq!(stem_word("goals"), "goal");
        assert_eq!(stem_word("class"), "class");
        assert_eq!(stem_word("café"), "café");
    }
}
