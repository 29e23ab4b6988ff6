//! Text normalization for social-media posts.
//!
//! [`Normalizer::normalize`] applies a fixed sequence of steps:
//!
//! 1. lowercase
//! 2. *(optional)* expand contractions (`won't` → `will not`)
//! 3. *(optional)* replace emoji glyphs with their names
//! 4. strip markup tags and decode common HTML entities
//! 5. remove URL-like substrings
//! 6. replace control characters with spaces
//! 7. remove punctuation
//! 8. remove digits
//! 9. collapse whitespace
//! 10. drop stopwords, lemmatize, drop tokens that lemmatized into stopwords
//!     (contractions surfaced by steps 7 and 8 are expanded here as well)
//!
//! The output is a fixed point: normalizing it again returns it unchanged.
//! Empty or whitespace-only input yields an empty string, as does input
//! made only of stopwords; callers treat that as missing text.

pub mod contractions;
pub mod lemma;
pub mod stopwords;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

pub use stopwords::StopwordLanguage;

static TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|</?[a-zA-Z][^>]*>").expect("valid tag pattern"));
static URLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www\S+").expect("valid url pattern"));
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation pattern"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit pattern"));

const MAX_TOKEN_PASSES: usize = 4;

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Which optional steps run before the core sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub language: StopwordLanguage,
    pub expand_contractions: bool,
    pub handle_emojis: bool,
}

impl NormalizeOptions {
    /// Core steps only.
    pub fn basic() -> Self {
        Self {
            language: StopwordLanguage::English,
            expand_contractions: false,
            handle_emojis: false,
        }
    }

    /// Core steps plus contraction expansion and emoji naming.
    pub fn advanced() -> Self {
        Self {
            expand_contractions: true,
            handle_emojis: true,
            ..Self::basic()
        }
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::advanced()
    }
}

/// Deterministic text normalizer.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalize one text. Never fails.
    pub fn normalize(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let mut text = text.to_lowercase();

        if self.options.expand_contractions {
            text = contractions::expand(&text);
        }
        if self.options.handle_emojis {
            text = demojize(&text);
        }

        text = TAGS.replace_all(&text, " ").into_owned();
        text = decode_entities(&text);
        text = URLS.replace_all(&text, "").into_owned();
        text = text
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();
        text = PUNCTUATION.replace_all(&text, " ").into_owned();
        text = DIGITS.replace_all(&text, "").into_owned();

        // Removing digits and punctuation can surface new contractions
        // (`4u` → `u`) and lemmas can land on informal forms, so the token
        // pass repeats until nothing changes.
        let mut tokens = self.token_pass(&text);
        for _ in 0..MAX_TOKEN_PASSES {
            let next = self.token_pass(&tokens);
            if next == tokens {
                break;
            }
            tokens = next;
        }
        tokens
    }

    /// Expand (if enabled), drop stopwords, lemmatize, drop again.
    fn token_pass(&self, text: &str) -> String {
        let expanded;
        let text = if self.options.expand_contractions {
            expanded = contractions::expand(text);
            expanded.as_str()
        } else {
            text
        };

        let language = self.options.language;
        text.split_whitespace()
            .filter(|w| !language.is_stopword(w))
            .map(|w| match language {
                StopwordLanguage::English => lemma::lemmatize(w),
                StopwordLanguage::French => w.to_string(),
            })
            .filter(|w| !w.is_empty() && !language.is_stopword(w) && !URLS.is_match(w))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalize a batch, preserving order.
    pub fn normalize_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        tracing::info!("Batch normalizing {} texts", texts.len());
        texts.iter().map(|t| self.normalize(t.as_ref())).collect()
    }
}

/// Replace each emoji grapheme with its name, padded with spaces.
fn demojize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for grapheme in text.graphemes(true) {
        let found = emojis::get(grapheme).or_else(|| emojis::get(&grapheme.replace('\u{fe0f}', "")));
        match found {
            Some(emoji) => {
                out.push(' ');
                out.push_str(emoji.name());
                out.push(' ');
            }
            None => out.push_str(grapheme),
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, ch)| acc.replace(entity, ch))
}

/// Before/after statistics for a normalization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizeStats {
    pub total_texts: usize,
    pub original_non_empty: usize,
    pub processed_non_empty: usize,
    pub average_length_original: f64,
    pub average_length_processed: f64,
    /// Percentage drop in average length.
    pub reduction_rate: f64,
}

/// Compare original texts with their normalized forms.
pub fn normalize_stats<A: AsRef<str>, B: AsRef<str>>(original: &[A], processed: &[B]) -> NormalizeStats {
    let non_empty = |t: &str| !t.trim().is_empty();
    let avg_len = |lens: Vec<usize>| -> f64 {
        if lens.is_empty() {
            0.0
        } else {
            lens.iter().sum::<usize>() as f64 / lens.len() as f64
        }
    };

    let average_length_original =
        avg_len(original.iter().map(|t| t.as_ref().chars().count()).collect());
    let average_length_processed =
        avg_len(processed.iter().map(|t| t.as_ref().chars().count()).collect());

    let reduction_rate = if average_length_original > 0.0 {
        (average_length_original - average_length_processed) / average_length_original * 100.0
    } else {
        0.0
    };

    NormalizeStats {
        total_texts: original.len(),
        original_non_empty: original.iter().filter(|t| non_empty(t.as_ref())).count(),
        processed_non_empty: processed.iter().filter(|t| non_empty(t.as_ref())).count(),
        average_length_original,
        average_length_processed,
        reduction_rate,
    }
}
