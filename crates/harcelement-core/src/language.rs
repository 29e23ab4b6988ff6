//! Language tagging with confidence scores.
//!
//! The [`LanguageTagger`] guards the model with a minimum text length and
//! maps every failure to the default language (`unknown`) with confidence
//! `0.0`. The model itself sits behind the [`LanguageModel`] trait; the
//! default [`WhatlangModel`] combines whatlang trigrams (restricted to the
//! supported languages) with function-word counts for short posts. Both are
//! fully deterministic, so repeated runs over the same input always agree.
//!
//! The advanced variant adds two fallback heuristics for texts the model
//! cannot place: a character-set check for accented and non-Latin scripts,
//! then a common-word lookup over the first ten words.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::DetectionError;
use crate::normalize::StopwordLanguage;

pub const DEFAULT_LANGUAGE: &str = "unknown";
pub const DEFAULT_MIN_TEXT_LENGTH: usize = 10;

/// Confidence attached to answers produced by the fallback heuristics.
pub const HEURISTIC_CONFIDENCE: f64 = 0.1;

/// ISO 639-1 codes the tagger reports; anything else maps to the default.
pub static SUPPORTED_LANGUAGES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "af", "ar", "bg", "bn", "ca", "cs", "cy", "da", "de", "el", "en", "es", "et", "fa", "fi",
        "fr", "gu", "he", "hi", "hr", "hu", "id", "it", "ja", "kn", "ko", "lt", "lv", "mk", "ml",
        "mr", "ne", "nl", "no", "pa", "pl", "pt", "ro", "ru", "sk", "sl", "so", "sq", "sv", "sw",
        "ta", "te", "th", "tl", "tr", "uk", "ur", "vi", "zh-cn", "zh-tw",
    ]
    .into_iter()
    .collect()
});

/// ISO 639-3 (as reported by whatlang) to the ISO 639-1 codes above.
static ISO_639_3_TO_1: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("afr", "af"), ("ara", "ar"), ("bul", "bg"), ("ben", "bn"), ("cat", "ca"),
        ("ces", "cs"), ("dan", "da"), ("deu", "de"), ("ell", "el"), ("eng", "en"),
        ("spa", "es"), ("est", "et"), ("pes", "fa"), ("fin", "fi"), ("fra", "fr"),
        ("guj", "gu"), ("heb", "he"), ("hin", "hi"), ("hrv", "hr"), ("hun", "hu"),
        ("ind", "id"), ("ita", "it"), ("jpn", "ja"), ("kan", "kn"), ("kor", "ko"),
        ("lit", "lt"), ("lav", "lv"), ("mkd", "mk"), ("mal", "ml"), ("mar", "mr"),
        ("nep", "ne"), ("nld", "nl"), ("nob", "no"), ("pan", "pa"), ("pol", "pl"),
        ("por", "pt"), ("ron", "ro"), ("rus", "ru"), ("slk", "sk"), ("slv", "sl"),
        ("swe", "sv"), ("tam", "ta"), ("tel", "te"), ("tha", "th"), ("tgl", "tl"),
        ("tur", "tr"), ("ukr", "uk"), ("urd", "ur"), ("vie", "vi"), ("cmn", "zh-cn"),
    ]
    .into_iter()
    .collect()
});

static LANGUAGE_FAMILIES: &[(&str, &[&str])] = &[
    ("germanic", &["en", "de", "nl", "sv", "no", "da"]),
    ("romance", &["es", "fr", "it", "pt", "ro"]),
    ("slavic", &["ru", "pl", "cs", "sk", "uk", "bg"]),
    ("asian", &["zh-cn", "zh-tw", "ja", "ko", "vi", "th"]),
    ("semitic", &["ar", "he"]),
    ("indic", &["hi", "bn", "pa", "gu", "mr", "ne"]),
];

/// Character sets checked in order by the character heuristic.
static CHARACTER_HINTS: &[(&str, &str)] = &[
    ("äöüß", "de"),
    ("áéíóúñ", "es"),
    ("àâæçéèêëîïôœùûüÿ", "fr"),
    ("àèéìíîòóùú", "it"),
    ("ãçõ", "pt"),
    ("αβγδεζηθικλμνξοπρστυφχψω", "el"),
    ("абвгдежзийклмнопрстуфхцчшщъыьэюя", "ru"),
];

/// Function words checked by the pattern heuristic.
static COMMON_WORDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("the", "en"), ("and", "en"), ("is", "en"),
        ("der", "de"), ("die", "de"), ("das", "de"),
        ("el", "es"), ("de", "es"),
        ("le", "fr"), ("et", "fr"),
        ("il", "it"), ("la", "it"), ("e", "it"),
    ]
    .into_iter()
    .collect()
});

/// A language identification model.
///
/// Returns an ISO 639-1 code (possibly unsupported) and a probability in
/// `[0, 1]`, or a [`DetectionError`] when the text has nothing to go on.
pub trait LanguageModel: Send + Sync {
    fn identify(&self, text: &str) -> Result<(String, f64), DetectionError>;
}

/// Informal English spellings common in posts. On short texts they carry
/// as much signal as function words.
const INFORMAL_ENGLISH: &[&str] = &[
    "wanna", "gonna", "gotta", "gimme", "lemme", "kinda", "sorta", "dunno", "ya", "u", "ur", "im",
    "dont", "cant", "lol", "omg",
];

const GERMAN_WORDS: &[&str] = &[
    "der", "die", "das", "und", "ist", "nicht", "ich", "du", "ein", "eine", "zu", "mit", "sie",
    "es", "auf", "den", "dem", "wir", "bist", "sind",
];

const SPANISH_WORDS: &[&str] = &[
    "el", "la", "los", "las", "que", "y", "es", "no", "un", "una", "por", "con", "para", "eres",
    "muy", "pero", "yo", "tu", "del", "se",
];

const ITALIAN_WORDS: &[&str] = &[
    "il", "lo", "gli", "che", "e", "non", "un", "una", "per", "con", "sono", "sei", "io", "tu",
    "ma", "del", "della", "questo", "mi", "ti",
];

/// A function-word guess needs at least this many matching words.
const MIN_FUNCTION_WORDS: usize = 2;

static FUNCTION_WORDS: Lazy<Vec<(&'static str, HashSet<&'static str>)>> = Lazy::new(|| {
    let english = StopwordLanguage::English
        .words()
        .iter()
        .chain(INFORMAL_ENGLISH)
        .copied()
        .collect();
    vec![
        ("en", english),
        ("fr", StopwordLanguage::French.words().clone()),
        ("de", GERMAN_WORDS.iter().copied().collect()),
        ("es", SPANISH_WORDS.iter().copied().collect()),
        ("it", ITALIAN_WORDS.iter().copied().collect()),
    ]
});

/// Language whose function words make up the largest share of the words
/// in `text`, with that share as confidence. `None` on a tie or when fewer
/// than two words match.
pub fn function_word_guess(text: &str) -> Option<(&'static str, f64)> {
    let lower = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphabetic() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return None;
    }

    let mut scores: Vec<(&'static str, usize)> = FUNCTION_WORDS
        .iter()
        .map(|(code, list)| (*code, words.iter().filter(|w| list.contains(*w)).count()))
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    let (best, hits) = scores[0];
    let runner_up = scores.get(1).map(|s| s.1).unwrap_or(0);
    if hits < MIN_FUNCTION_WORDS || hits == runner_up {
        return None;
    }
    Some((best, hits as f64 / words.len() as f64))
}

/// whatlang restricted to the languages it can report as ISO 639-1.
static DETECTOR: Lazy<whatlang::Detector> = Lazy::new(|| {
    let mut codes: Vec<&str> = ISO_639_3_TO_1.keys().copied().collect();
    codes.sort_unstable();
    let allowed = codes.into_iter().filter_map(whatlang::Lang::from_code).collect();
    whatlang::Detector::with_allowlist(allowed)
});

/// [`LanguageModel`] backed by the `whatlang` crate.
///
/// Trigram scores are unreliable on posts of a few words, so when whatlang
/// does not flag its answer as reliable the function-word guess wins if it
/// is more confident.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangModel;

impl LanguageModel for WhatlangModel {
    fn identify(&self, text: &str) -> Result<(String, f64), DetectionError> {
        let info = catch_unwind(AssertUnwindSafe(|| DETECTOR.detect(text)))
            .map_err(|_| DetectionError::Model("whatlang panicked".to_string()))?;
        let guess = function_word_guess(text);

        let Some(info) = info else {
            return guess
                .map(|(code, confidence)| (code.to_string(), confidence))
                .ok_or(DetectionError::NoFeatures);
        };

        let code = info.lang().code();
        let iso1 = ISO_639_3_TO_1
            .get(code)
            .map(|c| c.to_string())
            .unwrap_or_else(|| code.to_string());
        let confidence = info.confidence().clamp(0.0, 1.0);

        match guess {
            Some((guessed, share)) if !info.is_reliable() && share > confidence => {
                Ok((guessed.to_string(), share))
            }
            _ => Ok((iso1, confidence)),
        }
    }
}

/// A detected language and how sure the tagger is about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageTag {
    pub language: String,
    pub confidence: f64,
}

impl LanguageTag {
    fn new(language: impl Into<String>, confidence: f64) -> Self {
        Self {
            language: language.into(),
            confidence,
        }
    }
}

/// Tagger settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggerOptions {
    pub min_text_length: usize,
    pub default_language: String,
    /// Run the fallback heuristics when the model fails.
    pub enable_fallback: bool,
}

impl TaggerOptions {
    pub fn basic() -> Self {
        Self {
            min_text_length: DEFAULT_MIN_TEXT_LENGTH,
            default_language: DEFAULT_LANGUAGE.to_string(),
            enable_fallback: false,
        }
    }

    pub fn advanced() -> Self {
        Self {
            enable_fallback: true,
            ..Self::basic()
        }
    }
}

impl Default for TaggerOptions {
    fn default() -> Self {
        Self::basic()
    }
}

/// Language tagger: length guard, model call, failure mapping.
pub struct LanguageTagger {
    options: TaggerOptions,
    model: Box<dyn LanguageModel>,
}

impl LanguageTagger {
    pub fn new(options: TaggerOptions) -> Self {
        Self::with_model(options, Box::new(WhatlangModel))
    }

    pub fn with_model(options: TaggerOptions, model: Box<dyn LanguageModel>) -> Self {
        tracing::debug!(
            min_text_length = options.min_text_length,
            fallback = options.enable_fallback,
            "language tagger initialized"
        );
        Self { options, model }
    }

    pub fn options(&self) -> &TaggerOptions {
        &self.options
    }

    fn unknown(&self) -> LanguageTag {
        LanguageTag::new(self.options.default_language.clone(), 0.0)
    }

    /// Detect the language of one text. Never fails.
    pub fn detect(&self, text: &str) -> LanguageTag {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.options.min_text_length {
            return self.unknown();
        }

        match self.model.identify(trimmed) {
            Ok((code, confidence)) if SUPPORTED_LANGUAGES.contains(code.as_str()) => {
                LanguageTag::new(code, confidence)
            }
            Ok((code, _)) => {
                tracing::debug!("unsupported language '{}' detected", code);
                self.fallback(trimmed)
            }
            Err(e) => {
                tracing::debug!("language detection failed: {}", e);
                self.fallback(trimmed)
            }
        }
    }

    fn fallback(&self, text: &str) -> LanguageTag {
        if !self.options.enable_fallback {
            return self.unknown();
        }
        character_heuristic(text)
            .or_else(|| pattern_heuristic(text))
            .map(|code| LanguageTag::new(code, HEURISTIC_CONFIDENCE))
            .unwrap_or_else(|| self.unknown())
    }

    /// Detect a batch, preserving order.
    pub fn detect_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<LanguageTag> {
        tracing::info!("Batch detecting languages for {} texts", texts.len());
        texts.iter().map(|t| self.detect(t.as_ref())).collect()
    }
}

/// First character-set hint whose characters occur in `text`.
pub fn character_heuristic(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    CHARACTER_HINTS
        .iter()
        .find(|(chars, _)| chars.chars().any(|c| lower.contains(c)))
        .map(|(_, code)| *code)
}

/// Language of the first common function word among the first ten words.
pub fn pattern_heuristic(text: &str) -> Option<&'static str> {
    text.to_lowercase()
        .split_whitespace()
        .take(10)
        .find_map(|w| COMMON_WORDS.get(w).copied())
}

/// Family of an ISO 639-1 code, or `"unknown"`.
pub fn language_family(code: &str) -> &'static str {
    LANGUAGE_FAMILIES
        .iter()
        .find(|(_, members)| members.contains(&code))
        .map(|(family, _)| *family)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Per-language breakdown inside [`LanguageStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub count: usize,
    pub percentage: f64,
    pub average_confidence: f64,
}

/// Summary of a tagged dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageStats {
    pub total_documents: usize,
    pub unique_languages: usize,
    pub average_confidence: f64,
    pub distribution: BTreeMap<String, usize>,
    pub unknown_count: usize,
    pub unknown_percentage: f64,
    /// Ten most frequent languages, most frequent first.
    pub top_languages: Vec<(String, LanguageShare)>,
}

/// Aggregate tags into [`LanguageStats`]. Read-only.
pub fn language_stats(tags: &[LanguageTag], default_language: &str) -> LanguageStats {
    let total = tags.len();
    let pct = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 * 100.0 };

    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    let mut confidence_sums: HashMap<&str, f64> = HashMap::new();
    for tag in tags {
        *distribution.entry(tag.language.clone()).or_default() += 1;
        *confidence_sums.entry(tag.language.as_str()).or_default() += tag.confidence;
    }

    let mut ranked: Vec<(&String, &usize)> = distribution.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let top_languages = ranked
        .into_iter()
        .take(10)
        .map(|(lang, &count)| {
            let sum = confidence_sums.get(lang.as_str()).copied().unwrap_or(0.0);
            (
                lang.clone(),
                LanguageShare {
                    count,
                    percentage: pct(count),
                    average_confidence: sum / count as f64,
                },
            )
        })
        .collect();

    let unknown_count = distribution.get(default_language).copied().unwrap_or(0);
    let average_confidence = if total == 0 {
        0.0
    } else {
        tags.iter().map(|t| t.confidence).sum::<f64>() / total as f64
    };

    LanguageStats {
        total_documents: total,
        unique_languages: distribution.len(),
        average_confidence,
        unknown_count,
        unknown_percentage: pct(unknown_count),
        distribution,
        top_languages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingModel;

    impl LanguageModel for FailingModel {
        fn identify(&self, _text: &str) -> Result<(String, f64), DetectionError> {
            Err(DetectionError::NoFeatures)
        }
    }

    struct PanicModel;

    impl LanguageModel for PanicModel {
        fn identify(&self, _text: &str) -> Result<(String, f64), DetectionError> {
            panic!("short texts must not reach the model")
        }
    }

    #[test]
    fn short_text_is_unknown_without_model_call() {
        let tagger = LanguageTagger::with_model(TaggerOptions::advanced(), Box::new(PanicModel));
        for text in ["", "hi", "   short  ", "123456789"] {
            let tag = tagger.detect(text);
            assert_eq!(tag.language, "unknown");
            assert_eq!(tag.confidence, 0.0);
        }
    }

    #[test]
    fn detects_english_sentence() {
        let tagger = LanguageTagger::new(TaggerOptions::basic());
        let tag =
            tagger.detect("This platform is really helpful for connecting with friends and family.");
        assert_eq!(tag.language, "en");
        assert!(tag.confidence > 0.5, "confidence {}", tag.confidence);
    }

    #[test]
    fn short_informal_english() {
        let tagger = LanguageTagger::new(TaggerOptions::basic());
        let tag = tagger.detect("I wanna fuck you");
        assert_eq!(tag.language, "en");
        assert!(tag.confidence > 0.5, "confidence {}", tag.confidence);
    }

    #[test]
    fn function_words() {
        assert_eq!(function_word_guess("I wanna fuck you"), Some(("en", 0.75)));
        assert_eq!(function_word_guess("je ne sais pas").map(|g| g.0), Some("fr"));
        assert_eq!(function_word_guess("der Hund und die Katze").map(|g| g.0), Some("de"));
        assert_eq!(function_word_guess("loser"), None);
        assert_eq!(function_word_guess("123 !!!"), None);
    }

    #[test]
    fn detection_is_deterministic() {
        let tagger = LanguageTagger::new(TaggerOptions::basic());
        let text = "Je ne comprends pas pourquoi tu es si méchant avec moi";
        let first = tagger.detect(text);
        for _ in 0..5 {
            assert_eq!(tagger.detect(text), first);
        }
    }

    #[test]
    fn featureless_text_maps_to_unknown() {
        let tagger = LanguageTagger::new(TaggerOptions::basic());
        let tag = tagger.detect("1234567890 !!! ???");
        assert_eq!(tag.language, "unknown");
        assert_eq!(tag.confidence, 0.0);
    }

    #[test]
    fn fallback_only_when_enabled() {
        let text = "der Hund und die Katze";
        let basic = LanguageTagger::with_model(TaggerOptions::basic(), Box::new(FailingModel));
        assert_eq!(basic.detect(text).language, "unknown");

        let advanced = LanguageTagger::with_model(TaggerOptions::advanced(), Box::new(FailingModel));
        let tag = advanced.detect(text);
        assert_eq!(tag.language, "de");
        assert_eq!(tag.confidence, HEURISTIC_CONFIDENCE);
    }

    #[test]
    fn heuristics() {
        assert_eq!(character_heuristic("straße"), Some("de"));
        assert_eq!(character_heuristic("привет мир"), Some("ru"));
        assert_eq!(character_heuristic("plain ascii"), None);
        assert_eq!(pattern_heuristic("where is the cat"), Some("en"));
        assert_eq!(pattern_heuristic("le chat"), Some("fr"));
        assert_eq!(pattern_heuristic("zzz qqq"), None);
    }

    #[test]
    fn families() {
        assert_eq!(language_family("en"), "germanic");
        assert_eq!(language_family("fr"), "romance");
        assert_eq!(language_family("sw"), "unknown");
    }

    #[test]
    fn stats_aggregate() {
        let tags = vec![
            LanguageTag::new("en", 0.9),
            LanguageTag::new("en", 0.7),
            LanguageTag::new("fr", 0.8),
            LanguageTag::new("unknown", 0.0),
        ];
        let stats = language_stats(&tags, "unknown");
        assert_eq!(stats.total_documents, 4);
        assert_eq!(stats.unique_languages, 3);
        assert_eq!(stats.unknown_count, 1);
        assert!((stats.unknown_percentage - 25.0).abs() < 1e-9);
        assert!((stats.average_confidence - 0.6).abs() < 1e-9);
        assert_eq!(stats.top_languages[0].0, "en");
        assert_eq!(stats.top_languages[0].1.count, 2);
        assert!((stats.top_languages[0].1.average_confidence - 0.8).abs() < 1e-9);
    }
}
