//! Pattern-style lexicon sentiment (polarity and subjectivity).
//!
//! Each known word carries a polarity in `[-1, 1]` and a subjectivity in
//! `[0, 1]`. Intensifiers scale the next assessed word, a negation in front
//! of it multiplies polarity by `-0.5`, and the text's scores are the means
//! over all assessed words. Text with no known words scores `(0.0, 0.0)`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// `(word, polarity, subjectivity)`
const LEXICON: &[(&str, f64, f64)] = &[
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("nice", 0.6, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("awesome", 1.0, 1.0),
    ("amazing", 0.6, 0.9),
    ("wonderful", 1.0, 1.0),
    ("excellent", 1.0, 1.0),
    ("fantastic", 0.4, 0.9),
    ("perfect", 1.0, 1.0),
    ("beautiful", 0.85, 1.0),
    ("pretty", 0.25, 1.0),
    ("lovely", 0.5, 0.75),
    ("love", 0.5, 0.6),
    ("loved", 0.7, 0.8),
    ("like", 0.0, 0.0),
    ("happy", 0.8, 1.0),
    ("glad", 0.5, 1.0),
    ("fun", 0.3, 0.2),
    ("funny", 0.25, 1.0),
    ("cool", 0.35, 0.65),
    ("kind", 0.6, 0.9),
    ("helpful", 0.5, 0.5),
    ("delightful", 1.0, 1.0),
    ("brilliant", 0.9, 1.0),
    ("smart", 0.21, 0.64),
    ("clever", 0.5, 1.0),
    ("friendly", 0.375, 0.5),
    ("sweet", 0.35, 0.65),
    ("cute", 0.5, 1.0),
    ("strong", 0.43, 0.73),
    ("brave", 0.8, 1.0),
    ("proud", 0.8, 1.0),
    ("safe", 0.5, 0.5),
    ("fine", 0.42, 0.5),
    ("right", 0.29, 0.54),
    ("true", 0.35, 0.65),
    ("correct", 0.0, 0.0),
    ("interesting", 0.5, 0.5),
    ("exciting", 0.3, 0.8),
    ("thankful", 0.6, 0.8),
    ("grateful", 0.6, 0.9),
    ("welcome", 0.8, 0.9),
    ("calm", 0.3, 0.75),
    ("positive", 0.23, 0.55),
    ("surprise", 0.2, 0.8),
    ("bad", -0.7, 0.67),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("terrible", -1.0, 1.0),
    ("horrible", -1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("disgusting", -1.0, 1.0),
    ("nasty", -1.0, 1.0),
    ("hate", -0.8, 0.9),
    ("hated", -0.9, 0.7),
    ("hateful", -0.8, 0.9),
    ("despise", -0.7, 0.8),
    ("stupid", -0.8, 1.0),
    ("dumb", -0.375, 0.5),
    ("idiot", -0.8, 1.0),
    ("idiotic", -0.8, 1.0),
    ("moron", -0.8, 1.0),
    ("silly", -0.5, 0.9),
    ("ridiculous", -0.33, 1.0),
    ("pathetic", -1.0, 1.0),
    ("ugly", -0.7, 1.0),
    ("fat", 0.0, 0.0),
    ("gross", -0.35, 0.75),
    ("weird", -0.5, 1.0),
    ("annoying", -0.8, 0.9),
    ("boring", -1.0, 1.0),
    ("lame", -0.5, 0.75),
    ("useless", -0.5, 0.2),
    ("worthless", -0.8, 0.9),
    ("loser", -0.6, 0.8),
    ("sad", -0.5, 1.0),
    ("angry", -0.5, 1.0),
    ("mad", -0.625, 1.0),
    ("crazy", -0.6, 0.9),
    ("sick", -0.71, 0.86),
    ("dead", -0.2, 0.4),
    ("evil", -1.0, 1.0),
    ("cruel", -1.0, 1.0),
    ("mean", -0.31, 0.69),
    ("rude", -0.3, 0.6),
    ("shameful", -0.7, 0.9),
    ("embarrassing", -0.6, 0.9),
    ("wrong", -0.5, 0.9),
    ("poor", -0.4, 0.6),
    ("weak", -0.375, 0.625),
    ("scary", -0.5, 1.0),
    ("afraid", -0.6, 0.9),
    ("lonely", -0.25, 0.75),
    ("hurt", -0.5, 0.8),
    ("painful", -0.7, 0.9),
    ("dirty", -0.6, 0.8),
    ("fake", -0.5, 1.0),
    ("jealous", -0.3, 0.8),
    ("negative", -0.3, 0.4),
    ("toxic", -0.6, 0.8),
    ("damn", -0.5, 0.7),
    ("freaking", -0.3, 0.6),
    ("bloody", -0.8, 0.7),
];

/// Adverbs that scale the next assessed word.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.2),
    ("so", 1.3),
    ("too", 1.3),
    ("extremely", 1.5),
    ("absolutely", 1.5),
    ("totally", 1.4),
    ("incredibly", 1.5),
    ("super", 1.3),
    ("quite", 1.1),
    ("most", 1.3),
    ("somewhat", 0.7),
    ("slightly", 0.5),
    ("barely", 0.4),
];

const NEGATIONS: &[&str] = &["not", "never", "no", "nothing", "nobody", "neither", "nor", "cannot"];

static WORDS: Lazy<HashMap<&'static str, (f64, f64)>> =
    Lazy::new(|| LEXICON.iter().map(|(w, p, s)| (*w, (*p, *s))).collect());

static MODIFIERS: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| INTENSIFIERS.iter().copied().collect());

/// Polarity in `[-1, 1]` and subjectivity in `[0, 1]` for `text`.
pub fn polarity_subjectivity(text: &str) -> (f64, f64) {
    let lower = text.to_lowercase().replace("n't", " not");
    let tokens = lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty());

    let mut assessments: Vec<(f64, f64)> = Vec::new();
    let mut negated = false;
    let mut intensity = 1.0;

    for token in tokens {
        if NEGATIONS.contains(&token) {
            negated = true;
            continue;
        }
        if let Some(m) = MODIFIERS.get(token) {
            intensity *= m;
            continue;
        }
        if let Some(&(polarity, subjectivity)) = WORDS.get(token) {
            let mut p = polarity * intensity;
            if negated {
                p *= -0.5;
            }
            assessments.push((p, subjectivity * intensity));
            negated = false;
            intensity = 1.0;
        }
    }

    if assessments.is_empty() {
        return (0.0, 0.0);
    }
    let n = assessments.len() as f64;
    let polarity = assessments.iter().map(|a| a.0).sum::<f64>() / n;
    let subjectivity = assessments.iter().map(|a| a.1).sum::<f64>() / n;
    (polarity.clamp(-1.0, 1.0), subjectivity.clamp(0.0, 1.0))
}
