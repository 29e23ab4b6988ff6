//! Rule-based noun lemmatizer for English.
//!
//! Follows the WordNet `morphy` noun rules (plural suffix detachment plus an
//! exception table) without a dictionary lookup, so it is conservative: a
//! word is only rewritten when a rule clearly applies. Every output is a
//! fixed point of [`lemmatize`].

use std::collections::HashMap;

use once_cell::sync::Lazy;

static IRREGULAR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("lice", "louse"),
        ("oxen", "ox"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("lives", "life"),
        ("wolves", "wolf"),
        ("leaves", "leaf"),
        ("halves", "half"),
        ("selves", "self"),
        ("thieves", "thief"),
        ("goes", "go"),
        ("heroes", "hero"),
        ("potatoes", "potato"),
        ("tomatoes", "tomato"),
        ("echoes", "echo"),
        ("data", "datum"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
    ]
    .into_iter()
    .collect()
});

/// Words that end in `s` but are not plurals.
const INVARIANT: &[&str] = &[
    "always", "perhaps", "sometimes", "news", "series", "species", "lens", "physics",
    "mathematics", "politics", "ethics", "economics", "thanks", "yes", "towards", "afterwards",
    "besides", "whereas", "gas", "bias", "alias", "atlas", "canvas", "chaos", "cosmos", "pants",
    "jeans", "scissors", "glasses", "clothes", "whats", "lots", "less", "unless", "christmas",
];

/// Lemmatize one lowercase token as a noun.
///
/// Rules are reapplied until the word stops changing, so a stripped stem
/// that is itself irregular (`mens` → `men` → `man`) is resolved too.
pub fn lemmatize(word: &str) -> String {
    let mut current = word.to_string();
    loop {
        let next = reduce(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One rule application.
fn reduce(word: &str) -> String {
    if let Some(lemma) = IRREGULAR.get(word) {
        return lemma.to_string();
    }
    if word.chars().count() <= 3 || INVARIANT.contains(&word) {
        return word.to_string();
    }

    for (suffix, replacement) in [
        ("sses", "ss"),
        ("zzes", "zz"),
        ("xes", "x"),
        ("ches", "ch"),
        ("shes", "sh"),
    ] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{}{}", stem, replacement);
        }
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().count() >= 2 {
            return format!("{}y", stem);
        }
    }

    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }

    match word.strip_suffix('s') {
        Some(stem) if stem.chars().count() >= 3 => stem.to_string(),
        _ => word.to_string(),
    }
}
