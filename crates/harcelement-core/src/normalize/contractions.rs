//! English contraction and informal-form expansion.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const CONTRACTIONS: &[(&str, &str)] = &[
    ("ain't", "are not"),
    ("aren't", "are not"),
    ("can't", "cannot"),
    ("could've", "could have"),
    ("couldn't", "could not"),
    ("didn't", "did not"),
    ("doesn't", "does not"),
    ("don't", "do not"),
    ("hadn't", "had not"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("he'd", "he would"),
    ("he'll", "he will"),
    ("he's", "he is"),
    ("how'd", "how did"),
    ("how's", "how is"),
    ("i'd", "i would"),
    ("i'll", "i will"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("isn't", "is not"),
    ("it'd", "it would"),
    ("it'll", "it will"),
    ("it's", "it is"),
    ("let's", "let us"),
    ("might've", "might have"),
    ("mightn't", "might not"),
    ("must've", "must have"),
    ("mustn't", "must not"),
    ("needn't", "need not"),
    ("shan't", "shall not"),
    ("she'd", "she would"),
    ("she'll", "she will"),
    ("she's", "she is"),
    ("should've", "should have"),
    ("shouldn't", "should not"),
    ("that's", "that is"),
    ("there's", "there is"),
    ("they'd", "they would"),
    ("they'll", "they will"),
    ("they're", "they are"),
    ("they've", "they have"),
    ("wasn't", "was not"),
    ("we'd", "we would"),
    ("we'll", "we will"),
    ("we're", "we are"),
    ("we've", "we have"),
    ("weren't", "were not"),
    ("what's", "what is"),
    ("what're", "what are"),
    ("where's", "where is"),
    ("who's", "who is"),
    ("who'll", "who will"),
    ("who've", "who have"),
    ("won't", "will not"),
    ("would've", "would have"),
    ("wouldn't", "would not"),
    ("y'all", "you all"),
    ("you'd", "you would"),
    ("you'll", "you will"),
    ("you're", "you are"),
    ("you've", "you have"),
    // informal forms
    ("wanna", "want to"),
    ("gonna", "going to"),
    ("gotta", "got to"),
    ("gimme", "give me"),
    ("lemme", "let me"),
    ("kinda", "kind of"),
    ("sorta", "sort of"),
    ("dunno", "do not know"),
    ("ya", "you"),
    ("u", "you"),
    ("ur", "your"),
];

static TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| CONTRACTIONS.iter().copied().collect());

static PATTERN: Lazy<Regex> = Lazy::new(|| {
    let mut keys: Vec<&str> = CONTRACTIONS.iter().map(|(k, _)| *k).collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
    let alternation = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{})\b", alternation)).expect("contraction pattern is valid")
});

/// Expand contractions in lowercase text. Curly apostrophes are treated as
/// straight ones.
pub fn expand(text: &str) -> String {
    let text = text.replace(['\u{2019}', '\u{2018}'], "'");
    PATTERN
        .replace_all(&text, |caps: &Captures| {
            let matched = &caps[0];
            TABLE.get(matched).copied().unwrap_or(matched).to_string()
        })
        .into_owned()
}
