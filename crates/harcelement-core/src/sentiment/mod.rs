//! Sentiment scoring: VADER, a pattern lexicon, and their ensemble.
//!
//! Three independent outputs per text:
//!
//! | Model | Scores | Label rule |
//! |-------|--------|------------|
//! | VADER | compound ∈ [-1, 1], pos/neg/neu ∈ [0, 1] | `>= 0.05` / `<= -0.05` |
//! | Pattern ([`pattern`]) | polarity ∈ [-1, 1], subjectivity ∈ [0, 1] | `> 0.1` / `< -0.1` (adjustable) |
//! | Ensemble | `0.7 * compound + 0.3 * polarity` | `>= 0.05` / `<= -0.05` |
//!
//! Empty text and model failures both yield the neutral defaults; scoring
//! never returns an error.

pub mod pattern;

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use vader_sentiment::SentimentIntensityAnalyzer;

pub const VADER_WEIGHT: f64 = 0.7;
pub const POLARITY_WEIGHT: f64 = 0.3;

static VADER: Lazy<SentimentIntensityAnalyzer> = Lazy::new(SentimentIntensityAnalyzer::new);

/// Three-way sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cutoffs separating positive, neutral and negative scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub positive: f64,
    pub negative: f64,
}

impl Thresholds {
    /// VADER and ensemble cutoffs.
    pub const COMPOUND: Thresholds = Thresholds {
        positive: 0.05,
        negative: -0.05,
    };

    /// Default pattern-polarity cutoffs.
    pub const POLARITY: Thresholds = Thresholds {
        positive: 0.1,
        negative: -0.1,
    };

    pub fn new(positive: f64, negative: f64) -> Result<Self> {
        if !positive.is_finite() || !negative.is_finite() {
            bail!("sentiment thresholds must be finite numbers");
        }
        if positive < negative {
            bail!(
                "positive threshold ({}) must not be below negative threshold ({})",
                positive,
                negative
            );
        }
        Ok(Self { positive, negative })
    }

    /// Label with inclusive cutoffs (`>=` / `<=`).
    pub fn label_inclusive(&self, score: f64) -> SentimentLabel {
        if score >= self.positive {
            SentimentLabel::Positive
        } else if score <= self.negative {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Label with strict cutoffs (`>` / `<`).
    pub fn label_strict(&self, score: f64) -> SentimentLabel {
        if score > self.positive {
            SentimentLabel::Positive
        } else if score < self.negative {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// VADER output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VaderScores {
    pub compound: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl Default for VaderScores {
    fn default() -> Self {
        Self {
            compound: 0.0,
            positive: 0.0,
            negative: 0.0,
            neutral: 1.0,
        }
    }
}

impl VaderScores {
    pub fn label(&self) -> SentimentLabel {
        Thresholds::COMPOUND.label_inclusive(self.compound)
    }
}

/// Pattern-lexicon output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolarityScores {
    pub polarity: f64,
    pub subjectivity: f64,
    pub label: SentimentLabel,
}

impl Default for PolarityScores {
    fn default() -> Self {
        Self {
            polarity: 0.0,
            subjectivity: 0.0,
            label: SentimentLabel::Neutral,
        }
    }
}

/// All sentiment outputs for one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentResult {
    pub vader: VaderScores,
    pub vader_label: SentimentLabel,
    pub textblob: PolarityScores,
    pub ensemble_score: f64,
    pub ensemble_label: SentimentLabel,
    pub confidence: f64,
}

/// Weighted ensemble of the two polarity scores.
pub fn ensemble_score(compound: f64, polarity: f64) -> f64 {
    VADER_WEIGHT * compound + POLARITY_WEIGHT * polarity
}

/// Scores texts with both models and combines them.
#[derive(Debug, Clone)]
pub struct SentimentScorer {
    polarity_thresholds: Thresholds,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer {
    pub fn new() -> Self {
        tracing::debug!("sentiment scorer initialized with VADER and pattern models");
        Self {
            polarity_thresholds: Thresholds::POLARITY,
        }
    }

    /// Scorer with custom polarity cutoffs.
    pub fn with_thresholds(positive: f64, negative: f64) -> Result<Self> {
        let mut scorer = Self::new();
        scorer.set_custom_thresholds(positive, negative)?;
        Ok(scorer)
    }

    /// Replace the polarity label cutoffs.
    pub fn set_custom_thresholds(&mut self, positive: f64, negative: f64) -> Result<()> {
        self.polarity_thresholds = Thresholds::new(positive, negative)?;
        tracing::info!(
            "Custom thresholds set: positive={}, negative={}",
            positive,
            negative
        );
        Ok(())
    }

    pub fn polarity_thresholds(&self) -> Thresholds {
        self.polarity_thresholds
    }

    /// VADER scores; defaults for empty text or a model failure.
    pub fn vader(&self, text: &str) -> VaderScores {
        if text.trim().is_empty() {
            return VaderScores::default();
        }
        let scores = match catch_unwind(AssertUnwindSafe(|| VADER.polarity_scores(text))) {
            Ok(scores) => scores,
            Err(_) => {
                tracing::warn!("VADER sentiment analysis failed; using neutral defaults");
                return VaderScores::default();
            }
        };
        let get = |key: &str| scores.get(key).copied().unwrap_or(0.0);
        VaderScores {
            compound: get("compound").clamp(-1.0, 1.0),
            positive: get("pos"),
            negative: get("neg"),
            neutral: get("neu"),
        }
    }

    /// Pattern polarity and subjectivity with the configured label cutoffs.
    pub fn polarity(&self, text: &str) -> PolarityScores {
        if text.trim().is_empty() {
            return PolarityScores::default();
        }
        match catch_unwind(|| pattern::polarity_subjectivity(text)) {
            Ok((polarity, subjectivity)) => PolarityScores {
                polarity,
                subjectivity,
                label: self.polarity_thresholds.label_strict(polarity),
            },
            Err(_) => {
                tracing::warn!("pattern sentiment analysis failed; using neutral defaults");
                PolarityScores::default()
            }
        }
    }

    /// Every output for one text.
    pub fn analyze(&self, text: &str) -> SentimentResult {
        let vader = self.vader(text);
        let textblob = self.polarity(text);
        let score = ensemble_score(vader.compound, textblob.polarity);
        SentimentResult {
            vader,
            vader_label: vader.label(),
            textblob,
            ensemble_score: score,
            ensemble_label: Thresholds::COMPOUND.label_inclusive(score),
            confidence: score.abs().clamp(0.0, 1.0),
        }
    }
}

/// Summary of a score column and, optionally, its labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentStats {
    pub count: usize,
    pub mean_score: f64,
    pub median_score: f64,
    /// Sample standard deviation; 0.0 with fewer than two scores.
    pub std_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub distribution: BTreeMap<SentimentLabel, usize>,
    pub percentages: BTreeMap<SentimentLabel, f64>,
    /// Share of neutral labels, in percent.
    pub neutral_rate: f64,
}

/// Aggregate scores and labels. Read-only.
pub fn sentiment_stats(scores: &[f64], labels: &[SentimentLabel]) -> SentimentStats {
    let n = scores.len();
    let mean = if n == 0 {
        0.0
    } else {
        scores.iter().sum::<f64>() / n as f64
    };

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    };
    let std = if n < 2 {
        0.0
    } else {
        (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    };

    let mut distribution: BTreeMap<SentimentLabel, usize> = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ]
    .into_iter()
    .map(|l| (l, 0))
    .collect();
    for label in labels {
        *distribution.entry(*label).or_default() += 1;
    }
    let total = labels.len();
    let percentages: BTreeMap<SentimentLabel, f64> = distribution
        .iter()
        .map(|(label, count)| {
            let pct = if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64 * 100.0
            };
            (*label, pct)
        })
        .collect();
    let neutral_rate = percentages
        .get(&SentimentLabel::Neutral)
        .copied()
        .unwrap_or(0.0);

    SentimentStats {
        count: n,
        mean_score: mean,
        median_score: median,
        std_score: std,
        min_score: sorted.first().copied().unwrap_or(0.0),
        max_score: sorted.last().copied().unwrap_or(0.0),
        distribution,
        percentages,
        neutral_rate,
    }
}
