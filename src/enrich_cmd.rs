//! Dataset stage commands: `clean`, `preprocess`, `language`, `sentiment`,
//! `enrich` and `analyze`.
//!
//! Each stage reads a CSV, appends its columns and writes a new CSV. Schema
//! problems are detected before any output is written.

use anyhow::{Context, Result};
use harcelement_core::clean::{clean_table, label_stats};
use harcelement_core::enrich::{
    filter_by_language, language_summary, normalize_column, preprocess_summary, score_sentiment,
    sentiment_summary, tag_languages, Enricher, TextSource, ENSEMBLE_LABEL_COLUMN,
    ENSEMBLE_SCORE_COLUMN, PROCESSED_COLUMN,
};
use harcelement_core::language::{language_family, LanguageTagger, TaggerOptions};
use harcelement_core::normalize::Normalizer;
use harcelement_core::sentiment::{SentimentResult, SentimentScorer};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{Config, LanguageConfig, SentimentConfig};
use crate::dataset::{read_table, write_table};
use crate::progress::{ProgressReporter, StageEvent};
use crate::stats::{print_label_stats, print_language_stats, print_preprocess_stats, print_sentiment_stats};

/// Input and output CSV paths shared by every stage.
#[derive(Debug, Clone)]
pub struct StagePaths {
    pub input: PathBuf,
    pub output: PathBuf,
}

pub fn tagger_options(config: &LanguageConfig) -> TaggerOptions {
    TaggerOptions {
        min_text_length: config.min_text_length,
        default_language: config.default_language.clone(),
        enable_fallback: config.advanced && config.enable_fallback,
    }
}

pub fn build_scorer(config: &SentimentConfig) -> Result<SentimentScorer> {
    if config.advanced {
        SentimentScorer::with_thresholds(config.positive_threshold, config.negative_threshold)
    } else {
        Ok(SentimentScorer::new())
    }
}

pub fn run_clean(
    paths: &StagePaths,
    label_column: &str,
    type_column: Option<&str>,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let table = read_table(&paths.input)?;
    progress.report(StageEvent::started("clean", table.row_count()));

    let cleaned = clean_table(&table, label_column, type_column)
        .context("Failed to clean labels")?;
    write_table(&cleaned, &paths.output)?;
    progress.report(StageEvent::finished("clean", cleaned.row_count()));

    println!("clean: {} rows → {}", cleaned.row_count(), paths.output.display());
    print_label_stats(&label_stats(&cleaned)?);
    Ok(())
}

pub fn run_preprocess(
    config: &Config,
    paths: &StagePaths,
    source: &TextSource,
    output_column: &str,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let normalizer = Normalizer::new(config.preprocess.options()?);
    let table = read_table(&paths.input)?;
    progress.report(StageEvent::started("preprocess", table.row_count()));

    let processed = normalize_column(&table, source, output_column, &normalizer)
        .context("Failed to preprocess text")?;
    write_table(&processed, &paths.output)?;
    progress.report(StageEvent::finished("preprocess", processed.row_count()));

    println!(
        "preprocess: {} rows → {}",
        processed.row_count(),
        paths.output.display()
    );
    print_preprocess_stats(&preprocess_summary(&processed, &source.column, output_column)?);
    Ok(())
}

pub fn run_language(
    config: &Config,
    paths: &StagePaths,
    source: &TextSource,
    keep_languages: &[String],
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let tagger = LanguageTagger::new(tagger_options(&config.language));
    let table = read_table(&paths.input)?;
    progress.report(StageEvent::started("language", table.row_count()));

    let mut tagged = tag_languages(&table, source, &tagger).context("Failed to tag languages")?;
    if !keep_languages.is_empty() {
        let wanted: Vec<&str> = keep_languages.iter().map(String::as_str).collect();
        tagged = filter_by_language(&tagged, &wanted)?;
    }
    write_table(&tagged, &paths.output)?;
    progress.report(StageEvent::finished("language", tagged.row_count()));

    println!("language: {} rows → {}", tagged.row_count(), paths.output.display());
    print_language_stats(&language_summary(&tagged, &config.language.default_language)?);
    Ok(())
}

pub fn run_sentiment(
    config: &Config,
    paths: &StagePaths,
    source: &TextSource,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let scorer = build_scorer(&config.sentiment)?;
    let table = read_table(&paths.input)?;
    progress.report(StageEvent::started("sentiment", table.row_count()));

    let scored = score_sentiment(&table, source, &scorer).context("Failed to score sentiment")?;
    write_table(&scored, &paths.output)?;
    progress.report(StageEvent::finished("sentiment", scored.row_count()));

    println!("sentiment: {} rows → {}", scored.row_count(), paths.output.display());
    print_sentiment_stats(&sentiment_summary(
        &scored,
        ENSEMBLE_SCORE_COLUMN,
        ENSEMBLE_LABEL_COLUMN,
    )?);
    Ok(())
}

/// Normalize, tag and score in one pass. `analysis` names the column the
/// tagger and scorer read; `None` means the raw text column.
pub fn run_enrich(
    config: &Config,
    paths: &StagePaths,
    raw: &TextSource,
    analysis: Option<&TextSource>,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let enricher = Enricher {
        normalizer: Normalizer::new(config.preprocess.options()?),
        tagger: LanguageTagger::new(tagger_options(&config.language)),
        scorer: build_scorer(&config.sentiment)?,
    };
    let table = read_table(&paths.input)?;
    progress.report(StageEvent::started("enrich", table.row_count()));

    let enriched = enricher
        .run(&table, raw, analysis.unwrap_or(raw))
        .context("Failed to enrich dataset")?;
    write_table(&enriched, &paths.output)?;
    progress.report(StageEvent::finished("enrich", enriched.row_count()));

    println!(
        "enrich: {} rows, {} columns → {}",
        enriched.row_count(),
        enriched.column_count(),
        paths.output.display()
    );
    print_preprocess_stats(&preprocess_summary(&enriched, &raw.column, PROCESSED_COLUMN)?);
    print_language_stats(&language_summary(&enriched, &config.language.default_language)?);
    print_sentiment_stats(&sentiment_summary(
        &enriched,
        ENSEMBLE_SCORE_COLUMN,
        ENSEMBLE_LABEL_COLUMN,
    )?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct Analysis {
    text: String,
    normalized: String,
    language: String,
    language_confidence: f64,
    language_family: &'static str,
    sentiment: SentimentResult,
}

/// Analyze single texts given inline or one per line in a file.
pub fn run_analyze(config: &Config, texts: &[String], file: Option<&Path>, json: bool) -> Result<()> {
    let mut inputs: Vec<String> = texts.to_vec();
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read text file: {}", path.display()))?;
        inputs.extend(
            content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string),
        );
    }
    if inputs.is_empty() {
        anyhow::bail!("Nothing to analyze: pass --text or --file");
    }

    let normalizer = Normalizer::new(config.preprocess.options()?);
    let tagger = LanguageTagger::new(tagger_options(&config.language));
    let scorer = build_scorer(&config.sentiment)?;

    for text in inputs {
        let tag = tagger.detect(&text);
        let analysis = Analysis {
            normalized: normalizer.normalize(&text),
            language_family: language_family(&tag.language),
            language: tag.language,
            language_confidence: tag.confidence,
            sentiment: scorer.analyze(&text),
            text,
        };

        if json {
            println!("{}", serde_json::to_string(&analysis)?);
            continue;
        }

        let s = &analysis.sentiment;
        println!("text:        {}", analysis.text);
        println!("normalized:  {}", analysis.normalized);
        println!(
            "language:    {} ({:.3}, {})",
            analysis.language, analysis.language_confidence, analysis.language_family
        );
        println!(
            "vader:       {:+.4} {} (pos {:.3}, neg {:.3}, neu {:.3})",
            s.vader.compound, s.vader_label, s.vader.positive, s.vader.negative, s.vader.neutral
        );
        println!(
            "pattern:     {:+.4} {} (subjectivity {:.3})",
            s.textblob.polarity, s.textblob.label, s.textblob.subjectivity
        );
        println!(
            "ensemble:    {:+.4} {} (confidence {:.3})",
            s.ensemble_score, s.ensemble_label, s.confidence
        );
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_only_in_advanced_mode() {
        let mut config = LanguageConfig::default();
        assert!(!tagger_options(&config).enable_fallback);
        config.advanced = true;
        assert!(tagger_options(&config).enable_fallback);
        config.enable_fallback = false;
        assert!(!tagger_options(&config).enable_fallback);
    }

    #[test]
    fn thresholds_only_in_advanced_mode() {
        let mut config = SentimentConfig {
            positive_threshold: 0.5,
            negative_threshold: -0.5,
            ..SentimentConfig::default()
        };
        assert_eq!(build_scorer(&config).unwrap().polarity_thresholds().positive, 0.1);
        config.advanced = true;
        assert_eq!(build_scorer(&config).unwrap().polarity_thresholds().positive, 0.5);
    }
}
