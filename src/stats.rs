//! Dataset statistics.
//!
//! `harc stats` prints whichever summaries the file supports: label
//! distribution, language statistics, ensemble sentiment statistics and
//! normalization statistics. The `print_*` helpers are also used by the
//! stage commands for their end-of-stage summaries.

use anyhow::Result;
use harcelement_core::clean::{label_stats, LabelStats, LABEL_COLUMN};
use harcelement_core::enrich::{
    language_summary, preprocess_summary, sentiment_summary, ENSEMBLE_LABEL_COLUMN,
    ENSEMBLE_SCORE_COLUMN, LANGUAGE_COLUMN, PROCESSED_COLUMN, TEXT_COLUMN,
};
use harcelement_core::language::LanguageStats;
use harcelement_core::normalize::NormalizeStats;
use harcelement_core::sentiment::SentimentStats;
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::dataset::read_table;

/// Every summary the dataset supports.
#[derive(Debug, Serialize)]
pub struct DatasetStats {
    pub rows: usize,
    pub columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<LabelStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<LanguageStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocessing: Option<NormalizeStats>,
}

pub fn collect_stats(config: &Config, input: &Path) -> Result<DatasetStats> {
    let table = read_table(input)?;

    let labels = if table.has_column(LABEL_COLUMN) {
        Some(label_stats(&table)?)
    } else {
        None
    };
    let languages = if table.has_column(LANGUAGE_COLUMN) {
        Some(language_summary(&table, &config.language.default_language)?)
    } else {
        None
    };
    let sentiment = if table.has_column(ENSEMBLE_SCORE_COLUMN) && table.has_column(ENSEMBLE_LABEL_COLUMN) {
        Some(sentiment_summary(&table, ENSEMBLE_SCORE_COLUMN, ENSEMBLE_LABEL_COLUMN)?)
    } else {
        None
    };
    let preprocessing = if table.has_column(TEXT_COLUMN) && table.has_column(PROCESSED_COLUMN) {
        Some(preprocess_summary(&table, TEXT_COLUMN, PROCESSED_COLUMN)?)
    } else {
        None
    };

    Ok(DatasetStats {
        rows: table.row_count(),
        columns: table.column_count(),
        labels,
        languages,
        sentiment,
        preprocessing,
    })
}

/// Run the stats command and print a summary.
pub fn run_stats(config: &Config, input: &Path, json: bool) -> Result<()> {
    let stats = collect_stats(config, input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("harcelement — Dataset Stats");
    println!("===========================");
    println!();
    println!("  Dataset:     {}", input.display());
    println!("  Rows:        {}", stats.rows);
    println!("  Columns:     {}", stats.columns);

    let mut any = false;
    if let Some(labels) = &stats.labels {
        print_label_stats(labels);
        any = true;
    }
    if let Some(pre) = &stats.preprocessing {
        print_preprocess_stats(pre);
        any = true;
    }
    if let Some(languages) = &stats.languages {
        print_language_stats(languages);
        any = true;
    }
    if let Some(sentiment) = &stats.sentiment {
        print_sentiment_stats(sentiment);
        any = true;
    }
    if !any {
        println!();
        println!("  No label, language or sentiment columns found.");
    }
    println!();
    Ok(())
}

pub fn print_label_stats(stats: &LabelStats) {
    println!();
    println!("  Labels:");
    for (label, count) in &stats.labels {
        println!("    {:<16} {:>8}", label, count);
    }
    if stats.unlabeled > 0 {
        println!("    {:<16} {:>8}", "(unrecognized)", stats.unlabeled);
    }
    println!("    bullying rate    {:>7.1}%", stats.bullying_rate);
    if !stats.types.is_empty() {
        println!("  Types:");
        for (kind, count) in &stats.types {
            println!("    {:<16} {:>8}", kind, count);
        }
    }
}

pub fn print_preprocess_stats(stats: &NormalizeStats) {
    println!();
    println!("  Preprocessing:");
    println!(
        "    non-empty        {} → {} of {}",
        stats.original_non_empty, stats.processed_non_empty, stats.total_texts
    );
    println!(
        "    average length   {:.1} → {:.1} ({:.1}% shorter)",
        stats.average_length_original, stats.average_length_processed, stats.reduction_rate
    );
}

pub fn print_language_stats(stats: &LanguageStats) {
    println!();
    println!(
        "  Languages: {} unique, mean confidence {:.3}, unknown {} ({:.1}%)",
        stats.unique_languages,
        stats.average_confidence,
        stats.unknown_count,
        stats.unknown_percentage
    );
    println!("    {:<10} {:>8} {:>8} {:>10}", "LANGUAGE", "COUNT", "SHARE", "CONFIDENCE");
    for (language, share) in &stats.top_languages {
        println!(
            "    {:<10} {:>8} {:>7.1}% {:>10.3}",
            language, share.count, share.percentage, share.average_confidence
        );
    }
}

pub fn print_sentiment_stats(stats: &SentimentStats) {
    println!();
    println!(
        "  Sentiment: mean {:+.4}, median {:+.4}, std {:.4}, range [{:+.4}, {:+.4}]",
        stats.mean_score, stats.median_score, stats.std_score, stats.min_score, stats.max_score
    );
    for (label, count) in &stats.distribution {
        let pct = stats.percentages.get(label).copied().unwrap_or(0.0);
        println!("    {:<10} {:>8} {:>7.1}%", label.as_str(), count, pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn collects_available_sections_only() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("labels.csv");
        fs::write(&path, "Text,Label,Types\nhi,Not-Bullying,\nloser,Bullying,Age\n").unwrap();

        let stats = collect_stats(&Config::default(), &path).unwrap();
        assert_eq!(stats.rows, 2);
        let labels = stats.labels.unwrap();
        assert_eq!(labels.labels["Bullying"], 1);
        assert!(stats.languages.is_none());
        assert!(stats.sentiment.is_none());
        assert!(stats.preprocessing.is_none());
    }
}
