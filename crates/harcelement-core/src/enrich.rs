//! Row-wise enrichment of a [`Table`].
//!
//! Each stage reads one text per row through a [`TextSource`], runs a
//! model, and returns a copy of the input with its result columns appended.
//! Output column names are checked before any row is processed, so a
//! schema error leaves nothing half-written.

use std::collections::BTreeSet;

use crate::error::SchemaError;
use crate::language::{language_stats, LanguageStats, LanguageTag, LanguageTagger};
use crate::normalize::{normalize_stats, NormalizeStats, Normalizer};
use crate::sentiment::{sentiment_stats, SentimentLabel, SentimentScorer, SentimentStats};
use crate::table::{Cell, Column, Table};

pub const TEXT_COLUMN: &str = "Text";
pub const PROCESSED_COLUMN: &str = "Text_processed";
pub const LANGUAGE_COLUMN: &str = "Language";
pub const LANGUAGE_CONFIDENCE_COLUMN: &str = "Language_Confidence";

pub const VADER_SCORE_COLUMN: &str = "Sentiment_VADER_Score";
pub const VADER_LABEL_COLUMN: &str = "Sentiment_VADER_Label";
pub const VADER_POSITIVE_COLUMN: &str = "Sentiment_VADER_Positive";
pub const VADER_NEGATIVE_COLUMN: &str = "Sentiment_VADER_Negative";
pub const VADER_NEUTRAL_COLUMN: &str = "Sentiment_VADER_Neutral";
pub const POLARITY_COLUMN: &str = "Sentiment_TextBlob_Polarity";
pub const SUBJECTIVITY_COLUMN: &str = "Sentiment_TextBlob_Subjectivity";
pub const POLARITY_LABEL_COLUMN: &str = "Sentiment_TextBlob_Label";
pub const ENSEMBLE_SCORE_COLUMN: &str = "Sentiment_Ensemble_Score";
pub const ENSEMBLE_LABEL_COLUMN: &str = "Sentiment_Ensemble_Label";
pub const CONFIDENCE_COLUMN: &str = "Sentiment_Confidence";

/// The eleven sentiment columns, in output order.
pub const SENTIMENT_COLUMNS: [&str; 11] = [
    VADER_SCORE_COLUMN,
    VADER_LABEL_COLUMN,
    VADER_POSITIVE_COLUMN,
    VADER_NEGATIVE_COLUMN,
    VADER_NEUTRAL_COLUMN,
    POLARITY_COLUMN,
    SUBJECTIVITY_COLUMN,
    POLARITY_LABEL_COLUMN,
    ENSEMBLE_SCORE_COLUMN,
    ENSEMBLE_LABEL_COLUMN,
    CONFIDENCE_COLUMN,
];

/// Where a stage reads its text from.
///
/// When the primary cell is empty and a fallback column is set, the
/// fallback cell is used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSource {
    pub column: String,
    pub fallback: Option<String>,
}

impl Default for TextSource {
    fn default() -> Self {
        Self::new(TEXT_COLUMN)
    }
}

impl TextSource {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// One text per row. Null cells read as empty text.
    pub fn texts(&self, table: &Table) -> Result<Vec<String>, SchemaError> {
        let primary = table.require_column(&self.column)?;
        let fallback = self
            .fallback
            .as_deref()
            .map(|name| table.require_column(name))
            .transpose()?;

        Ok(primary
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let text = cell_text(cell);
                match fallback {
                    Some(fb) if text.trim().is_empty() => cell_text(&fb.cells[i]),
                    _ => text,
                }
            })
            .collect())
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        other => other.render(),
    }
}

fn text_cell(text: String) -> Cell {
    if text.is_empty() {
        Cell::Null
    } else {
        Cell::Text(text)
    }
}

/// Append the normalized form of `source` as `output`.
pub fn normalize_column(
    table: &Table,
    source: &TextSource,
    output: &str,
    normalizer: &Normalizer,
) -> Result<Table, SchemaError> {
    table.ensure_absent(&[output])?;
    let texts = source.texts(table)?;
    let processed = normalizer.normalize_batch(&texts);

    let mut out = table.clone();
    out.append_column(Column::new(
        output,
        processed.into_iter().map(text_cell).collect(),
    ))?;
    Ok(out)
}

/// Append `Language` and `Language_Confidence`.
pub fn tag_languages(
    table: &Table,
    source: &TextSource,
    tagger: &LanguageTagger,
) -> Result<Table, SchemaError> {
    table.ensure_absent(&[LANGUAGE_COLUMN, LANGUAGE_CONFIDENCE_COLUMN])?;
    let texts = source.texts(table)?;
    let tags = tagger.detect_batch(&texts);

    let mut languages = Vec::with_capacity(tags.len());
    let mut confidences = Vec::with_capacity(tags.len());
    for tag in tags {
        confidences.push(Cell::Float(tag.confidence));
        languages.push(Cell::Text(tag.language));
    }

    let mut out = table.clone();
    out.append_column(Column::new(LANGUAGE_COLUMN, languages))?;
    out.append_column(Column::new(LANGUAGE_CONFIDENCE_COLUMN, confidences))?;
    Ok(out)
}

/// Append the eleven sentiment columns in one pass.
pub fn score_sentiment(
    table: &Table,
    source: &TextSource,
    scorer: &SentimentScorer,
) -> Result<Table, SchemaError> {
    table.ensure_absent(&SENTIMENT_COLUMNS)?;
    let texts = source.texts(table)?;
    tracing::info!("Scoring sentiment for {} texts", texts.len());

    let mut columns: Vec<Vec<Cell>> = (0..SENTIMENT_COLUMNS.len())
        .map(|_| Vec::with_capacity(texts.len()))
        .collect();
    for text in &texts {
        let r = scorer.analyze(text);
        let row = [
            Cell::Float(r.vader.compound),
            Cell::from(r.vader_label.as_str()),
            Cell::Float(r.vader.positive),
            Cell::Float(r.vader.negative),
            Cell::Float(r.vader.neutral),
            Cell::Float(r.textblob.polarity),
            Cell::Float(r.textblob.subjectivity),
            Cell::from(r.textblob.label.as_str()),
            Cell::Float(r.ensemble_score),
            Cell::from(r.ensemble_label.as_str()),
            Cell::Float(r.confidence),
        ];
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(cell);
        }
    }

    let mut out = table.clone();
    for (name, cells) in SENTIMENT_COLUMNS.iter().zip(columns) {
        out.append_column(Column::new(*name, cells))?;
    }
    Ok(out)
}

/// Keep only rows whose `Language` is one of `languages`.
pub fn filter_by_language(table: &Table, languages: &[&str]) -> Result<Table, SchemaError> {
    let column = table.require_column(LANGUAGE_COLUMN)?;
    let wanted: BTreeSet<&str> = languages.iter().copied().collect();
    let keep: Vec<bool> = column
        .cells
        .iter()
        .map(|c| c.as_text().map(|l| wanted.contains(l)).unwrap_or(false))
        .collect();
    let out = table.filter_rows(|i| keep[i]);
    tracing::info!(
        "Filtered dataset from {} to {} rows",
        table.row_count(),
        out.row_count()
    );
    Ok(out)
}

/// Full enrichment: normalize into `Text_processed`, then tag languages and
/// score sentiment from `analysis`.
pub struct Enricher {
    pub normalizer: Normalizer,
    pub tagger: LanguageTagger,
    pub scorer: SentimentScorer,
}

impl Enricher {
    pub fn run(
        &self,
        table: &Table,
        raw: &TextSource,
        analysis: &TextSource,
    ) -> Result<Table, SchemaError> {
        let mut planned = vec![PROCESSED_COLUMN, LANGUAGE_COLUMN, LANGUAGE_CONFIDENCE_COLUMN];
        planned.extend(SENTIMENT_COLUMNS);
        table.ensure_absent(&planned)?;
        table.require_column(&raw.column)?;

        let table = normalize_column(table, raw, PROCESSED_COLUMN, &self.normalizer)?;
        let table = tag_languages(&table, analysis, &self.tagger)?;
        score_sentiment(&table, analysis, &self.scorer)
    }
}

/// Language statistics from the `Language` columns.
pub fn language_summary(table: &Table, default_language: &str) -> Result<LanguageStats, SchemaError> {
    let languages = table.require_column(LANGUAGE_COLUMN)?;
    let confidences = table.column(LANGUAGE_CONFIDENCE_COLUMN);
    let tags: Vec<LanguageTag> = languages
        .cells
        .iter()
        .enumerate()
        .map(|(i, cell)| LanguageTag {
            language: match cell {
                Cell::Null => default_language.to_string(),
                other => other.render(),
            },
            confidence: confidences
                .and_then(|c| c.cells[i].as_f64())
                .unwrap_or(0.0),
        })
        .collect();
    Ok(language_stats(&tags, default_language))
}

/// Sentiment statistics over a score column and its label column.
///
/// Null or non-numeric scores are skipped; unparseable labels are ignored.
pub fn sentiment_summary(
    table: &Table,
    score_column: &str,
    label_column: &str,
) -> Result<SentimentStats, SchemaError> {
    let scores: Vec<f64> = table
        .require_column(score_column)?
        .cells
        .iter()
        .filter_map(Cell::as_f64)
        .collect();
    let labels: Vec<SentimentLabel> = table
        .require_column(label_column)?
        .cells
        .iter()
        .filter_map(|c| c.as_text().and_then(SentimentLabel::parse))
        .collect();
    Ok(sentiment_stats(&scores, &labels))
}

/// Normalization statistics comparing `original` with `processed`.
pub fn preprocess_summary(
    table: &Table,
    original: &str,
    processed: &str,
) -> Result<NormalizeStats, SchemaError> {
    let before = TextSource::new(original).texts(table)?;
    let after = TextSource::new(processed).texts(table)?;
    Ok(normalize_stats(&before, &after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::TaggerOptions;
    use crate::normalize::NormalizeOptions;

    fn posts() -> Table {
        Table::from_raw_rows(
            vec!["Id".into(), "Text".into()],
            vec![
                vec!["1".into(), "I wanna fuck you".into()],
                vec![
                    "2".into(),
                    "What a wonderful day, thank you all for the lovely messages!".into(),
                ],
                vec!["3".into(), "".into()],
                vec!["4".into(), "ok".into()],
            ],
        )
        .unwrap()
    }

    fn enricher() -> Enricher {
        Enricher {
            normalizer: Normalizer::new(NormalizeOptions::advanced()),
            tagger: LanguageTagger::new(TaggerOptions::basic()),
            scorer: SentimentScorer::new(),
        }
    }

    #[test]
    fn stages_only_append() {
        let input = posts();
        let out = enricher()
            .run(&input, &TextSource::default(), &TextSource::default())
            .unwrap();

        assert_eq!(out.row_count(), input.row_count());
        assert_eq!(out.column_count(), input.column_count() + 1 + 2 + 11);
        for column in input.columns() {
            assert_eq!(out.column(&column.name), Some(column));
        }
        let names = out.column_names();
        assert_eq!(&names[..2], &["Id", "Text"]);
        assert_eq!(names[2], PROCESSED_COLUMN);
        assert_eq!(&names[5..], &SENTIMENT_COLUMNS);
    }

    #[test]
    fn end_to_end_example_is_consistent() {
        let out = enricher()
            .run(&posts(), &TextSource::default(), &TextSource::default())
            .unwrap();

        assert_eq!(out.cell(PROCESSED_COLUMN, 0), Some(&Cell::from("want fuck")));
        assert_eq!(out.cell(LANGUAGE_COLUMN, 0), Some(&Cell::from("en")));
        let confidence = out.cell(LANGUAGE_CONFIDENCE_COLUMN, 0).unwrap().as_f64().unwrap();
        assert!(confidence > 0.5 && confidence <= 1.0, "confidence {}", confidence);

        let compound = out.cell(VADER_SCORE_COLUMN, 0).unwrap().as_f64().unwrap();
        let polarity = out.cell(POLARITY_COLUMN, 0).unwrap().as_f64().unwrap();
        let ensemble = out.cell(ENSEMBLE_SCORE_COLUMN, 0).unwrap().as_f64().unwrap();
        assert!((ensemble - (0.7 * compound + 0.3 * polarity)).abs() < 1e-12);
        if compound * polarity >= 0.0 {
            let (lo, hi) = (compound.min(polarity), compound.max(polarity));
            assert!(lo - 1e-12 <= ensemble && ensemble <= hi + 1e-12);
        }
        let label = out.cell(ENSEMBLE_LABEL_COLUMN, 0).unwrap().as_text().unwrap();
        let expected = crate::sentiment::Thresholds::COMPOUND.label_inclusive(ensemble);
        assert_eq!(label, expected.as_str());
    }

    #[test]
    fn short_and_empty_rows_get_defaults() {
        let tagger = LanguageTagger::new(TaggerOptions::basic());
        let out = tag_languages(&posts(), &TextSource::default(), &tagger).unwrap();
        for row in [2, 3] {
            assert_eq!(out.cell(LANGUAGE_COLUMN, row), Some(&Cell::from("unknown")));
            assert_eq!(out.cell(LANGUAGE_CONFIDENCE_COLUMN, row), Some(&Cell::Float(0.0)));
        }
        assert_eq!(out.cell(LANGUAGE_COLUMN, 1), Some(&Cell::from("en")));

        let scored = score_sentiment(&posts(), &TextSource::default(), &SentimentScorer::new()).unwrap();
        assert_eq!(scored.cell(VADER_NEUTRAL_COLUMN, 2), Some(&Cell::Float(1.0)));
        assert_eq!(scored.cell(ENSEMBLE_LABEL_COLUMN, 2), Some(&Cell::from("neutral")));
    }

    #[test]
    fn fallback_column_fills_empty_text() {
        let table = Table::from_raw_rows(
            vec!["Text".into(), "Text_processed".into()],
            vec![
                vec!["Raw text here".into(), "".into()],
                vec!["Other raw".into(), "processed".into()],
            ],
        )
        .unwrap();
        let source = TextSource::new(PROCESSED_COLUMN).with_fallback(TEXT_COLUMN);
        assert_eq!(
            source.texts(&table).unwrap(),
            vec!["Raw text here".to_string(), "processed".to_string()]
        );
    }

    #[test]
    fn schema_errors_before_any_work() {
        let table = posts();
        assert_eq!(
            tag_languages(&table, &TextSource::new("Body"), &LanguageTagger::new(TaggerOptions::basic())),
            Err(SchemaError::MissingColumn("Body".into()))
        );

        let tagged = tag_languages(&table, &TextSource::default(), &LanguageTagger::new(TaggerOptions::basic())).unwrap();
        assert_eq!(
            enricher().run(&tagged, &TextSource::default(), &TextSource::default()),
            Err(SchemaError::DuplicateColumn(LANGUAGE_COLUMN.into()))
        );
        assert_eq!(
            normalize_column(&table, &TextSource::default(), "Text", &Normalizer::default()),
            Err(SchemaError::DuplicateColumn("Text".into()))
        );
    }

    #[test]
    fn filter_keeps_order() {
        let tagged = Table::from_raw_rows(
            vec!["Id".into(), "Language".into()],
            vec![
                vec!["1".into(), "fr".into()],
                vec!["2".into(), "en".into()],
                vec!["3".into(), "unknown".into()],
                vec!["4".into(), "en".into()],
            ],
        )
        .unwrap();
        let english = filter_by_language(&tagged, &["en"]).unwrap();
        assert_eq!(english.row_count(), 2);
        assert_eq!(english.cell("Id", 0), Some(&Cell::Int(2)));
        assert_eq!(english.cell("Id", 1), Some(&Cell::Int(4)));
        assert_eq!(filter_by_language(&tagged, &["unknown", "fr"]).unwrap().row_count(), 2);
        assert!(filter_by_language(&posts(), &["en"]).is_err());
    }

    #[test]
    fn summaries() {
        let out = enricher()
            .run(&posts(), &TextSource::default(), &TextSource::default())
            .unwrap();
        let languages = language_summary(&out, "unknown").unwrap();
        assert_eq!(languages.total_documents, 4);
        assert!(languages.unknown_count >= 2);

        let sentiment = sentiment_summary(&out, ENSEMBLE_SCORE_COLUMN, ENSEMBLE_LABEL_COLUMN).unwrap();
        assert_eq!(sentiment.count, 4);
        assert_eq!(sentiment.distribution.values().sum::<usize>(), 4);

        let pre = preprocess_summary(&out, TEXT_COLUMN, PROCESSED_COLUMN).unwrap();
        assert_eq!(pre.total_texts, 4);
        assert!(pre.processed_non_empty <= pre.original_non_empty);
    }
}
