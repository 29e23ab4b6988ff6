//! # harcelement CLI (`harc`)
//!
//! The `harc` binary runs each pipeline stage over CSV files and ships the
//! enriched dataset to MongoDB and Elasticsearch.
//!
//! ## Usage
//!
//! ```bash
//! harc --config ./config/harc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `harc clean` | Canonicalize raw labels into `Label` / `Types` |
//! | `harc preprocess` | Append normalized text (`Text_processed`) |
//! | `harc language` | Append `Language` / `Language_Confidence` |
//! | `harc sentiment` | Append the eleven sentiment columns |
//! | `harc enrich` | Preprocess, language and sentiment in one pass |
//! | `harc analyze` | Analyze single texts |
//! | `harc stats` | Summarize a dataset |
//! | `harc load` | Bulk-load a CSV into MongoDB |
//! | `harc publish` | Publish MongoDB documents to Elasticsearch |
//!
//! ## Examples
//!
//! ```bash
//! # Canonicalize the raw Kaggle labels
//! harc clean -i data/raw.csv -o data/clean.csv --label-column cyberbullying_type
//!
//! # Full enrichment with contractions, emoji names and fallback heuristics
//! harc enrich -i data/clean.csv -o data/enriched.csv --advanced
//!
//! # Replace the collection contents, then publish
//! harc load -i data/enriched.csv --replace
//! harc publish --no-verify-ssl
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use harcelement::config::{self, Config};
use harcelement::enrich_cmd::{self, StagePaths};
use harcelement::progress::ProgressMode;
use harcelement::{load_cmd, publish_cmd, stats};
use harcelement_core::enrich::{TextSource, PROCESSED_COLUMN, TEXT_COLUMN};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// harcelement CLI — enrichment and ingestion pipeline for a
/// cyberbullying-detection dataset.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/harc.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "harc",
    about = "harcelement — enrichment and ingestion pipeline for a cyberbullying-detection dataset",
    version,
    long_about = "harcelement cleans raw social-media posts, normalizes their text, tags language \
    and sentiment, then loads the result into MongoDB and publishes it to Elasticsearch. \
    Each stage reads a CSV and writes a CSV with strictly more columns."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/harc.toml` when that file exists; built-in
    /// defaults are used otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Progress on stderr: `auto` (human on a TTY), `off`, `human` or `json`.
    #[arg(long, global = true, default_value = "auto")]
    progress: ProgressMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IoArgs {
    /// Input CSV file.
    #[arg(long, short)]
    input: PathBuf,

    /// Output CSV file.
    #[arg(long, short)]
    output: PathBuf,
}

impl IoArgs {
    fn paths(self) -> StagePaths {
        StagePaths {
            input: self.input,
            output: self.output,
        }
    }
}

#[derive(Args)]
struct TextArgs {
    /// Column to read text from.
    #[arg(long, default_value = TEXT_COLUMN)]
    text_column: String,

    /// Column used when the text column is empty.
    #[arg(long)]
    fallback_column: Option<String>,
}

impl TextArgs {
    fn source(self) -> TextSource {
        let source = TextSource::new(self.text_column);
        match self.fallback_column {
            Some(fallback) => source.with_fallback(fallback),
            None => source,
        }
    }
}

#[derive(Args)]
struct StoreArgs {
    /// MongoDB URI (overrides `store.uri` and `HARC_MONGO_URI`).
    #[arg(long)]
    mongo_uri: Option<String>,

    /// MongoDB database name.
    #[arg(long)]
    database: Option<String>,

    /// MongoDB collection name.
    #[arg(long)]
    collection: Option<String>,

    /// Field that receives a copy of each document's id.
    #[arg(long)]
    id_field: Option<String>,
}

impl StoreArgs {
    fn apply(self, cfg: &mut Config) {
        if let Some(v) = self.mongo_uri {
            cfg.store.uri = v;
        }
        if let Some(v) = self.database {
            cfg.store.database = v;
        }
        if let Some(v) = self.collection {
            cfg.store.collection = v;
        }
        if let Some(v) = self.id_field {
            cfg.store.id_field = v;
        }
    }
}

#[derive(Args)]
struct IndexArgs {
    /// Elasticsearch URL (overrides `index.url` and `HARC_ES_URL`).
    #[arg(long)]
    es_url: Option<String>,

    /// Elasticsearch index name.
    #[arg(long)]
    index: Option<String>,

    /// Elasticsearch username.
    #[arg(long)]
    es_user: Option<String>,

    /// Elasticsearch password.
    #[arg(long)]
    es_password: Option<String>,

    /// Disable TLS certificate verification.
    #[arg(long)]
    no_verify_ssl: bool,

    /// Documents per bulk request.
    #[arg(long)]
    chunk_size: Option<usize>,
}

impl IndexArgs {
    fn apply(self, cfg: &mut Config) {
        if let Some(v) = self.es_url {
            cfg.index.url = v;
        }
        if let Some(v) = self.index {
            cfg.index.name = v;
        }
        if let Some(v) = self.es_user {
            cfg.index.username = Some(v);
        }
        if let Some(v) = self.es_password {
            cfg.index.password = Some(v);
        }
        if self.no_verify_ssl {
            cfg.index.verify_certs = false;
        }
        if let Some(v) = self.chunk_size {
            cfg.index.bulk_chunk_size = v;
        }
    }
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Canonicalize raw labels into `Label` and `Types` columns.
    ///
    /// `Label` is `Bullying` or `Not-Bullying`; `Types` is one of Age,
    /// Ethnicity, Gender, Religion, Other, and is empty unless the row is
    /// `Bullying`.
    Clean {
        #[command(flatten)]
        io: IoArgs,

        /// Column holding the raw label (e.g. `not_cyberbullying`, `religion`).
        #[arg(long, default_value = "cyberbullying_type")]
        label_column: String,

        /// Optional column holding the raw category.
        #[arg(long)]
        type_column: Option<String>,
    },

    /// Append a normalized copy of the text.
    Preprocess {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        text: TextArgs,

        /// Name of the appended column.
        #[arg(long, default_value = PROCESSED_COLUMN)]
        output_column: String,

        /// Stopword language: `english` or `french`.
        #[arg(long)]
        language: Option<String>,

        /// Expand contractions and name emojis.
        #[arg(long)]
        advanced: bool,

        /// Expand contractions (`won't` → `will not`).
        #[arg(long)]
        expand_contractions: bool,

        /// Replace emojis with their names.
        #[arg(long)]
        handle_emojis: bool,
    },

    /// Append `Language` and `Language_Confidence` columns.
    Language {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        text: TextArgs,

        /// Texts shorter than this (trimmed, in characters) are `unknown`.
        #[arg(long)]
        min_length: Option<usize>,

        /// Use the fallback heuristics when the model fails.
        #[arg(long)]
        advanced: bool,

        /// Disable the fallback heuristics in advanced mode.
        #[arg(long)]
        no_fallback: bool,

        /// Keep only rows tagged with these codes (comma-separated).
        #[arg(long, value_delimiter = ',')]
        keep: Vec<String>,
    },

    /// Append the eleven sentiment columns.
    Sentiment {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        text: TextArgs,

        /// Use custom pattern-polarity thresholds.
        #[arg(long)]
        advanced: bool,

        /// Polarity above this is positive (implies `--advanced`).
        #[arg(long, allow_negative_numbers = true)]
        positive_threshold: Option<f64>,

        /// Polarity below this is negative (implies `--advanced`).
        #[arg(long, allow_negative_numbers = true)]
        negative_threshold: Option<f64>,
    },

    /// Preprocess, tag languages and score sentiment in one pass.
    Enrich {
        #[command(flatten)]
        io: IoArgs,

        /// Raw text column.
        #[arg(long, default_value = TEXT_COLUMN)]
        text_column: String,

        /// Column the language and sentiment stages read (e.g.
        /// `Text_processed`); falls back to the raw text when empty.
        #[arg(long)]
        analysis_column: Option<String>,

        /// Advanced preprocessing, fallback heuristics and custom thresholds.
        #[arg(long)]
        advanced: bool,

        /// Minimum text length for language detection.
        #[arg(long)]
        min_length: Option<usize>,
    },

    /// Analyze single texts and print every output.
    Analyze {
        /// Text to analyze (repeatable).
        #[arg(long)]
        text: Vec<String>,

        /// File with one text per line.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Advanced preprocessing, fallback heuristics and custom thresholds.
        #[arg(long)]
        advanced: bool,

        /// One JSON object per text.
        #[arg(long)]
        json: bool,
    },

    /// Summarize labels, languages, sentiment and preprocessing in a CSV.
    Stats {
        /// Input CSV file.
        #[arg(long, short)]
        input: PathBuf,

        /// Print JSON instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Bulk-load a CSV into MongoDB and mirror each id into a field.
    ///
    /// Loading the same file twice stores every row twice; pass `--replace`
    /// to clear the collection first.
    Load {
        /// Input CSV file.
        #[arg(long, short)]
        input: PathBuf,

        #[command(flatten)]
        store: StoreArgs,

        /// Delete every document in the collection before inserting.
        #[arg(long)]
        replace: bool,
    },

    /// Publish every MongoDB document to Elasticsearch.
    ///
    /// Creates the index with its mapping if absent. Documents are keyed by
    /// their MongoDB id, so publishing again overwrites instead of growing.
    Publish {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        index: IndexArgs,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn set_advanced(cfg: &mut Config) {
    cfg.preprocess.expand_contractions = true;
    cfg.preprocess.handle_emojis = true;
    cfg.language.advanced = true;
    cfg.sentiment.advanced = true;
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = config::load_config(cli.config.as_deref())?;
    let reporter = cli.progress.reporter();
    let progress = reporter.as_ref();

    match cli.command {
        Commands::Clean {
            io,
            label_column,
            type_column,
        } => {
            enrich_cmd::run_clean(&io.paths(), &label_column, type_column.as_deref(), progress)?;
        }
        Commands::Preprocess {
            io,
            text,
            output_column,
            language,
            advanced,
            expand_contractions,
            handle_emojis,
        } => {
            if let Some(language) = language {
                cfg.preprocess.language = language;
            }
            cfg.preprocess.expand_contractions |= advanced || expand_contractions;
            cfg.preprocess.handle_emojis |= advanced || handle_emojis;
            config::validate(&cfg)?;
            enrich_cmd::run_preprocess(&cfg, &io.paths(), &text.source(), &output_column, progress)?;
        }
        Commands::Language {
            io,
            text,
            min_length,
            advanced,
            no_fallback,
            keep,
        } => {
            if let Some(n) = min_length {
                cfg.language.min_text_length = n;
            }
            cfg.language.advanced |= advanced;
            if no_fallback {
                cfg.language.enable_fallback = false;
            }
            config::validate(&cfg)?;
            enrich_cmd::run_language(&cfg, &io.paths(), &text.source(), &keep, progress)?;
        }
        Commands::Sentiment {
            io,
            text,
            advanced,
            positive_threshold,
            negative_threshold,
        } => {
            cfg.sentiment.advanced |= advanced;
            if let Some(p) = positive_threshold {
                cfg.sentiment.positive_threshold = p;
                cfg.sentiment.advanced = true;
            }
            if let Some(n) = negative_threshold {
                cfg.sentiment.negative_threshold = n;
                cfg.sentiment.advanced = true;
            }
            config::validate(&cfg)?;
            enrich_cmd::run_sentiment(&cfg, &io.paths(), &text.source(), progress)?;
        }
        Commands::Enrich {
            io,
            text_column,
            analysis_column,
            advanced,
            min_length,
        } => {
            if advanced {
                set_advanced(&mut cfg);
            }
            if let Some(n) = min_length {
                cfg.language.min_text_length = n;
            }
            config::validate(&cfg)?;
            let analysis =
                analysis_column.map(|c| TextSource::new(c).with_fallback(text_column.clone()));
            enrich_cmd::run_enrich(
                &cfg,
                &io.paths(),
                &TextSource::new(text_column),
                analysis.as_ref(),
                progress,
            )?;
        }
        Commands::Analyze {
            text,
            file,
            advanced,
            json,
        } => {
            if advanced {
                set_advanced(&mut cfg);
            }
            enrich_cmd::run_analyze(&cfg, &text, file.as_deref(), json)?;
        }
        Commands::Stats { input, json } => {
            stats::run_stats(&cfg, &input, json)?;
        }
        Commands::Load {
            input,
            store,
            replace,
        } => {
            store.apply(&mut cfg);
            config::validate(&cfg)?;
            load_cmd::run_load(&cfg, &input, replace, progress).await?;
        }
        Commands::Publish { store, index } => {
            store.apply(&mut cfg);
            index.apply(&mut cfg);
            config::validate(&cfg)?;
            publish_cmd::run_publish(&cfg, progress).await?;
        }
    }

    Ok(())
}
