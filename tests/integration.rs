use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn harc_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("harc");
    path
}

const POSTS: &str = "\
Id,Text,cyberbullying_type
1,I wanna fuck you,gender
2,\"What a wonderful day, thank you all for the lovely messages!\",not_cyberbullying
3,,not_cyberbullying
4,ok,religion
5,\"Nobody likes you, you stupid loser. Go away and never come back!!!\",age
6,\"<p>Check this out https://example.com</p> it is really great news for everyone\",other_cyberbullying
";

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    fs::write(root.join("data/posts.csv"), POSTS).unwrap();

    let config_content = r#"[preprocess]
language = "english"

[language]
min_text_length = 10

[store]
uri = "mongodb://127.0.0.1:1/"
timeout_secs = 1

[index]
url = "http://127.0.0.1:1"
timeout_secs = 1
"#;
    let config_path = config_dir.join("harc.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_harc(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = harc_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .env_remove("HARC_MONGO_URI")
        .env_remove("HARC_ES_URL")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run harc binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn data(tmp: &TempDir, name: &str) -> String {
    tmp.path().join("data").join(name).to_str().unwrap().to_string()
}

/// Header and rows of a CSV file.
fn read_csv(path: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

fn column<'a>(headers: &[String], rows: &'a [Vec<String>], name: &str) -> Vec<&'a str> {
    let idx = headers
        .iter()
        .position(|h| h == name)
        .unwrap_or_else(|| panic!("missing column {}", name));
    rows.iter().map(|r| r[idx].as_str()).collect()
}

const SENTIMENT_COLUMNS: [&str; 11] = [
    "Sentiment_VADER_Score",
    "Sentiment_VADER_Label",
    "Sentiment_VADER_Positive",
    "Sentiment_VADER_Negative",
    "Sentiment_VADER_Neutral",
    "Sentiment_TextBlob_Polarity",
    "Sentiment_TextBlob_Subjectivity",
    "Sentiment_TextBlob_Label",
    "Sentiment_Ensemble_Score",
    "Sentiment_Ensemble_Label",
    "Sentiment_Confidence",
];

#[test]
fn test_preprocess_appends_column() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let output = data(&tmp, "pre.csv");

    let (stdout, stderr, success) =
        run_harc(&config_path, &["preprocess", "-i", &input, "-o", &output]);
    assert!(success, "preprocess failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("preprocess: 6 rows"));

    let (in_headers, in_rows) = read_csv(&input);
    let (headers, rows) = read_csv(&output);
    assert_eq!(rows.len(), in_rows.len());
    assert_eq!(&headers[..3], &in_headers[..]);
    assert_eq!(headers[3], "Text_processed");
    for (before, after) in in_rows.iter().zip(&rows) {
        assert_eq!(&after[..3], &before[..]);
    }

    let processed = column(&headers, &rows, "Text_processed");
    assert_eq!(processed[2], "");
    assert!(!processed[5].contains("https"));
    assert!(!processed[5].contains('<'));
}

#[test]
fn test_preprocess_advanced_end_to_end_example() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let output = data(&tmp, "pre.csv");

    let (_, stderr, success) = run_harc(
        &config_path,
        &["preprocess", "-i", &input, "-o", &output, "--advanced"],
    );
    assert!(success, "preprocess failed: {}", stderr);
    let (headers, rows) = read_csv(&output);
    assert_eq!(column(&headers, &rows, "Text_processed")[0], "want fuck");
}

#[test]
fn test_language_short_text_unknown() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let output = data(&tmp, "lang.csv");

    let (stdout, stderr, success) =
        run_harc(&config_path, &["language", "-i", &input, "-o", &output]);
    assert!(success, "language failed: stdout={}, stderr={}", stdout, stderr);

    let (headers, rows) = read_csv(&output);
    assert_eq!(headers.len(), 5);
    assert_eq!(rows.len(), 6);
    let languages = column(&headers, &rows, "Language");
    let confidences = column(&headers, &rows, "Language_Confidence");
    for row in [2, 3] {
        assert_eq!(languages[row], "unknown");
        assert_eq!(confidences[row].parse::<f64>().unwrap(), 0.0);
    }
    assert_eq!(languages[0], "en");
    assert!(confidences[0].parse::<f64>().unwrap() > 0.5);
    assert_eq!(languages[1], "en");
    for c in confidences {
        let c: f64 = c.parse().unwrap();
        assert!((0.0..=1.0).contains(&c));
    }
}

#[test]
fn test_language_keep_filters_rows() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let output = data(&tmp, "lang.csv");

    let (_, stderr, success) = run_harc(
        &config_path,
        &["language", "-i", &input, "-o", &output, "--keep", "unknown"],
    );
    assert!(success, "language failed: {}", stderr);
    let (headers, rows) = read_csv(&output);
    assert!(rows.len() >= 2);
    assert!(column(&headers, &rows, "Language").iter().all(|l| *l == "unknown"));
}

#[test]
fn test_sentiment_columns_consistent() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let output = data(&tmp, "sent.csv");

    let (stdout, stderr, success) =
        run_harc(&config_path, &["sentiment", "-i", &input, "-o", &output]);
    assert!(success, "sentiment failed: stdout={}, stderr={}", stdout, stderr);

    let (headers, rows) = read_csv(&output);
    assert_eq!(rows.len(), 6);
    assert_eq!(&headers[3..], &SENTIMENT_COLUMNS.map(String::from)[..]);

    let num = |name: &str| -> Vec<f64> {
        column(&headers, &rows, name)
            .iter()
            .map(|v| v.parse().unwrap())
            .collect()
    };
    let compound = num("Sentiment_VADER_Score");
    let polarity = num("Sentiment_TextBlob_Polarity");
    let ensemble = num("Sentiment_Ensemble_Score");
    let confidence = num("Sentiment_Confidence");
    let labels = column(&headers, &rows, "Sentiment_Ensemble_Label");
    for i in 0..rows.len() {
        assert!((ensemble[i] - (0.7 * compound[i] + 0.3 * polarity[i])).abs() < 1e-9);
        let expected = if ensemble[i] >= 0.05 {
            "positive"
        } else if ensemble[i] <= -0.05 {
            "negative"
        } else {
            "neutral"
        };
        assert_eq!(labels[i], expected);
        assert!((0.0..=1.0).contains(&confidence[i]));
    }

    // empty text gets neutral defaults
    assert_eq!(column(&headers, &rows, "Sentiment_VADER_Neutral")[2], "1.0");
    assert_eq!(labels[2], "neutral");
    assert_eq!(labels[4], "negative");
}

#[test]
fn test_enrich_full_pipeline() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let output = data(&tmp, "enriched.csv");

    let (stdout, stderr, success) = run_harc(
        &config_path,
        &["enrich", "-i", &input, "-o", &output, "--advanced"],
    );
    assert!(success, "enrich failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("enrich: 6 rows, 17 columns"));

    let (headers, rows) = read_csv(&output);
    assert_eq!(headers.len(), 3 + 1 + 2 + 11);
    assert_eq!(rows.len(), 6);
    assert_eq!(column(&headers, &rows, "Id"), vec!["1", "2", "3", "4", "5", "6"]);
    assert_eq!(column(&headers, &rows, "Text_processed")[0], "want fuck");
}

#[test]
fn test_clean_nulls_types_for_not_bullying() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let output = data(&tmp, "clean.csv");

    let (stdout, stderr, success) = run_harc(&config_path, &["clean", "-i", &input, "-o", &output]);
    assert!(success, "clean failed: stdout={}, stderr={}", stdout, stderr);

    let (headers, rows) = read_csv(&output);
    let labels = column(&headers, &rows, "Label");
    let types = column(&headers, &rows, "Types");
    assert_eq!(
        labels,
        vec!["Bullying", "Not-Bullying", "Not-Bullying", "Bullying", "Bullying", "Bullying"]
    );
    assert_eq!(types, vec!["Gender", "", "", "Religion", "Age", "Other"]);
}

#[test]
fn test_missing_column_fails_without_output() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let output = data(&tmp, "never.csv");

    let (_, stderr, success) = run_harc(
        &config_path,
        &["sentiment", "-i", &input, "-o", &output, "--text-column", "Body"],
    );
    assert!(!success, "sentiment should fail on a missing column");
    assert!(stderr.contains("Body"), "stderr: {}", stderr);
    assert!(!Path::new(&output).exists());
}

#[test]
fn test_rerunning_stage_is_schema_error() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let first = data(&tmp, "lang1.csv");
    let second = data(&tmp, "lang2.csv");

    let (_, _, success) = run_harc(&config_path, &["language", "-i", &input, "-o", &first]);
    assert!(success);
    let (_, stderr, success) = run_harc(&config_path, &["language", "-i", &first, "-o", &second]);
    assert!(!success, "second language run should fail");
    assert!(stderr.contains("already exists"), "stderr: {}", stderr);
    assert!(!Path::new(&second).exists());
}

#[test]
fn test_stats_json() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let cleaned = data(&tmp, "clean.csv");
    let enriched = data(&tmp, "enriched.csv");

    run_harc(&config_path, &["clean", "-i", &input, "-o", &cleaned]);
    run_harc(&config_path, &["enrich", "-i", &cleaned, "-o", &enriched]);

    let (stdout, stderr, success) = run_harc(&config_path, &["stats", "-i", &enriched, "--json"]);
    assert!(success, "stats failed: {}", stderr);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["rows"], 6);
    assert_eq!(stats["labels"]["labels"]["Bullying"], 4);
    assert_eq!(stats["languages"]["total_documents"], 6);
    assert_eq!(stats["sentiment"]["count"], 6);
    assert_eq!(stats["preprocessing"]["total_texts"], 6);
}

#[test]
fn test_stats_human() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");

    let (stdout, _, success) = run_harc(&config_path, &["stats", "-i", &input]);
    assert!(success);
    assert!(stdout.contains("Rows:        6"));
    assert!(stdout.contains("No label, language or sentiment columns found."));
}

#[test]
fn test_analyze_json() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_harc(
        &config_path,
        &["analyze", "--advanced", "--json", "--text", "I wanna fuck you"],
    );
    assert!(success, "analyze failed: {}", stderr);
    let line: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(line["normalized"], "want fuck");
    let s = &line["sentiment"];
    let ensemble = s["ensemble_score"].as_f64().unwrap();
    let expected = 0.7 * s["vader"]["compound"].as_f64().unwrap()
        + 0.3 * s["textblob"]["polarity"].as_f64().unwrap();
    assert!((ensemble - expected).abs() < 1e-9);
}

#[test]
fn test_analyze_requires_input() {
    let (_tmp, config_path) = setup_test_env();
    let (_, _, success) = run_harc(&config_path, &["analyze"]);
    assert!(!success);
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, config_path) = setup_test_env();
    fs::write(
        &config_path,
        "[sentiment]\npositive_threshold = -0.5\nnegative_threshold = 0.5\n",
    )
    .unwrap();
    let input = data(&tmp, "posts.csv");
    let (_, stderr, success) = run_harc(&config_path, &["stats", "-i", &input]);
    assert!(!success);
    assert!(stderr.contains("positive_threshold"), "stderr: {}", stderr);
}

#[test]
fn test_load_unreachable_store_fails() {
    let (tmp, config_path) = setup_test_env();
    let input = data(&tmp, "posts.csv");
    let (_, stderr, success) = run_harc(&config_path, &["load", "-i", &input]);
    assert!(!success, "load should fail without a MongoDB server");
    assert!(stderr.contains("MongoDB"), "stderr: {}", stderr);
}
