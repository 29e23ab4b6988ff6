//! Stage progress reporting.
//!
//! Reports what each stage is doing and how far along it is. Progress is
//! emitted on **stderr** so stdout stays parseable for scripts: stage
//! summaries are the only thing commands print on stdout.

use std::io::Write;
use std::str::FromStr;

/// A single progress event for a pipeline stage.
#[derive(Clone, Debug, PartialEq)]
pub enum StageEvent {
    /// The stage read its input and is about to process `total` rows.
    Started { stage: String, total: u64 },
    /// `n` of `total` items written (bulk stages only).
    Writing { stage: String, n: u64, total: u64 },
    /// The stage finished after processing `n` rows.
    Finished { stage: String, n: u64 },
}

impl StageEvent {
    pub fn started(stage: &str, total: usize) -> Self {
        Self::Started {
            stage: stage.to_string(),
            total: total as u64,
        }
    }

    pub fn writing(stage: &str, n: usize, total: usize) -> Self {
        Self::Writing {
            stage: stage.to_string(),
            n: n as u64,
            total: total as u64,
        }
    }

    pub fn finished(stage: &str, n: usize) -> Self {
        Self::Finished {
            stage: stage.to_string(),
            n: n as u64,
        }
    }
}

/// Reports stage progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: StageEvent);
}

/// Human-friendly progress on stderr: "publish  writing  1,000 / 5,000 documents".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: StageEvent) {
        let line = match &event {
            StageEvent::Started { stage, total } => {
                format!("{}  started  {} rows\n", stage, format_number(*total))
            }
            StageEvent::Writing { stage, n, total } => format!(
                "{}  writing  {} / {} documents\n",
                stage,
                format_number(*n),
                format_number(*total)
            ),
            StageEvent::Finished { stage, n } => {
                format!("{}  done  {} rows\n", stage, format_number(*n))
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: StageEvent) {
        let obj = match &event {
            StageEvent::Started { stage, total } => serde_json::json!({
                "event": "progress",
                "stage": stage,
                "phase": "started",
                "total": total
            }),
            StageEvent::Writing { stage, n, total } => serde_json::json!({
                "event": "progress",
                "stage": stage,
                "phase": "writing",
                "n": n,
                "total": total
            }),
            StageEvent::Finished { stage, n } => serde_json::json!({
                "event": "progress",
                "stage": stage,
                "phase": "finished",
                "n": n
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: StageEvent) {}
}

/// Row and document counts with thousands separators (`12,345`).
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

impl FromStr for ProgressMode {
    type Err = String;

    /// Parse `auto`, `off`, `human` or `json`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::default_for_tty()),
            "off" | "none" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "unknown progress mode '{}': expected auto, off, human or json",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1), "1");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_number(100_000), "100,000");
    }

    #[test]
    fn parse_modes() {
        assert_eq!("off".parse::<ProgressMode>(), Ok(ProgressMode::Off));
        assert_eq!("json".parse::<ProgressMode>(), Ok(ProgressMode::Json));
        assert_eq!("human".parse::<ProgressMode>(), Ok(ProgressMode::Human));
        assert!("loud".parse::<ProgressMode>().is_err());
    }
}
