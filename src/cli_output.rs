// Agent-friendly CLI output: colored for terminals, plain for pipes, JSON on request
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal};

/// Output mode for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with colors and tables
    Human,
    /// Machine-readable JSON output
    Json,
    /// Plain text without colors (for pipes/logs)
    Plain,
}

impl OutputMode {
    /// Auto-detect output mode based on environment
    pub fn auto() -> Self {
        if std::env::var("FLOWDEPS_JSON").is_ok() {
            Self::Json
        } else if !io::stdout().is_terminal() {
            Self::Plain
        } else {
            Self::Human
        }
    }

    /// Resolve a `--format` value. `table` only wins on a terminal.
    pub fn from_format(format: &str) -> Self {
        match format.to_lowercase().as_str() {
            "json" => Self::Json,
            "plain" | "text" => Self::Plain,
            _ => Self::auto(),
        }
    }
}

/// Structured result for agent consumption
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub command: String,
    pub duration_ms: u64,
    pub generated_at: DateTime<Utc>,
    pub output: serde_json::Value,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Status line in JSON mode, written to stderr so stdout stays one document.
#[derive(Debug, Clone, Serialize)]
struct StatusLine<'a> {
    level: &'a str,
    message: &'a str,
}

/// CLI output writer with mode awareness
pub struct OutputWriter {
    mode: OutputMode,
}

impl OutputWriter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        match self.mode {
            OutputMode::Human => {
                println!();
                println!("{}", title.cyan().bold());
                println!("{}", "═".repeat(title.chars().count()).cyan());
            }
            OutputMode::Plain => {
                println!();
                println!("{}", title);
                println!("{}", "=".repeat(title.chars().count()));
            }
            OutputMode::Json => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("  {} {}", "✓".green(), message.green()),
            OutputMode::Plain => println!("  [OK] {}", message),
            OutputMode::Json => self.emit_status("info", message),
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => eprintln!("  {} {}", "✗".red(), message.red()),
            OutputMode::Plain => eprintln!("  [ERROR] {}", message),
            OutputMode::Json => self.emit_status("error", message),
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("  {} {}", "⚠".yellow(), message.yellow()),
            OutputMode::Plain => println!("  [WARN] {}", message),
            OutputMode::Json => self.emit_status("warning", message),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        match self.mode {
            OutputMode::Human | OutputMode::Plain => println!("  {}", message),
            OutputMode::Json => self.emit_status("info", message),
        }
    }

    fn emit_status(&self, level: &str, message: &str) {
        if let Ok(json) = serde_json::to_string(&StatusLine { level, message }) {
            eprintln!("{}", json);
        }
    }

    /// Emit final structured result (for JSON mode)
    pub fn emit_result(&self, result: &CommandResult) {
        if let OutputMode::Json = self.mode {
            if let Ok(json) = serde_json::to_string_pretty(result) {
                println!("{}", json);
            }
        }
    }

    /// Print a key-value table
    pub fn table(&self, rows: &[(&str, String)]) {
        let max_key_len = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        match self.mode {
            OutputMode::Human => {
                for (key, value) in rows {
                    println!("  {:width$} │ {}", key.yellow(), value, width = max_key_len);
                }
            }
            OutputMode::Plain => {
                for (key, value) in rows {
                    println!("  {:width$} : {}", key, value, width = max_key_len);
                }
            }
            OutputMode::Json => {}
        }
    }

    /// Get the output mode
    pub fn mode(&self) -> OutputMode {
        self.mode
    }
}

/// Format duration in human-readable form
pub fn format_duration_ms(millis: u64) -> String {
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", millis as f64 / 1000.0)
    } else {
        format!("{}m {}s", millis / 60_000, (millis % 60_000) / 1000)
    }
}
