// Mode-aware CLI output: colours for terminals, plain text for pipes, JSON for scripts
use colored::Colorize;
use serde::Serialize;
use std::io::{self, IsTerminal};

/// Output mode for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Colours and symbols
    Human,
    /// Machine-readable JSON on stdout
    Json,
    /// Plain text without colours (for pipes/logs)
    Plain,
}

impl OutputMode {
    /// Auto-detect output mode based on environment
    pub fn auto() -> Self {
        if std::env::var("LINKVET_JSON").is_ok() {
            Self::Json
        } else if !io::stdout().is_terminal() {
            Self::Plain
        } else {
            Self::Human
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "plain" | "text" => Some(Self::Plain),
            _ => None,
        }
    }
}

/// Status line emitted on stderr in JSON mode
#[derive(Debug, Clone, Serialize)]
struct StatusEvent<'a> {
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

    pub fn auto() -> Self {
        Self::new(OutputMode::auto())
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

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("  {} {}", "✓".green(), message),
            OutputMode::Plain => println!("  [OK] {}", message),
            OutputMode::Json => self.emit_status("ok", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => eprintln!("  {} {}", "✗".red(), message),
            OutputMode::Plain => eprintln!("  [ERROR] {}", message),
            OutputMode::Json => self.emit_status("error", message),
        }
    }

    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("  {} {}", "⚠".yellow(), message),
            OutputMode::Plain => println!("  [WARN] {}", message),
            OutputMode::Json => self.emit_status("warning", message),
        }
    }

    pub fn info(&self, message: &str) {
        match self.mode {
            OutputMode::Human | OutputMode::Plain => println!("  {}", message),
            OutputMode::Json => self.emit_status("info", message),
        }
    }

    /// Print a metric
    pub fn metric(&self, label: &str, value: &str) {
        match self.mode {
            OutputMode::Human => println!("    • {}: {}", label, value.green()),
            OutputMode::Plain => println!("    - {}: {}", label, value),
            OutputMode::Json => {}
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

    /// Print a rendered comfy-table, skipped in JSON mode
    pub fn render(&self, table: &comfy_table::Table) {
        if !self.is_json() {
            println!("{table}");
        }
    }

    /// Print the final JSON document on stdout
    pub fn json(&self, document: &str) {
        println!("{}", document);
    }

    fn emit_status(&self, level: &str, message: &str) {
        if let Ok(json) = serde_json::to_string(&StatusEvent { level, message }) {
            eprintln!("{}", json);
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn is_human(&self) -> bool {
        matches!(self.mode, OutputMode::Human)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, OutputMode::Json)
    }
}

/// Ratio in [0, 1] as a percentage with one decimal
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Format file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}
