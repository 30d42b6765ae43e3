//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Verdict;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// PPJB Auditor - LLM-powered unfair-term checker for property contracts
///
/// Reads a PPJB (Perjanjian Pengikatan Jual Beli), lets an analyst model
/// flag unfair clauses under UU Perlindungan Konsumen Pasal 18, and has an
/// advisor model explain the risks with a final verdict.
///
/// Examples:
///   ppjb-auditor ppjb.txt
///   ppjb-auditor ppjb.txt --model qwen2.5:14b --format json -o audit.json
///   cat ppjb.txt | ppjb-auditor --lenient
///   ppjb-auditor cluster-a.txt cluster-b.txt -o audits/ --fail-on negotiate-hard
///   ppjb-auditor --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Contract documents (UTF-8 text). Use `-` or nothing to read stdin.
    #[arg(value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Ollama model to use for the analyst and the advisor
    ///
    /// Can also be set via PPJB_AUDITOR_MODEL env var or .ppjb-auditor.toml config.
    #[arg(short, long, env = "PPJB_AUDITOR_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Output file for the report (a directory when auditing several documents)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ppjb-auditor.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds, per model call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Reject stage output that breaks the data contract (default)
    #[arg(long, conflicts_with = "lenient")]
    pub strict: bool,

    /// Recover from fenced or wrapped analyst output and missing verdicts
    #[arg(long, conflicts_with = "strict")]
    pub lenient: bool,

    /// Number of documents audited at the same time
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Maximum document size in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_document_bytes: Option<usize>,

    /// Fail if any verdict is at or above this level
    ///
    /// Useful for scripting. Exit code 2 when the threshold is reached.
    #[arg(long, value_name = "VERDICT")]
    pub fail_on: Option<FailOnVerdict>,

    /// Print the stage instructions and exit
    #[arg(long)]
    pub show_prompts: bool,

    /// Generate a default .ppjb-auditor.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

/// Verdict threshold for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailOnVerdict {
    NegotiateHard,
    RunAway,
}

impl From<FailOnVerdict> for Verdict {
    fn from(level: FailOnVerdict) -> Self {
        match level {
            FailOnVerdict::NegotiateHard => Verdict::NegotiateHard,
            FailOnVerdict::RunAway => Verdict::RunAway,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config || self.show_prompts {
            return Ok(());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.max_document_bytes == Some(0) {
            return Err("Max document size must be at least 1 byte".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for input in &self.inputs {
            if input.as_os_str() != "-" && !input.is_file() {
                return Err(format!("Document does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
