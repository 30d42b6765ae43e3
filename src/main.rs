//! PPJB Auditor - AI-powered unfair-term checker for property contracts
//!
//! A CLI tool that runs a contract through an analyst model and an advisor
//! model via Ollama and writes an audit report with a final verdict.
//!
//! Exit codes:
//!   0 - Success (no verdict at or above --fail-on, or no --fail-on set)
//!   1 - Runtime error (connection, config, unreadable document, contract violation)
//!   2 - Verdict at or above --fail-on threshold

mod agent;
mod analysis;
mod cli;
mod config;
mod document;
mod models;
mod report;

use agent::{AdvisorAgent, AnalystAgent, BatchItem, Coordinator, LlmConfig, OllamaClient, PipelineOutcome};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{AuditReport, ContractDocument, ReportMetadata, RiskSummary, ValidationMode, Verdict};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config and --show-prompts early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }
    if args.show_prompts {
        print_prompts();
        return Ok(());
    }

    // Initialize logging
    init_logging(&args);

    info!("PPJB Auditor v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_audit(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Audit failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ppjb-auditor.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize model, validation, and output.");
    Ok(())
}

/// Handle --show-prompts: print the instruction for every stage.
fn print_prompts() {
    let sections = [
        ("Coordinator", agent::prompts::COORDINATOR_PROMPT),
        ("Analyst", agent::prompts::ANALYST_PROMPT),
        ("Advisor", agent::prompts::ADVISOR_PROMPT),
    ];

    for (name, prompt) in sections {
        println!("===== {} =====\n{}\n", name, prompt);
    }
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the audit for every input document. Returns the exit code.
async fn run_audit(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load the documents
    let documents = document::load_documents(&args.inputs, config.input.max_document_bytes)?;
    let validation = config.pipeline.validation;

    // Step 2: Initialize the pipeline
    if !args.quiet {
        println!("🤖 Initializing contract audit...");
        println!("   Model: {}", config.model.name);
        println!("   Ollama: {}", config.model.ollama_url);
        println!("   Validation: {}", validation);
        println!("   Timeout: {}s per call", config.model.timeout_seconds);
        println!("   Documents: {}", documents.len());
    }

    let llm = Arc::new(OllamaClient::new(LlmConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        timeout_seconds: config.model.timeout_seconds,
        show_progress: !args.quiet && documents.len() == 1,
    })?);

    let coordinator = Coordinator::new(
        AnalystAgent::new(llm.clone(), validation),
        AdvisorAgent::new(llm, validation),
    );

    // Step 3: Run analyst then advisor for each document
    if !args.quiet {
        println!("\n🔬 Analyst is reviewing the contract, then the advisor explains the risks...\n");
    }
    let batch = documents.len() > 1;
    let items = agent::run_batch(&coordinator, documents, config.general.concurrency).await;

    // Step 4: Write reports
    let mut output = PathBuf::from(&config.general.output);
    if batch {
        output = batch_output_dir(&output);
        std::fs::create_dir_all(&output)
            .with_context(|| format!("Failed to create output directory {}", output.display()))?;
    }

    let mut used_names = HashSet::new();
    let mut failures = 0;
    let mut worst: Option<Verdict> = None;
    let total = items.len();

    for item in items {
        let BatchItem {
            document,
            result,
            duration,
        } = item;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) if !batch => {
                if let Some(raw) = e.raw_output() {
                    debug!("Offending model output:\n{}", raw);
                }
                return Err(anyhow::Error::new(e).context(format!("Audit of {} failed", document.name)));
            }
            Err(e) => {
                failures += 1;
                if let Some(raw) = e.raw_output() {
                    debug!("Offending model output:\n{}", raw);
                }
                error!("Audit of {} failed: {}", document.name, e);
                eprintln!("❌ {}: {}", document.name, e);
                continue;
            }
        };

        let report = build_report(
            &document,
            outcome,
            &config.model.name,
            validation,
            duration.as_secs_f64(),
        );

        let path = if batch {
            output.join(unique_report_name(&document, config.general.format, &mut used_names))
        } else {
            output.clone()
        };

        write_report(&report, config.general.format, &path)?;
        print_outcome(&report, &path, args.quiet);

        worst = worst.max(Some(report.verdict));
    }

    if !args.quiet {
        println!(
            "\n✅ Audit complete: {}/{} document(s) in {:.1}s",
            total - failures,
            total,
            start_time.elapsed().as_secs_f64()
        );
    }

    if failures > 0 {
        warn!("{} of {} documents failed", failures, total);
        return Ok(1);
    }

    // Check --fail-on threshold
    if let (Some(fail_on), Some(worst)) = (args.fail_on, worst) {
        let threshold = Verdict::from(fail_on);
        if worst >= threshold {
            eprintln!(
                "\n⛔ Verdict {} is at or above {}. Failing (exit code 2).",
                worst, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Assemble the report for one finished run.
fn build_report(
    document: &ContractDocument,
    outcome: PipelineOutcome,
    model: &str,
    validation: ValidationMode,
    duration_seconds: f64,
) -> AuditReport {
    let PipelineOutcome { findings, advisory } = outcome;

    AuditReport {
        metadata: ReportMetadata {
            document: document.name.clone(),
            analysis_date: Utc::now(),
            model_used: model.to_string(),
            validation,
            duration_seconds,
        },
        summary: RiskSummary::from_findings(&findings),
        findings,
        advice: advisory.text,
        verdict: advisory.verdict,
    }
}

/// Directory for batch reports. A file-like output path loses its extension.
fn batch_output_dir(output: &Path) -> PathBuf {
    if output.extension().is_some() {
        output.with_extension("")
    } else {
        output.to_path_buf()
    }
}

/// Report file name for a document in a batch, unique within the batch.
fn unique_report_name(
    document: &ContractDocument,
    format: OutputFormat,
    used: &mut HashSet<String>,
) -> String {
    let stem = document::report_stem(document);
    let mut name = format!("{}_audit.{}", stem, format.extension());
    let mut n = 2;
    while !used.insert(name.clone()) {
        name = format!("{}_audit_{}.{}", stem, n, format.extension());
        n += 1;
    }
    name
}

fn write_report(report: &AuditReport, format: OutputFormat, path: &Path) -> Result<()> {
    let content = match format {
        OutputFormat::Json => report::generate_json_report(report)?,
        OutputFormat::Markdown => report::generate_markdown_report(report),
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Print the advisor's answer and a short summary.
fn print_outcome(report: &AuditReport, path: &Path, quiet: bool) {
    if quiet {
        println!("{}: {}", report.metadata.document, report.verdict);
        return;
    }

    let summary = &report.summary;
    println!("📄 {}\n", report.metadata.document);
    println!("{}\n", report.advice.trim());
    println!("📊 Findings: {}", summary.total);
    println!(
        "   - 🔴 Critical: {} | 🟠 High: {} | 🟡 Medium: {}",
        summary.critical, summary.high, summary.medium
    );
    println!("   {} Verdict: {}", report.verdict.emoji(), report.verdict);
    println!("   Report saved to: {}\n", path.display());
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
