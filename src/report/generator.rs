//! Audit report generation.
//!
//! This module renders an [`AuditReport`] as Markdown or JSON.

use crate::models::{AuditReport, ReportMetadata, RiskCategory, RiskFinding, RiskLevel, RiskSummary};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AuditReport) -> String {
    let mut output = String::new();

    output.push_str("# PPJB Audit Report\n\n");
    output.push_str(&generate_verdict_banner(report));
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_findings_section(&report.findings));
    output.push_str(&generate_advice_section(&report.advice));
    output.push_str(&generate_footer());

    output
}

fn generate_verdict_banner(report: &AuditReport) -> String {
    format!(
        "> {} **Verdict: {}**\n\n",
        report.verdict.emoji(),
        report.verdict.token()
    )
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Document:** {}\n", metadata.document));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!("- **Validation:** {}\n", metadata.validation));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &RiskSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "| {} Critical | {} High | {} Medium | **Total** |\n",
        RiskLevel::Critical.emoji(),
        RiskLevel::High.emoji(),
        RiskLevel::Medium.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        summary.critical, summary.high, summary.medium, summary.total
    ));

    if !summary.by_category.is_empty() {
        section.push_str("### Findings by Category\n\n");
        section.push_str("| Category | Count |\n");
        section.push_str("|:---|:---:|\n");

        let mut categories: Vec<_> = summary.by_category.iter().collect();
        categories.sort_by_key(|(_, count)| std::cmp::Reverse(*count));

        for (category, count) in categories {
            section.push_str(&format!("| {} | {} |\n", category, count));
        }
        section.push('\n');
    }

    section
}

/// Generate the findings section, in detection order.
fn generate_findings_section(findings: &[RiskFinding]) -> String {
    let mut section = String::new();

    section.push_str("## Findings\n\n");

    if findings.is_empty() {
        section.push_str("No unfair contract terms were found. ✅\n\n");
        return section;
    }

    for (i, finding) in findings.iter().enumerate() {
        section.push_str(&generate_finding_block(i + 1, finding));
    }

    section
}

/// Generate a single finding block.
fn generate_finding_block(number: usize, finding: &RiskFinding) -> String {
    let mut block = String::new();

    let category = RiskCategory::detect(finding)
        .map(|c| format!(" - {}", c))
        .unwrap_or_default();

    block.push_str(&format!(
        "### {}. {} **{}** {}{}\n\n",
        number,
        finding.risk_level.emoji(),
        finding.risk_level,
        finding.article_reference,
        category
    ));

    if !finding.original_text.is_empty() {
        for line in finding.original_text.lines() {
            block.push_str(&format!("> {}\n", line));
        }
        block.push('\n');
    }

    if !finding.legal_reasoning.is_empty() {
        block.push_str(&format!("**Legal reasoning:** {}\n\n", finding.legal_reasoning));
    }

    block.push_str("---\n\n");

    block
}

fn generate_advice_section(advice: &str) -> String {
    let mut section = String::new();

    section.push_str("## Advice\n\n");
    section.push_str(advice.trim());
    section.push_str("\n\n");

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(
        "*Report generated by ppjb-auditor. This is not legal advice; consult a notary or lawyer before signing.*\n",
    );

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AuditReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
