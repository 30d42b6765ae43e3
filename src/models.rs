//! Data models for the contract auditor.
//!
//! This module contains the core data structures passed between the
//! pipeline stages: the contract document, the risk findings produced by
//! the analyst, and the advisory summary with its verdict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A contract document supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDocument {
    /// Display name (file name, or `<stdin>`).
    pub name: String,
    /// Raw contract text.
    pub text: String,
}

impl ContractDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Severity of a detected unfair clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    #[serde(alias = "high", alias = "High")]
    High,
    #[serde(alias = "critical", alias = "Critical")]
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl RiskLevel {
    /// Returns an emoji representation of the risk level.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🟠",
            RiskLevel::Critical => "🔴",
        }
    }
}

/// One clause flagged by the analyst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    /// Article number, e.g. "Pasal 3 Ayat 1".
    #[serde(rename = "pasal", alias = "article_reference")]
    pub article_reference: String,
    /// The snippet of the dangerous text.
    pub original_text: String,
    pub risk_level: RiskLevel,
    /// Why the clause is illegal or dangerous.
    pub legal_reasoning: String,
}

/// Ordered findings, in detection order.
pub type FindingList = Vec<RiskFinding>;

/// Final recommendation at the end of the advisory summary.
///
/// Ordered by how strongly it warns against signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "SAFE")]
    Safe,
    #[serde(rename = "NEGOTIATE HARD")]
    NegotiateHard,
    #[serde(rename = "RUN AWAY")]
    RunAway,
}

impl Verdict {
    pub const ALL: [Verdict; 3] = [Verdict::RunAway, Verdict::NegotiateHard, Verdict::Safe];

    /// The exact token the advisor must emit.
    pub fn token(&self) -> &'static str {
        match self {
            Verdict::Safe => "SAFE",
            Verdict::NegotiateHard => "NEGOTIATE HARD",
            Verdict::RunAway => "RUN AWAY",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Verdict::Safe => "✅",
            Verdict::NegotiateHard => "⚠️",
            Verdict::RunAway => "🚩",
        }
    }

    /// Verdict implied by the findings alone.
    ///
    /// Used when the advisor's reply carries no verdict and validation is lenient.
    pub fn recommended_for(findings: &[RiskFinding]) -> Self {
        match findings.iter().map(|f| f.risk_level).max() {
            None => Verdict::Safe,
            Some(RiskLevel::Critical) => Verdict::RunAway,
            Some(_) => Verdict::NegotiateHard,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        Verdict::ALL
            .into_iter()
            .find(|v| v.token() == normalized)
            .ok_or_else(|| format!("Unknown verdict: {}", s))
    }
}

/// The advisor's output: narrative text plus the verdict extracted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorySummary {
    /// The advisor's reply, verbatim.
    pub text: String,
    pub verdict: Verdict,
}

/// How strictly stage outputs are checked against their data contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Contract violations are errors.
    #[default]
    Strict,
    /// Best-effort recovery, violations are logged.
    Lenient,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Strict => write!(f, "strict"),
            ValidationMode::Lenient => write!(f, "lenient"),
        }
    }
}

/// The five red-flag categories the analyst looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    UnilateralChange,
    Exoneration,
    VagueHandover,
    UnbalancedPenalty,
    ForceMajeureAbuse,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskCategory::UnilateralChange => write!(f, "Unilateral Change"),
            RiskCategory::Exoneration => write!(f, "Exoneration Clause"),
            RiskCategory::VagueHandover => write!(f, "Vague Handover"),
            RiskCategory::UnbalancedPenalty => write!(f, "Unbalanced Penalty"),
            RiskCategory::ForceMajeureAbuse => write!(f, "Force Majeure Abuse"),
        }
    }
}

impl RiskCategory {
    // Checked in order; force majeure wording often also mentions delays.
    const KEYWORDS: [(RiskCategory, &'static [&'static str]); 5] = [
        (
            RiskCategory::ForceMajeureAbuse,
            &["force majeure", "keadaan memaksa", "kebijakan pemerintah", "government policy"],
        ),
        (
            RiskCategory::Exoneration,
            &["tuntut", "gugat", "lawsuit", "exonerat", "tidak bertanggung jawab", "liability"],
        ),
        (
            RiskCategory::UnilateralChange,
            &["sepihak", "unilateral", "without consent", "tanpa persetujuan"],
        ),
        (
            RiskCategory::VagueHandover,
            &["tentatif", "estimasi", "serah terima", "handover", "arus kas", "cash flow"],
        ),
        (
            RiskCategory::UnbalancedPenalty,
            &["pembatalan", "batal", "cancel", "denda", "penalty", "hangus", "refund"],
        ),
    ];

    /// Best-guess category for a finding, from its text and reasoning.
    pub fn detect(finding: &RiskFinding) -> Option<Self> {
        let haystack = format!("{} {}", finding.original_text, finding.legal_reasoning).to_lowercase();

        Self::KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| haystack.contains(w)))
            .map(|(category, _)| *category)
    }
}

/// Summary of findings by level and category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    /// Counts by detected category; unmatched findings count as "Other".
    pub by_category: BTreeMap<String, usize>,
}

impl RiskSummary {
    /// Creates a summary from a list of findings.
    pub fn from_findings(findings: &[RiskFinding]) -> Self {
        let mut summary = Self {
            total: findings.len(),
            ..Self::default()
        };

        for finding in findings {
            match finding.risk_level {
                RiskLevel::Critical => summary.critical += 1,
                RiskLevel::High => summary.high += 1,
                RiskLevel::Medium => summary.medium += 1,
            }

            let category = RiskCategory::detect(finding)
                .map(|c| c.to_string())
                .unwrap_or_else(|| "Other".to_string());
            *summary.by_category.entry(category).or_insert(0) += 1;
        }

        summary
    }
}

/// Metadata about one audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub document: String,
    pub analysis_date: DateTime<Utc>,
    pub model_used: String,
    pub validation: ValidationMode,
    pub duration_seconds: f64,
}

/// The complete audit report for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub metadata: ReportMetadata,
    /// Analyst findings. Serialized as `risks` for front ends.
    #[serde(rename = "risks")]
    pub findings: FindingList,
    pub summary: RiskSummary,
    /// Advisor text. Serialized as `advice` for front ends.
    #[serde(rename = "advice")]
    pub advice: String,
    pub verdict: Verdict,
}
