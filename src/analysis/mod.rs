//! Validation of stage outputs.
//!
//! This module checks the analyst's findings list and the advisor's
//! summary against the data contract between the two stages.

pub mod coverage;
pub mod parser;

pub use coverage::{missing_references, unreferenced_articles};
pub use parser::{extract_verdict, parse_findings, VerdictScan};
