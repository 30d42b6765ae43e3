//! Checks that the advisor's summary covers the analyst's findings.

use crate::models::RiskFinding;
use std::collections::{BTreeMap, BTreeSet};

/// Article references of `findings` that `summary` does not address.
///
/// Matching ignores case, punctuation and repeated whitespace. A reference
/// shared by several findings has to be mentioned at least that many times.
/// Each reference is reported once, in finding order.
pub fn missing_references(summary: &str, findings: &[RiskFinding]) -> Vec<String> {
    let haystack = normalize(summary);
    let mut expected: BTreeMap<String, usize> = BTreeMap::new();
    let mut order = Vec::new();

    for finding in findings {
        let reference = finding.article_reference.trim();
        let needle = normalize(reference);
        if needle.is_empty() {
            continue;
        }
        let count = expected.entry(needle.clone()).or_insert(0);
        if *count == 0 {
            order.push((needle, reference.to_string()));
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|(needle, _)| count_phrase(&haystack, needle) < expected[needle])
        .map(|(_, reference)| reference)
        .collect()
}

/// "Pasal N" numbers in `summary` that none of the findings refer to.
///
/// A hint that the advisor may have invented a risk; the summary can also
/// legitimately cite statute articles, so this is never fatal.
pub fn unreferenced_articles(summary: &str, findings: &[RiskFinding]) -> Vec<String> {
    let known: BTreeSet<String> = findings
        .iter()
        .flat_map(|f| pasal_numbers(&f.article_reference))
        .collect();

    pasal_numbers(summary)
        .into_iter()
        .filter(|n| !known.contains(n))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|n| format!("Pasal {}", n))
        .collect()
}

/// Numbers following the word "pasal", in order of appearance.
fn pasal_numbers(text: &str) -> Vec<String> {
    let words = normalize(text);
    let words: Vec<&str> = words.split(' ').collect();

    words
        .windows(2)
        .filter(|w| w[0] == "pasal" && w[1].chars().all(|c| c.is_ascii_digit()))
        .map(|w| w[1].to_string())
        .collect()
}

/// Whole-word occurrences of `needle` in `haystack`, both normalized.
fn count_phrase(haystack: &str, needle: &str) -> usize {
    let words: Vec<&str> = haystack.split(' ').collect();
    let phrase: Vec<&str> = needle.split(' ').collect();

    words.windows(phrase.len()).filter(|w| *w == phrase.as_slice()).count()
}

fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
