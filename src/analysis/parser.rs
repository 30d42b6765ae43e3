//! Parsing of stage outputs.
//!
//! The analyst must reply with a bare JSON array of findings and the advisor
//! must end with a verdict line. These functions check both contracts.

use crate::agent::PipelineError;
use crate::models::{FindingList, RiskFinding, ValidationMode, Verdict};
use tracing::{debug, warn};

/// Parse the analyst's reply into findings.
///
/// Strict mode accepts only a bare JSON array. Lenient mode additionally
/// strips a markdown fence or surrounding prose and accepts a single object.
pub fn parse_findings(raw: &str, mode: ValidationMode) -> Result<FindingList, PipelineError> {
    match parse_bare_array(raw) {
        Ok(findings) => Ok(findings),
        Err(err) if mode == ValidationMode::Strict => Err(err),
        Err(err) => {
            warn!("Analyst output is not a bare JSON array ({}), attempting recovery", err);
            recover_findings(raw)
        }
    }
}

fn parse_bare_array(raw: &str) -> Result<FindingList, PipelineError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(PipelineError::malformed("output is empty", raw));
    }
    if trimmed.starts_with("```") {
        return Err(PipelineError::malformed("output is wrapped in markdown fencing", raw));
    }
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return Err(PipelineError::malformed("output is not a bare JSON array", raw));
    }

    serde_json::from_str::<FindingList>(trimmed)
        .map_err(|e| PipelineError::malformed(format!("invalid findings JSON: {}", e), raw))
}

fn recover_findings(raw: &str) -> Result<FindingList, PipelineError> {
    let body = strip_fence(raw.trim());

    // Prose before the list may itself contain brackets, so try every opening one.
    if let Some(end) = body.rfind(']') {
        for (start, _) in body.match_indices('[').filter(|(i, _)| *i < end) {
            if let Ok(findings) = serde_json::from_str::<FindingList>(&body[start..=end]) {
                debug!("Recovered {} findings from wrapped output", findings.len());
                return Ok(findings);
            }
        }
    }

    // Some models return one object instead of a one-element list.
    if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
        if start < end {
            if let Ok(finding) = serde_json::from_str::<RiskFinding>(&body[start..=end]) {
                debug!("Recovered a single finding object");
                return Ok(vec![finding]);
            }
        }
    }

    Err(PipelineError::malformed("no JSON findings list could be recovered", raw))
}

/// Remove a surrounding ```` ``` ```` or ```` ```json ```` fence, if any.
pub fn strip_fence(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };

    let after_open = &text[start + 3..];
    // Drop the info string (e.g. "json") up to the end of the fence line.
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Outcome of scanning the advisor's reply for a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictScan {
    Found(Verdict),
    Missing,
    /// Distinct verdicts on the verdict line, in order of appearance.
    Conflicting(Vec<Verdict>),
}

/// Find the verdict at the end of the advisor's reply.
///
/// The verdict is read from the last line mentioning "verdict". When that
/// line carries no token (a heading, say), the line after it is tried, then
/// the last line. An unlabelled line counts in strict mode only if it is
/// nothing but a verdict token; lenient mode takes any token in it.
pub fn extract_verdict(text: &str, mode: ValidationMode) -> VerdictScan {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    if let Some(idx) = lines.iter().rposition(|l| l.to_lowercase().contains("verdict")) {
        let scan = scan_line(lines[idx]);
        if scan != VerdictScan::Missing {
            return scan;
        }
        if let Some(next) = lines.get(idx + 1) {
            let scan = scan_unlabelled(next, mode);
            if scan != VerdictScan::Missing {
                return scan;
            }
        }
    }

    match lines.last() {
        Some(last) => scan_unlabelled(last, mode),
        None => VerdictScan::Missing,
    }
}

fn scan_unlabelled(line: &str, mode: ValidationMode) -> VerdictScan {
    match mode {
        ValidationMode::Strict => bare_verdict(line).map_or(VerdictScan::Missing, VerdictScan::Found),
        ValidationMode::Lenient => scan_line(line),
    }
}

/// The verdict a line consists of, ignoring emphasis, emoji and punctuation.
fn bare_verdict(line: &str) -> Option<Verdict> {
    line.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .parse()
        .ok()
}

fn scan_line(line: &str) -> VerdictScan {
    let found = find_verdict_tokens(line);

    let mut distinct = Vec::new();
    for verdict in found {
        if !distinct.contains(&verdict) {
            distinct.push(verdict);
        }
    }

    match distinct.len() {
        0 => VerdictScan::Missing,
        1 => VerdictScan::Found(distinct[0]),
        _ => VerdictScan::Conflicting(distinct),
    }
}

/// Verdict tokens in a line, in order of appearance, matched on word boundaries.
fn find_verdict_tokens(line: &str) -> Vec<Verdict> {
    let normalized = normalize(line);
    let mut hits: Vec<(usize, Verdict)> = Vec::new();

    for verdict in Verdict::ALL {
        let token = verdict.token();
        let mut from = 0;
        while let Some(pos) = normalized[from..].find(token) {
            let start = from + pos;
            let end = start + token.len();
            let before_ok = normalized[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let after_ok = normalized[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
            if before_ok && after_ok {
                hits.push((start, verdict));
            }
            from = end;
        }
    }

    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, v)| v).collect()
}

/// Uppercase, drop markdown emphasis and collapse whitespace.
fn normalize(line: &str) -> String {
    line.chars()
        .map(|c| if matches!(c, '*' | '_' | '`' | '"' | '\'') { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    const ONE_FINDING: &str = r#"[{"pasal": "Pasal 18", "original_text": "Developer can change layout unilaterally", "risk_level": "HIGH", "legal_reasoning": "Violates consumer protection: no consent mechanism"}]"#;

    #[test]
    fn test_parse_bare_array() {
        let findings = parse_findings(ONE_FINDING, ValidationMode::Strict).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].article_reference, "Pasal 18");
        assert_eq!(findings[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn test_parse_empty_array() {
        let findings = parse_findings("  []\n", ValidationMode::Strict).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_parse_keeps_detection_order() {
        let raw = r#"[
            {"pasal": "Pasal 9", "original_text": "a", "risk_level": "MEDIUM", "legal_reasoning": "x"},
            {"pasal": "Pasal 2", "original_text": "b", "risk_level": "CRITICAL", "legal_reasoning": "y"}
        ]"#;
        let findings = parse_findings(raw, ValidationMode::Strict).unwrap();
        let refs: Vec<_> = findings.iter().map(|f| f.article_reference.as_str()).collect();
        assert_eq!(refs, vec!["Pasal 9", "Pasal 2"]);
    }

    #[test]
    fn test_strict_rejects_markdown_fence() {
        let fenced = format!("```json\n{}\n```", ONE_FINDING);
        let err = parse_findings(&fenced, ValidationMode::Strict).unwrap_err();
        match err {
            PipelineError::MalformedFindings { reason, raw } => {
                assert!(reason.contains("markdown"));
                assert_eq!(raw, fenced);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_strict_rejects_prose_wrapper() {
        let wrapped = format!("Here are the risks I found:\n{}", ONE_FINDING);
        assert!(matches!(
            parse_findings(&wrapped, ValidationMode::Strict),
            Err(PipelineError::MalformedFindings { .. })
        ));
    }

    #[test]
    fn test_lenient_recovers_markdown_fence() {
        let fenced = format!("```json\n{}\n```", ONE_FINDING);
        let findings = parse_findings(&fenced, ValidationMode::Lenient).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_lenient_recovers_prose_and_single_object() {
        let wrapped = format!("Sure! {}\nLet me know.", ONE_FINDING);
        assert_eq!(parse_findings(&wrapped, ValidationMode::Lenient).unwrap().len(), 1);

        let object = ONE_FINDING.trim_start_matches('[').trim_end_matches(']');
        assert_eq!(parse_findings(object, ValidationMode::Lenient).unwrap().len(), 1);
    }

    #[test]
    fn test_lenient_still_fails_on_garbage() {
        assert!(parse_findings("I could not read the document.", ValidationMode::Lenient).is_err());
        assert!(parse_findings("", ValidationMode::Lenient).is_err());
    }

    #[test]
    fn test_strip_fence() {
        assert_eq!(strip_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_fence("```\n[1]"), "[1]");
        assert_eq!(strip_fence("[1]"), "[1]");
    }

    #[test]
    fn test_lenient_skips_brackets_in_prose() {
        let raw = r#"Catatan [draft]: berikut risikonya.
[
  {"pasal": "Pasal 3", "original_text": "a", "risk_level": "HIGH", "legal_reasoning": "x"},
  {"pasal": "Pasal 8", "original_text": "b", "risk_level": "CRITICAL", "legal_reasoning": "y"}
]"#;
        let findings = parse_findings(raw, ValidationMode::Lenient).unwrap();
        let refs: Vec<_> = findings.iter().map(|f| f.article_reference.as_str()).collect();
        assert_eq!(refs, vec!["Pasal 3", "Pasal 8"]);
    }

    #[test]
    fn test_extract_verdict_line() {
        let text = "🚩 Pasal 18: developer bisa ganti denah seenaknya.\n\nVERDICT: **NEGOTIATE HARD**";
        for mode in [ValidationMode::Strict, ValidationMode::Lenient] {
            assert_eq!(extract_verdict(text, mode), VerdictScan::Found(Verdict::NegotiateHard));
        }
    }

    #[test]
    fn test_extract_verdict_bare_last_line() {
        let text = "Semua aman, bro.\n\nSAFE ✅";
        assert_eq!(extract_verdict(text, ValidationMode::Strict), VerdictScan::Found(Verdict::Safe));
    }

    #[test]
    fn test_strict_ignores_sign_off_words() {
        let text = "🚩 Pasal 18: duit lu angus 💀\nStay safe, bro!";
        assert_eq!(extract_verdict(text, ValidationMode::Strict), VerdictScan::Missing);
        assert_eq!(extract_verdict(text, ValidationMode::Lenient), VerdictScan::Found(Verdict::Safe));
    }

    #[test]
    fn test_extract_verdict_under_heading() {
        let text = "🚩 Pasal 18: layout bisa diganti 💸\n\n## Final Verdict\n\n**RUN AWAY** 🚩";
        for mode in [ValidationMode::Strict, ValidationMode::Lenient] {
            assert_eq!(extract_verdict(text, mode), VerdictScan::Found(Verdict::RunAway));
        }
    }

    #[test]
    fn test_strict_heading_followed_by_prose() {
        let text = "## Verdict\n\nMenurut gue sih safe, tapi cek lagi ya.";
        assert_eq!(extract_verdict(text, ValidationMode::Strict), VerdictScan::Missing);
    }

    #[test]
    fn test_extract_verdict_word_boundaries() {
        assert_eq!(extract_verdict("Verdict: this is UNSAFE", ValidationMode::Lenient), VerdictScan::Missing);
        assert_eq!(extract_verdict("", ValidationMode::Strict), VerdictScan::Missing);
    }

    #[test]
    fn test_extract_verdict_conflicting() {
        let text = "Final verdict: RUN AWAY | NEGOTIATE HARD | SAFE";
        assert_eq!(
            extract_verdict(text, ValidationMode::Strict),
            VerdictScan::Conflicting(vec![Verdict::RunAway, Verdict::NegotiateHard, Verdict::Safe])
        );
    }

    #[test]
    fn test_extract_verdict_repeated_same_token() {
        assert_eq!(
            extract_verdict("Verdict: RUN AWAY. Seriously, RUN AWAY!", ValidationMode::Strict),
            VerdictScan::Found(Verdict::RunAway)
        );
    }
}
