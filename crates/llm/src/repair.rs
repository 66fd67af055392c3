//! Structured-output repair
//!
//! The model is told to emit bare JSON, but in practice wraps it in code
//! fences, truncates it, or answers in prose. This module recovers what it
//! can: strip fences, parse, validate against the schema, and fall back to
//! a well-formed degraded result rather than surfacing a hard failure.

use nyaya_core::{DegradedResult, Language, LegalAnalysis, QueryType, StructuredLegalResult};

use crate::schema::validate_legal_result;

/// Turn raw model output into a [`LegalAnalysis`].
///
/// Never fails: anything that cannot be parsed and validated becomes a
/// low-confidence [`DegradedResult`] carrying a prefix of the raw output.
pub fn parse_structured(raw: &str, language: Language, query_type: QueryType) -> LegalAnalysis {
    let cleaned = strip_code_fences(raw);

    let value: serde_json::Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, chars = raw.len(), "legal output is not valid JSON");
            metrics::counter!("legal_parse_failures_total").increment(1);
            return LegalAnalysis::Degraded(DegradedResult::parse_failure(
                language, query_type, raw,
            ));
        }
    };

    if let Err(violation) = validate_legal_result(&value) {
        tracing::warn!(%violation, "legal output failed schema validation");
        metrics::counter!("legal_schema_violations_total").increment(1);
        return LegalAnalysis::Degraded(DegradedResult::parse_failure(language, query_type, raw));
    }

    match serde_json::from_value::<StructuredLegalResult>(value) {
        Ok(result) => LegalAnalysis::Structured(result),
        Err(err) => {
            tracing::warn!(error = %err, "legal output did not deserialize after validation");
            LegalAnalysis::Degraded(DegradedResult::parse_failure(language, query_type, raw))
        }
    }
}

/// Strip a single surrounding markdown code fence, with or without a
/// `json` language tag
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let without_open = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };

    without_open
        .trim_start()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyaya_core::Confidence;

    const VALID: &str = r#"{
        "summary": "Theft under IPC 379.",
        "applicable_provisions": [{
            "code": "IPC 379",
            "title": "Punishment for theft",
            "why_applicable": "Movable property taken dishonestly",
            "classification": {"cognizable": true, "bailable": false, "punishment": "3 years"},
            "sources": []
        }],
        "confidence": "high",
        "disclaimer": "Consult a lawyer"
    }"#;

    #[test]
    fn test_bare_json_parses() {
        let analysis = parse_structured(VALID, Language::English, QueryType::Complaint);
        assert!(!analysis.is_degraded());
        assert_eq!(analysis.confidence(), Confidence::High);
    }

    #[test]
    fn test_json_fence_stripped() {
        let fenced = format!("```json\n{VALID}\n```");
        let analysis = parse_structured(&fenced, Language::English, QueryType::Query);
        assert!(!analysis.is_degraded());
    }

    #[test]
    fn test_plain_fence_stripped() {
        let fenced = format!("```\n{VALID}\n```");
        let analysis = parse_structured(&fenced, Language::English, QueryType::Query);
        assert!(!analysis.is_degraded());
    }

    #[test]
    fn test_truncated_json_degrades() {
        let truncated = &VALID[..VALID.len() / 2];
        let analysis = parse_structured(truncated, Language::Hindi, QueryType::Complaint);
        match analysis {
            LegalAnalysis::Degraded(d) => {
                assert_eq!(d.confidence, Confidence::Low);
                assert_eq!(d.response_language, "hindi");
                assert_eq!(d.query_type, QueryType::Complaint);
                assert!(d.raw_response.is_some());
            }
            other => panic!("expected degraded, got {other:?}"),
        }
    }

    #[test]
    fn test_prose_answer_degrades() {
        let analysis = parse_structured(
            "I cannot provide legal analysis for this request.",
            Language::English,
            QueryType::Query,
        );
        assert!(analysis.is_degraded());
    }

    #[test]
    fn test_empty_output_degrades() {
        let analysis = parse_structured("", Language::English, QueryType::Query);
        assert!(analysis.is_degraded());
    }

    #[test]
    fn test_schema_violation_degrades() {
        // Valid JSON, wrong shape
        let analysis = parse_structured(
            r#"{"summary": "x", "confidence": "certain", "disclaimer": "y", "applicable_provisions": []}"#,
            Language::English,
            QueryType::Query,
        );
        assert!(analysis.is_degraded());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse_structured(VALID, Language::Tamil, QueryType::Query);
        let b = parse_structured(VALID, Language::Tamil, QueryType::Query);
        assert_eq!(a, b);
    }
}
