//! Structured legal result schema
//!
//! The legal research pipeline instructs the model to answer with a JSON
//! object matching this tree. Downstream consumers never branch on shape:
//! a response is either a [`StructuredLegalResult`] or a [`DegradedResult`]
//! carrying the same top-level `confidence` and `disclaimer` fields.

use serde::{Deserialize, Serialize};

use crate::Language;

/// Citable source categories. Only government and court material qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Statute,
    Judgment,
    GovernmentPortal,
}

/// A citation backing a provision or act
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub name: String,
    pub url: String,
}

/// Cognizability/bailability classification of an offence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub cognizable: bool,
    pub bailable: bool,
    pub punishment: String,
}

/// A substantive provision the incident may attract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicableProvision {
    pub code: String,
    pub title: String,
    pub why_applicable: String,
    pub classification: Classification,
    /// Always present, possibly empty
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

/// A procedural provision (FIR registration, investigation, bail process)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceduralProvision {
    pub code: String,
    pub purpose: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

/// A special act engaged alongside the general criminal code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialAct {
    pub act: String,
    pub why_applicable: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

/// A decided case with comparable facts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarCase {
    pub citation: String,
    pub court: String,
    pub year: i32,
    pub fact_similarity: String,
    pub key_holding: String,
    pub url: String,
}

/// Model self-reported confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// The full structured answer for a legal research request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredLegalResult {
    /// 2-3 line plain-language summary of the legal characterization
    pub summary: String,
    #[serde(default)]
    pub applicable_provisions: Vec<ApplicableProvision>,
    #[serde(default)]
    pub procedural_provisions: Vec<ProceduralProvision>,
    #[serde(default)]
    pub special_acts: Vec<SpecialAct>,
    #[serde(default)]
    pub similar_cases: Vec<SimilarCase>,
    #[serde(default)]
    pub investigation_tips: Vec<String>,
    pub confidence: Confidence,
    /// Points that require verification against local/state amendments
    #[serde(default)]
    pub needs_local_check: Vec<String>,
    pub disclaimer: String,
}

/// Whether the request narrates a concrete complaint or asks an abstract question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    Query,
    Complaint,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Query => "query",
            QueryType::Complaint => "complaint",
        }
    }
}

/// Incident facts collected from the client.
///
/// Optional list fields are always materialized (possibly empty) so the built
/// prompt has a deterministic structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentDetails {
    pub narrative: String,
    pub location_state: String,
    pub date_time: String,
    pub known_sections_or_acts: Vec<String>,
    pub key_entities: Vec<String>,
    pub evidence_available: Vec<String>,
    pub aggravating_factors: Vec<String>,
    pub is_complaint: bool,
}

/// Well-formed fallback substituted when structured parsing or the upstream
/// completion fails. Reported to clients as a success with low confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedResult {
    pub response_language: String,
    pub query_type: QueryType,
    /// Explicit marker distinguishing this envelope from a real result
    pub error: String,
    /// Truncated prefix of the raw model output, for diagnosis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    pub summary: String,
    pub applicable_provisions: Vec<ApplicableProvision>,
    pub similar_cases: Vec<SimilarCase>,
    pub confidence: Confidence,
    pub disclaimer: String,
}

/// How much of the raw model output a degraded result keeps for diagnosis
const RAW_PREFIX_CHARS: usize = 1000;

impl DegradedResult {
    /// Fallback for output that could not be parsed or failed schema validation
    pub fn parse_failure(language: Language, query_type: QueryType, raw: &str) -> Self {
        Self {
            response_language: language.key().to_string(),
            query_type,
            error: "JSON parsing failed".into(),
            raw_response: Some(truncate_chars(raw, RAW_PREFIX_CHARS)),
            summary: "Unable to parse the model response. The model returned malformed JSON."
                .into(),
            applicable_provisions: Vec::new(),
            similar_cases: Vec::new(),
            confidence: Confidence::Low,
            disclaimer: "Please try again. If the issue persists, contact support.".into(),
        }
    }

    /// Fallback when the completion call itself failed (refusal, upstream error)
    pub fn upstream_failure(language: Language, query_type: QueryType) -> Self {
        Self {
            response_language: language.key().to_string(),
            query_type,
            error: "LLM processing error".into(),
            raw_response: None,
            summary: "An error occurred while processing your request. Please try again.".into(),
            applicable_provisions: Vec::new(),
            similar_cases: Vec::new(),
            confidence: Confidence::Low,
            disclaimer: "Service temporarily unavailable. Please try again.".into(),
        }
    }
}

/// Outcome of the structured-parsing stage. Serializes transparently so the
/// client sees either the full result or the degraded envelope, never a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegalAnalysis {
    Structured(StructuredLegalResult),
    Degraded(DegradedResult),
}

impl LegalAnalysis {
    pub fn is_degraded(&self) -> bool {
        matches!(self, LegalAnalysis::Degraded(_))
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            LegalAnalysis::Structured(r) => r.confidence,
            LegalAnalysis::Degraded(d) => d.confidence,
        }
    }

    pub fn disclaimer(&self) -> &str {
        match self {
            LegalAnalysis::Structured(r) => &r.disclaimer,
            LegalAnalysis::Degraded(d) => &d.disclaimer,
        }
    }

    /// Short spoken summary used as TTS input for legal responses
    pub fn tts_summary(&self) -> String {
        match self {
            LegalAnalysis::Structured(r) => {
                let codes: Vec<&str> = r
                    .applicable_provisions
                    .iter()
                    .map(|p| p.code.as_str())
                    .collect();
                format!(
                    "Legal Analysis Summary: {}. Applicable Provisions: {}. Confidence Level: {}. {}",
                    r.summary,
                    if codes.is_empty() {
                        "none identified".to_string()
                    } else {
                        codes.join(", ")
                    },
                    confidence_label(r.confidence),
                    r.disclaimer
                )
            }
            LegalAnalysis::Degraded(d) => format!("{} {}", d.summary, d.disclaimer),
        }
    }
}

fn confidence_label(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::High => "high",
        Confidence::Medium => "medium",
        Confidence::Low => "low",
    }
}

/// Char-boundary-safe prefix truncation
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> StructuredLegalResult {
        StructuredLegalResult {
            summary: "Theft of a mobile phone; IPC 379 applies.".into(),
            applicable_provisions: vec![ApplicableProvision {
                code: "IPC 379".into(),
                title: "Punishment for theft".into(),
                why_applicable: "Movable property taken dishonestly".into(),
                classification: Classification {
                    cognizable: true,
                    bailable: false,
                    punishment: "Up to 3 years imprisonment or fine or both".into(),
                },
                sources: vec![],
            }],
            procedural_provisions: vec![],
            special_acts: vec![],
            similar_cases: vec![],
            investigation_tips: vec!["Collect CCTV footage".into()],
            confidence: Confidence::High,
            needs_local_check: vec![],
            disclaimer: "Consult a lawyer for case-specific advice".into(),
        }
    }

    #[test]
    fn test_roundtrip_is_identity() {
        let result = sample_result();
        let json = serde_json::to_string(&result).unwrap();
        let back: StructuredLegalResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_missing_sources_defaults_to_empty_list() {
        let json = r#"{
            "code": "IPC 379",
            "title": "Theft",
            "why_applicable": "x",
            "classification": {"cognizable": true, "bailable": true, "punishment": "fine"}
        }"#;
        let provision: ApplicableProvision = serde_json::from_str(json).unwrap();
        assert!(provision.sources.is_empty());
    }

    #[test]
    fn test_source_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&SourceType::GovernmentPortal).unwrap(),
            "\"government_portal\""
        );
    }

    #[test]
    fn test_degraded_truncates_raw_prefix() {
        let raw = "x".repeat(5000);
        let degraded = DegradedResult::parse_failure(Language::English, QueryType::Complaint, &raw);
        let kept = degraded.raw_response.unwrap();
        assert!(kept.chars().count() <= RAW_PREFIX_CHARS + 3);
        assert_eq!(degraded.confidence, Confidence::Low);
        assert_eq!(degraded.query_type, QueryType::Complaint);
    }

    #[test]
    fn test_analysis_serializes_untagged() {
        let analysis = LegalAnalysis::Degraded(DegradedResult::upstream_failure(
            Language::Hindi,
            QueryType::Query,
        ));
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["error"], "LLM processing error");
        assert_eq!(value["response_language"], "hindi");
        assert!(value.get("Degraded").is_none());
    }

    #[test]
    fn test_tts_summary_lists_provision_codes() {
        let analysis = LegalAnalysis::Structured(sample_result());
        let spoken = analysis.tts_summary();
        assert!(spoken.contains("IPC 379"));
        assert!(spoken.contains("Confidence Level: high"));
    }
}
