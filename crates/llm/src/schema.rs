//! JSON Schema for the structured legal result
//!
//! Compiled once and reused; validation runs before deserialization so that
//! shape violations degrade the result instead of half-parsing it.

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// Schema the model's legal output must satisfy
pub static LEGAL_RESULT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let sources = json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["type", "name", "url"],
            "properties": {
                "type": {"enum": ["statute", "judgment", "government_portal"]},
                "name": {"type": "string"},
                "url": {"type": "string"}
            }
        }
    });

    json!({
        "type": "object",
        "required": ["summary", "applicable_provisions", "confidence", "disclaimer"],
        "properties": {
            "summary": {"type": "string", "minLength": 1},
            "applicable_provisions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["code", "title", "why_applicable", "classification"],
                    "properties": {
                        "code": {"type": "string"},
                        "title": {"type": "string"},
                        "why_applicable": {"type": "string"},
                        "classification": {
                            "type": "object",
                            "required": ["cognizable", "bailable", "punishment"],
                            "properties": {
                                "cognizable": {"type": "boolean"},
                                "bailable": {"type": "boolean"},
                                "punishment": {"type": "string"}
                            }
                        },
                        "sources": sources.clone()
                    }
                }
            },
            "procedural_provisions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["code", "purpose"],
                    "properties": {
                        "code": {"type": "string"},
                        "purpose": {"type": "string"},
                        "sources": sources.clone()
                    }
                }
            },
            "special_acts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["act", "why_applicable"],
                    "properties": {
                        "act": {"type": "string"},
                        "why_applicable": {"type": "string"},
                        "sources": sources
                    }
                }
            },
            "similar_cases": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["citation", "court", "year", "fact_similarity", "key_holding", "url"],
                    "properties": {
                        "citation": {"type": "string"},
                        "court": {"type": "string"},
                        "year": {"type": "integer"},
                        "fact_similarity": {"type": "string"},
                        "key_holding": {"type": "string"},
                        "url": {"type": "string"}
                    }
                }
            },
            "investigation_tips": {"type": "array", "items": {"type": "string"}},
            "confidence": {"enum": ["high", "medium", "low"]},
            "needs_local_check": {"type": "array", "items": {"type": "string"}},
            "disclaimer": {"type": "string", "minLength": 1}
        }
    })
});

/// Compiled validator for [`LEGAL_RESULT_SCHEMA`]
pub static LEGAL_RESULT_VALIDATOR: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::compile(&LEGAL_RESULT_SCHEMA)
        .unwrap_or_else(|e| panic!("legal result schema is invalid: {e}"))
});

/// Validate a candidate value, returning the first violation message
pub fn validate_legal_result(value: &Value) -> Result<(), String> {
    let result = LEGAL_RESULT_VALIDATOR.validate(value);
    if let Err(mut errors) = result {
        if let Some(first) = errors.next() {
            return Err(format!("{} at {}", first, first.instance_path));
        }
        return Err("schema validation failed".to_string());
    }
    Ok(())
}
