//! Request language vocabulary
//!
//! The client selects one of a small fixed set of languages (or auto-detect).
//! The same value drives three things: the optional STT language hint, the
//! human-readable label echoed in responses, and the response-language
//! directive injected into legal prompts.

use serde::{Deserialize, Serialize};

/// Languages the client may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Let the upstream STT/LLM detect the language
    #[default]
    Auto,
    English,
    Hindi,
    Tamil,
}

impl Language {
    /// ISO 639-1 hint for the transcription backend. `Auto` sends no hint.
    pub fn stt_hint(&self) -> Option<&'static str> {
        match self {
            Language::Auto => None,
            Language::English => Some("en"),
            Language::Hindi => Some("hi"),
            Language::Tamil => Some("ta"),
        }
    }

    /// Label echoed back to clients and embedded in prompts
    pub fn display_label(&self) -> &'static str {
        match self {
            Language::Auto => "Auto-detected",
            Language::English => "English",
            Language::Hindi => "Hindi (हिन्दी)",
            Language::Tamil => "Tamil (தமிழ்)",
        }
    }

    /// Lowercase key used in degraded legal results (`response_language`)
    pub fn key(&self) -> &'static str {
        match self {
            Language::Auto => "auto",
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Tamil => "tamil",
        }
    }

    /// Response-language directive for the legal system prompt.
    ///
    /// Hindi and Tamil carry the instruction in their own script as well;
    /// models follow script-native directives far more reliably.
    pub fn directive(&self) -> &'static str {
        match self {
            Language::Auto | Language::English => "Respond in English.",
            Language::Hindi => {
                "सभी उत्तर हिंदी में दें। All responses must be in Hindi (Devanagari script)."
            }
            Language::Tamil => {
                "அனைத்து பதில்களும் தமிழில் கொடுக்கவும். All responses must be in Tamil script."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stt_hint_vocabulary() {
        assert_eq!(Language::English.stt_hint(), Some("en"));
        assert_eq!(Language::Hindi.stt_hint(), Some("hi"));
        assert_eq!(Language::Tamil.stt_hint(), Some("ta"));
        assert_eq!(Language::Auto.stt_hint(), None);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::from_str::<Language>("\"hindi\"").unwrap(),
            Language::Hindi
        );
        assert_eq!(serde_json::to_string(&Language::Auto).unwrap(), "\"auto\"");
    }

    #[test]
    fn test_default_is_auto() {
        assert_eq!(Language::default(), Language::Auto);
    }
}
