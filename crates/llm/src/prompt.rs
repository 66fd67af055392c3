//! Prompt construction for the chat and legal research flows
//!
//! The legal prompt is deliberately rigid: a fixed source whitelist, a
//! JSON-only output directive, and a deterministic rendering of every
//! incident field. Empty lists are rendered as an explicit "(none)" so the
//! prompt structure never varies with field presence.

use nyaya_core::{IncidentDetails, Language, PromptPair};

/// System prompt for conversational questions and transcript analysis
const CHAT_SYSTEM: &str = "You are an assistant that summarizes, extracts action items, \
and provides a helpful response based on a user's speech transcript or question. \
Keep the response concise, structured, and helpful for a developer audience.";

/// Build the conversational prompt. The language is conveyed as a label in
/// the user message, matching how the model was prompted in production.
pub fn build_chat_prompt(question: &str, language: Language) -> PromptPair {
    let user = format!(
        "Language: {}\nUser Question:\n\"\"\"{}\"\"\"",
        language.display_label(),
        question.trim()
    );
    PromptPair::new(CHAT_SYSTEM, user)
}

/// Build the prompt that analyzes a speech transcript
pub fn build_transcript_prompt(transcript: &str, language: Language) -> PromptPair {
    let user = format!(
        "Language: {}\nTranscript:\n\"\"\"{}\"\"\"",
        language.display_label(),
        transcript.trim()
    );
    PromptPair::new(CHAT_SYSTEM, user)
}

/// Build the structured legal research prompt.
///
/// The system half carries the sourcing whitelist, JSON formatting rules,
/// and the response-language directive verbatim. The user half embeds every
/// incident field, empty or not.
pub fn build_legal_prompt(details: &IncidentDetails, language: Language) -> PromptPair {
    let system = format!(
        r#"You are a legal research AI for Indian criminal law (IPC/CrPC) trained to provide accurate, source-verified legal analysis.

CRITICAL JSON FORMATTING RULES:
1. ALL string values MUST escape special characters: " becomes \", \ becomes \\, newlines become \n
2. Legal text with quotes MUST be properly escaped
3. Return ONLY valid JSON - no markdown, no code blocks
4. Test: Can this be parsed by a strict JSON parser? If no, fix it.

SOURCING RULES:
- ONLY cite: legislative.gov.in, indiacode.nic.in, main.sci.gov.in, High Court .nic.in sites
- NEVER cite: blogs, news, forums, law firm websites
- If source not found, write "Source not available" - do NOT invent URLs

LANGUAGE REQUIREMENT:
{}

RESPONSE FORMAT:
- Return valid JSON object only
- Escape all quotes and special characters in legal text
- Use simple, short descriptions to avoid JSON parsing errors"#,
        language.directive()
    );

    let query_kind = if details.is_complaint {
        "COMPLAINT"
    } else {
        "LEGAL QUERY"
    };

    let user = format!(
        r#"Analyze this legal {} and return structured JSON.

Input:
- Type: {}
- Language: {}
- Content: {}
- Location: {}
- Date/Time: {}
- Known sections or acts: {}
- Key entities: {}
- Evidence available: {}
- Aggravating factors: {}

Return a JSON object with exactly these fields:
{{
  "summary": "2-3 sentence plain-language legal characterization",
  "applicable_provisions": [
    {{
      "code": "IPC 379",
      "title": "Punishment for theft",
      "why_applicable": "Why this provision fits the facts",
      "classification": {{"cognizable": true, "bailable": false, "punishment": "Up to 3 years imprisonment or fine or both"}},
      "sources": [{{"type": "statute", "name": "India Code", "url": "https://indiacode.nic.in/..."}}]
    }}
  ],
  "procedural_provisions": [
    {{"code": "CrPC 154", "purpose": "FIR registration", "sources": []}}
  ],
  "special_acts": [
    {{"act": "IT Act, 2000", "why_applicable": "...", "sources": []}}
  ],
  "similar_cases": [
    {{"citation": "Case Name v State (Year) X SCC Y", "court": "Supreme Court of India", "year": 2020, "fact_similarity": "...", "key_holding": "...", "url": "https://main.sci.gov.in/..."}}
  ],
  "investigation_tips": ["..."],
  "confidence": "high",
  "needs_local_check": ["Points needing verification against state amendments"],
  "disclaimer": "Consult a lawyer for case-specific advice"
}}

Every provision, act, and case MUST carry a "sources" list, empty if no whitelisted source exists.
CRITICAL: Ensure ALL quotes in strings are escaped."#,
        if details.is_complaint { "complaint" } else { "query" },
        query_kind,
        language.key(),
        details.narrative,
        details.location_state,
        details.date_time,
        render_list(&details.known_sections_or_acts),
        render_list(&details.key_entities),
        render_list(&details.evidence_available),
        render_list(&details.aggravating_factors),
    );

    PromptPair::new(system, user)
}

/// Deterministic list rendering: empty lists stay visible as "(none)"
fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
