//! HTTP endpoints
//!
//! REST API over the three request pipelines, plus artifact serving and
//! service endpoints. Handlers validate input, build a pipeline context,
//! and translate the resulting context into the response envelope; all
//! processing happens inside the pipelines.

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use nyaya_core::{Error, IncidentDetails, Language};
use nyaya_pipeline::{chat_pipeline, legal_pipeline, transcribe_pipeline, PipelineContext};

use crate::error::ApiError;
use crate::metrics::metrics_handler;
use crate::state::AppState;

/// Slack on top of the upload limit for multipart framing and text fields
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors = if state.settings.server.cors_enabled {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };
    // Twice the upload cap so moderately oversized uploads reach the
    // handler and get the JSON rejection instead of a bare 413
    let body_limit = state.settings.limits.max_upload_bytes as usize * 2 + MULTIPART_OVERHEAD;

    let mut router = Router::new()
        .route("/", get(service_info))
        .route("/api/chat", post(chat))
        .route("/api/transcribe", post(transcribe))
        .route("/api/legal", post(legal))
        .route("/audio/:file_name", get(serve_audio))
        .route("/health", get(health_check));

    if state.settings.observability.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    question: Option<String>,
    /// Accepted alias for `question`
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    language: Option<Language>,
    #[serde(default, rename = "enableTTS")]
    enable_tts: bool,
}

impl ChatRequest {
    fn question(self) -> Option<String> {
        self.question
            .or(self.message)
            .filter(|q| !q.trim().is_empty())
    }
}

/// POST /api/chat
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    metrics::counter!("api_requests_total", "endpoint" => "chat").increment(1);

    let language = request.language.unwrap_or(Language::English);
    let enable_tts = request.enable_tts;
    let Some(question) = request.question() else {
        return Err(Error::Validation("No question provided".into()).into());
    };

    let mut ctx = PipelineContext::for_text(
        state.store.clone(),
        question.clone(),
        language,
        enable_tts,
    );
    chat_pipeline(state.llm.clone(), state.tts.clone())
        .run(&mut ctx)
        .await?;

    let mut body = json!({
        "success": true,
        "question": question,
        "language": language.display_label(),
        "response": ctx.completion,
        "timestamp": now_iso(),
    });
    attach_audio(&mut body, &mut ctx, None);
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
struct LegalRequest {
    #[serde(default)]
    narrative: Option<String>,
    #[serde(default)]
    location_state: Option<String>,
    #[serde(default)]
    date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    known_sections_or_acts: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    key_entities: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    evidence_available: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    aggravating_factors: Vec<String>,
    #[serde(default)]
    language: Option<Language>,
    #[serde(default)]
    is_complaint: bool,
    #[serde(default, rename = "enableTTS")]
    enable_tts: bool,
}

/// POST /api/legal
async fn legal(
    State(state): State<AppState>,
    Json(request): Json<LegalRequest>,
) -> Result<Response, ApiError> {
    metrics::counter!("api_requests_total", "endpoint" => "legal").increment(1);

    let narrative = match request.narrative {
        Some(n) if !n.trim().is_empty() => n,
        _ => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Incident narrative is required",
                    "hint": "Please provide a description of the legal incident or situation",
                })),
            )
                .into_response())
        }
    };

    let language = request.language.unwrap_or(Language::English);
    let incident = IncidentDetails {
        narrative: narrative.clone(),
        location_state: request
            .location_state
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "India (unspecified state)".to_string()),
        date_time: request
            .date_time
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(now_iso),
        known_sections_or_acts: request.known_sections_or_acts,
        key_entities: request.key_entities,
        evidence_available: request.evidence_available,
        aggravating_factors: request.aggravating_factors,
        is_complaint: request.is_complaint,
    };

    let mut ctx = PipelineContext::for_incident(
        state.store.clone(),
        incident,
        language,
        request.enable_tts,
    );
    legal_pipeline(state.llm.clone(), state.tts.clone())
        .run(&mut ctx)
        .await?;

    let analysis = ctx
        .analysis
        .as_ref()
        .ok_or_else(|| Error::Internal("legal pipeline produced no analysis".into()))?;

    let mut body = json!({
        "success": true,
        "incident_narrative": narrative,
        "legal_analysis": analysis,
        "timestamp": now_iso(),
    });
    attach_audio(
        &mut body,
        &mut ctx,
        Some("Text-to-speech audio of the legal summary"),
    );
    Ok(Json(body).into_response())
}

/// POST /api/transcribe (multipart: audio file, language, enableTTS)
async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    metrics::counter!("api_requests_total", "endpoint" => "transcribe").increment(1);

    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut language = Language::Auto;
    let mut enable_tts = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("failed to read audio field: {e}")))?;
                upload = Some((file_name, bytes.to_vec()));
            }
            "language" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::Validation(format!("failed to read language field: {e}")))?;
                language = language_from_key(&text);
            }
            "enableTTS" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::Validation(format!("failed to read enableTTS field: {e}")))?;
                enable_tts = parse_bool_field(&text);
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Err(Error::Validation("No audio file uploaded".into()).into());
    };

    // Rejected before any upstream call is made
    let limit = state.settings.limits.max_upload_bytes;
    if bytes.len() as u64 > limit {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "Audio file too large",
                "details": format!("Uploads are limited to {limit} bytes"),
            })),
        )
            .into_response());
    }

    let file_size = bytes.len();
    let mut ctx = PipelineContext::for_audio(state.store.clone(), bytes, language, enable_tts);
    transcribe_pipeline(state.stt.clone(), state.llm.clone(), state.tts.clone())
        .run(&mut ctx)
        .await?;

    let transcript = ctx
        .transcript
        .as_ref()
        .ok_or_else(|| Error::Internal("transcribe pipeline produced no transcript".into()))?;

    let mut body = json!({
        "success": true,
        "transcription": transcript.text,
        "language": language.display_label(),
        "languageCode": language.key(),
        "fileName": file_name,
        "fileSize": file_size,
        "analysis": ctx.completion,
        "timestamp": now_iso(),
    });
    attach_audio(&mut body, &mut ctx, None);
    Ok(Json(body).into_response())
}

/// GET /audio/:file_name
async fn serve_audio(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Response {
    match state.store.open(&file_name) {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, content_type_for(&file_name))],
            bytes,
        )
            .into_response(),
        Err(err) => {
            tracing::debug!(file = %file_name, error = %err, "audio artifact lookup failed");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "error": "Audio file not found" })),
            )
                .into_response()
        }
    }
}

/// GET /
async fn service_info() -> Json<Value> {
    Json(json!({
        "message": "Legal voice assistant API is running",
        "status": "active",
        "endpoints": {
            "transcribe": {
                "path": "/api/transcribe",
                "method": "POST",
                "description": "Upload audio, transcribe, and get AI analysis",
                "accepts": "multipart/form-data (audio file + language)",
            },
            "chat": {
                "path": "/api/chat",
                "method": "POST",
                "description": "Send text question and get AI response",
                "accepts": "application/json (question + language)",
            },
            "legal": {
                "path": "/api/legal",
                "method": "POST",
                "description": "Analyze a legal incident and get structured provisions",
                "accepts": "application/json (narrative + incident details)",
            },
        },
        "supportedLanguages": [
            "English",
            "Hindi (हिन्दी)",
            "Tamil (தமிழ்)",
            "Auto-detect",
        ],
        "timestamp": now_iso(),
    }))
}

/// GET /health
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Route not found" })),
    )
        .into_response()
}

/// Add the audio envelope when synthesis produced a file. Attaching detaches
/// the file from request cleanup so the client can fetch it afterwards; the
/// TTL sweeper collects it later.
fn attach_audio(body: &mut Value, ctx: &mut PipelineContext, description: Option<&str>) {
    if let Some(artifact) = &ctx.synthesized {
        let mut audio = json!({
            "fileName": artifact.file_name,
            "url": format!("/audio/{}", artifact.file_name),
        });
        if let Some(text) = description {
            audio["description"] = json!(text);
        }
        body["audio"] = audio;
        ctx.artifacts.keep(&artifact.file_name);
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Map the multipart language key onto the vocabulary, unknown keys fall
/// back to auto-detection
fn language_from_key(key: &str) -> Language {
    match key.trim().to_ascii_lowercase().as_str() {
        "english" => Language::English,
        "hindi" => Language::Hindi,
        "tamil" => Language::Tamil,
        _ => Language::Auto,
    }
}

/// Form fields carry booleans as text; accept "true"/"1" case-insensitively
fn parse_bool_field(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

/// Clients sometimes send scalars where lists belong; coerce anything that
/// is not an array of strings to an empty list instead of rejecting
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    })
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_key_parsing() {
        assert_eq!(language_from_key("English"), Language::English);
        assert_eq!(language_from_key(" hindi "), Language::Hindi);
        assert_eq!(language_from_key("tamil"), Language::Tamil);
        assert_eq!(language_from_key("klingon"), Language::Auto);
        assert_eq!(language_from_key(""), Language::Auto);
    }

    #[test]
    fn test_bool_field_coercion() {
        assert!(parse_bool_field("true"));
        assert!(parse_bool_field("TRUE"));
        assert!(parse_bool_field("1"));
        assert!(!parse_bool_field("false"));
        assert!(!parse_bool_field("yes"));
        assert!(!parse_bool_field(""));
    }

    #[test]
    fn test_lenient_lists_coerce_scalars_to_empty() {
        let request: LegalRequest = serde_json::from_value(json!({
            "narrative": "Phone stolen",
            "known_sections_or_acts": "IPC 379",
            "key_entities": ["thief"],
            "evidence_available": 42,
        }))
        .unwrap();
        assert!(request.known_sections_or_acts.is_empty());
        assert_eq!(request.key_entities, vec!["thief".to_string()]);
        assert!(request.evidence_available.is_empty());
        assert!(request.aggravating_factors.is_empty());
    }

    #[test]
    fn test_enable_tts_rename() {
        let request: ChatRequest =
            serde_json::from_value(json!({ "question": "hi", "enableTTS": true })).unwrap();
        assert!(request.enable_tts);

        let request: ChatRequest = serde_json::from_value(json!({ "question": "hi" })).unwrap();
        assert!(!request.enable_tts);
    }

    #[test]
    fn test_message_is_an_alias_for_question() {
        let request: ChatRequest =
            serde_json::from_value(json!({ "message": "Explain recursion" })).unwrap();
        assert_eq!(request.question().as_deref(), Some("Explain recursion"));

        let request: ChatRequest = serde_json::from_value(json!({
            "question": "preferred",
            "message": "ignored"
        }))
        .unwrap();
        assert_eq!(request.question().as_deref(), Some("preferred"));

        let request: ChatRequest = serde_json::from_value(json!({ "message": "  " })).unwrap();
        assert!(request.question().is_none());
    }

    #[test]
    fn test_content_type_lookup() {
        assert_eq!(content_type_for("a.flac"), "audio/flac");
        assert_eq!(content_type_for("a.wav"), "audio/wav");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
