//! Per-endpoint pipeline definitions
//!
//! One orchestrator, three stage lists. The chat flow never touches audio
//! input; the transcription flow prepends normalization and transcription;
//! the legal flow swaps the prompt builder and adds structured parsing and
//! the spoken summary.

use std::sync::Arc;

use nyaya_core::{CompletionModel, CompletionOptions, SpeechSynthesizer, SpeechToText};

use crate::stage::{Pipeline, Stage};
use crate::stages::{
    BuildChatPrompt, BuildLegalPrompt, BuildTranscriptPrompt, Complete, CompleteStructured,
    MaybeSynthesize, NormalizeAudio, SummarizeForSpeech, Transcribe,
};

/// Free-form chat: prompt, complete, optionally speak the answer
pub fn chat_pipeline(
    llm: Arc<dyn CompletionModel>,
    tts: Arc<dyn SpeechSynthesizer>,
) -> Pipeline {
    Pipeline::new(
        "chat",
        vec![
            Arc::new(BuildChatPrompt) as Arc<dyn Stage>,
            Arc::new(Complete {
                llm,
                options: CompletionOptions::chat(),
            }),
            Arc::new(MaybeSynthesize { tts }),
        ],
    )
}

/// Audio upload: normalize, transcribe, then answer the transcript as chat
pub fn transcribe_pipeline(
    stt: Arc<dyn SpeechToText>,
    llm: Arc<dyn CompletionModel>,
    tts: Arc<dyn SpeechSynthesizer>,
) -> Pipeline {
    Pipeline::new(
        "transcribe",
        vec![
            Arc::new(NormalizeAudio) as Arc<dyn Stage>,
            Arc::new(Transcribe { stt }),
            Arc::new(BuildTranscriptPrompt),
            Arc::new(Complete {
                llm,
                options: CompletionOptions::chat(),
            }),
            Arc::new(MaybeSynthesize { tts }),
        ],
    )
}

/// Structured legal research: legal prompt, structured completion with
/// repair, spoken summary, optional synthesis
pub fn legal_pipeline(
    llm: Arc<dyn CompletionModel>,
    tts: Arc<dyn SpeechSynthesizer>,
) -> Pipeline {
    Pipeline::new(
        "legal",
        vec![
            Arc::new(BuildLegalPrompt) as Arc<dyn Stage>,
            Arc::new(CompleteStructured {
                llm,
                options: CompletionOptions::legal(),
            }),
            Arc::new(SummarizeForSpeech),
            Arc::new(MaybeSynthesize { tts }),
        ],
    )
}

#[cfg(test)]
mod tests {
    use nyaya_audio::TransientAudioStore;
    use nyaya_core::{IncidentDetails, Language};

    use super::*;
    use crate::context::PipelineContext;
    use crate::stages::test_support::{FixedCompletion, SilentSynthesizer};

    fn store() -> Arc<TransientAudioStore> {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TransientAudioStore::new(dir.path()).unwrap());
        std::mem::forget(dir);
        store
    }

    const LEGAL_JSON: &str = r#"{
        "summary": "Theft under IPC 379.",
        "applicable_provisions": [],
        "confidence": "medium",
        "disclaimer": "Consult a lawyer"
    }"#;

    #[tokio::test]
    async fn test_chat_pipeline_end_to_end() {
        let pipeline = chat_pipeline(
            Arc::new(FixedCompletion("An FIR is a First Information Report.".into())),
            Arc::new(SilentSynthesizer),
        );
        let mut ctx =
            PipelineContext::for_text(store(), "What is an FIR?".into(), Language::English, true);

        pipeline.run(&mut ctx).await.unwrap();
        assert_eq!(
            ctx.completion.as_deref(),
            Some("An FIR is a First Information Report.")
        );
        assert!(ctx.synthesized.is_none());
    }

    #[tokio::test]
    async fn test_legal_pipeline_produces_analysis_and_speech_text() {
        let pipeline = legal_pipeline(
            Arc::new(FixedCompletion(LEGAL_JSON.into())),
            Arc::new(SilentSynthesizer),
        );
        let incident = IncidentDetails {
            narrative: "Phone stolen".into(),
            location_state: "Goa".into(),
            date_time: "2026-03-01T00:00:00Z".into(),
            known_sections_or_acts: vec![],
            key_entities: vec![],
            evidence_available: vec![],
            aggravating_factors: vec![],
            is_complaint: true,
        };
        let mut ctx = PipelineContext::for_incident(store(), incident, Language::English, true);

        pipeline.run(&mut ctx).await.unwrap();
        let analysis = ctx.analysis.as_ref().unwrap();
        assert!(!analysis.is_degraded());
        let speech = ctx.speech_text.as_deref().unwrap();
        assert!(speech.starts_with("Legal Analysis Summary:"));
    }
}
