//! Stage implementations shared by the three pipelines

use std::sync::Arc;

use async_trait::async_trait;

use nyaya_core::{
    CompletionModel, CompletionOptions, Error, Language, LegalAnalysis, Result, SpeechSynthesizer,
    SpeechToText,
};
use nyaya_llm::{build_chat_prompt, build_legal_prompt, build_transcript_prompt, parse_structured};

use crate::context::PipelineContext;
use crate::stage::Stage;

/// Decode and resample uploaded audio into canonical WAV
pub struct NormalizeAudio;

#[async_trait]
impl Stage for NormalizeAudio {
    fn name(&self) -> &'static str {
        "normalize_audio"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let input = ctx
            .input_audio
            .take()
            .ok_or_else(|| Error::Internal("normalize stage ran without audio input".into()))?;

        // Decoding and resampling are CPU-bound
        let wav = tokio::task::spawn_blocking(move || nyaya_audio::normalize_to_wav(&input))
            .await
            .map_err(|e| Error::Internal(format!("normalization task failed: {e}")))??;

        ctx.wav = Some(wav);
        Ok(())
    }
}

/// Transcribe the canonical WAV and adopt the transcript as the request text
pub struct Transcribe {
    pub stt: Arc<dyn SpeechToText>,
}

#[async_trait]
impl Stage for Transcribe {
    fn name(&self) -> &'static str {
        "transcribe"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let wav = ctx
            .wav
            .as_deref()
            .ok_or_else(|| Error::Internal("transcribe stage ran without WAV audio".into()))?;

        let transcript = self.stt.transcribe(wav, ctx.language).await?;
        ctx.text = Some(transcript.text.clone());
        ctx.transcript = Some(transcript);
        Ok(())
    }
}

/// Build the conversational prompt from the request text
pub struct BuildChatPrompt;

#[async_trait]
impl Stage for BuildChatPrompt {
    fn name(&self) -> &'static str {
        "build_chat_prompt"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let text = ctx
            .text
            .as_deref()
            .ok_or_else(|| Error::Internal("prompt stage ran without request text".into()))?;
        ctx.prompt = Some(build_chat_prompt(text, ctx.language));
        Ok(())
    }
}

/// Build the transcript-analysis prompt from the transcribed text
pub struct BuildTranscriptPrompt;

#[async_trait]
impl Stage for BuildTranscriptPrompt {
    fn name(&self) -> &'static str {
        "build_transcript_prompt"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let text = ctx
            .text
            .as_deref()
            .ok_or_else(|| Error::Internal("prompt stage ran without transcript".into()))?;
        ctx.prompt = Some(build_transcript_prompt(text, ctx.language));
        Ok(())
    }
}

/// Build the structured legal research prompt from the incident facts
pub struct BuildLegalPrompt;

#[async_trait]
impl Stage for BuildLegalPrompt {
    fn name(&self) -> &'static str {
        "build_legal_prompt"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let incident = ctx
            .incident
            .as_ref()
            .ok_or_else(|| Error::Internal("legal prompt stage ran without incident".into()))?;
        ctx.prompt = Some(build_legal_prompt(incident, ctx.language));
        Ok(())
    }
}

/// Invoke the completion model for a free-text answer
pub struct Complete {
    pub llm: Arc<dyn CompletionModel>,
    pub options: CompletionOptions,
}

#[async_trait]
impl Stage for Complete {
    fn name(&self) -> &'static str {
        "complete"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let prompt = ctx
            .prompt
            .as_ref()
            .ok_or_else(|| Error::Internal("completion stage ran without prompt".into()))?;
        ctx.completion = Some(self.llm.complete(prompt, &self.options).await?);
        Ok(())
    }
}

/// Invoke the completion model for structured legal output and repair it.
///
/// A warming-up upstream still propagates so the caller can retry; any
/// other completion failure degrades into a low-confidence result rather
/// than failing the request.
pub struct CompleteStructured {
    pub llm: Arc<dyn CompletionModel>,
    pub options: CompletionOptions,
}

#[async_trait]
impl Stage for CompleteStructured {
    fn name(&self) -> &'static str {
        "complete_structured"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let prompt = ctx
            .prompt
            .as_ref()
            .ok_or_else(|| Error::Internal("completion stage ran without prompt".into()))?;
        let query_type = query_type_of(ctx);

        let analysis = match self.llm.complete(prompt, &self.options).await {
            Ok(raw) => {
                let analysis = parse_structured(&raw, ctx.language, query_type);
                ctx.completion = Some(raw);
                analysis
            }
            Err(err) if err.is_retryable() => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "legal completion failed, degrading result");
                LegalAnalysis::Degraded(nyaya_core::DegradedResult::upstream_failure(
                    ctx.language,
                    query_type,
                ))
            }
        };

        ctx.analysis = Some(analysis);
        Ok(())
    }
}

fn query_type_of(ctx: &PipelineContext) -> nyaya_core::QueryType {
    match &ctx.incident {
        Some(incident) if incident.is_complaint => nyaya_core::QueryType::Complaint,
        _ => nyaya_core::QueryType::Query,
    }
}

/// Derive the spoken summary for a legal analysis
pub struct SummarizeForSpeech;

#[async_trait]
impl Stage for SummarizeForSpeech {
    fn name(&self) -> &'static str {
        "summarize_for_speech"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let analysis = ctx
            .analysis
            .as_ref()
            .ok_or_else(|| Error::Internal("speech summary ran without analysis".into()))?;
        ctx.speech_text = Some(analysis.tts_summary());
        Ok(())
    }
}

/// Synthesize speech for the response, when the caller opted in
pub struct MaybeSynthesize {
    pub tts: Arc<dyn SpeechSynthesizer>,
}

#[async_trait]
impl Stage for MaybeSynthesize {
    fn name(&self) -> &'static str {
        "synthesize"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        if !ctx.enable_tts {
            return Ok(());
        }

        let text = ctx
            .speech_text
            .as_deref()
            .or(ctx.completion.as_deref())
            .unwrap_or_default()
            .to_string();

        if let Some(artifact) = self.tts.synthesize(&text).await? {
            ctx.artifacts.track(&artifact);
            ctx.synthesized = Some(artifact);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use nyaya_core::{AudioArtifact, PromptPair, Transcript};

    /// Completion backend returning a canned string
    pub struct FixedCompletion(pub String);

    #[async_trait]
    impl CompletionModel for FixedCompletion {
        async fn complete(&self, _: &PromptPair, _: &CompletionOptions) -> Result<String> {
            Ok(self.0.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    /// Completion backend that always fails with the given status
    pub struct FailingCompletion(pub u16);

    #[async_trait]
    impl CompletionModel for FailingCompletion {
        async fn complete(&self, _: &PromptPair, _: &CompletionOptions) -> Result<String> {
            Err(Error::from_upstream_status(self.0, "unavailable".into()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    /// Transcriber returning a canned transcript
    pub struct FixedTranscriber(pub String);

    #[async_trait]
    impl SpeechToText for FixedTranscriber {
        async fn transcribe(&self, _: &[u8], _: Language) -> Result<Transcript> {
            Ok(Transcript::from_text(self.0.clone()))
        }

        fn model_name(&self) -> &str {
            "fixed-stt"
        }
    }

    /// Synthesizer that records what it was asked to speak and declines
    pub struct SilentSynthesizer;

    #[async_trait]
    impl SpeechSynthesizer for SilentSynthesizer {
        async fn synthesize(&self, _: &str) -> Result<Option<AudioArtifact>> {
            Ok(None)
        }

        fn model_name(&self) -> &str {
            "silent"
        }
    }
}

#[cfg(test)]
mod tests {
    use nyaya_audio::TransientAudioStore;
    use nyaya_core::{Confidence, IncidentDetails, QueryType};

    use super::test_support::*;
    use super::*;
    use crate::context::PipelineContext;

    fn store() -> Arc<TransientAudioStore> {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TransientAudioStore::new(dir.path()).unwrap());
        std::mem::forget(dir);
        store
    }

    fn incident(is_complaint: bool) -> IncidentDetails {
        IncidentDetails {
            narrative: "My phone was stolen".into(),
            location_state: "Kerala".into(),
            date_time: "2026-02-01T09:00:00Z".into(),
            known_sections_or_acts: vec![],
            key_entities: vec![],
            evidence_available: vec![],
            aggravating_factors: vec![],
            is_complaint,
        }
    }

    #[tokio::test]
    async fn test_chat_prompt_then_complete() {
        let mut ctx =
            PipelineContext::for_text(store(), "What is bail?".into(), Language::English, false);

        BuildChatPrompt.run(&mut ctx).await.unwrap();
        assert!(ctx.prompt.is_some());

        let complete = Complete {
            llm: Arc::new(FixedCompletion("Bail is...".into())),
            options: CompletionOptions::chat(),
        };
        complete.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.completion.as_deref(), Some("Bail is..."));
    }

    #[tokio::test]
    async fn test_transcribe_adopts_text() {
        let mut ctx = PipelineContext::for_audio(store(), vec![0u8; 4], Language::Auto, false);
        ctx.wav = Some(vec![0u8; 4]);

        let stage = Transcribe {
            stt: Arc::new(FixedTranscriber("spoken words".into())),
        };
        stage.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.text.as_deref(), Some("spoken words"));
        assert_eq!(ctx.transcript.as_ref().unwrap().text, "spoken words");
    }

    #[tokio::test]
    async fn test_structured_completion_degrades_on_upstream_error() {
        let mut ctx = PipelineContext::for_incident(store(), incident(true), Language::Hindi, false);
        BuildLegalPrompt.run(&mut ctx).await.unwrap();

        let stage = CompleteStructured {
            llm: Arc::new(FailingCompletion(500)),
            options: CompletionOptions::legal(),
        };
        stage.run(&mut ctx).await.unwrap();

        let analysis = ctx.analysis.unwrap();
        assert!(analysis.is_degraded());
        assert_eq!(analysis.confidence(), Confidence::Low);
        match analysis {
            LegalAnalysis::Degraded(d) => {
                assert_eq!(d.query_type, QueryType::Complaint);
                assert_eq!(d.response_language, "hindi");
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_structured_completion_propagates_warming_upstream() {
        let mut ctx = PipelineContext::for_incident(store(), incident(false), Language::Auto, false);
        BuildLegalPrompt.run(&mut ctx).await.unwrap();

        let stage = CompleteStructured {
            llm: Arc::new(FailingCompletion(503)),
            options: CompletionOptions::legal(),
        };
        let err = stage.run(&mut ctx).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(ctx.analysis.is_none());
    }

    /// Synthesizer that writes a real file into the store
    struct StoringSynthesizer(Arc<TransientAudioStore>);

    #[async_trait]
    impl SpeechSynthesizer for StoringSynthesizer {
        async fn synthesize(&self, _: &str) -> Result<Option<nyaya_core::AudioArtifact>> {
            let artifact =
                self.0
                    .store(b"flac bytes", "flac", nyaya_core::AudioFormat::unknown())?;
            Ok(Some(artifact))
        }

        fn model_name(&self) -> &str {
            "storing"
        }
    }

    #[tokio::test]
    async fn test_synthesized_audio_released_when_context_drops() {
        let store = store();
        let mut ctx = PipelineContext::for_text(store.clone(), "hi".into(), Language::English, true);
        ctx.completion = Some("answer".into());

        let stage = MaybeSynthesize {
            tts: Arc::new(StoringSynthesizer(store.clone())),
        };
        stage.run(&mut ctx).await.unwrap();

        let file_name = ctx.synthesized.as_ref().unwrap().file_name.clone();
        assert!(store.open(&file_name).is_ok());

        // The request ended without the file being attached to a response
        drop(ctx);
        assert!(store.open(&file_name).is_err());
    }

    #[tokio::test]
    async fn test_kept_synthesized_audio_survives_context_drop() {
        let store = store();
        let mut ctx = PipelineContext::for_text(store.clone(), "hi".into(), Language::English, true);
        ctx.completion = Some("answer".into());

        let stage = MaybeSynthesize {
            tts: Arc::new(StoringSynthesizer(store.clone())),
        };
        stage.run(&mut ctx).await.unwrap();

        let file_name = ctx.synthesized.as_ref().unwrap().file_name.clone();
        ctx.artifacts.keep(&file_name);

        drop(ctx);
        assert!(store.open(&file_name).is_ok());
    }

    #[tokio::test]
    async fn test_synthesize_skipped_when_disabled() {
        let mut ctx = PipelineContext::for_text(store(), "hi".into(), Language::Auto, false);
        ctx.completion = Some("answer".into());

        let stage = MaybeSynthesize {
            tts: Arc::new(SilentSynthesizer),
        };
        stage.run(&mut ctx).await.unwrap();
        assert!(ctx.synthesized.is_none());
    }
}
