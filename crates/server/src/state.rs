//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use nyaya_audio::TransientAudioStore;
use nyaya_config::Settings;
use nyaya_core::{CompletionModel, Result, SpeechSynthesizer, SpeechToText};
use nyaya_llm::{ChatCompletionBackend, CompletionConfig};
use nyaya_pipeline::{HttpSynthesizer, HttpTranscriber, SynthesizerConfig, TranscriberConfig};

/// Shared application state handed to every handler.
///
/// Upstream services hide behind trait objects so tests can swap in stub
/// backends without touching the router.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<TransientAudioStore>,
    pub stt: Arc<dyn SpeechToText>,
    pub llm: Arc<dyn CompletionModel>,
    pub tts: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    /// Wire the production backends from settings
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let store = Arc::new(TransientAudioStore::new(settings.storage.dir.clone())?);
        let timeout = Duration::from_secs(settings.server.timeout_seconds);

        let stt = HttpTranscriber::new(TranscriberConfig {
            url: settings.upstream.stt_url.clone(),
            model: settings.upstream.stt_model.clone(),
            api_key: settings.upstream.api_key.clone(),
            timeout,
        })?;

        let llm = ChatCompletionBackend::new(CompletionConfig {
            endpoint: settings.upstream.llm_endpoint.clone(),
            model: settings.upstream.llm_model.clone(),
            api_key: settings.upstream.api_key.clone(),
            timeout,
        })?;

        let tts = HttpSynthesizer::new(
            SynthesizerConfig {
                url: settings.upstream.tts_url.clone(),
                model: settings.upstream.tts_model.clone(),
                api_key: settings.upstream.api_key.clone(),
                timeout,
            },
            store.clone(),
        )?;

        Ok(Self {
            settings: Arc::new(settings),
            store,
            stt: Arc::new(stt),
            llm: Arc::new(llm),
            tts: Arc::new(tts),
        })
    }

    /// Assemble state from pre-built backends. Used by tests.
    pub fn with_backends(
        settings: Settings,
        store: Arc<TransientAudioStore>,
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn CompletionModel>,
        tts: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
            stt,
            llm,
            tts,
        }
    }
}
