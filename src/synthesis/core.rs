/*!
 * Core speech service implementation.
 *
 * This module contains the SpeechService struct, which runs one request
 * through segmentation, synthesis, stitching, caption grouping and SRT
 * serialization, and owns the request-level policies around that pipeline.
 */

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app_config::{Config, EngineProvider};
use crate::errors::PipelineError;
use crate::providers::SpeechEngine;
use crate::providers::http::HttpEngine;
use crate::providers::mock::MockEngine;
use crate::subtitle_processor::{serialize_srt, Caption};
use super::grouping::{group_captions, GroupingRules};
use super::stitcher::{TimelineStitcher, VoiceSettings};

/// Facts about one run, reported alongside the artifacts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputMetadata {
    pub request_id: String,
    pub voice: String,
    pub segments: usize,
    pub fallback_segments: usize,
    pub captions: usize,
    /// The captions are a placeholder because nothing else was produced
    pub placeholder: bool,
}

/// Final artifacts of one request
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub audio: Bytes,
    pub subtitle_text: String,
    pub captions: Vec<Caption>,
    pub metadata: OutputMetadata,
}

/// Base64 response envelope for HTTP-style consumers
#[derive(Debug, Serialize)]
pub struct ResponseEnvelope<'a> {
    pub status: &'static str,
    pub data: EnvelopeData<'a>,
}

#[derive(Debug, Serialize)]
pub struct EnvelopeData<'a> {
    pub audio_base64: String,
    pub srt_base64: String,
    pub metadata: &'a OutputMetadata,
}

impl PipelineOutput {
    pub fn envelope(&self) -> ResponseEnvelope<'_> {
        ResponseEnvelope {
            status: "success",
            data: EnvelopeData {
                audio_base64: STANDARD.encode(&self.audio),
                srt_base64: STANDARD.encode(self.subtitle_text.as_bytes()),
                metadata: &self.metadata,
            },
        }
    }
}

/// Main speech service for text-to-captioned-audio synthesis
pub struct SpeechService {
    /// Engine implementation
    engine: Box<dyn SpeechEngine>,

    /// Configuration for the service
    pub config: Config,
}

impl SpeechService {
    /// Create a new speech service with the engine named in the configuration
    pub fn new(config: Config) -> Result<Self> {
        let engine: Box<dyn SpeechEngine> = match config.engine.provider {
            EngineProvider::Http => Box::new(HttpEngine::new(
                config.engine.endpoint.clone(),
                config.engine.timeout_secs,
            )),
            EngineProvider::Mock => Box::new(MockEngine::working()),
        };

        Ok(Self::with_engine(engine, config))
    }

    /// Create a speech service around an existing engine
    pub fn with_engine(engine: Box<dyn SpeechEngine>, config: Config) -> Self {
        Self { engine, config }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Caption grouping rules from the pipeline configuration
    pub fn grouping_rules(&self) -> GroupingRules {
        GroupingRules {
            max_words: self.config.pipeline.max_words_per_caption,
            min_words_before_break: self.config.pipeline.min_words_before_sentence_break,
        }
    }

    /// Synthesize `text` into audio and SRT captions.
    ///
    /// Fails as a whole when any segment fails; there is no partial output.
    pub async fn synthesize<F>(
        &self,
        text: &str,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<PipelineOutput, PipelineError>
    where
        F: Fn(usize, usize),
    {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let request_id = Uuid::new_v4().to_string();
        let voice = VoiceSettings::from_config(&self.config.voice);
        let start_time = Instant::now();
        info!(
            "[{}] Synthesizing {} chars with {} voice {}",
            request_id,
            text.chars().count(),
            self.engine.name(),
            voice.voice
        );

        let timeline = TimelineStitcher::new(self.engine.as_ref(), &self.config.pipeline)
            .run(text, &voice, cancel, on_progress)
            .await?;

        let segments = timeline.segment_count();
        let fallback_segments = timeline.fallback_segments();
        let (audio, events) = timeline.into_parts();

        let mut captions = group_captions(&events, self.grouping_rules());
        let placeholder = captions.is_empty();
        if placeholder {
            warn!("[{}] No captions produced, substituting a placeholder", request_id);
            captions.push(Caption::placeholder(
                text,
                self.config.pipeline.max_words_per_caption,
                self.config.output.placeholder_duration_ticks,
            ));
        }
        let subtitle_text = serialize_srt(&captions);

        info!(
            "[{}] Done in {:.1}s: {} segments ({} estimated), {} captions, {} bytes of audio",
            request_id,
            start_time.elapsed().as_secs_f64(),
            segments,
            fallback_segments,
            captions.len(),
            audio.len()
        );

        Ok(PipelineOutput {
            audio,
            subtitle_text,
            metadata: OutputMetadata {
                request_id,
                voice: voice.voice,
                segments,
                fallback_segments,
                captions: captions.len(),
                placeholder,
            },
            captions,
        })
    }
}
