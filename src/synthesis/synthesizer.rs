/*!
 * Per-segment synthesis with retry.
 *
 * One engine call is collected into audio plus segment-relative word events.
 * Two retry policies apply:
 * - audio without timing is retried, and when every attempt lacks timing the
 *   last audio is returned with no events so the timeline can estimate them;
 * - retryable engine errors are retried, and surface once attempts run out.
 *
 * Audio from an earlier attempt always beats a later error.
 */

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use log::{debug, error, warn};
use std::time::Duration;

use crate::app_config::PipelineConfig;
use crate::errors::EngineError;
use crate::providers::{SpeechEngine, StreamChunk, SynthesisRequest};
use super::timeline::WordEvent;

/// Upper bound on the backoff doubling
const MAX_BACKOFF_DOUBLINGS: u32 = 5;

/// How often and how patiently a segment is retried
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_retries, Duration::from_millis(config.retry_delay_ms))
    }

    /// Delay before retry number `retry` (zero-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .checked_mul(2u32.pow(retry.min(MAX_BACKOFF_DOUBLINGS)))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Audio and segment-relative timing of one segment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SynthesisResult {
    pub audio: Bytes,
    pub events: Vec<WordEvent>,
}

impl SynthesisResult {
    pub fn has_timing(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Invokes the engine for one segment under a retry policy
pub struct SegmentSynthesizer<'a> {
    engine: &'a dyn SpeechEngine,
    policy: RetryPolicy,
}

impl<'a> SegmentSynthesizer<'a> {
    pub fn new(engine: &'a dyn SpeechEngine, policy: RetryPolicy) -> Self {
        Self { engine, policy }
    }

    /// Synthesize one segment, retrying missing timing and transient errors
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult, EngineError> {
        let attempts = self.policy.max_retries.saturating_add(1);
        let mut audio_only: Option<SynthesisResult> = None;
        let mut last_error = EngineError::NoAudio;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.delay_for(attempt - 2)).await;
            }

            match self.collect_once(request).await {
                Ok(result) if result.has_timing() => {
                    debug!(
                        "{} returned {} bytes and {} words on attempt {}",
                        self.engine.name(), result.audio.len(), result.events.len(), attempt
                    );
                    return Ok(result);
                }
                Ok(result) => {
                    warn!(
                        "Audio without word timing ({} bytes), attempt {}/{}",
                        result.audio.len(), attempt, attempts
                    );
                    audio_only = Some(result);
                }
                Err(e) if e.is_retryable() => {
                    warn!("Engine attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                }
                Err(e) => {
                    if let Some(result) = audio_only {
                        warn!("Engine refused retry ({}), keeping earlier audio for estimated timing", e);
                        return Ok(result);
                    }
                    error!("Engine refused segment: {}", e);
                    return Err(e);
                }
            }
        }

        match audio_only {
            Some(result) => {
                warn!("No word timing after {} attempts, keeping audio for estimated timing", attempts);
                Ok(result)
            }
            None => {
                error!("Segment failed after {} attempts: {}", attempts, last_error);
                Err(last_error)
            }
        }
    }

    /// Run one engine call and drain its stream
    async fn collect_once(&self, request: &SynthesisRequest) -> Result<SynthesisResult, EngineError> {
        let mut stream = self.engine.stream_synthesize(request.clone()).await?;
        let mut audio = BytesMut::new();
        let mut events = Vec::new();

        while let Some(chunk) = stream.next().await {
            match chunk? {
                StreamChunk::Audio(data) => audio.extend_from_slice(&data),
                StreamChunk::WordBoundary { offset, duration, text } => {
                    events.push(WordEvent::new(offset, duration, text));
                }
            }
        }

        if audio.is_empty() {
            return Err(EngineError::NoAudio);
        }

        Ok(SynthesisResult {
            audio: audio.freeze(),
            events,
        })
    }
}
