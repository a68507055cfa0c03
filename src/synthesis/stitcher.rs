/*!
 * Sequential per-segment synthesis onto one global timeline.
 *
 * Segments are synthesized strictly one after another: each segment's start
 * depends on the cumulative duration of everything before it.
 */

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::app_config::{normalize_adjustment, PipelineConfig, VoiceConfig};
use crate::errors::PipelineError;
use crate::providers::{SpeechEngine, SynthesisRequest};
use super::segmenter::segment_text;
use super::synthesizer::{RetryPolicy, SegmentSynthesizer};
use super::timeline::GlobalTimeline;

/// Voice and engine adjustments, with neutral adjustments already dropped
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub voice: String,
    pub rate: Option<String>,
    pub pitch: Option<String>,
}

impl VoiceSettings {
    pub fn new(voice: impl Into<String>, rate: &str, pitch: &str) -> Self {
        Self {
            voice: voice.into(),
            rate: normalize_adjustment(rate),
            pitch: normalize_adjustment(pitch),
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(config.voice.trim(), &config.rate, &config.pitch)
    }

    /// Engine request speaking `text` with these settings
    pub fn request_for(&self, text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
            voice: self.voice.clone(),
            rate: self.rate.clone(),
            pitch: self.pitch.clone(),
        }
    }
}

/// Drives segmentation and synthesis, accumulating one timeline
pub struct TimelineStitcher<'a> {
    engine: &'a dyn SpeechEngine,
    config: &'a PipelineConfig,
}

impl<'a> TimelineStitcher<'a> {
    pub fn new(engine: &'a dyn SpeechEngine, config: &'a PipelineConfig) -> Self {
        Self { engine, config }
    }

    /// Synthesize `text` segment by segment.
    ///
    /// `on_progress` receives `(completed, total)` after each segment. The
    /// run stops with `PipelineError::Cancelled` as soon as `cancel` fires and
    /// with `PipelineError::Engine` when a segment fails for good; no partial
    /// timeline is returned in either case.
    pub async fn run<F>(
        &self,
        text: &str,
        voice: &VoiceSettings,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<GlobalTimeline, PipelineError>
    where
        F: Fn(usize, usize),
    {
        let segments = segment_text(text, self.config.max_segment_chars);
        let total = segments.len();
        let synthesizer = SegmentSynthesizer::new(self.engine, RetryPolicy::from_config(self.config));
        let gap = self.config.inter_segment_gap_ticks;
        let mut timeline = GlobalTimeline::new();

        for segment in &segments {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled { completed: segment.index, total });
            }

            let request = voice.request_for(&segment.text);
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(PipelineError::Cancelled { completed: segment.index, total });
                }
                result = synthesizer.synthesize(&request) => result,
            };
            let result = result.map_err(|source| PipelineError::Engine {
                segment: segment.index,
                source,
            })?;

            timeline.append_audio(&result.audio);
            if result.has_timing() {
                timeline.append_engine_events(&result.events, gap);
            } else {
                warn!(
                    "Segment {} has no word timing, estimating {} chars at {} ticks/char",
                    segment.index,
                    segment.text.chars().count(),
                    self.config.fallback_ticks_per_char
                );
                timeline.append_estimated_segment(&segment.text, self.config.fallback_ticks_per_char, gap);
            }

            debug!(
                "Segment {}/{}: {} chars, {} events so far, offset now {}",
                segment.index + 1,
                total,
                segment.text.chars().count(),
                timeline.events().len(),
                timeline.offset()
            );
            on_progress(segment.index + 1, total);
        }

        Ok(timeline)
    }
}
