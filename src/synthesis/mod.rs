/*!
 * Speech synthesis pipeline with word-level caption timing.
 *
 * This module turns text into one audio stream plus SRT captions. It is
 * split into several submodules:
 *
 * - `core`: Service definition and request-level policies
 * - `segmenter`: Sentence-aware splitting into engine-sized segments
 * - `synthesizer`: One engine call per segment, with retry
 * - `stitcher`: Sequential synthesis onto one global timeline
 * - `timeline`: Word events, tick arithmetic and duration estimates
 * - `grouping`: Folding word events into multi-word captions
 */

// Re-export main types for easier usage
pub use self::core::{OutputMetadata, PipelineOutput, ResponseEnvelope, SpeechService};
pub use self::grouping::{group_captions, GroupingRules};
pub use self::segmenter::{segment_text, Segment};
pub use self::stitcher::{TimelineStitcher, VoiceSettings};
pub use self::synthesizer::{RetryPolicy, SegmentSynthesizer, SynthesisResult};
pub use self::timeline::{GlobalTimeline, Ticks, WordEvent};

// Submodules
pub mod core;
pub mod grouping;
pub mod segmenter;
pub mod stitcher;
pub mod synthesizer;
pub mod timeline;
