/*!
 * # speechsub - Speech synthesis with word-timed subtitles
 *
 * A Rust library that turns text into narrated audio plus SRT captions
 * whose timing follows the words the engine actually spoke.
 *
 * ## Features
 *
 * - Sentence-aware segmentation sized for streaming TTS engines
 * - Per-segment synthesis with retry on missing timing and transient errors
 * - One continuous timeline across segments, with estimated timing when
 *   an engine never reports word boundaries
 * - Multi-word caption grouping and SRT output
 * - Pluggable engines:
 *   - Streaming HTTP bridge (newline-delimited JSON)
 *   - Offline mock engine
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Caption model and SRT reading/writing
 * - `synthesis`: The synthesis pipeline:
 *   - `synthesis::segmenter`: Text segmentation
 *   - `synthesis::synthesizer`: Per-segment synthesis with retry
 *   - `synthesis::stitcher`: Global timeline assembly
 *   - `synthesis::grouping`: Caption grouping
 *   - `synthesis::core`: Service definition
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `providers`: Speech engine implementations:
 *   - `providers::http`: Streaming HTTP engine client
 *   - `providers::mock`: Mock engine
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod subtitle_processor;
pub mod synthesis;
pub mod app_controller;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use subtitle_processor::{Caption, format_timestamp, parse_srt_string, serialize_srt};
pub use synthesis::{PipelineOutput, SpeechService};
pub use providers::{SpeechEngine, StreamChunk, SynthesisRequest};
pub use errors::{AppError, EngineError, PipelineError};
