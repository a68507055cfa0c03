/*!
 * Speech engine implementations.
 *
 * This module contains client implementations for text-to-speech engines:
 * - Http: streaming HTTP bridge to the engine
 * - Mock: offline engine with scripted behaviours
 */

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt::Debug;

use crate::errors::EngineError;

/// One item of an engine's synthesis stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// A piece of encoded audio
    Audio(Bytes),
    /// Timing of one spoken word, relative to the start of this request
    WordBoundary {
        offset: u64,
        duration: u64,
        text: String,
    },
}

/// Lazily consumed, finite sequence of chunks for one synthesis call
pub type ChunkStream = BoxStream<'static, Result<StreamChunk, EngineError>>;

/// What the engine is asked to speak
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    /// `None` means no adjustment; neutral values are never forwarded
    pub rate: Option<String>,
    pub pitch: Option<String>,
}

/// Common trait for all speech engines
///
/// This trait defines the streaming call contract the synthesis pipeline
/// relies on, allowing engines to be used interchangeably.
#[async_trait]
pub trait SpeechEngine: Send + Sync + Debug {
    /// Short engine name for logs
    fn name(&self) -> &str;

    /// Start synthesizing a request
    ///
    /// # Arguments
    /// * `request` - The text and voice settings to synthesize
    ///
    /// # Returns
    /// * `Result<ChunkStream, EngineError>` - The chunk stream, or an error if the call could not start
    async fn stream_synthesize(&self, request: SynthesisRequest) -> Result<ChunkStream, EngineError>;
}

pub mod http;
pub mod mock;
