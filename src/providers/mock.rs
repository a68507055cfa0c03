/*!
 * Mock speech engine for offline runs and testing.
 *
 * The engine "speaks" each word as a tiny audio chunk followed by its
 * WordBoundary event (100 ms per character, 50 ms pause between words).
 * Behaviours simulate the failure modes seen from real engines:
 * - `MockEngine::working()` - Always returns audio with timing
 * - `MockEngine::audio_only()` - Returns audio but never any timing
 * - `MockEngine::missing_timing_for(n)` - First n calls lack timing
 * - `MockEngine::intermittent(n)` - Every nth call fails with a transport error
 * - `MockEngine::failing()` - Always fails with a transport error
 * - `MockEngine::rejecting()` - Refuses every request as invalid
 * - `MockEngine::interrupted()` - Stream breaks after the first audio chunk
 */

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::EngineError;
use crate::providers::{ChunkStream, SpeechEngine, StreamChunk, SynthesisRequest};

/// Simulated speaking time per character, in ticks
pub const MOCK_TICKS_PER_CHAR: u64 = 1_000_000;

/// Simulated pause between words, in ticks
pub const MOCK_WORD_PAUSE_TICKS: u64 = 500_000;

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Audio and timing for every call
    Working,
    /// Audio without WordBoundary events for every call
    AudioOnly,
    /// The first `attempts` calls lack timing, later calls are complete
    MissingTimingFor { attempts: usize },
    /// Every `fail_every`th call fails with a transport error
    Intermittent { fail_every: usize },
    /// Every call fails with a transport error
    Failing,
    /// Every call is refused as invalid
    Rejecting,
    /// The stream yields one audio chunk, then breaks
    Interrupted,
}

/// Mock engine for testing synthesis behavior
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<SynthesisRequest>>>,
}

impl MockEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn audio_only() -> Self {
        Self::new(MockBehavior::AudioOnly)
    }

    pub fn missing_timing_for(attempts: usize) -> Self {
        Self::new(MockBehavior::MissingTimingFor { attempts })
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    pub fn interrupted() -> Self {
        Self::new(MockBehavior::Interrupted)
    }

    /// Number of synthesis calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of the requests received so far
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// The chunks a complete synthesis of `text` produces
    pub fn spoken_chunks(text: &str, with_timing: bool) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();
        let mut cursor = 0;
        for word in text.split_whitespace() {
            let duration = word.chars().count() as u64 * MOCK_TICKS_PER_CHAR;
            chunks.push(StreamChunk::Audio(Bytes::from(format!("[{}]", word))));
            if with_timing {
                chunks.push(StreamChunk::WordBoundary {
                    offset: cursor,
                    duration,
                    text: word.to_string(),
                });
            }
            cursor += duration + MOCK_WORD_PAUSE_TICKS;
        }
        chunks
    }

    fn stream_of(chunks: Vec<StreamChunk>) -> ChunkStream {
        stream::iter(chunks.into_iter().map(Ok)).boxed()
    }
}

#[async_trait]
impl SpeechEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stream_synthesize(&self, request: SynthesisRequest) -> Result<ChunkStream, EngineError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.behavior {
            MockBehavior::Working => Ok(Self::stream_of(Self::spoken_chunks(&request.text, true))),

            MockBehavior::AudioOnly => Ok(Self::stream_of(Self::spoken_chunks(&request.text, false))),

            MockBehavior::MissingTimingFor { attempts } => {
                let with_timing = count >= attempts;
                Ok(Self::stream_of(Self::spoken_chunks(&request.text, with_timing)))
            }

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(EngineError::Transport("Simulated intermittent failure".to_string()))
                } else {
                    Ok(Self::stream_of(Self::spoken_chunks(&request.text, true)))
                }
            }

            MockBehavior::Failing => Err(EngineError::Transport("Simulated engine outage".to_string())),

            MockBehavior::Rejecting => Err(EngineError::InvalidRequest(format!("Unknown voice: {}", request.voice))),

            MockBehavior::Interrupted => {
                let items = vec![
                    Ok(StreamChunk::Audio(Bytes::from_static(b"[partial]"))),
                    Err(EngineError::Transport("Connection closed mid-stream".to_string())),
                ];
                Ok(stream::iter(items).boxed())
            }
        }
    }
}
