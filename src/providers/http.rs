use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io;
use std::time::Duration;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;

use crate::errors::EngineError;
use crate::providers::{ChunkStream, SpeechEngine, StreamChunk, SynthesisRequest};

/// Longest response line accepted from the bridge
const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Client for an engine bridge that streams newline-delimited JSON chunks
#[derive(Debug, Clone)]
pub struct HttpEngine {
    /// Base URL of the engine bridge
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Synthesis request body
#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    text: &'a str,
    voice: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pitch: Option<&'a str>,
}

/// One line of the response stream
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum WireChunk {
    #[serde(rename = "audio")]
    Audio { data: String },
    WordBoundary {
        offset: u64,
        duration: u64,
        text: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
    /// SentenceBoundary, metadata and anything else the bridge forwards
    #[serde(other)]
    Other,
}

impl HttpEngine {
    /// Create a new client for the bridge at `base_url`
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn classify_status(status: StatusCode, body: String) -> EngineError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            EngineError::RateLimited(body)
        } else if status == StatusCode::REQUEST_TIMEOUT || status.as_u16() == 425 {
            // Transient; retried like a server error
            EngineError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }
        } else if status.is_client_error() {
            EngineError::InvalidRequest(format!("{} - {}", status.as_u16(), body))
        } else {
            EngineError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }
        }
    }
}

#[async_trait]
impl SpeechEngine for HttpEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn stream_synthesize(&self, request: SynthesisRequest) -> Result<ChunkStream, EngineError> {
        let url = format!("{}/synthesize", self.base_url);
        let body = WireRequest {
            text: &request.text,
            voice: &request.voice,
            rate: request.rate.as_deref(),
            pitch: request.pitch.as_deref(),
        };

        let response = self.client.post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("Failed to reach engine at {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Engine returned {} for voice {}: {}", status, request.voice, text);
            return Err(Self::classify_status(status, text));
        }

        Ok(decode_stream(response.bytes_stream()))
    }
}

/// Turn one response line into a chunk. Blank lines and unknown chunk
/// types yield `None`.
pub fn decode_line(line: &str) -> Result<Option<StreamChunk>, EngineError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let chunk: WireChunk = serde_json::from_str(line)
        .map_err(|e| EngineError::Protocol(format!("Malformed chunk: {}", e)))?;

    match chunk {
        WireChunk::Audio { data } => {
            let audio = STANDARD.decode(data.as_bytes())
                .map_err(|e| EngineError::Protocol(format!("Invalid audio payload: {}", e)))?;
            Ok(Some(StreamChunk::Audio(Bytes::from(audio))))
        }
        WireChunk::WordBoundary { offset, duration, text } => {
            Ok(Some(StreamChunk::WordBoundary { offset, duration, text }))
        }
        WireChunk::Error { message } => Err(EngineError::Protocol(message)),
        WireChunk::Other => {
            debug!("Skipping unhandled chunk: {}", line);
            Ok(None)
        }
    }
}

/// Lazily decode a streamed response body into chunks
pub fn decode_stream<S, E>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display,
{
    decode_stream_with_limit(body, MAX_LINE_BYTES)
}

fn decode_stream_with_limit<S, E>(body: S, max_line_bytes: usize) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display,
{
    let reader = StreamReader::new(body.map(|item| item.map_err(|e| io::Error::other(e.to_string()))));

    FramedRead::new(reader, LinesCodec::new_with_max_length(max_line_bytes))
        .filter_map(|line| async move {
            match line {
                Ok(line) => decode_line(&line).transpose(),
                Err(e) => Some(Err(framing_error(e))),
            }
        })
        .boxed()
}

fn framing_error(error: LinesCodecError) -> EngineError {
    match error {
        LinesCodecError::MaxLineLengthExceeded => {
            EngineError::Protocol("Chunk exceeds the maximum line length".to_string())
        }
        LinesCodecError::Io(e) if e.kind() == io::ErrorKind::InvalidData => {
            EngineError::Protocol(format!("Chunk is not UTF-8: {}", e))
        }
        LinesCodecError::Io(e) => EngineError::Transport(format!("Stream interrupted: {}", e)),
    }
}
