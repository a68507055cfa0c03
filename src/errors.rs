/*!
 * Error types for the speechsub application.
 *
 * This module contains custom error types for the different layers of the
 * application, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised by a speech engine while synthesizing one request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The request never reached the engine or the connection dropped mid-stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// The engine answered with data that could not be decoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error returned by the engine itself
    #[error("Engine responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the engine
        message: String,
    },

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The engine refused the request (unknown voice, malformed adjustment, ...)
    #[error("Invalid synthesis request: {0}")]
    InvalidRequest(String),

    /// The stream completed without a single audio chunk
    #[error("No audio received from engine")]
    NoAudio,
}

impl EngineError {
    /// Whether another attempt may succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Protocol(_) | Self::RateLimited(_) | Self::NoAudio => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || matches!(*status_code, 408 | 425),
            Self::InvalidRequest(_) => false,
        }
    }
}

/// Errors that abort a whole synthesis run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A segment failed after its retries were exhausted
    #[error("Segment {segment} failed: {source}")]
    Engine {
        /// Zero-based index of the failing segment
        segment: usize,
        #[source]
        source: EngineError,
    },

    /// The caller cancelled the run between segments
    #[error("Synthesis cancelled after {completed} of {total} segments")]
    Cancelled {
        completed: usize,
        total: usize,
    },

    /// The input holds no speakable text
    #[error("Input text is empty")]
    EmptyInput,
}

impl PipelineError {
    /// The engine error behind this failure, if any
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::Engine { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the speech engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Error from a synthesis run
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
