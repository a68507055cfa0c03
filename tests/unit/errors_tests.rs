/*!
 * Tests for error types and conversions
 */

use std::error::Error;

use speechsub::errors::{AppError, EngineError, PipelineError};

#[test]
fn test_engineError_apiError_shouldDisplayStatusAndMessage() {
    let error = EngineError::ApiError {
        status_code: 503,
        message: "Engine overloaded".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("503"));
    assert!(display.contains("Engine overloaded"));
}

#[test]
fn test_engineError_isRetryable_shouldSeparateTransientFromPermanent() {
    assert!(EngineError::Transport("reset".to_string()).is_retryable());
    assert!(EngineError::Protocol("bad json".to_string()).is_retryable());
    assert!(EngineError::RateLimited("slow down".to_string()).is_retryable());
    assert!(EngineError::NoAudio.is_retryable());
    assert!(EngineError::ApiError { status_code: 502, message: String::new() }.is_retryable());
    assert!(EngineError::ApiError { status_code: 408, message: String::new() }.is_retryable());

    assert!(!EngineError::ApiError { status_code: 404, message: String::new() }.is_retryable());
    assert!(!EngineError::InvalidRequest("unknown voice".to_string()).is_retryable());
}

#[test]
fn test_pipelineError_engine_shouldExposeSourceAndSegment() {
    let error = PipelineError::Engine {
        segment: 2,
        source: EngineError::Transport("connection refused".to_string()),
    };

    let display = format!("{}", error);
    assert!(display.contains("Segment 2"));
    assert!(display.contains("connection refused"));
    assert!(error.source().is_some());
    assert_eq!(error.engine_error(), Some(&EngineError::Transport("connection refused".to_string())));
}

#[test]
fn test_pipelineError_cancelled_shouldReportProgress() {
    let error = PipelineError::Cancelled { completed: 1, total: 4 };
    assert_eq!(format!("{}", error), "Synthesis cancelled after 1 of 4 segments");
    assert!(error.engine_error().is_none());
}

#[test]
fn test_appError_fromEngineError_shouldWrapCorrectly() {
    let app_error: AppError = EngineError::NoAudio.into();
    assert!(matches!(app_error, AppError::Engine(EngineError::NoAudio)));
    assert!(format!("{}", app_error).contains("No audio received"));
}

#[test]
fn test_appError_fromPipelineError_shouldWrapCorrectly() {
    let app_error: AppError = PipelineError::EmptyInput.into();
    assert!(matches!(app_error, AppError::Pipeline(PipelineError::EmptyInput)));
}

#[test]
fn test_appError_fromIoError_shouldBecomeFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
    let app_error: AppError = io_error.into();
    assert!(matches!(app_error, AppError::File(ref msg) if msg.contains("missing.txt")));
}
