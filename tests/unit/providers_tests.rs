/*!
 * Tests for engine implementations
 *
 * The HTTP engine is exercised against a one-shot local server that answers
 * a single request with a canned response.
 */

use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use speechsub::errors::EngineError;
use speechsub::providers::http::HttpEngine;
use speechsub::providers::mock::MockEngine;
use speechsub::providers::{SpeechEngine, StreamChunk, SynthesisRequest};

fn request(text: &str) -> SynthesisRequest {
    SynthesisRequest {
        text: text.to_string(),
        voice: "pt-BR-FranciscaNeural".to_string(),
        rate: Some("+10%".to_string()),
        pitch: None,
    }
}

/// Serve one HTTP response; resolves to the raw request body
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut buffer = [0u8; 4096];

        let (header_end, content_length) = loop {
            let n = socket.read(&mut buffer).await.unwrap();
            received.extend_from_slice(&buffer[..n]);
            if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&received[..pos]).to_lowercase();
                let length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (pos + 4, length);
            }
        };
        while received.len() < header_end + content_length {
            let n = socket.read(&mut buffer).await.unwrap();
            received.extend_from_slice(&buffer[..n]);
        }

        let response = format!(
            "{}\r\nContent-Type: application/x-ndjson\r\nConnection: close\r\n\r\n{}",
            status_line, body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8_lossy(&received[header_end..]).to_string()
    });

    (address, handle)
}

#[tokio::test]
async fn test_httpEngine_shouldStreamDecodedChunks() {
    let body = "{\"type\":\"audio\",\"data\":\"AAE=\"}\n\
                {\"type\":\"WordBoundary\",\"offset\":1000000,\"duration\":4000000,\"text\":\"Olá\"}\n\
                {\"type\":\"SentenceBoundary\",\"offset\":0,\"duration\":0,\"text\":\"Olá\"}\n";
    let (address, server) = serve_once("HTTP/1.1 200 OK", body).await;

    let engine = HttpEngine::new(format!("{}/", address), 5);
    let chunks: Vec<_> = engine
        .stream_synthesize(request("Olá"))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].as_ref().unwrap(), &StreamChunk::Audio(bytes::Bytes::from_static(&[0, 1])));
    assert_eq!(
        chunks[1].as_ref().unwrap(),
        &StreamChunk::WordBoundary { offset: 1_000_000, duration: 4_000_000, text: "Olá".to_string() }
    );

    let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(sent["text"], "Olá");
    assert_eq!(sent["voice"], "pt-BR-FranciscaNeural");
    assert_eq!(sent["rate"], "+10%");
    assert!(sent.get("pitch").is_none());
}

#[tokio::test]
async fn test_httpEngine_withClientError_shouldRejectRequest() {
    let (address, server) = serve_once("HTTP/1.1 400 Bad Request", "unknown voice").await;

    let engine = HttpEngine::new(address, 5);
    let error = engine.stream_synthesize(request("Olá")).await.err().unwrap();

    assert!(matches!(error, EngineError::InvalidRequest(ref msg) if msg.contains("unknown voice")));
    assert!(!error.is_retryable());
    server.await.unwrap();
}

#[tokio::test]
async fn test_httpEngine_withServerError_shouldBeRetryable() {
    let (address, server) = serve_once("HTTP/1.1 503 Service Unavailable", "busy").await;

    let engine = HttpEngine::new(address, 5);
    let error = engine.stream_synthesize(request("Olá")).await.err().unwrap();

    assert_eq!(error, EngineError::ApiError { status_code: 503, message: "busy".to_string() });
    assert!(error.is_retryable());
    server.await.unwrap();
}

#[tokio::test]
async fn test_httpEngine_withRateLimit_shouldReportRateLimited() {
    let (address, server) = serve_once("HTTP/1.1 429 Too Many Requests", "slow down").await;

    let engine = HttpEngine::new(address, 5);
    let error = engine.stream_synthesize(request("Olá")).await.err().unwrap();

    assert_eq!(error, EngineError::RateLimited("slow down".to_string()));
    server.await.unwrap();
}

#[tokio::test]
async fn test_httpEngine_withNothingListening_shouldFailWithTransport() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let engine = HttpEngine::new(address, 2);
    let error = engine.stream_synthesize(request("Olá")).await.err().unwrap();
    assert!(matches!(error, EngineError::Transport(_)));
}

#[test]
fn test_httpEngine_new_shouldTrimTrailingSlash() {
    assert_eq!(HttpEngine::new("http://localhost:5050/", 10).base_url(), "http://localhost:5050");
}

#[tokio::test]
async fn test_mockEngine_shouldRecordRequests() {
    let engine = MockEngine::working();
    let clone = engine.clone();

    let _ = clone.stream_synthesize(request("first")).await.unwrap();
    let _ = engine.stream_synthesize(request("second")).await.unwrap();

    let texts: Vec<String> = engine.requests().into_iter().map(|r| r.text).collect();
    assert_eq!(texts, vec!["first".to_string(), "second".to_string()]);
    assert_eq!(engine.request_count(), 2);
}

#[test]
fn test_mockEngine_spokenChunks_withoutTiming_shouldOnlyHoldAudio() {
    let chunks = MockEngine::spoken_chunks("one two", false);
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| matches!(c, StreamChunk::Audio(_))));
}
