//! Shared test utilities
//!
//! Collaborator backends are stubbed with small axum servers bound on
//! ephemeral ports; requests they receive are recorded for assertions.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use sightline_gateway::Config;

/// Transcript every stub transcriber returns
pub const TRANSCRIPT: &str = "what am i looking at";

/// Audio bytes every stub synthesizer returns
pub const ANSWER_AUDIO: &[u8] = b"synthesized-mp3-bytes";

/// Multipart boundary used by [`multipart_request`]
pub const BOUNDARY: &str = "sightline-test-boundary";

/// Request bodies recorded by a stub backend
pub type RecordedRequests = Arc<Mutex<Vec<Value>>>;

/// Serve a stub router on an ephemeral port, returning its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Stub transcription backend answering every upload with a fixed transcript
pub fn transcriber_stub(text: &str) -> Router {
    transcriber_stub_with_delay(text, Duration::ZERO)
}

/// Stub transcription backend that stalls before answering
pub fn transcriber_stub_with_delay(text: &str, delay: Duration) -> Router {
    let text = text.to_string();
    Router::new().route(
        "/v1/audio/transcriptions",
        post(move || {
            let text = text.clone();
            async move {
                tokio::time::sleep(delay).await;
                Json(json!({ "text": text }))
            }
        }),
    )
}

/// Stub reasoning backend returning a fixed reply, recording what it was sent
pub fn reasoner_stub(reply: Value) -> (Router, RecordedRequests) {
    reasoner_stub_with_delay(reply, Duration::ZERO)
}

/// Stub reasoning backend that stalls before answering
pub fn reasoner_stub_with_delay(reply: Value, delay: Duration) -> (Router, RecordedRequests) {
    let seen: RecordedRequests = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let router = Router::new().route(
        "/api/generate",
        post(move |Json(body): Json<Value>| {
            let record = Arc::clone(&record);
            let reply = reply.clone();
            async move {
                record.lock().unwrap().push(body);
                tokio::time::sleep(delay).await;
                Json(reply)
            }
        }),
    );
    (router, seen)
}

/// Stub synthesis backend returning fixed audio, recording what it was sent
pub fn recording_tts_stub(audio: &'static [u8]) -> (Router, RecordedRequests) {
    let seen: RecordedRequests = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let router = Router::new().route(
        "/v1/audio/speech",
        post(move |Json(body): Json<Value>| {
            let record = Arc::clone(&record);
            async move {
                record.lock().unwrap().push(body);
                audio.to_vec()
            }
        }),
    );
    (router, seen)
}

/// Config wired to a full set of stub backends under `dir`
///
/// Returns the recorded requests of the reasoning and synthesis stubs.
pub async fn stub_config(
    dir: &Path,
    reasoner_reply: Value,
) -> (Config, RecordedRequests, RecordedRequests) {
    let stt_url = spawn_stub(transcriber_stub(TRANSCRIPT)).await;
    let (reasoner, reasoner_seen) = reasoner_stub(reasoner_reply);
    let reasoning_url = spawn_stub(reasoner).await;
    let (tts, tts_seen) = recording_tts_stub(ANSWER_AUDIO);
    let tts_url = spawn_stub(tts).await;

    let mut config = Config {
        data_dir: dir.to_path_buf(),
        stage_timeout_secs: 5,
        ..Config::default()
    };
    config.stt.base_url = stt_url;
    config.reasoning.base_url = reasoning_url;
    config.tts.base_url = tts_url;

    (config, reasoner_seen, tts_seen)
}

/// Build a multipart POST request with optional `device_id` and payload fields
pub fn multipart_request(
    uri: &str,
    device_id: Option<&str>,
    payload: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();

    if let Some(id) = device_id {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"device_id\"\r\n\r\n",
        );
        body.extend_from_slice(id.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((name, bytes)) = payload {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
