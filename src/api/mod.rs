//! HTTP API server for the sightline gateway

pub mod health;
mod ingest;
mod query;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::pipeline::QueryPipeline;
use crate::session::SessionRegistry;
use crate::storage::MediaStore;
use crate::{Error, Result};

/// Largest accepted upload (frames and query audio)
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for API handlers
pub struct ApiState {
    pub registry: Arc<SessionRegistry>,
    pub media: Arc<MediaStore>,
    pub pipeline: QueryPipeline,
    pub frame_capacity: usize,
    pub reasoning_model: String,
}

impl ApiState {
    /// Build the shared state tree from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the media store directories cannot be created.
    pub fn from_config(config: &Config) -> Result<Arc<Self>> {
        let media = Arc::new(MediaStore::new(&config.data_dir)?);
        let registry = Arc::new(SessionRegistry::new(config.frame_capacity));
        let pipeline = QueryPipeline::new(Arc::clone(&registry), Arc::clone(&media), config);

        Ok(Arc::new(Self {
            registry,
            media,
            pipeline,
            frame_capacity: config.frame_capacity,
            reasoning_model: config.reasoning.model.clone(),
        }))
    }
}

/// Build the gateway router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/image_stream", post(ingest::image_stream))
        .route("/query", post(query::submit_query))
        .with_state(Arc::clone(&state))
        .merge(health::router(state))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the state tree cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            state: ApiState::from_config(config)?,
            port: config.port,
        })
    }

    /// Shared handler state (exposed for tests)
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        Arc::clone(&self.state)
    }

    /// Run the server until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or serve.
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind {addr}: {e}")))?;

        tracing::info!(port = self.port, "gateway listening");

        let app = router(self.state);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| Error::Config(format!("server error: {e}")))?;

        Ok(())
    }
}

/// API-boundary errors, rendered as machine-readable JSON
#[derive(Debug)]
pub enum ApiError {
    /// The request body itself could not be read
    BadRequest(String),
    /// A gateway or pipeline error
    Pipeline(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Pipeline(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            Self::Pipeline(err) => {
                let (status, code) = match &err {
                    Error::NoImage => (StatusCode::BAD_REQUEST, "no_image"),
                    Error::NoAudio => (StatusCode::BAD_REQUEST, "no_audio"),
                    Error::Transcription(_) => (StatusCode::BAD_GATEWAY, "transcription_failed"),
                    Error::Reasoning(_) => (StatusCode::BAD_GATEWAY, "reasoning_failed"),
                    Error::ReasoningProtocol(_) => (StatusCode::BAD_GATEWAY, "reasoning_protocol"),
                    Error::Synthesis(_) => (StatusCode::BAD_GATEWAY, "synthesis_failed"),
                    Error::StageTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "stage_timeout"),
                    Error::Storage(_) | Error::Io(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "storage")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
                };
                (status, code, err.to_string())
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}

/// Fields common to both inbound operations
pub(crate) struct Submission {
    pub device_id: Option<String>,
    pub payload: Option<Bytes>,
}

/// Read the `device_id` and payload fields out of a multipart body
pub(crate) async fn read_submission(
    mut multipart: Multipart,
    payload_field: &str,
) -> std::result::Result<Submission, ApiError> {
    let mut device_id = None;
    let mut payload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("malformed multipart body: {e}"))
    })? {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        if name == "device_id" {
            device_id = Some(field.text().await.map_err(|e| {
                ApiError::BadRequest(format!("unreadable device_id field: {e}"))
            })?);
        } else if name == payload_field {
            payload = Some(field.bytes().await.map_err(|e| {
                ApiError::BadRequest(format!("unreadable {payload_field} field: {e}"))
            })?);
        }
    }

    Ok(Submission { device_id, payload })
}

/// Explicit device identifier, or the caller's network origin as fallback
pub(crate) fn resolve_device_id(submitted: Option<String>, peer: SocketAddr) -> String {
    submitted
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
