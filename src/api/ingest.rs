//! Frame ingestion endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Multipart, State};
use serde::Serialize;

use super::{ApiError, ApiState, read_submission, resolve_device_id};
use crate::Error;
use crate::session::FrameRecord;

/// Ingest acknowledgement
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub frames: usize,
}

/// Accept one frame from a device and append it to the device's window
///
/// Form fields: `device_id` (optional, falls back to the caller's address)
/// and `image` (binary). A missing or empty image rejects the request
/// without touching the store.
pub(super) async fn image_stream(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    multipart: Multipart,
) -> Result<Json<IngestResponse>, ApiError> {
    let submission = read_submission(multipart, "image").await?;
    let device_id = resolve_device_id(submission.device_id, peer);

    let image = submission
        .payload
        .filter(|bytes| !bytes.is_empty())
        .ok_or(ApiError::Pipeline(Error::NoImage))?;

    let stored = state.media.store_frame(&device_id, &image).await?;
    let session = state.registry.get_or_create(&device_id).await;
    session.append_frame(FrameRecord::new(stored));

    tracing::debug!(
        device = %device_id,
        frames = session.frame_count(),
        "frame ingested"
    );

    Ok(Json(IngestResponse {
        status: "ok",
        frames: session.frame_count(),
    }))
}
