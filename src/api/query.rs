//! Voice query endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::{ApiError, ApiState, read_submission, resolve_device_id};
use crate::Error;

/// Accept one spoken query and return the synthesized answer
///
/// Form fields: `device_id` (optional, falls back to the caller's address)
/// and `audio` (binary). On success the response body is the answer audio.
pub(super) async fn submit_query(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let submission = read_submission(multipart, "audio").await?;
    let device_id = resolve_device_id(submission.device_id, peer);

    let audio = submission
        .payload
        .filter(|bytes| !bytes.is_empty())
        .ok_or(ApiError::Pipeline(Error::NoAudio))?;

    let speech = state.pipeline.answer(&device_id, &audio).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        speech,
    )
        .into_response())
}
