use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::StreamExt;
use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use flowproxy_protocol::openai::create_chat_completions::request::CreateChatCompletionRequestBody;

use crate::AppState;
use crate::error::ApiError;

pub(crate) async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(err) = state.auth.check(&headers) {
        return err.into_response();
    }
    let request: CreateChatCompletionRequestBody = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return ApiError::new(StatusCode::BAD_REQUEST, format!("invalid request body: {err}"))
                .into_response();
        }
    };

    let started_at = Instant::now();
    let model = request.model.clone();
    info!(
        event = "downstream_received",
        model = %model,
        messages = request.messages.len(),
        is_stream = true
    );

    match state.provider.chat_completion(request).await {
        Ok(stream) => {
            info!(
                event = "downstream_responded",
                trace_id = %stream.id,
                model = %model,
                status = 200,
                elapsed_ms = started_at.elapsed().as_millis(),
                is_stream = true
            );
            sse_response(stream.frames)
        }
        Err(err) => {
            let err = ApiError::from(err);
            warn!(
                event = "downstream_responded",
                model = %model,
                status = err.status.as_u16(),
                error = %err.detail,
                elapsed_ms = started_at.elapsed().as_millis(),
                is_stream = true
            );
            err.into_response()
        }
    }
}

pub(crate) async fn list_models(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = state.auth.check(&headers) {
        return err.into_response();
    }
    Json(state.provider.list_models()).into_response()
}

fn sse_response(frames: tokio::sync::mpsc::Receiver<Bytes>) -> Response {
    let stream = ReceiverStream::new(frames).map(Ok::<_, Infallible>);
    let mut response = Response::new(Body::from_stream(stream));
    let h = response.headers_mut();
    h.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    // Hint common reverse proxies to avoid buffering SSE responses.
    h.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    response
}
