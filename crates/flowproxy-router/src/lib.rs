//! HTTP surface of the proxy: OpenAI-style chat completions and model listing.

mod auth;
mod error;
mod handler;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use flowproxy_provider::FlowProvider;

pub use auth::ApiKeyAuth;
pub use error::ApiError;

pub struct AppState {
    pub provider: FlowProvider,
    pub auth: ApiKeyAuth,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(handler::chat_completions))
        .route("/v1/models", get(handler::list_models))
        .with_state(state)
}
