use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{info, warn};

use flowproxy_protocol::flowgpt::{
    ConversationLocation, ConversationMessage, CreateConversationRequestBody,
    CreateConversationResponse,
};
use flowproxy_protocol::openai::create_chat_completions::types::ChatCompletionRequestMessage;

use crate::client::{HttpMethod, UpstreamClient, UpstreamHttpRequest};
use crate::credential::FlowCredentials;
use crate::errors::{ProviderError, ProviderResult};

const CREATE_CONVERSATION_PATH: &str = "/conversation/create";

/// Opens one upstream conversation per request, seeded with the full history.
#[derive(Clone)]
pub struct SessionEstablisher {
    client: Arc<dyn UpstreamClient>,
    credentials: FlowCredentials,
    base_url: String,
}

impl SessionEstablisher {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        credentials: FlowCredentials,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            base_url: base_url.into(),
        }
    }

    pub async fn create_session(
        &self,
        trace_id: &str,
        prompt_id: &str,
        messages: &[ChatCompletionRequestMessage],
    ) -> ProviderResult<String> {
        let headers = self.credentials.headers(false)?;
        let body = CreateConversationRequestBody {
            prompt_id: prompt_id.to_string(),
            location: ConversationLocation::ChatPage,
            messages: messages
                .iter()
                .map(|message| ConversationMessage {
                    role: message.role.as_str().to_string(),
                    content: message.content.to_text(),
                })
                .collect(),
        };
        let body = serde_json::to_vec(&body)
            .map_err(|err| ProviderError::Protocol(format!("encode conversation body: {err}")))?;

        info!(
            event = "upstream_request",
            trace_id = %trace_id,
            op = "create_conversation",
            prompt_id = %prompt_id,
            messages = messages.len()
        );
        let started_at = Instant::now();
        let resp = self
            .client
            .send(UpstreamHttpRequest {
                method: HttpMethod::Post,
                url: format!("{}{CREATE_CONVERSATION_PATH}", self.base_url),
                headers,
                body: Some(Bytes::from(body)),
                is_stream: false,
            })
            .await?;

        if !resp.is_success() {
            let err = resp.into_upstream_error().await;
            warn!(
                event = "upstream_response",
                trace_id = %trace_id,
                op = "create_conversation",
                elapsed_ms = started_at.elapsed().as_millis(),
                error = %err
            );
            return Err(err);
        }

        let bytes = resp.into_bytes().await?;
        let parsed: CreateConversationResponse = serde_json::from_slice(&bytes).map_err(|err| {
            ProviderError::Protocol(format!("conversation/create returned invalid JSON: {err}"))
        })?;
        let conversation_id = parsed
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Protocol("conversation/create response is missing 'id'".to_string())
            })?;

        info!(
            event = "upstream_response",
            trace_id = %trace_id,
            op = "create_conversation",
            elapsed_ms = started_at.elapsed().as_millis(),
            conversation_id = %conversation_id
        );
        Ok(conversation_id)
    }
}
