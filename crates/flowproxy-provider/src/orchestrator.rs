use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{info, warn};

use flowproxy_protocol::flowgpt::{ChatRequestBody, ChatStreamLine};
use flowproxy_protocol::jsonl::LineDecoder;
use flowproxy_protocol::openai::create_chat_completions::request::CreateChatCompletionRequestBody;
use flowproxy_protocol::openai::list_models::{
    ListModelsResponse, ListObjectType, Model, ModelObjectType,
};

use crate::cleaner::StreamCleaner;
use crate::client::{ByteStream, HttpMethod, UpstreamBody, UpstreamClient, UpstreamHttpRequest};
use crate::config::{DEFAULT_TEMPERATURE, FlowConfig, MODEL_OWNER, UPSTREAM_CHAT_MODEL};
use crate::credential::FlowCredentials;
use crate::errors::{ProviderError, ProviderResult};
use crate::session::SessionEstablisher;
use crate::translator::StreamTranslator;

const CHAT_PATH: &str = "/v3/chat";
const FRAME_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Validating,
    CreatingSession,
    Streaming,
    Done,
    Failed,
}

impl RequestPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPhase::Validating => "validating",
            RequestPhase::CreatingSession => "creating_session",
            RequestPhase::Streaming => "streaming",
            RequestPhase::Done => "done",
            RequestPhase::Failed => "failed",
        }
    }
}

/// SSE frames of one chat completion, in upstream order, always ending in `[DONE]`.
#[derive(Debug)]
pub struct ChatCompletionStream {
    pub id: String,
    pub frames: mpsc::Receiver<Bytes>,
}

#[derive(Clone)]
pub struct FlowProvider {
    config: Arc<FlowConfig>,
    client: Arc<dyn UpstreamClient>,
    credentials: FlowCredentials,
    sessions: SessionEstablisher,
}

impl FlowProvider {
    pub fn new(config: Arc<FlowConfig>, client: Arc<dyn UpstreamClient>) -> Self {
        let credentials = FlowCredentials::from_config(&config);
        let sessions =
            SessionEstablisher::new(client.clone(), credentials.clone(), config.base_url());
        Self {
            config,
            client,
            credentials,
            sessions,
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn list_models(&self) -> ListModelsResponse {
        let created = OffsetDateTime::now_utc().unix_timestamp();
        ListModelsResponse {
            object: ListObjectType::List,
            data: self
                .config
                .model_map
                .keys()
                .map(|alias| Model {
                    id: alias.clone(),
                    created,
                    object: ModelObjectType::Model,
                    owned_by: MODEL_OWNER.to_string(),
                })
                .collect(),
        }
    }

    /// Everything up to and including opening the upstream chat stream happens
    /// here, so those failures are still plain errors. Later failures are
    /// reported inside the returned stream.
    pub async fn chat_completion(
        &self,
        body: CreateChatCompletionRequestBody,
    ) -> ProviderResult<ChatCompletionStream> {
        let translator = StreamTranslator::new(body.model.clone());
        let trace_id = translator.id().to_string();
        let started_at = Instant::now();
        let mut phase = RequestPhase::Validating;

        match self.open_chat(&trace_id, &body, &mut phase).await {
            Ok(upstream) => {
                let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
                tokio::spawn(drive_stream(
                    upstream,
                    StreamCleaner::new(),
                    translator,
                    tx,
                    trace_id.clone(),
                ));
                Ok(ChatCompletionStream {
                    id: trace_id,
                    frames: rx,
                })
            }
            Err(err) => {
                warn!(
                    event = "request_failed",
                    trace_id = %trace_id,
                    model = %body.model,
                    phase = phase.as_str(),
                    next = RequestPhase::Failed.as_str(),
                    elapsed_ms = started_at.elapsed().as_millis(),
                    error = %err
                );
                Err(err)
            }
        }
    }

    async fn open_chat(
        &self,
        trace_id: &str,
        body: &CreateChatCompletionRequestBody,
        phase: &mut RequestPhase,
    ) -> ProviderResult<ByteStream> {
        let Some(question) = body.last_question() else {
            return Err(ProviderError::InvalidRequest(
                "request body must include a non-empty 'messages' array".to_string(),
            ));
        };
        // Credentials are checked before any network call.
        self.credentials.headers(false)?;
        let prompt_id = self.config.resolve_prompt_id(&body.model).to_string();

        *phase = RequestPhase::CreatingSession;
        let conversation_id = self
            .sessions
            .create_session(trace_id, &prompt_id, &body.messages)
            .await?;

        *phase = RequestPhase::Streaming;
        let chat = ChatRequestBody {
            model: UPSTREAM_CHAT_MODEL.to_string(),
            nsfw: false,
            question,
            temperature: body.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            user_id: String::new(),
            prompt_id,
            conversation_id,
            document_ids: Vec::new(),
            generate_image: false,
            generate_audio: false,
        };
        let chat = serde_json::to_vec(&chat)
            .map_err(|err| ProviderError::Protocol(format!("encode chat body: {err}")))?;

        info!(
            event = "upstream_request",
            trace_id = %trace_id,
            op = "chat",
            model = %body.model,
            is_stream = true
        );
        let resp = self
            .client
            .send(UpstreamHttpRequest {
                method: HttpMethod::Post,
                url: format!("{}{CHAT_PATH}", self.config.base_url()),
                headers: self.credentials.headers(true)?,
                body: Some(Bytes::from(chat)),
                is_stream: true,
            })
            .await?;
        if !resp.is_success() {
            return Err(resp.into_upstream_error().await);
        }
        info!(
            event = "upstream_response",
            trace_id = %trace_id,
            op = "chat",
            status = resp.status
        );

        match resp.body {
            UpstreamBody::Stream(rx) => Ok(rx),
            UpstreamBody::Bytes(bytes) => {
                let (tx, rx) = mpsc::channel(1);
                tx.try_send(Ok(bytes)).map_err(|err| {
                    ProviderError::Protocol(format!("buffer chat body: {err}"))
                })?;
                Ok(rx)
            }
        }
    }
}

/// Pumps one upstream chat stream through its own cleaner and translator.
/// Returns early, dropping the upstream receiver, if the client goes away.
pub async fn drive_stream(
    mut upstream: ByteStream,
    mut cleaner: StreamCleaner,
    mut translator: StreamTranslator,
    tx: mpsc::Sender<Bytes>,
    trace_id: String,
) {
    let started_at = Instant::now();
    let mut lines = LineDecoder::new();
    let mut increments = 0usize;

    let outcome = loop {
        let (batch, end) = match upstream.recv().await {
            Some(Ok(chunk)) => (lines.push_bytes(&chunk), None),
            Some(Err(err)) => (Vec::new(), Some(Err(ProviderError::Stream(err.to_string())))),
            None => (lines.finish(), Some(Ok(()))),
        };
        for line in batch {
            let Some(text) = parse_line(&trace_id, &line) else {
                continue;
            };
            increments += 1;
            let cleaned = cleaner.push(&text);
            if !send_all(&tx, translator.translate(Ok(cleaned))).await {
                info!(event = "downstream_closed", trace_id = %trace_id, increments);
                return;
            }
        }
        if let Some(end) = end {
            break end;
        }
    };

    let frames = match &outcome {
        Ok(()) => {
            let mut frames = Vec::new();
            if let Some(rest) = cleaner.finish() {
                frames.extend(translator.translate(Ok(rest)));
            }
            frames.extend(translator.finish());
            frames
        }
        Err(err) => translator.fail(err),
    };
    let delivered = send_all(&tx, frames).await;

    match outcome {
        Ok(()) => info!(
            event = "stream_finished",
            trace_id = %trace_id,
            phase = RequestPhase::Done.as_str(),
            cleaner = ?cleaner.state(),
            increments,
            delivered,
            elapsed_ms = started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            event = "stream_finished",
            trace_id = %trace_id,
            phase = RequestPhase::Failed.as_str(),
            increments,
            delivered,
            elapsed_ms = started_at.elapsed().as_millis(),
            error = %err
        ),
    }
}

fn parse_line(trace_id: &str, line: &str) -> Option<String> {
    match serde_json::from_str::<ChatStreamLine>(line) {
        Ok(parsed) => Some(parsed.data),
        Err(err) => {
            warn!(
                event = "upstream_line_skipped",
                trace_id = %trace_id,
                line = %line,
                error = %err
            );
            None
        }
    }
}

async fn send_all(tx: &mpsc::Sender<Bytes>, frames: Vec<Bytes>) -> bool {
    for frame in frames {
        if tx.send(frame).await.is_err() {
            return false;
        }
    }
    true
}
