use bytes::Bytes;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use flowproxy_protocol::openai::create_chat_completions::stream::{
    ChatCompletionChunkObjectType, ChatCompletionStreamChoice, CreateChatCompletionStreamResponse,
};
use flowproxy_protocol::openai::create_chat_completions::types::{
    ChatCompletionFinishReason, ChatCompletionStreamResponseDelta,
};
use flowproxy_protocol::sse;

use crate::errors::ProviderError;

/// Frames cleaned text as `chat.completion.chunk` events.
///
/// This is the only place a failure becomes client-visible once streaming has
/// started: it turns an `Err` into a terminal frame followed by `[DONE]`.
/// After the terminal frame every further input is ignored.
#[derive(Debug)]
pub struct StreamTranslator {
    id: String,
    model: String,
    created: i64,
    terminated: bool,
}

impl StreamTranslator {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_identity(
            format!("chatcmpl-{}", Uuid::new_v4()),
            model,
            OffsetDateTime::now_utc().unix_timestamp(),
        )
    }

    pub fn with_identity(id: impl Into<String>, model: impl Into<String>, created: i64) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            created,
            terminated: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn frame(
        &self,
        content: Option<String>,
        finish_reason: Option<ChatCompletionFinishReason>,
    ) -> CreateChatCompletionStreamResponse {
        CreateChatCompletionStreamResponse {
            id: self.id.clone(),
            object: ChatCompletionChunkObjectType::ChatCompletionChunk,
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChatCompletionStreamChoice {
                index: 0,
                delta: ChatCompletionStreamResponseDelta {
                    content,
                    role: None,
                },
                finish_reason,
            }],
        }
    }

    /// `Ok` carries one cleaned increment; `Err` terminates the stream.
    pub fn translate(&mut self, item: Result<String, ProviderError>) -> Vec<Bytes> {
        match item {
            Ok(text) => self.delta(&text).into_iter().collect(),
            Err(err) => self.fail(&err),
        }
    }

    pub fn delta(&mut self, text: &str) -> Option<Bytes> {
        if self.terminated || text.is_empty() {
            return None;
        }
        encode(&self.frame(Some(text.to_string()), None))
    }

    /// Normal end: an empty delta with `finish_reason: "stop"`, then `[DONE]`.
    pub fn finish(&mut self) -> Vec<Bytes> {
        self.terminate(None)
    }

    pub fn fail(&mut self, err: &ProviderError) -> Vec<Bytes> {
        self.terminate(Some(format!("Internal error: {err}")))
    }

    fn terminate(&mut self, content: Option<String>) -> Vec<Bytes> {
        if self.terminated {
            return Vec::new();
        }
        self.terminated = true;
        let mut out = Vec::with_capacity(2);
        out.extend(encode(&self.frame(content, Some(ChatCompletionFinishReason::Stop))));
        out.push(sse::encode_done());
        out
    }
}

fn encode(frame: &CreateChatCompletionStreamResponse) -> Option<Bytes> {
    match serde_json::to_string(frame) {
        Ok(data) => Some(sse::encode_data(&data)),
        Err(err) => {
            warn!(event = "frame_encode_failed", id = %frame.id, error = %err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowproxy_protocol::sse::{DONE_DATA, SseDataParser};
    use serde_json::Value;

    fn decode(frames: &[Bytes]) -> Vec<String> {
        let mut parser = SseDataParser::new();
        let mut events = Vec::new();
        for frame in frames {
            events.extend(parser.push_bytes(frame));
        }
        events.extend(parser.finish());
        events
    }

    #[test]
    fn content_frame_shape() {
        let mut translator = StreamTranslator::with_identity("chatcmpl-1", "default", 42);
        let frame = translator.delta("Hello").unwrap();
        let events = decode(&[frame]);
        let value: Value = serde_json::from_str(&events[0]).unwrap();
        assert_eq!(value["id"], "chatcmpl-1");
        assert_eq!(value["object"], "chat.completion.chunk");
        assert_eq!(value["created"], 42);
        assert_eq!(value["model"], "default");
        assert_eq!(value["choices"][0]["delta"]["content"], "Hello");
        assert!(value["choices"][0]["finish_reason"].is_null());
    }

    #[test]
    fn empty_increments_produce_no_frame() {
        let mut translator = StreamTranslator::new("default");
        assert!(translator.translate(Ok(String::new())).is_empty());
    }

    #[test]
    fn finish_emits_stop_then_done() {
        let mut translator = StreamTranslator::new("default");
        let events = decode(&translator.finish());
        assert_eq!(events.len(), 2);
        let stop: Value = serde_json::from_str(&events[0]).unwrap();
        assert_eq!(stop["choices"][0]["finish_reason"], "stop");
        assert!(stop["choices"][0]["delta"].get("content").is_none());
        assert_eq!(events[1], DONE_DATA);
    }

    #[test]
    fn error_becomes_terminal_frame_and_later_input_is_ignored() {
        let mut translator = StreamTranslator::new("default");
        let frames = translator.translate(Err(ProviderError::Stream("connection reset".to_string())));
        let events = decode(&frames);
        assert_eq!(events.len(), 2);
        let err: Value = serde_json::from_str(&events[0]).unwrap();
        let content = err["choices"][0]["delta"]["content"].as_str().unwrap();
        assert!(content.contains("connection reset"));
        assert_eq!(err["choices"][0]["finish_reason"], "stop");
        assert_eq!(events[1], DONE_DATA);

        assert!(translator.is_terminated());
        assert!(translator.delta("late").is_none());
        assert!(translator.finish().is_empty());
    }
}
