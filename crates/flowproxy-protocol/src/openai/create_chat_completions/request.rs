use serde::{Deserialize, Serialize};

use crate::openai::create_chat_completions::types::ChatCompletionRequestMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateChatCompletionRequestBody {
    /// A list of messages comprising the conversation so far.
    /// Must contain at least 1 message; the orchestrator enforces it.
    #[serde(default)]
    pub messages: Vec<ChatCompletionRequestMessage>,
    /// Client-facing model alias. Unknown aliases fall back to the default prompt.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Range is 0..=2.0 (not enforced here).
    pub temperature: Option<f64>,
    /// Accepted for compatibility; responses are always streamed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

fn default_model() -> String {
    "default".to_string()
}

impl CreateChatCompletionRequestBody {
    /// Text of the last message, which carries the user's current question.
    pub fn last_question(&self) -> Option<String> {
        self.messages.last().map(|message| message.content.to_text())
    }
}
