use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatCompletionRole {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

impl ChatCompletionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatCompletionRole::System => "system",
            ChatCompletionRole::User => "user",
            ChatCompletionRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatCompletionRequestMessage {
    pub role: ChatCompletionRole,
    /// `null` (assistant turns carrying only tool calls) reads as empty text.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: ChatCompletionMessageContent,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<ChatCompletionMessageContent, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ChatCompletionMessageContent>::deserialize(deserializer)?.unwrap_or_default())
}

/// Either a plain string or an array of typed parts. Only text parts carry
/// meaning upstream; other part types are dropped when flattening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatCompletionMessageContent {
    Text(String),
    Parts(Vec<ChatCompletionContentPart>),
}

impl Default for ChatCompletionMessageContent {
    fn default() -> Self {
        ChatCompletionMessageContent::Text(String::new())
    }
}

impl ChatCompletionMessageContent {
    pub fn to_text(&self) -> String {
        match self {
            ChatCompletionMessageContent::Text(text) => text.clone(),
            ChatCompletionMessageContent::Parts(parts) => parts
                .iter()
                .filter(|part| part.r#type == "text")
                .filter_map(|part| part.text.as_deref())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatCompletionContentPart {
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatCompletionStreamResponseDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ChatCompletionRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatCompletionFinishReason {
    #[serde(rename = "stop")]
    Stop,
}
