use serde::{Deserialize, Serialize};

/// `POST {base}/v3/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub model: String,
    pub nsfw: bool,
    pub question: String,
    pub temperature: f64,
    pub user_id: String,
    pub prompt_id: String,
    pub conversation_id: String,
    pub document_ids: Vec<String>,
    pub generate_image: bool,
    pub generate_audio: bool,
}

/// One line of the chat response stream. `data` is a raw text increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatStreamLine {
    #[serde(default)]
    pub data: String,
}
