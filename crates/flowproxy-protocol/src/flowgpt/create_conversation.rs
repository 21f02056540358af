use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationLocation {
    #[serde(rename = "CHAT_PAGE")]
    ChatPage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
}

/// `POST {base}/conversation/create`. Carries the whole history so the
/// conversation already has context when the chat call arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequestBody {
    pub prompt_id: String,
    pub location: ConversationLocation,
    pub messages: Vec<ConversationMessage>,
}

/// Only `id` is read; everything else the backend returns is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    #[serde(default)]
    pub id: Option<String>,
}
