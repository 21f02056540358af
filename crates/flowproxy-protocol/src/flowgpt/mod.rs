//! Bodies of the FlowGPT backend calls the proxy makes.

pub mod chat;
pub mod create_conversation;

pub use chat::{ChatRequestBody, ChatStreamLine};
pub use create_conversation::{
    ConversationLocation, ConversationMessage, CreateConversationRequestBody,
    CreateConversationResponse,
};
