pub mod create_chat_completions;
pub mod list_models;
