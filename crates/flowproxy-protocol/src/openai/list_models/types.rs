use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelObjectType {
    #[serde(rename = "model")]
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Model {
    /// The client-facing alias, which can be passed as `model` in chat requests.
    pub id: String,
    /// The Unix timestamp (in seconds) when the listing was produced.
    pub created: i64,
    /// The object type, which is always "model".
    pub object: ModelObjectType,
    pub owned_by: String,
}
