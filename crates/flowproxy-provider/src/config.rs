use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://prod-backend-k8s.flowgpt.com";
pub const DEFAULT_DEVICE_ID: &str = "aORT9gbujH92iIVYYVcTE";
pub const DEFAULT_PROMPT_ID: &str = "uzNcMUGo4sOwl4GFvRpm8";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);
/// Upstream model name sent on every chat call; the alias only selects the prompt.
pub const UPSTREAM_CHAT_MODEL: &str = "FlowGPT-Ares";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const MODEL_OWNER: &str = "flowgpt";

const BUILTIN_MODELS: [(&str, &str); 4] = [
    ("default", DEFAULT_PROMPT_ID),
    ("gpt-4-free", DEFAULT_PROMPT_ID),
    ("chatgpt-5-pro", "vlaOLDN9qTxzIlvzfL_Ty"),
    ("aisuperior", "lKm5yPE9x-Naf0_0_KI5M"),
];

/// Loaded once at startup and shared read-only between requests.
#[derive(Clone)]
pub struct FlowConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub device_id: Option<String>,
    pub request_timeout: Duration,
    pub default_model_id: String,
    /// Client-facing alias -> upstream prompt id.
    pub model_map: BTreeMap<String, String>,
    pub proxy: Option<String>,
}

impl FlowConfig {
    pub fn builtin_model_map() -> BTreeMap<String, String> {
        BUILTIN_MODELS
            .iter()
            .map(|(alias, prompt_id)| (alias.to_string(), prompt_id.to_string()))
            .collect()
    }

    /// Unknown aliases are not an error; they use the default prompt.
    pub fn resolve_prompt_id(&self, alias: &str) -> &str {
        self.model_map
            .get(alias)
            .map(String::as_str)
            .unwrap_or(self.default_model_id.as_str())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer_token: None,
            device_id: Some(DEFAULT_DEVICE_ID.to_string()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_model_id: DEFAULT_PROMPT_ID.to_string(),
            model_map: Self::builtin_model_map(),
            proxy: None,
        }
    }
}

impl fmt::Debug for FlowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowConfig")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .field("device_id", &self.device_id)
            .field("request_timeout", &self.request_timeout)
            .field("default_model_id", &self.default_model_id)
            .field("model_map", &self.model_map)
            .field("proxy", &self.proxy)
            .finish()
    }
}
