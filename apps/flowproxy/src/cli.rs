use std::collections::BTreeMap;
use std::time::Duration;

use clap::Parser;
use flowproxy_provider::FlowConfig;
use flowproxy_provider::config::{DEFAULT_BASE_URL, DEFAULT_DEVICE_ID, DEFAULT_PROMPT_ID};

#[derive(Parser)]
#[command(name = "flowproxy")]
pub(crate) struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    pub(crate) host: String,
    #[arg(long, default_value_t = 8088)]
    pub(crate) port: u16,
    #[arg(long, env = "FLOWGPT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub(crate) base_url: String,
    #[arg(long, env = "FLOWGPT_BEARER_TOKEN", hide_env_values = true)]
    pub(crate) bearer_token: Option<String>,
    #[arg(long, env = "FLOWGPT_DEVICE_ID", default_value = DEFAULT_DEVICE_ID)]
    pub(crate) device_id: String,
    #[arg(long, env = "API_REQUEST_TIMEOUT", default_value_t = 180)]
    pub(crate) request_timeout_secs: u64,
    #[arg(long, env = "DEFAULT_MODEL_ID", default_value = DEFAULT_PROMPT_ID)]
    pub(crate) default_model_id: String,
    /// `alias=promptId`; replaces the built-in model table when given.
    #[arg(long = "model", env = "MODEL_MAP", value_delimiter = ',', value_parser = parse_model_entry)]
    pub(crate) models: Vec<(String, String)>,
    #[arg(long, env = "API_MASTER_KEY", hide_env_values = true)]
    pub(crate) api_master_key: Option<String>,
    #[arg(long)]
    pub(crate) proxy: Option<String>,
}

impl Cli {
    pub(crate) fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn api_key(&self) -> Option<String> {
        non_blank(self.api_master_key.clone())
    }

    pub(crate) fn flow_config(&self) -> FlowConfig {
        let model_map = if self.models.is_empty() {
            FlowConfig::builtin_model_map()
        } else {
            self.models.iter().cloned().collect::<BTreeMap<_, _>>()
        };
        FlowConfig {
            base_url: self.base_url.clone(),
            bearer_token: non_blank(self.bearer_token.clone()),
            device_id: non_blank(Some(self.device_id.clone())),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            default_model_id: self.default_model_id.clone(),
            model_map,
            proxy: non_blank(self.proxy.clone()),
        }
    }
}

fn parse_model_entry(raw: &str) -> Result<(String, String), String> {
    let (alias, prompt_id) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected alias=promptId, got '{raw}'"))?;
    let (alias, prompt_id) = (alias.trim(), prompt_id.trim());
    if alias.is_empty() || prompt_id.is_empty() {
        return Err(format!("expected alias=promptId, got '{raw}'"));
    }
    Ok((alias.to_string(), prompt_id.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
