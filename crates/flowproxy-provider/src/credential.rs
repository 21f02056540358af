use rand::Rng;
use time::OffsetDateTime;

use crate::client::{Headers, header_set};
use crate::config::FlowConfig;
use crate::errors::{ProviderError, ProviderResult};

pub const NONCE_LEN: usize = 32;
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Per-call replay protection for the chat endpoint. Never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub timestamp: String,
    pub nonce: String,
    pub signature: String,
}

impl SignedHeaders {
    pub fn generate(salt: &str) -> Self {
        let timestamp = OffsetDateTime::now_utc().unix_timestamp().to_string();
        Self::from_parts(timestamp, generate_nonce(NONCE_LEN), salt)
    }

    pub fn from_parts(timestamp: String, nonce: String, salt: &str) -> Self {
        let signature = sign(&timestamp, &nonce, salt);
        Self {
            timestamp,
            nonce,
            signature,
        }
    }
}

/// Lowercase hex MD5 over `timestamp ‖ nonce ‖ salt`. The upstream validates
/// exactly these bytes in exactly this order.
pub fn sign(timestamp: &str, nonce: &str, salt: &str) -> String {
    let mut input = String::with_capacity(timestamp.len() + nonce.len() + salt.len());
    input.push_str(timestamp);
    input.push_str(nonce);
    input.push_str(salt);
    format!("{:x}", md5::compute(input.as_bytes()))
}

fn generate_nonce(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| HEX_DIGITS[rng.random_range(0..HEX_DIGITS.len())] as char)
        .collect()
}

/// Identity headers for the FlowGPT backend.
#[derive(Clone)]
pub struct FlowCredentials {
    bearer_token: Option<String>,
    device_id: Option<String>,
}

impl FlowCredentials {
    pub fn new(bearer_token: Option<String>, device_id: Option<String>) -> Self {
        Self {
            bearer_token: non_blank(bearer_token).map(|token| token.trim().to_string()),
            // Also the signing salt: kept byte-for-byte as configured.
            device_id: non_blank(device_id),
        }
    }

    pub fn from_config(config: &FlowConfig) -> Self {
        Self::new(config.bearer_token.clone(), config.device_id.clone())
    }

    /// Session calls get identity and authorization only; chat calls are also signed.
    pub fn headers(&self, for_chat_call: bool) -> ProviderResult<Headers> {
        let token = self.bearer_token.as_deref().ok_or_else(|| {
            ProviderError::Configuration("FLOWGPT_BEARER_TOKEN is not configured".to_string())
        })?;
        let device_id = self.device_id.as_deref().ok_or_else(|| {
            ProviderError::Configuration("FLOWGPT_DEVICE_ID is not configured".to_string())
        })?;

        let mut headers = Headers::new();
        header_set(&mut headers, "Accept", "*/*");
        header_set(&mut headers, "Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8");
        header_set(&mut headers, "Authorization", authorization_value(token));
        header_set(&mut headers, "Content-Type", "application/json");
        header_set(&mut headers, "Origin", "https://flowgpt.com");
        header_set(&mut headers, "Referer", "https://flowgpt.com/");
        header_set(&mut headers, "x-flow-device-id", device_id);
        header_set(&mut headers, "x-flow-language", "en");

        if for_chat_call {
            let signed = SignedHeaders::generate(device_id);
            header_set(&mut headers, "x-nonce", signed.nonce);
            header_set(&mut headers, "x-timestamp", signed.timestamp);
            header_set(&mut headers, "x-signature", signed.signature);
        }
        Ok(headers)
    }
}

fn authorization_value(token: &str) -> String {
    let has_scheme = token
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bearer "));
    if has_scheme {
        token.to_string()
    } else {
        format!("Bearer {token}")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|item| !item.trim().is_empty())
}
