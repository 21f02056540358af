use http::{HeaderMap, StatusCode};

use crate::error::ApiError;

/// Optional shared key guarding the downstream API. `None` accepts everyone.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyAuth {
    key: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: key
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty()),
        }
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let Some(expected) = self.key.as_deref() else {
            return Ok(());
        };
        let presented = extract_api_key(headers)
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "missing api key"))?;
        if presented != expected {
            return Err(ApiError::new(StatusCode::FORBIDDEN, "invalid api key"));
        }
        Ok(())
    }
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = header_value(headers, "x-api-key") {
        return Some(value.trim().to_string());
    }
    let auth = header_value(headers, "authorization")?;
    let auth = auth.trim();
    let scheme = auth.get(..7)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }
    Some(auth[7..].trim().to_string())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
