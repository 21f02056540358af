pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    ReadTimeout,
    Connect,
    Dns,
    Tls,
    Other,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::ReadTimeout => "read_timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Bearer token or device id missing. Fatal for the request, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Non-2xx from either upstream call, carrying the upstream status and body.
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    /// 2xx upstream response that does not have the expected shape.
    #[error("unexpected upstream response: {0}")]
    Protocol(String),
    #[error("upstream transport error ({}): {message}", kind.as_str())]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },
    /// Failure after the downstream stream was opened. Only ever rendered as a
    /// terminal frame, never as an HTTP status.
    #[error("stream interrupted: {0}")]
    Stream(String),
}
