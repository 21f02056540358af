use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use wreq::{Client, Method, Proxy};

use crate::config::FlowConfig;
use crate::errors::{ProviderError, ProviderResult, TransportErrorKind};

pub type Headers = Vec<(String, String)>;

/// Streamed upstream body. A transport failure mid-body arrives as the last item.
pub type ByteStream = mpsc::Receiver<ProviderResult<Bytes>>;

pub fn header_set(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    match headers
        .iter_mut()
        .find(|(key, _)| key.eq_ignore_ascii_case(&name))
    {
        Some((_, existing)) => *existing = value,
        None => headers.push((name, value)),
    }
}

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct UpstreamHttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
    pub is_stream: bool,
}

#[derive(Debug)]
pub enum UpstreamBody {
    Bytes(Bytes),
    Stream(ByteStream),
}

#[derive(Debug)]
pub struct UpstreamHttpResponse {
    pub status: u16,
    pub body: UpstreamBody,
}

impl UpstreamHttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Reads the whole body, draining a streamed body if necessary.
    pub async fn into_bytes(self) -> ProviderResult<Bytes> {
        match self.body {
            UpstreamBody::Bytes(bytes) => Ok(bytes),
            UpstreamBody::Stream(mut rx) => {
                let mut out = BytesMut::new();
                while let Some(chunk) = rx.recv().await {
                    out.extend_from_slice(&chunk?);
                }
                Ok(out.freeze())
            }
        }
    }

    /// Turns a non-2xx response into `ProviderError::Upstream` with its body text.
    pub async fn into_upstream_error(self) -> ProviderError {
        let status = self.status;
        let body = match self.into_bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => err.to_string(),
        };
        ProviderError::Upstream { status, body }
    }
}

pub trait UpstreamClient: Send + Sync {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = ProviderResult<UpstreamHttpResponse>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    pub proxy: Option<String>,
    pub connect_timeout: Duration,
    /// Longest silence tolerated on a response, streamed or not.
    pub read_timeout: Duration,
}

impl UpstreamClientConfig {
    pub fn from_flow(config: &FlowConfig) -> Self {
        Self {
            proxy: normalize_proxy(config.proxy.clone()),
            connect_timeout: Duration::from_secs(10),
            read_timeout: config.request_timeout,
        }
    }
}

impl Default for UpstreamClientConfig {
    fn default() -> Self {
        Self::from_flow(&FlowConfig::default())
    }
}

#[derive(Clone)]
pub struct WreqUpstreamClient {
    config: UpstreamClientConfig,
    client: Client,
}

impl WreqUpstreamClient {
    pub fn new(config: UpstreamClientConfig) -> Result<Self, wreq::Error> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout);
        if let Some(proxy) = config.proxy.as_deref() {
            builder = builder.proxy(Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }
}

impl UpstreamClient for WreqUpstreamClient {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = ProviderResult<UpstreamHttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            let method = match req.method {
                HttpMethod::Get => Method::GET,
                HttpMethod::Post => Method::POST,
            };
            let mut builder = self.client.request(method, &req.url);
            for (k, v) in &req.headers {
                builder = builder.header(k, v);
            }
            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let resp = builder.send().await.map_err(map_wreq_error)?;
            convert_response(resp, req.is_stream, self.config.read_timeout).await
        })
    }
}

async fn convert_response(
    resp: wreq::Response,
    want_stream: bool,
    idle_timeout: Duration,
) -> ProviderResult<UpstreamHttpResponse> {
    let status = resp.status().as_u16();
    let is_success = (200..300).contains(&status);
    if !is_success || !want_stream {
        let body = resp.bytes().await.map_err(map_wreq_error)?;
        return Ok(UpstreamHttpResponse {
            status,
            body: UpstreamBody::Bytes(body),
        });
    }

    // The pump owns the response; once the receiver is dropped the send fails,
    // the loop ends and the connection is released.
    let (tx, rx) = mpsc::channel::<ProviderResult<Bytes>>(16);
    tokio::spawn(async move {
        let mut stream = resp.bytes_stream();
        loop {
            let item = match tokio::time::timeout(idle_timeout, stream.next()).await {
                Ok(Some(Ok(chunk))) => Ok(chunk),
                Ok(Some(Err(err))) => Err(map_wreq_error(err)),
                Ok(None) => break,
                Err(_) => Err(ProviderError::Transport {
                    kind: TransportErrorKind::ReadTimeout,
                    message: format!("no upstream data for {}s", idle_timeout.as_secs()),
                }),
            };
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                break;
            }
        }
    });

    Ok(UpstreamHttpResponse {
        status,
        body: UpstreamBody::Stream(rx),
    })
}

fn normalize_proxy(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

fn map_wreq_error(err: wreq::Error) -> ProviderError {
    ProviderError::Transport {
        kind: classify_wreq_error(&err),
        message: err.to_string(),
    }
}

fn classify_wreq_error(err: &wreq::Error) -> TransportErrorKind {
    let message = err.to_string().to_ascii_lowercase();
    if err.is_timeout() {
        if message.contains("read") || message.contains("idle") {
            return TransportErrorKind::ReadTimeout;
        }
        return TransportErrorKind::Timeout;
    }
    if err.is_connect() {
        if message.contains("dns") || message.contains("resolve") {
            return TransportErrorKind::Dns;
        }
        if message.contains("tls") || message.contains("ssl") {
            return TransportErrorKind::Tls;
        }
        return TransportErrorKind::Connect;
    }
    if message.contains("tls") || message.contains("ssl") {
        return TransportErrorKind::Tls;
    }
    TransportErrorKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_set_replaces_case_insensitively() {
        let mut headers = Headers::new();
        header_set(&mut headers, "Content-Type", "text/plain");
        header_set(&mut headers, "content-type", "application/json");
        assert_eq!(headers.len(), 1);
        assert_eq!(header_get(&headers, "CONTENT-TYPE"), Some("application/json"));
    }

    #[tokio::test]
    async fn streamed_body_is_drained_into_bytes() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(Bytes::from_static(b"ab"))).await.unwrap();
        tx.send(Ok(Bytes::from_static(b"cd"))).await.unwrap();
        drop(tx);
        let resp = UpstreamHttpResponse {
            status: 503,
            body: UpstreamBody::Stream(rx),
        };
        assert!(!resp.is_success());
        match resp.into_upstream_error().await {
            ProviderError::Upstream { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "abcd");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
