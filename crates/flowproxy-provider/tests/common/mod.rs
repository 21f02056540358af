#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::mpsc;

use flowproxy_protocol::sse::SseDataParser;
use flowproxy_provider::{
    FlowConfig, FlowProvider, ProviderError, ProviderResult, UpstreamBody, UpstreamClient,
    UpstreamHttpRequest, UpstreamHttpResponse,
};

pub enum Scripted {
    Body { status: u16, body: String },
    Stream(Vec<ProviderResult<Bytes>>),
    Fail(ProviderError),
}

impl Scripted {
    pub fn json(status: u16, body: Value) -> Self {
        Scripted::Body {
            status,
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Scripted::Body {
            status,
            body: body.to_string(),
        }
    }

    /// One `{"data": ...}` line per increment.
    pub fn increments(increments: &[&str]) -> Self {
        Scripted::Stream(
            increments
                .iter()
                .map(|inc| Ok(data_line(inc)))
                .collect(),
        )
    }
}

pub fn data_line(increment: &str) -> Bytes {
    let mut line = serde_json::json!({ "data": increment }).to_string();
    line.push('\n');
    Bytes::from(line)
}

#[derive(Default)]
pub struct FakeUpstream {
    script: Mutex<VecDeque<Scripted>>,
    /// Per-question scripts, for requests whose calls interleave.
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<UpstreamHttpRequest>>,
}

impl FakeUpstream {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    /// Replies are picked by the request's question: the last message of a
    /// session call or the `question` of a chat call.
    pub fn routed(routes: Vec<(&str, Vec<Scripted>)>) -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(
                routes
                    .into_iter()
                    .map(|(question, script)| (question.to_string(), script.into()))
                    .collect(),
            ),
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<UpstreamHttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl UpstreamClient for FakeUpstream {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = ProviderResult<UpstreamHttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            let route = question_of(&req);
            self.requests.lock().unwrap().push(req);
            let routed = match &route {
                Some(question) => self
                    .routes
                    .lock()
                    .unwrap()
                    .get_mut(question)
                    .map(VecDeque::pop_front),
                None => None,
            };
            let next = match routed {
                Some(next) => next,
                None => self.script.lock().unwrap().pop_front(),
            }
            .expect("unexpected upstream call");
            match next {
                Scripted::Body { status, body } => Ok(UpstreamHttpResponse {
                    status,
                    body: UpstreamBody::Bytes(Bytes::from(body)),
                }),
                Scripted::Stream(items) => {
                    let (tx, rx) = mpsc::channel(items.len() + 1);
                    for item in items {
                        tx.try_send(item).unwrap();
                    }
                    Ok(UpstreamHttpResponse {
                        status: 200,
                        body: UpstreamBody::Stream(rx),
                    })
                }
                Scripted::Fail(err) => Err(err),
            }
        })
    }
}

fn question_of(req: &UpstreamHttpRequest) -> Option<String> {
    let body: Value = serde_json::from_slice(req.body.as_ref()?).ok()?;
    let question = match body.get("question") {
        Some(question) => question,
        None => &body["messages"].as_array()?.last()?["content"],
    };
    question.as_str().map(str::to_string)
}

pub fn test_config() -> FlowConfig {
    FlowConfig {
        base_url: "http://flow.test/".to_string(),
        bearer_token: Some("tok".to_string()),
        device_id: Some("dev".to_string()),
        ..FlowConfig::default()
    }
}

pub fn provider(config: FlowConfig, upstream: &Arc<FakeUpstream>) -> FlowProvider {
    FlowProvider::new(Arc::new(config), upstream.clone())
}

pub fn session_ok(id: &str) -> Scripted {
    Scripted::json(200, serde_json::json!({ "id": id, "title": "ignored" }))
}

/// Drains a frame channel and returns each SSE data payload in order.
pub async fn collect_events(mut frames: mpsc::Receiver<Bytes>) -> Vec<String> {
    let mut parser = SseDataParser::new();
    let mut events = Vec::new();
    while let Some(frame) = frames.recv().await {
        events.extend(parser.push_bytes(&frame));
    }
    events.extend(parser.finish());
    events
}

pub fn content_of(event: &str) -> Option<String> {
    let value: Value = serde_json::from_str(event).ok()?;
    value["choices"][0]["delta"]["content"]
        .as_str()
        .map(str::to_string)
}

pub fn finish_reason_of(event: &str) -> Option<String> {
    let value: Value = serde_json::from_str(event).ok()?;
    value["choices"][0]["finish_reason"]
        .as_str()
        .map(str::to_string)
}

pub fn body_json(req: &UpstreamHttpRequest) -> Value {
    serde_json::from_slice(req.body.as_ref().expect("request body")).unwrap()
}
