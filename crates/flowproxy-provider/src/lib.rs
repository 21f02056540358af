//! FlowGPT upstream provider.
//!
//! The request path is `FlowProvider::chat_completion`: validate, create the
//! upstream conversation, open the signed chat stream, then drive every raw
//! increment through a per-request [`StreamCleaner`] and [`StreamTranslator`].

pub mod cleaner;
pub mod client;
pub mod config;
pub mod credential;
pub mod errors;
pub mod orchestrator;
pub mod session;
pub mod translator;

pub use cleaner::{CleanerState, DECISION_THRESHOLD, MARKER, StreamCleaner};
pub use client::{
    ByteStream, Headers, HttpMethod, UpstreamBody, UpstreamClient, UpstreamClientConfig,
    UpstreamHttpRequest, UpstreamHttpResponse, WreqUpstreamClient, header_get, header_set,
};
pub use config::FlowConfig;
pub use credential::{FlowCredentials, SignedHeaders};
pub use errors::{ProviderError, ProviderResult, TransportErrorKind};
pub use orchestrator::{ChatCompletionStream, FlowProvider, RequestPhase};
pub use session::SessionEstablisher;
pub use translator::StreamTranslator;
