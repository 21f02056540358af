//! Wire types for both sides of the proxy.
//!
//! `openai` holds the downstream chat-completions and models shapes, `flowgpt`
//! holds the upstream request/response bodies. `sse` and `jsonl` are the two
//! stream framings the proxy reads and writes.

pub mod flowgpt;
pub mod jsonl;
pub mod openai;
pub mod sse;
