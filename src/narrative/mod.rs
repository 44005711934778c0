//! Narration - dialogue service seam, fallback pool and LLM client

pub mod client;
pub mod context;
pub mod fallback;
pub mod narrator;

pub use client::{ApiFormat, LlmClient};
pub use context::{DialogueContext, DialogueKind, DialogueRequest};
pub use fallback::FallbackPool;
pub use narrator::{DialogueService, LineSource, Narration, Narrator, RogueDialogue};
