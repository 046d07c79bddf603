//! Anchor candidate generation with external LLMs (OpenAI/Anthropic/Groq).
//!
//! The generator builds a prompt, calls a `TextGenerator`, parses the reply
//! into short phrases and filters them. Service failures never reach the
//! caller; they degrade to the seed keyword or an empty list.

pub mod client;
pub mod config;
pub mod generator;
pub mod prompt;
pub mod providers;
pub mod types;

pub use client::{LlmClient, TextGenerator};
pub use config::LlmConfig;
pub use generator::{filter_phrases, parse_phrases, AnchorGenerator, AnchorRequest};
pub use types::*;
