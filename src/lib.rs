//! Codemate - Editor-style AI assistant engine
//!
//! Provider-agnostic chat with bounded, persistent conversation history,
//! reply classification, a positional line diff, and an accept/discard
//! review workflow for generated code.

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod provider;
pub mod storage;
pub mod utils;

pub use config::Settings;
pub use engine::{Command, Engine, EngineState};
pub use error::{Error, Result};
