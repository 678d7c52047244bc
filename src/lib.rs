//! DataLens backend: upload a tabular dataset, ask questions in natural
//! language, get answers from LLM-generated analysis code executed in an
//! isolated remote sandbox.
//!
//! Pipeline: upload → session bound to a sandbox + dataset staged → query →
//! code generation → sandboxed execution → normalized response.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod sandbox;
pub mod schemas;
pub mod server;
pub mod session;

pub use error::Error;
