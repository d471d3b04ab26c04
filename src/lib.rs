//! # Path Insight Agent
//!
//! A chat front-end over an LLM agent that runs Network Wide Path Insight
//! traces on an SD-WAN controller.
//!
//! This library provides:
//! - An HTTP API with a single chat endpoint and an alert webhook
//! - A tool-based agent loop over the controller's diagnostic operations
//! - A bounded-retry chat wrapper that feeds classified failures back to the
//!   agent so it can self-correct
//!
//! ## Architecture
//!
//! A chat turn flows: HTTP request -> chat wrapper -> agent executor (which
//! may call diagnostic tools zero or more times, consulting the system prompt
//! and the conversation memory) -> final text -> HTTP response. Recoverable
//! failures (missing tool parameter, unreachable controller, nonexistent
//! device) are rephrased and replayed through the executor up to two times.

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod notify;
pub mod nwpi;
pub mod tools;

pub use config::Config;
