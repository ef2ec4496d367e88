//! Request orchestration for docent.
//!
//! The [`Controller`] is the single entry point: it resolves the session,
//! decides which tools run, dispatches them through the tool registry,
//! composes an answer with the generator, and records the turn.
//!
//! ```text
//! McpRequest ──► resolve session ──► select tools ──► run (concurrent, timed)
//!                                                          │
//! McpResponse ◄── record turn ◄── generate answer ◄────────┘
//! ```
//!
//! Only request validation, which happens before `process` is called, can
//! reject a turn. Everything after that degrades into the response.

mod config;
mod controller;
mod error;
mod policy;
pub mod prompt;

pub use config::{
    ControllerConfig, DEFAULT_GENERATION_TIMEOUT, DEFAULT_HISTORY_TURNS, DEFAULT_TOOL_TIMEOUT,
    FALLBACK_ANSWER,
};
pub use controller::Controller;
pub use error::{ControllerError, Result};
pub use policy::{
    ClassifyOnly, DEFAULT_NON_INFORMATIONAL_ROUTES, DEFAULT_SEARCH_PATTERNS, IntentGatedSearch,
    KeywordPolicy, SelectionPolicy, SharedPolicy,
};
pub use prompt::{PromptLibrary, PromptTemplate};
