//! Tool adapters for the docent controller.
//!
//! Each [`ToolType`](docent_types::ToolType) has exactly one adapter. The
//! adapters form a closed set of variants behind a single capability,
//! [`ToolAdapter::run`], and are held in an immutable [`ToolRegistry`] built
//! once at startup.
//!
//! Adapters never fail past their own boundary: every upstream or parameter
//! problem comes back as a [`ToolResult`](docent_types::ToolResult) with
//! `status = error`.
//!
//! # Example
//!
//! ```rust,ignore
//! use docent_tools::{IntentDetectionTool, SearchLimits, ToolRegistry, VectorSearchTool};
//!
//! let registry = ToolRegistry::builder()
//!     .register(IntentDetectionTool::new(classifier))
//!     .register(VectorSearchTool::new(index, SearchLimits::default()))
//!     .build();
//! ```

mod adapter;
mod error;
mod intent;
mod params;
mod registry;
mod search;

pub use adapter::{ToolAdapter, ToolContext};
pub use error::{Result, ToolError};
pub use intent::IntentDetectionTool;
pub use params::{ParamExt, ParamResult, ParameterValidationError};
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use search::{
    DEFAULT_MAX_TOP_K, DEFAULT_TOP_K, SearchLimits, SearchParams, VectorSearchTool,
    matches_from_data,
};
