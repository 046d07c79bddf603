//! Anchorsmith Core: data model, column schemas, pipeline configuration.

pub mod config;
pub mod error;
pub mod schema;
pub mod types;

pub use config::{GenerationSettings, MatchMode, PipelineConfig, PunctuationPolicy};
pub use error::{Error, Result};
pub use schema::{LinkColumns, OpportunityColumns, ReferenceColumns};
pub use types::*;
