//! Runtime: runs the suggestion pipeline over opportunity rows.
//!
//! `Pipeline` wires the normalizer, language detector, anchor generator and
//! matcher together; `assemble` flattens row outcomes into export records.

pub mod assemble;
pub mod pipeline;
pub mod types;

pub use assemble::{
    assemble, assemble_all, results_to_csv, suggestions_by_opportunity, write_results,
    OpportunitySuggestions, ResultRecord,
};
pub use pipeline::Pipeline;
pub use types::*;
