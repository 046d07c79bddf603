//! Resolvers: map anchor candidates onto reference links.
//!
//! `tfidf` builds the vector space, `matcher` picks the best reference per
//! candidate (jointly fitted or language-aware), `search` looks up existing
//! live links by topic.

pub mod matcher;
pub mod search;
pub mod tfidf;
pub mod types;

pub use matcher::{match_joint, ReferenceIndex};
pub use search::search_links;
pub use tfidf::{tokenize, SparseVector, TfIdfSpace};
pub use types::*;
