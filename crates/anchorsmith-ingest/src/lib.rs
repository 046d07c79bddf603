//! Anchorsmith Ingest: text normalization, language detection, content
//! extraction from files and URLs, and CSV table loading/export.

pub mod fetch;
pub mod file;
pub mod language;
pub mod normalize;
pub mod table;

pub use fetch::{ContentFetcher, FetchedPage};
pub use language::{Detection, DetectionMethod, LanguageDetector};
pub use normalize::{normalize, normalize_default, NormalizeOptions};
