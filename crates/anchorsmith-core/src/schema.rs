//! Caller-chosen column mappings for input tables.
//!
//! Column names are configuration. A mapping is resolved once against a
//! table's header row into column indices; rows are then read through the
//! resolved form only.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Column names for the reference-link table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceColumns {
    pub topic: String,
    pub url: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            topic: "Target".into(),
            url: "Client URL".into(),
            language: None,
        }
    }
}

/// Column names for the opportunity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityColumns {
    pub source_url: String,
    pub anchor: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl Default for OpportunityColumns {
    fn default() -> Self {
        Self {
            source_url: "URL".into(),
            anchor: "Anchor".into(),
            text: None,
        }
    }
}

/// Column names for a live-link table searched by topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkColumns {
    pub topic: String,
    pub url: String,
    pub anchor: String,
}

impl Default for LinkColumns {
    fn default() -> Self {
        Self {
            topic: "Target".into(),
            url: "Client URL".into(),
            anchor: "Anchor".into(),
        }
    }
}

/// Reference columns resolved to header positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedReferenceColumns {
    pub topic: usize,
    pub url: usize,
    pub language: Option<usize>,
}

/// Opportunity columns resolved to header positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOpportunityColumns {
    pub source_url: usize,
    pub anchor: usize,
    pub text: Option<usize>,
}

/// Link columns resolved to header positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLinkColumns {
    pub topic: usize,
    pub url: usize,
    pub anchor: usize,
}

impl ReferenceColumns {
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedReferenceColumns> {
        Ok(ResolvedReferenceColumns {
            topic: find_column(headers, &self.topic)?,
            url: find_column(headers, &self.url)?,
            language: self
                .language
                .as_deref()
                .map(|name| find_column(headers, name))
                .transpose()?,
        })
    }
}

impl OpportunityColumns {
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedOpportunityColumns> {
        Ok(ResolvedOpportunityColumns {
            source_url: find_column(headers, &self.source_url)?,
            anchor: find_column(headers, &self.anchor)?,
            text: self
                .text
                .as_deref()
                .map(|name| find_column(headers, name))
                .transpose()?,
        })
    }
}

impl LinkColumns {
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedLinkColumns> {
        Ok(ResolvedLinkColumns {
            topic: find_column(headers, &self.topic)?,
            url: find_column(headers, &self.url)?,
            anchor: find_column(headers, &self.anchor)?,
        })
    }
}

/// Exact header match first, then a trimmed case-insensitive one.
fn find_column(headers: &[String], name: &str) -> Result<usize> {
    if let Some(idx) = headers.iter().position(|h| h == name) {
        return Ok(idx);
    }
    let wanted = name.trim().to_lowercase();
    headers
        .iter()
        .position(|h| h.trim().to_lowercase() == wanted)
        .ok_or_else(|| {
            Error::Config(format!(
                "column '{}' not found; available columns: {}",
                name,
                headers.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_reference_columns() {
        let cols = ReferenceColumns {
            topic: "Keyword".into(),
            url: "Page".into(),
            language: Some("Lang".into()),
        };
        let resolved = cols
            .resolve(&headers(&["Page", "Keyword", "Lang"]))
            .unwrap();
        assert_eq!(resolved.topic, 1);
        assert_eq!(resolved.url, 0);
        assert_eq!(resolved.language, Some(2));
    }

    #[test]
    fn test_resolve_is_case_insensitive_fallback() {
        let resolved = ReferenceColumns::default()
            .resolve(&headers(&[" target ", "client url"]))
            .unwrap();
        assert_eq!(resolved.topic, 0);
        assert_eq!(resolved.url, 1);
        assert_eq!(resolved.language, None);
    }

    #[test]
    fn test_missing_column_is_config_error() {
        let err = OpportunityColumns::default()
            .resolve(&headers(&["URL", "Text"]))
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Anchor"));
        assert!(err.to_string().contains("URL, Text"));
    }
}
