//! Anchor candidate → reference link matching.
//!
//! Two strategies share the same argmax rule (first maximum wins, so ties go
//! to the earliest reference row):
//! - `match_joint` fits one space over reference topics and the candidates.
//! - `ReferenceIndex` fits once over reference topics and filters by language.

use anchorsmith_core::{language_prefix, AnchorCandidate, ReferenceLink};
use tracing::debug;

use crate::tfidf::{SparseVector, TfIdfSpace};
use crate::types::{LinkMatch, ReferenceScope};

/// Index and similarity of the best vector among `pool`.
fn best_of<'a>(
    query: &SparseVector,
    pool: impl IntoIterator<Item = (usize, &'a SparseVector)>,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, vector) in pool {
        let sim = query.cosine(vector);
        match best {
            Some((_, top)) if sim <= top => {}
            _ => best = Some((idx, sim)),
        }
    }
    best
}

fn valid_references(references: &[ReferenceLink]) -> Vec<&ReferenceLink> {
    references.iter().filter(|r| r.is_valid()).collect()
}

/// Match each candidate against a space fitted jointly over the reference
/// topics and the candidate phrases. No language filtering.
pub fn match_joint(candidates: &[AnchorCandidate], references: &[ReferenceLink]) -> Vec<LinkMatch> {
    let references = valid_references(references);
    if candidates.is_empty() || references.is_empty() {
        return Vec::new();
    }

    let documents: Vec<&str> = references
        .iter()
        .map(|r| r.topic.as_str())
        .chain(candidates.iter().map(|c| c.phrase.as_str()))
        .collect();
    let space = TfIdfSpace::fit(&documents);
    let ref_vectors: Vec<SparseVector> = references
        .iter()
        .map(|r| space.transform(&r.topic))
        .collect();

    candidates
        .iter()
        .filter_map(|candidate| {
            let query = space.transform(&candidate.phrase);
            let (idx, similarity) = best_of(&query, ref_vectors.iter().enumerate())?;
            Some(LinkMatch {
                anchor: candidate.clone(),
                url: references[idx].url.clone(),
                topic: references[idx].topic.clone(),
                similarity,
            })
        })
        .collect()
}

/// Reference topics vectorized once, for language-aware matching.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    references: Vec<ReferenceLink>,
    prefixes: Vec<String>,
    vectors: Vec<SparseVector>,
    space: TfIdfSpace,
}

impl ReferenceIndex {
    /// Build over the valid entries of `references`.
    pub fn build(references: &[ReferenceLink]) -> Self {
        let references: Vec<ReferenceLink> = references
            .iter()
            .filter(|r| r.is_valid())
            .cloned()
            .collect();
        let topics: Vec<&str> = references.iter().map(|r| r.topic.as_str()).collect();
        let space = TfIdfSpace::fit(&topics);
        let vectors = space.transform_all(&topics);
        let prefixes = references.iter().map(|r| r.language_prefix()).collect();

        debug!(
            "Reference index: {} links, {} terms",
            references.len(),
            space.vocabulary_len()
        );

        Self {
            references,
            prefixes,
            vectors,
            space,
        }
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn references(&self) -> &[ReferenceLink] {
        &self.references
    }

    /// Rows eligible for `language`, falling back to the whole table when no
    /// reference shares its two-letter prefix.
    pub fn scope(&self, language: &str) -> (Vec<usize>, ReferenceScope) {
        let prefix = language_prefix(language);
        let matching: Vec<usize> = self
            .prefixes
            .iter()
            .enumerate()
            .filter(|(_, p)| !prefix.is_empty() && **p == prefix)
            .map(|(i, _)| i)
            .collect();

        if matching.is_empty() {
            debug!(
                "No references for language '{}', using full table",
                language
            );
            ((0..self.references.len()).collect(), ReferenceScope::FullTable)
        } else {
            (matching, ReferenceScope::Language)
        }
    }

    /// Best reference for one candidate.
    pub fn best_match(&self, candidate: &AnchorCandidate, language: &str) -> Option<LinkMatch> {
        let (rows, _) = self.scope(language);
        self.best_in(candidate, &rows)
    }

    /// One match per candidate, in candidate order.
    pub fn match_all(&self, candidates: &[AnchorCandidate], language: &str) -> Vec<LinkMatch> {
        if self.is_empty() || candidates.is_empty() {
            return Vec::new();
        }
        let (rows, _) = self.scope(language);
        candidates
            .iter()
            .filter_map(|c| self.best_in(c, &rows))
            .collect()
    }

    fn best_in(&self, candidate: &AnchorCandidate, rows: &[usize]) -> Option<LinkMatch> {
        let query = self.space.transform(&candidate.phrase);
        let (idx, similarity) = best_of(&query, rows.iter().map(|&i| (i, &self.vectors[i])))?;
        let reference = &self.references[idx];
        Some(LinkMatch {
            anchor: candidate.clone(),
            url: reference.url.clone(),
            topic: reference.topic.clone(),
            similarity,
        })
    }
}
