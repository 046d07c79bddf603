//! TF-IDF vector space.
//!
//! Tokens are lowercase runs of two or more word characters. Weights are raw
//! term counts times the smoothed IDF `ln((1 + n) / (1 + df)) + 1`, and every
//! vector is L2-normalized so cosine similarity is a plain dot product.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Lowercased tokens of `text`, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Sparse vector sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Dot product; both sides are sorted so this is a linear merge.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            match a.cmp(&b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity of two normalized vectors, clamped to [0, 1].
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let sim = self.dot(other);
        if sim.is_nan() {
            0.0
        } else {
            sim.clamp(0.0, 1.0)
        }
    }
}

/// Vocabulary and IDF weights fitted over a document set.
#[derive(Debug, Clone, Default)]
pub struct TfIdfSpace {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfSpace {
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let n = documents.len() as f64;
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();

        for doc in documents {
            let mut tokens = tokenize(doc.as_ref());
            tokens.sort_unstable();
            tokens.dedup();
            for token in tokens {
                let next = vocabulary.len();
                let idx = *vocabulary.entry(token).or_insert(next);
                if idx == df.len() {
                    df.push(0);
                }
                df[idx] += 1;
            }
        }

        let idf = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Normalized TF-IDF vector. Out-of-vocabulary tokens are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        entries.sort_unstable_by_key(|(idx, _)| *idx);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 1e-12 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        } else {
            entries.clear();
        }
        SparseVector { entries }
    }

    pub fn transform_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SparseVector> {
        texts.iter().map(|t| self.transform(t.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Bet on Darts! a 1v1 x"),
            vec!["bet", "on", "darts", "1v1"]
        );
        assert_eq!(tokenize("Apuestas de fútbol"), vec!["apuestas", "de", "fútbol"]);
    }

    #[test]
    fn test_idf_smoothing() {
        let space = TfIdfSpace::fit(&["online darts", "live casino"]);
        assert_eq!(space.vocabulary_len(), 4);
        // Each term appears in one of two documents: ln(3/2) + 1
        let expected = (3.0f64 / 2.0).ln() + 1.0;
        assert!(space.idf.iter().all(|w| (w - expected).abs() < 1e-12));
    }

    #[test]
    fn test_vectors_are_normalized() {
        let space = TfIdfSpace::fit(&["online darts darts", "live casino", "darts"]);
        let v = space.transform("online darts darts");
        assert!((v.norm() - 1.0).abs() < 1e-9);
        assert!((v.cosine(&v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_vocabulary_is_zero() {
        let space = TfIdfSpace::fit(&["online darts"]);
        let v = space.transform("poker tournament");
        assert!(v.is_zero());
        assert_eq!(v.cosine(&space.transform("online darts")), 0.0);
    }

    #[test]
    fn test_shared_terms_score_higher() {
        let space = TfIdfSpace::fit(&["online darts", "live casino", "bet on darts"]);
        let query = space.transform("bet on darts");
        let darts = space.transform("online darts");
        let casino = space.transform("live casino");
        assert!(query.cosine(&darts) > query.cosine(&casino));
        assert_eq!(query.cosine(&casino), 0.0);
    }

    #[test]
    fn test_empty_fit() {
        let space = TfIdfSpace::fit::<&str>(&[]);
        assert!(space.is_empty());
        assert!(space.transform("anything").is_zero());
    }
}
