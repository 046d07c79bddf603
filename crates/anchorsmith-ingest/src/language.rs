//! Language detection: script histogram plus stop-word frequency scoring.
//!
//! Non-Latin scripts identify the language directly. Latin-script text is
//! scored against fixed per-language stop-word lists; no hits or a tied top
//! score yields the configured fallback code.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

pub const DEFAULT_MIN_CHARS: usize = 10;

/// How a language code was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Script,
    Stopwords,
    Fallback,
}

/// Detection outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub code: String,
    pub confidence: f64,
    pub method: DetectionMethod,
}

const STOPWORDS: &[(&str, &[&str])] = &[
    ("en", &[
        "the", "and", "of", "to", "is", "it", "that", "for", "you", "with",
        "this", "are", "was", "be", "at", "by", "not", "or", "from", "have",
        "but", "they", "what", "your", "can", "will", "about", "more", "how",
        "all", "an", "which", "their", "should", "would",
    ]),
    ("es", &[
        "el", "la", "los", "las", "de", "del", "que", "y", "en", "un", "una",
        "es", "por", "con", "para", "como", "más", "pero", "sus", "al", "lo",
        "se", "su", "este", "esta", "son", "también", "hay", "muy", "cuando",
        "sobre",
    ]),
    ("fr", &[
        "le", "la", "les", "des", "de", "du", "et", "est", "un", "une", "en",
        "que", "qui", "dans", "pour", "pas", "sur", "au", "avec", "ce",
        "cette", "sont", "il", "elle", "nous", "vous", "mais", "ou", "plus",
        "par",
    ]),
    ("de", &[
        "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "zu", "den",
        "von", "mit", "sich", "des", "auf", "für", "im", "dem", "auch", "es",
        "werden", "aus", "er", "sie", "wir", "ich", "bei", "oder", "wie",
        "noch", "sind",
    ]),
    ("it", &[
        "il", "lo", "la", "gli", "le", "di", "che", "è", "e", "un", "una",
        "per", "non", "con", "del", "della", "sono", "nel", "alla", "ma",
        "come", "anche", "più", "questo", "questa", "ci", "dei", "delle",
    ]),
    ("pt", &[
        "o", "os", "a", "as", "de", "do", "da", "dos", "das", "que", "e", "um",
        "uma", "em", "no", "na", "para", "com", "não", "por", "mais", "como",
        "mas", "foi", "ao", "são", "também", "seu", "sua", "você",
    ]),
    ("nl", &[
        "de", "het", "een", "en", "van", "is", "dat", "op", "te", "in", "voor",
        "niet", "met", "zijn", "er", "maar", "ook", "als", "aan", "bij",
        "door", "wordt", "dit", "die", "wat", "naar", "nog", "worden",
    ]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Script {
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Hangul,
    Kana,
    Han,
    Thai,
    Devanagari,
}

fn script_of(c: char) -> Option<Script> {
    let script = match c as u32 {
        0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F | 0x1E00..=0x1EFF => Script::Latin,
        0x0370..=0x03FF | 0x1F00..=0x1FFF => Script::Greek,
        0x0400..=0x052F => Script::Cyrillic,
        0x0590..=0x05FF => Script::Hebrew,
        0x0600..=0x06FF | 0x0750..=0x077F => Script::Arabic,
        0x0900..=0x097F => Script::Devanagari,
        0x0E00..=0x0E7F => Script::Thai,
        0x3040..=0x30FF => Script::Kana,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF => Script::Han,
        0xAC00..=0xD7AF | 0x1100..=0x11FF => Script::Hangul,
        _ => return None,
    };
    Some(script)
}

/// Detects two-letter language codes with a fixed fallback.
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    fallback: String,
    min_chars: usize,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new("en", DEFAULT_MIN_CHARS)
    }
}

impl LanguageDetector {
    pub fn new(fallback: impl Into<String>, min_chars: usize) -> Self {
        Self {
            fallback: fallback.into(),
            min_chars,
        }
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Two-letter language code for `text`.
    pub fn detect(&self, text: &str) -> String {
        self.detect_with_confidence(text).code
    }

    pub fn detect_with_confidence(&self, text: &str) -> Detection {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_chars {
            return self.fallback_detection();
        }

        if let Some(detection) = detect_by_script(trimmed) {
            return detection;
        }

        match detect_by_stopwords(trimmed) {
            Some(detection) => detection,
            None => {
                debug!("Language ambiguous, using fallback '{}'", self.fallback);
                self.fallback_detection()
            }
        }
    }

    fn fallback_detection(&self) -> Detection {
        Detection {
            code: self.fallback.clone(),
            confidence: 0.0,
            method: DetectionMethod::Fallback,
        }
    }
}

/// Dominant non-Latin script, if any.
fn detect_by_script(text: &str) -> Option<Detection> {
    let mut counts: HashMap<Script, usize> = HashMap::new();
    let mut total = 0usize;
    for script in text.chars().filter(|c| c.is_alphabetic()).filter_map(script_of) {
        *counts.entry(script).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return None;
    }

    // Japanese mixes kana with Han; any notable kana share decides it.
    let kana = counts.get(&Script::Kana).copied().unwrap_or(0);
    let han = counts.get(&Script::Han).copied().unwrap_or(0);
    if kana > 0 && kana + han > total / 2 {
        return Some(script_detection("ja", kana + han, total));
    }

    let count = counts.values().copied().max()?;
    let mut leaders = counts.iter().filter(|(_, n)| **n == count);
    let (&script, _) = leaders.next()?;
    if leaders.next().is_some() {
        // Two scripts share the lead: leave it to the stop-word stage
        return None;
    }
    let code = match script {
        Script::Latin => return None,
        Script::Cyrillic => "ru",
        Script::Greek => "el",
        Script::Arabic => "ar",
        Script::Hebrew => "he",
        Script::Hangul => "ko",
        Script::Kana => "ja",
        Script::Han => "zh",
        Script::Thai => "th",
        Script::Devanagari => "hi",
    };
    Some(script_detection(code, count, total))
}

fn script_detection(code: &str, count: usize, total: usize) -> Detection {
    Detection {
        code: code.to_string(),
        confidence: count as f64 / total as f64,
        method: DetectionMethod::Script,
    }
}

/// Stop-word frequency scoring. `None` when nothing matches or the top
/// score is shared.
fn detect_by_stopwords(text: &str) -> Option<Detection> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return None;
    }

    let mut scores: Vec<(&str, usize)> = STOPWORDS
        .iter()
        .map(|(code, words)| {
            let hits = tokens.iter().filter(|t| words.contains(*t)).count();
            (*code, hits)
        })
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    let (best_code, best) = scores[0];
    let runner_up = scores.get(1).map(|s| s.1).unwrap_or(0);
    if best == 0 || best == runner_up {
        return None;
    }

    Some(Detection {
        code: best_code.to_string(),
        confidence: best as f64 / tokens.len() as f64,
        method: DetectionMethod::Stopwords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english() {
        let detector = LanguageDetector::default();
        let d = detector.detect_with_confidence(
            "This is a guide to the best darts betting sites and how they work",
        );
        assert_eq!(d.code, "en");
        assert_eq!(d.method, DetectionMethod::Stopwords);
        assert!(d.confidence > 0.0);
    }

    #[test]
    fn test_spanish() {
        let detector = LanguageDetector::default();
        assert_eq!(
            detector.detect("El perro come la comida en la casa y los niños juegan"),
            "es"
        );
    }

    #[test]
    fn test_german() {
        let detector = LanguageDetector::default();
        assert_eq!(
            detector.detect("Der Hund und die Katze sind nicht im Haus"),
            "de"
        );
    }

    #[test]
    fn test_non_latin_scripts() {
        let detector = LanguageDetector::default();
        assert_eq!(detector.detect("Привет, как дела сегодня?"), "ru");
        assert_eq!(detector.detect("ライブカジノで遊ぶ方法について"), "ja");
        assert_eq!(detector.detect("온라인 다트 게임 베팅 가이드"), "ko");
    }

    #[test]
    fn test_short_input_falls_back() {
        let detector = LanguageDetector::new("fr", 10);
        let d = detector.detect_with_confidence("das ist");
        assert_eq!(d.code, "fr");
        assert_eq!(d.method, DetectionMethod::Fallback);
    }

    #[test]
    fn test_script_tie_falls_back() {
        let detector = LanguageDetector::default();
        for _ in 0..20 {
            let detection = detector.detect_with_confidence("абвгд αβγδε абвгд αβγδε");
            assert_eq!(detection.code, "en");
            assert_eq!(detection.method, DetectionMethod::Fallback);
        }
    }

    #[test]
    fn test_ambiguous_falls_back() {
        let detector = LanguageDetector::default();
        assert_eq!(detector.detect("xyzzy plugh frobnicate quux"), "en");
        let detector = LanguageDetector::new("pt", 10);
        assert_eq!(detector.detect("12345 67890 !!!"), "pt");
    }
}
