//! Text normalization: markup removal, case folding, punctuation stripping.
//!
//! Output is a flat lowercase string with single spaces. With punctuation
//! stripping enabled (the default) normalization is idempotent.

use anchorsmith_core::PunctuationPolicy;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").unwrap()
});
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").unwrap());
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap());
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Elements rendered within a line of text. Any other tag is a word boundary.
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "del", "dfn", "em", "font", "i",
    "ins", "kbd", "mark", "q", "s", "samp", "small", "span", "strike", "strong", "sub", "sup",
    "time", "u", "var", "wbr",
];

pub(crate) fn is_inline_element(name: &str) -> bool {
    INLINE_ELEMENTS
        .iter()
        .any(|inline| inline.eq_ignore_ascii_case(name))
}

fn tag_name(tag: &str) -> &str {
    let inner = tag.trim_start_matches('<').trim_start();
    let inner = inner.trim_start_matches('/').trim_start();
    let end = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    &inner[..end]
}

/// Normalization options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub punctuation: PunctuationPolicy,
}

impl NormalizeOptions {
    pub fn new(punctuation: PunctuationPolicy) -> Self {
        Self { punctuation }
    }
}

/// Normalize with the default policy (punctuation stripped after markup).
pub fn normalize_default(raw: &str) -> String {
    normalize(raw, &NormalizeOptions::default())
}

/// Normalize raw text or HTML into a flat lowercase string.
pub fn normalize(raw: &str, options: &NormalizeOptions) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let decoded = decode_entities(raw);
    let text = match options.punctuation {
        PunctuationPolicy::AfterMarkup => strip_punctuation(&strip_markup(&decoded)),
        // Stripping punctuation first also destroys tag delimiters; tag
        // names then survive as plain words.
        PunctuationPolicy::BeforeMarkup => strip_markup(&strip_punctuation(&decoded)),
        PunctuationPolicy::Keep => strip_markup(&decoded),
    };

    collapse_whitespace(&text.to_lowercase())
}

/// Remove script/style blocks, comments and tags. Inline tags vanish so
/// `foot<b>ball</b>` stays one word; every other tag becomes a space.
pub fn strip_markup(text: &str) -> String {
    let text = SCRIPT_STYLE.replace_all(text, " ");
    let text = COMMENT.replace_all(&text, " ");
    TAG.replace_all(&text, |caps: &Captures| {
        if is_inline_element(tag_name(&caps[0])) {
            ""
        } else {
            " "
        }
    })
    .into_owned()
}

fn strip_punctuation(text: &str) -> String {
    PUNCTUATION.replace_all(text, "").into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode named and numeric HTML entities. Unknown entities are left as-is.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(body)
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "copy" => '©',
        "reg" => '®',
        "euro" => '€',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_paragraph() {
        assert_eq!(normalize_default("<p>Hello <b>world</b></p>"), "hello world");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize_default(""), "");
        assert_eq!(normalize_default("   \n\t "), "");
        assert_eq!(normalize_default("<div></div>"), "");
    }

    #[test]
    fn test_block_elements_do_not_merge() {
        assert_eq!(
            normalize_default("<h1>Online Darts</h1><p>Bet now!</p>"),
            "online darts bet now"
        );
    }

    #[test]
    fn test_scripts_styles_comments_removed() {
        let html = "<style>p { color: red; }</style><p>Live casino</p>\
                    <script>var x = '<b>';</script><!-- hidden -->";
        assert_eq!(normalize_default(html), "live casino");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(normalize_default("Rock &amp; Roll&nbsp;Bets"), "rock roll bets");
        assert_eq!(decode_entities("caf&#233; &#x41;"), "café A");
        assert_eq!(decode_entities("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn test_unicode_words_survive() {
        assert_eq!(normalize_default("¡Apuestas en DARDOS!"), "apuestas en dardos");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<p>Hello <b>world</b></p>",
            "Bet on darts, it's fun!!!",
            "  Mixed   CASE\tand\nlines ",
            "<a href=\"/x\">Play &amp; win</a> — today",
        ];
        for input in inputs {
            let once = normalize_default(input);
            assert_eq!(normalize_default(&once), once, "input: {input}");
        }
    }

    #[test]
    fn test_punctuation_before_markup() {
        let opts = NormalizeOptions::new(PunctuationPolicy::BeforeMarkup);
        assert_eq!(normalize("<p>Hello</p>", &opts), "phellop");
        let opts = NormalizeOptions::new(PunctuationPolicy::BeforeMarkup);
        assert_eq!(normalize("Bet, now.", &opts), "bet now");
    }

    #[test]
    fn test_punctuation_kept() {
        let opts = NormalizeOptions::new(PunctuationPolicy::Keep);
        assert_eq!(normalize("<p>Bet <i>now</i>!</p>", &opts), "bet now!");
    }

    #[test]
    fn test_inline_markup_keeps_words_whole() {
        assert_eq!(normalize_default("<p>foot<b>ball</b> odds</p>"), "football odds");
        assert_eq!(
            normalize_default("<li>Live</li><li>casino</li><br/>tips"),
            "live casino tips"
        );
        assert_eq!(strip_markup("Bet <A HREF=\"/x\">now</A>, today"), "Bet now, today");
    }
}
