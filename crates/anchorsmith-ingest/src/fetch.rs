//! URL content extraction.
//!
//! Fetches a page with a fixed timeout and pulls readable text (title,
//! headings, paragraphs, list items) out of the HTML.

use std::time::Duration;

use anchorsmith_core::{Error, Result};
use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::normalize::is_inline_element;

const USER_AGENT: &str = concat!("anchorsmith/", env!("CARGO_PKG_VERSION"));

/// Text extracted from a fetched page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// HTTP fetcher for opportunity pages.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
}

impl ContentFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { client })
    }

    /// Fetch a page and extract its readable text.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed = validate_url(url)?;
        debug!("Fetching {}", parsed);

        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", parsed, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{} returned status {}", parsed, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", parsed, e)))?;

        let (title, text) = extract_page_text(&body);
        Ok(FetchedPage {
            url: parsed.to_string(),
            title,
            text,
        })
    }

    /// Fetch a page's text; failures are logged and yield an empty string.
    pub async fn fetch_text_or_empty(&self, url: &str) -> String {
        match self.fetch(url).await {
            Ok(page) => page.text,
            Err(e) => {
                warn!("Content fetch failed, continuing with empty text: {}", e);
                String::new()
            }
        }
    }
}

/// Only absolute http(s) URLs are fetched.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| Error::Fetch(format!("invalid URL '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::Fetch(format!("unsupported URL scheme: {}", other))),
    }
}

/// Extract `(title, text)` from an HTML document. Text blocks are joined
/// with newlines in document order.
pub fn extract_page_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").unwrap();
    let block_selector = Selector::parse("h1, h2, h3, h4, p, li, blockquote").unwrap();

    let title = document
        .select(&title_selector)
        .next()
        .map(|t| collapse(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let blocks: Vec<String> = document
        .select(&block_selector)
        // Nested blocks (p inside li) would otherwise repeat their text
        .filter(|el| {
            !el.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| matches!(a.value().name(), "p" | "li" | "blockquote"))
        })
        .map(|el| collapse(&element_text(el)))
        .filter(|t| !t.is_empty())
        .collect();

    let text = if blocks.is_empty() {
        // No block structure: fall back to every text node in the body
        collapse(&element_text(document.root_element()))
    } else {
        blocks.join("\n")
    };

    (title, text)
}

/// Text content of an element. Inline children join without a separator;
/// other elements are padded with spaces.
fn element_text(element: ElementRef) -> String {
    let mut out = String::new();
    push_text(element, &mut out);
    out
}

fn push_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if matches!(el.name(), "head" | "script" | "style" | "noscript" | "template") {
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let inline = is_inline_element(el.name());
                if !inline {
                    out.push(' ');
                }
                push_text(child_el, out);
                if !inline {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::Html as HtmlResponse;
    use axum::routing::get;
    use axum::Router;
    use std::net::SocketAddr;

    const PAGE: &str = r#"<html><head><title> Darts Guide </title>
        <style>p { color: red }</style></head>
        <body><nav><a href="/">Home</a></nav>
        <h1>Online Darts</h1>
        <p>Bet on <b>darts</b> matches.</p>
        <ul><li><p>Live odds</p></li><li>Tips</li></ul>
        </body></html>"#;

    #[test]
    fn test_extract_page_text() {
        let (title, text) = extract_page_text(PAGE);
        assert_eq!(title.as_deref(), Some("Darts Guide"));
        assert_eq!(text, "Online Darts\nBet on darts matches.\nLive odds\nTips");
    }

    #[test]
    fn test_extract_without_blocks() {
        let (title, text) = extract_page_text("<div>Just <span>loose</span> text</div>");
        assert!(title.is_none());
        assert_eq!(text, "Just loose text");
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        let (_, text) = extract_page_text(
            "<p>Foot<b>ball</b> odds, <a href=\"/x\">today</a>.</p><li>Line<br>break</li>",
        );
        assert_eq!(text, "Football odds, today.\nLine break");
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/blog").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }

    async fn spawn_fixture() -> SocketAddr {
        let app = Router::new()
            .route("/post", get(|| async { HtmlResponse(PAGE) }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let addr = spawn_fixture().await;
        let fetcher = ContentFetcher::new(Duration::from_secs(2)).unwrap();
        let page = fetcher.fetch(&format!("http://{}/post", addr)).await.unwrap();
        assert_eq!(page.title.as_deref(), Some("Darts Guide"));
        assert!(page.text.contains("Bet on darts matches."));
    }

    #[tokio::test]
    async fn test_fetch_error_yields_empty_text() {
        let addr = spawn_fixture().await;
        let fetcher = ContentFetcher::new(Duration::from_secs(2)).unwrap();

        let err = fetcher
            .fetch(&format!("http://{}/missing", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));

        let text = fetcher
            .fetch_text_or_empty(&format!("http://{}/missing", addr))
            .await;
        assert!(text.is_empty());
    }
}
