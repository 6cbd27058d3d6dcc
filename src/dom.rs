//! Documents and element handles.
//!
//! A `Document` owns immutable HTML source. An `Element` names one element
//! of that source by CSS selector and match index; it is cheap to clone and
//! `Send`, so it can be moved onto a blocking task for rasterization. The
//! parsed tree itself is rebuilt wherever it is needed because `scraper`'s
//! tree is not thread-safe.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use crate::{Error, Result};

/// Immutable HTML source that elements are resolved against
#[derive(Debug, Clone)]
pub struct Document {
    source: Arc<str>,
}

impl Document {
    pub fn from_html(html: impl Into<String>) -> Self {
        let html: String = html.into();
        Self { source: Arc::from(html) }
    }

    /// Read a document from a file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)
            .map_err(|e| Error::LoadError(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_html(html))
    }

    /// Read a document from any reader (stdin for the CLI)
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut html = String::new();
        reader
            .read_to_string(&mut html)
            .map_err(|e| Error::LoadError(e.to_string()))?;
        Ok(Self::from_html(html))
    }

    /// Fetch a document over HTTP(S)
    #[cfg(feature = "fetch")]
    pub fn fetch(location: &str, user_agent: &str) -> Result<Self> {
        let parsed = url::Url::parse(location)
            .map_err(|e| Error::LoadError(format!("invalid URL `{}`: {}", location, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::LoadError(format!("unsupported scheme `{}`", parsed.scheme())));
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::LoadError(format!("Failed to build HTTP client: {}", e)))?;

        let res = client
            .get(parsed)
            .send()
            .map_err(|e| Error::LoadError(format!("HTTP GET failed: {}", e)))?;
        if !res.status().is_success() {
            return Err(Error::LoadError(format!("HTTP status {}", res.status())));
        }
        let body = res
            .text()
            .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;
        Ok(Self::from_html(body))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Handle to the first element matching `selector`
    pub fn element(&self, selector: &str) -> Result<Element> {
        self.nth_element(selector, 0)
    }

    /// Handle to the `index`-th element matching `selector`
    ///
    /// Fails with `Error::ElementNotFound` when there is no such match, so
    /// callers never receive a handle to nothing.
    pub fn nth_element(&self, selector: &str, index: usize) -> Result<Element> {
        let element = Element {
            source: Arc::clone(&self.source),
            selector: selector.to_string(),
            index,
        };
        element.with_resolved(|_| ())?;
        Ok(element)
    }

    /// Handles to every element matching `selector`, in document order
    pub fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        let sel = parse_selector(selector)?;
        let count = Html::parse_document(&self.source).select(&sel).count();
        Ok((0..count)
            .map(|index| Element {
                source: Arc::clone(&self.source),
                selector: selector.to_string(),
                index,
            })
            .collect())
    }
}

/// A reference to one element of a `Document`
#[derive(Debug, Clone)]
pub struct Element {
    source: Arc<str>,
    selector: String,
    index: usize,
}

impl Element {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Source of the document the element belongs to
    pub fn document_source(&self) -> &str {
        &self.source
    }

    /// Parse the document and run `f` against the resolved element
    pub fn with_resolved<R>(&self, f: impl FnOnce(ElementRef<'_>) -> R) -> Result<R> {
        let sel = parse_selector(&self.selector)?;
        let html = Html::parse_document(&self.source);
        let found = html
            .select(&sel)
            .nth(self.index)
            .ok_or_else(|| Error::ElementNotFound {
                selector: self.selector.clone(),
                index: self.index,
            })?;
        Ok(f(found))
    }

    /// Concatenated text content of the element
    pub fn text(&self) -> Result<String> {
        self.with_resolved(|el| el.text().collect::<String>())
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    if selector.trim().is_empty() {
        return Err(Error::InvalidSelector(selector.to_string()));
    }
    Selector::parse(selector).map_err(|_| Error::InvalidSelector(selector.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html><body><div class=\"card\">One</div><div class=\"card\">Two</div></body></html>";

    #[test]
    fn element_resolves_by_selector() {
        let doc = Document::from_html(PAGE);
        let el = doc.element(".card").unwrap();
        assert_eq!(el.text().unwrap(), "One");
        let second = doc.nth_element(".card", 1).unwrap();
        assert_eq!(second.text().unwrap(), "Two");
    }

    #[test]
    fn missing_element_is_an_error() {
        let doc = Document::from_html(PAGE);
        match doc.element("#nope") {
            Err(Error::ElementNotFound { selector, index }) => {
                assert_eq!(selector, "#nope");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(doc.nth_element(".card", 2).is_err());
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let doc = Document::from_html(PAGE);
        assert!(matches!(doc.element("div[[["), Err(Error::InvalidSelector(_))));
        assert!(matches!(doc.element("   "), Err(Error::InvalidSelector(_))));
    }

    #[test]
    fn query_all_lists_matches_in_order() {
        let doc = Document::from_html(PAGE);
        let all = doc.query_all(".card").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].index(), 1);
    }
}
