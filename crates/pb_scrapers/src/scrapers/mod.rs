pub mod arxiv;

/// Common utilities for scrapers
pub(crate) mod utils {
    use pb_core::{Error, Result};
    use scraper::{ElementRef, Selector};
    use url::Url;

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::Scraping(format!("Failed to parse URL: {}", e)))
    }

    pub fn join_url(base: &str, href: &str) -> Result<String> {
        let joined = parse_url(base)?
            .join(href)
            .map_err(|e| Error::Scraping(format!("Failed to resolve {}: {}", href, e)))?;
        Ok(joined.to_string())
    }

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| Error::Scraping(format!("Invalid selector {}: {:?}", css, e)))
    }

    /// Every non-empty text node below `element`, trimmed and space separated.
    pub fn element_text(element: &ElementRef<'_>) -> String {
        collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
    }

    /// Text nodes that are direct children of `element`, skipping nested tags.
    pub fn own_text(element: &ElementRef<'_>) -> String {
        let pieces = element
            .children()
            .filter_map(|node| node.value().as_text())
            .map(|text| text.trim().to_string())
            .collect::<Vec<_>>();
        collapse_whitespace(&pieces.join(" "))
    }

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
