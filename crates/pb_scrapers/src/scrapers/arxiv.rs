use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use pb_core::{DateWindow, DocumentRecord, DocumentSource, Error, Result};
use reqwest::{Client, StatusCode};
use scraper::Html;
use crate::scrapers::utils;

pub const ARXIV_BASE_URL: &str = "https://arxiv.org";
const DATED_PAGE_SIZE: usize = 100;
const PASTWEEK_PAGE_SIZE: usize = 25;
const PASTWEEK_PAGES: usize = 4;

#[derive(Debug, Clone)]
pub struct ArxivConfig {
    pub base_url: String,
    pub categories: Vec<String>,
    /// Pause before every request.
    pub request_delay: Duration,
    pub user_agent: String,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: ARXIV_BASE_URL.to_string(),
            categories: vec!["cs.CL".to_string(), "cs.AI".to_string()],
            request_delay: Duration::from_secs(1),
            user_agent: concat!("pb/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// One listing page to crawl and the date its entries are filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub url: String,
    pub category: String,
    pub added_at: NaiveDate,
}

/// A listing row, before its abstract page has been fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub id: String,
    pub title: String,
    pub authors: String,
    pub abs_url: String,
    pub category: String,
    pub added_at: NaiveDate,
}

impl ListingEntry {
    pub fn into_record(self, abstract_text: String) -> DocumentRecord {
        DocumentRecord {
            id: self.id,
            category: self.category,
            title: self.title,
            authors: self.authors,
            abstract_text,
            url: self.abs_url,
            added_at: self.added_at,
        }
    }
}

/// Parse an arXiv `/list/...` page.
pub fn parse_listing(html: &str, page_url: &str, category: &str, added_at: NaiveDate) -> Result<Vec<ListingEntry>> {
    let document = Html::parse_document(html);
    let title_selector = utils::selector("div.list-title")?;
    let authors_selector = utils::selector("div.list-authors")?;
    let author_link_selector = utils::selector("a")?;
    let abstract_link_selector = utils::selector(r#"a[title="Abstract"]"#)?;

    let titles = document.select(&title_selector).collect::<Vec<_>>();
    let authors = document.select(&authors_selector).collect::<Vec<_>>();
    let links = document.select(&abstract_link_selector).collect::<Vec<_>>();

    let count = titles.len().min(authors.len()).min(links.len());
    if count < titles.len().max(authors.len()).max(links.len()) {
        tracing::warn!(
            page_url,
            titles = titles.len(),
            authors = authors.len(),
            links = links.len(),
            "Listing columns have different lengths, keeping the first {}",
            count
        );
    }

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let link = links[i].value();
        let Some(href) = link.attr("href") else {
            continue;
        };
        let raw_id = link.attr("id").unwrap_or(href);
        let id = raw_id
            .rsplit(['-', '/'])
            .next()
            .unwrap_or(raw_id)
            .trim()
            .to_string();
        if id.is_empty() {
            continue;
        }

        let title = utils::element_text(&titles[i]);
        let title = title.strip_prefix("Title:").unwrap_or(&title).trim().to_string();

        let names = authors[i]
            .select(&author_link_selector)
            .map(|a| utils::element_text(&a))
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();
        let authors = if names.is_empty() {
            let text = utils::element_text(&authors[i]);
            text.strip_prefix("Authors:").unwrap_or(&text).trim().to_string()
        } else {
            names.join(", ")
        };

        entries.push(ListingEntry {
            id,
            title,
            authors,
            abs_url: utils::join_url(page_url, href)?,
            category: category.to_string(),
            added_at,
        });
    }

    Ok(entries)
}

/// Extract the abstract body from an `/abs/...` page.
pub fn parse_abstract(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = utils::selector("blockquote.abstract")?;
    Ok(document
        .select(&selector)
        .next()
        .map(|el| utils::own_text(&el))
        .unwrap_or_default())
}

pub struct ArxivScraper {
    client: Client,
    config: ArxivConfig,
}

impl ArxivScraper {
    pub fn new(config: ArxivConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    /// Dated listings for each day of the window (newest first), then the
    /// "past week" pages as a backstop, per category.
    pub fn listing_pages(&self, window: &DateWindow) -> Vec<ListingPage> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut pages = Vec::new();
        for category in &self.config.categories {
            let mut day = window.end;
            while day >= window.start {
                pages.push(ListingPage {
                    url: format!("{}/list/{}/{}?show={}", base, category, day.format("%y%m%d"), DATED_PAGE_SIZE),
                    category: category.clone(),
                    added_at: day,
                });
                match day.pred_opt() {
                    Some(previous) => day = previous,
                    None => break,
                }
            }
            for page in 0..PASTWEEK_PAGES {
                pages.push(ListingPage {
                    url: format!(
                        "{}/list/{}/pastweek?skip={}&show={}",
                        base,
                        category,
                        page * PASTWEEK_PAGE_SIZE,
                        PASTWEEK_PAGE_SIZE
                    ),
                    category: category.clone(),
                    added_at: window.end,
                });
            }
        }
        pages
    }

    async fn get_html(&self, url: &str) -> Result<String> {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Scraping(format!("{} returned {}", url, status)));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl DocumentSource for ArxivScraper {
    fn name(&self) -> &str {
        "arXiv"
    }

    async fn check_available(&self) -> Result<()> {
        let response = self.client.get(&self.config.base_url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(Error::Scraping(format!("arXiv returned status {}", response.status())));
        }
        Ok(())
    }

    async fn fetch(&self, window: &DateWindow) -> Result<Vec<DocumentRecord>> {
        let pages = self.listing_pages(window);
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut fetched_pages = 0usize;

        for page in &pages {
            let html = match self.get_html(&page.url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(url = %page.url, "Skipping listing page: {}", e);
                    continue;
                }
            };
            fetched_pages += 1;

            let entries = parse_listing(&html, &page.url, &page.category, page.added_at)?;
            tracing::info!(category = %page.category, url = %page.url, "📄 Found {} papers", entries.len());

            for entry in entries {
                if !seen.insert(entry.id.clone()) {
                    continue;
                }
                match self.get_html(&entry.abs_url).await {
                    Ok(html) => {
                        let abstract_text = parse_abstract(&html)?;
                        records.push(entry.into_record(abstract_text));
                    }
                    Err(e) => tracing::warn!(id = %entry.id, "Skipping paper: {}", e),
                }
            }
        }

        if fetched_pages == 0 && !pages.is_empty() {
            return Err(Error::Scraping(format!("None of the {} listing pages could be fetched", pages.len())));
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = r#"
        <dl id="articles">
          <dt><a name="item1">[1]</a>
            <a href="/abs/2405.00001" title="Abstract" id="2405.00001">arXiv:2405.00001</a></dt>
          <dd><div class="meta">
            <div class="list-title mathjax"><span class="descriptor">Title:</span>
              Multi-Agent Debate for Planning
            </div>
            <div class="list-authors"><a href="/a/alice">Alice Smith</a>, <a href="/a/bob">Bob Jones</a></div>
          </div></dd>
          <dt><a name="item2">[2]</a>
            <a href="/abs/2405.00002" title="Abstract" id="2405.00002">arXiv:2405.00002</a></dt>
          <dd><div class="meta">
            <div class="list-title mathjax"><span class="descriptor">Title:</span> Sparse Kernels</div>
            <div class="list-authors"><a href="/a/carol">Carol</a></div>
          </div></dd>
        </dl>
    "#;

    fn abstract_page(text: &str) -> String {
        format!(
            r#"<html><body><blockquote class="abstract mathjax">
                 <span class="descriptor">Abstract:</span>{}</blockquote></body></html>"#,
            text
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn scraper(base_url: &str, categories: &[&str]) -> ArxivScraper {
        ArxivScraper::new(ArxivConfig {
            base_url: base_url.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            request_delay: Duration::ZERO,
            ..ArxivConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_listing() {
        let entries = parse_listing(LISTING, "https://arxiv.org/list/cs.AI/pastweek", "cs.AI", date("2024-05-02")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "2405.00001");
        assert_eq!(entries[0].title, "Multi-Agent Debate for Planning");
        assert_eq!(entries[0].authors, "Alice Smith, Bob Jones");
        assert_eq!(entries[0].abs_url, "https://arxiv.org/abs/2405.00001");
        assert_eq!(entries[1].title, "Sparse Kernels");
        assert_eq!(entries[1].category, "cs.AI");
    }

    #[test]
    fn test_parse_abstract() {
        let text = parse_abstract(&abstract_page("\n  We propose   agents.\n")).unwrap();
        assert_eq!(text, "We propose agents.");
        assert_eq!(parse_abstract("<html></html>").unwrap(), "");
    }

    #[test]
    fn test_listing_pages_cover_window_and_pastweek() {
        let scraper = scraper("https://arxiv.org", &["cs.AI"]);
        let pages = scraper.listing_pages(&DateWindow::last_day(date("2024-05-02")));
        assert_eq!(pages.len(), 6);
        assert_eq!(pages[0].url, "https://arxiv.org/list/cs.AI/240502?show=100");
        assert_eq!(pages[1].url, "https://arxiv.org/list/cs.AI/240501?show=100");
        assert_eq!(pages[1].added_at, date("2024-05-01"));
        assert_eq!(pages[5].url, "https://arxiv.org/list/cs.AI/pastweek?skip=75&show=25");
        assert_eq!(pages[5].added_at, date("2024-05-02"));
    }

    #[tokio::test]
    async fn test_fetch_dedups_across_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/cs.AI/240502"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/list/cs.AI/pastweek"))
            .and(query_param("skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/abs/2405.00001"))
            .respond_with(ResponseTemplate::new(200).set_body_string(abstract_page("Agents debate.")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/abs/2405.00002"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let scraper = scraper(&server.uri(), &["cs.AI"]);
        let records = scraper.fetch(&DateWindow::last_day(date("2024-05-02"))).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "2405.00001");
        assert_eq!(records[0].abstract_text, "Agents debate.");
        assert_eq!(records[0].added_at, date("2024-05-02"));
        assert!(records[0].url.ends_with("/abs/2405.00001"));
    }

    #[tokio::test]
    async fn test_fetch_fails_when_no_listing_is_reachable() {
        let server = MockServer::start().await;
        let scraper = scraper(&server.uri(), &["cs.AI"]);
        let result = scraper.fetch(&DateWindow::last_day(date("2024-05-02"))).await;
        assert!(matches!(result, Err(Error::Scraping(_))));
    }

    #[tokio::test]
    async fn test_check_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        assert!(scraper(&server.uri(), &[]).check_available().await.is_ok());

        let down = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&down)
            .await;
        assert!(scraper(&down.uri(), &[]).check_available().await.is_err());
    }
}
