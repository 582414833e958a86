pub mod manager;
pub mod scrapers;

pub use manager::ScraperManager;
pub use scrapers::arxiv::{ArxivConfig, ArxivScraper};

pub mod prelude {
    pub use super::manager::ScraperManager;
    pub use super::scrapers::arxiv::{ArxivConfig, ArxivScraper};
    pub use pb_core::{DocumentRecord, DocumentSource, Error, Result};
}
