//! Crawler module for catalog discovery and listing extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timeouts and request pacing
//! - Brand and model discovery with threshold filtering
//! - Result page walking and per-listing field extraction
//! - Per-model pagination and multi-model coordination

mod coordinator;
mod discovery;
mod driver;
mod extractor;
mod fetcher;
mod pagination;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use discovery::{
    discover_brands, discover_models, filter_by_threshold, parse_brand_nav,
    parse_inventory_count, parse_model_list, ModelEntry,
};
pub use driver::{
    crawl_model, parse_first_page, parse_model_probe, walk_first_page, ModelCrawl, ModelProbe,
    ProgressUpdate,
};
pub use extractor::{extract_fields, extract_listing};
pub use fetcher::{build_http_client, FetchedPage, PageFetcher};
pub use pagination::{
    find_next_page, parse_listing_document, parse_listing_page, walk_one_page, PageOutcome,
    LISTING_SELECTOR,
};
pub use scheduler::{RequestPacer, Scheduler};
