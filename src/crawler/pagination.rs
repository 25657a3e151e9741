//! Result page walking
//!
//! One call to [`walk_one_page`] fetches a model's result page, extracts every
//! listing on it in document order and works out where the next page lives.
//! The driver repeats this until no next page is returned.

use crate::crawler::extractor::extract_listing;
use crate::crawler::fetcher::PageFetcher;
use crate::record::ListingRecord;
use crate::url::{extract_quoted_target, resolve_link};
use crate::FetchError;
use scraper::{Html, Selector};
use url::Url;

/// Container of a single listing on a result page
pub const LISTING_SELECTOR: &str = ".caset.js_listTableCassette";

/// The pager's "next" button; the pager is rendered above and below the list
const NEXT_BUTTON_SELECTOR: &str = ".btnFunc.pager__btn__next";

/// Which "next" button carries the usable handler (the one below the list)
const NEXT_BUTTON_INDEX: usize = 1;

/// What one result page yielded
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    /// Records in the order their listings appear on the page
    pub records: Vec<ListingRecord>,

    /// Absolute URL of the following page, if any
    pub next_url: Option<Url>,
}

/// Fetches `page_url` and parses it as a result page
///
/// A fetch failure is returned as-is; the caller decides what happens to the
/// model's crawl. Parsing itself cannot fail: missing listings give an empty
/// page and a missing or unreadable pager ends the walk.
pub async fn walk_one_page(
    fetcher: &PageFetcher,
    page_url: &Url,
    site_root: &Url,
) -> Result<PageOutcome, FetchError> {
    let page = fetcher.fetch(page_url).await?;
    let outcome = parse_listing_page(&page.body, site_root);

    tracing::debug!(
        "{}: {} listings, next page: {}",
        page_url,
        outcome.records.len(),
        outcome
            .next_url
            .as_ref()
            .map(Url::as_str)
            .unwrap_or("none")
    );

    Ok(outcome)
}

/// Extracts all listings and the next-page link from a result page
pub fn parse_listing_page(html: &str, site_root: &Url) -> PageOutcome {
    let document = Html::parse_document(html);
    parse_listing_document(&document, site_root)
}

/// Same as [`parse_listing_page`], over an already parsed document
pub fn parse_listing_document(document: &Html, site_root: &Url) -> PageOutcome {
    let records = match Selector::parse(LISTING_SELECTOR) {
        Ok(selector) => document
            .select(&selector)
            .map(|fragment| extract_listing(&fragment))
            .collect(),
        Err(_) => Vec::new(),
    };

    PageOutcome {
        records,
        next_url: find_next_page(document, site_root),
    }
}

/// Reads the next-page target from the pager's `onclick` handler
///
/// Returns None when the button, its handler, the quoted target or a valid
/// resolution is missing. Any of these simply means there is no next page.
pub fn find_next_page(document: &Html, site_root: &Url) -> Option<Url> {
    let selector = Selector::parse(NEXT_BUTTON_SELECTOR).ok()?;
    let button = document.select(&selector).nth(NEXT_BUTTON_INDEX)?;
    let handler = button.value().attr("onclick")?;
    let target = extract_quoted_target(handler)?;
    resolve_link(target, site_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SENTINEL;

    fn root() -> Url {
        Url::parse("https://www.carsensor.net/").unwrap()
    }

    fn pager(target: &str) -> String {
        let button = format!(
            r#"<button class="btnFunc pager__btn__next" onclick="location.href='{}'">次へ</button>"#,
            target
        );
        format!(r#"<div class="pager">{}</div>"#, button)
    }

    fn page(listings: &[&str], pagers: &str) -> String {
        let body: String = listings
            .iter()
            .map(|maker| {
                format!(
                    r#"<div class="caset js_listTableCassette"><p class="casetMedia__body__maker">{}</p></div>"#,
                    maker
                )
            })
            .collect();
        format!("<html><body>{}{}{}</body></html>", pagers, body, pagers)
    }

    #[test]
    fn test_records_keep_document_order() {
        let html = page(&["トヨタ", "ホンダ", "日産"], "");
        let outcome = parse_listing_page(&html, &root());

        let brands: Vec<&str> = outcome.records.iter().map(|r| r.brand.as_str()).collect();
        assert_eq!(brands, vec!["トヨタ", "ホンダ", "日産"]);
    }

    #[test]
    fn test_next_page_from_second_button() {
        let html = page(&["トヨタ"], &pager("/usedcar/bTO/s001/index2.html"));
        let outcome = parse_listing_page(&html, &root());

        assert_eq!(
            outcome.next_url.unwrap().as_str(),
            "https://www.carsensor.net/usedcar/bTO/s001/index2.html"
        );
    }

    #[test]
    fn test_no_pager_ends_walk() {
        let html = page(&["トヨタ"], "");
        let outcome = parse_listing_page(&html, &root());
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.next_url.is_none());
    }

    #[test]
    fn test_single_next_button_ends_walk() {
        let html = format!(
            "<html><body>{}</body></html>",
            pager("/usedcar/bTO/s001/index2.html")
        );
        let outcome = parse_listing_page(&html, &root());
        assert!(outcome.next_url.is_none());
    }

    #[test]
    fn test_unparsable_handler_ends_walk() {
        let button = r#"<button class="btnFunc pager__btn__next" onclick="return false;">次へ</button>"#;
        let html = page(&["トヨタ"], button);
        let outcome = parse_listing_page(&html, &root());
        assert!(outcome.next_url.is_none());
    }

    #[test]
    fn test_page_without_listings_still_paginates() {
        let html = page(&[], &pager("/usedcar/bTO/s001/index3.html"));
        let outcome = parse_listing_page(&html, &root());

        assert!(outcome.records.is_empty());
        assert!(outcome.next_url.is_some());
    }

    #[test]
    fn test_sparse_listing_still_yields_record() {
        let html = page(&["スズキ"], "");
        let outcome = parse_listing_page(&html, &root());

        let record = &outcome.records[0];
        assert_eq!(record.brand, "スズキ");
        assert_eq!(record.price, SENTINEL);
        assert_eq!(record.fields().len(), 14);
    }
}
