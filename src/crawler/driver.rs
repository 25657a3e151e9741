//! Per-model crawl driver
//!
//! [`crawl_model`] walks every result page of one model, strictly in order,
//! and always hands back the records it gathered, whether the walk ran to the
//! last page, hit a failing fetch or was cancelled.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pagination::{parse_listing_document, walk_one_page, PageOutcome};
use crate::record::ListingRecord;
use crate::state::{CrawlState, ModelOutcome};
use crate::FetchError;
use scraper::{Html, Selector};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use url::Url;

const MODEL_TITLE_SELECTOR: &str = ".casetMedia__body__title > a";
const RESULT_COUNT_SELECTOR: &str = ".resultBar__result > p";

/// Progress observation emitted after every walked page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Display title of the model (its URL when the title is unknown)
    pub model: String,

    /// Records extracted so far
    pub processed: usize,

    /// Listing count announced by the first page
    pub total: u64,
}

/// Title and announced size of a model, read from its first page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelProbe {
    pub title: Option<String>,
    pub total: Option<u64>,
}

impl ModelProbe {
    /// Progress is only reported when the announced total is known
    pub fn reports_progress(&self) -> bool {
        self.total.is_some()
    }
}

/// Everything one model's crawl produced
#[derive(Debug, Clone)]
pub struct ModelCrawl {
    /// First catalog page of the model
    pub model_url: Url,

    /// Display title, if the first page carried one
    pub title: Option<String>,

    /// Announced listing count, if the first page carried one
    pub total: Option<u64>,

    /// Records in page order, then document order within each page
    pub records: Vec<ListingRecord>,

    /// Number of pages successfully walked
    pub pages: usize,

    /// How the walk ended
    pub outcome: ModelOutcome,
}

impl ModelCrawl {
    /// A crawl that ended before its first page was requested
    pub fn unstarted(model_url: Url, outcome: ModelOutcome) -> Self {
        Self {
            model_url,
            title: None,
            total: None,
            records: Vec::new(),
            pages: 0,
            outcome,
        }
    }

    /// Title for display and export, falling back to the model URL
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.model_url.as_str())
    }
}

/// Crawls every result page of one model
///
/// # Flow
///
/// 1. Walk the first page, reading the model title and announced total from
///    it as well (best-effort; missing markup only disables progress)
/// 2. Walk the following pages one at a time until no next page is returned
///    or the next page was already walked
/// 3. After each page, send a [`ProgressUpdate`] if the total is known
///
/// A failing fetch or a cancellation ends the walk; the records collected up
/// to that point are returned with the corresponding [`ModelOutcome`]. A
/// cancellation also abandons the page being fetched.
pub async fn crawl_model(
    fetcher: &PageFetcher,
    site_root: &Url,
    model_url: &Url,
    progress: Option<&UnboundedSender<ProgressUpdate>>,
    cancel: &CancellationToken,
) -> ModelCrawl {
    let mut state = CrawlState::new(model_url.clone(), None);
    let mut probe = ModelProbe::default();
    let mut records = Vec::new();
    let mut outcome = ModelOutcome::Completed;

    while let Some(page_url) = state.current_url().cloned() {
        let first_page = state.pages() == 0;
        let walked = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            walked = walk_page(fetcher, &page_url, site_root, first_page) => Some(walked),
        };

        match walked {
            None => {
                tracing::warn!(
                    "{}: cancelled after {} pages, keeping {} records",
                    model_name(&probe, model_url),
                    state.pages(),
                    records.len()
                );
                outcome = ModelOutcome::Cancelled;
                break;
            }
            Some(Ok((first_probe, page))) => {
                if let Some(first_probe) = first_probe {
                    if !first_probe.reports_progress() {
                        tracing::warn!("{}: announced listing count not found", model_url);
                    }
                    state.set_total(first_probe.total);
                    probe = first_probe;
                }

                let count = page.records.len();
                records.extend(page.records);
                state.advance(count, page.next_url);

                if probe.reports_progress() {
                    emit(
                        progress,
                        &model_name(&probe, model_url),
                        state.processed(),
                        state.total(),
                    );
                }
            }
            Some(Err(e)) => {
                tracing::warn!(
                    "{}: stopping after {} pages, keeping {} records: {}",
                    model_name(&probe, model_url),
                    state.pages(),
                    records.len(),
                    e
                );
                outcome = ModelOutcome::Failed {
                    error: e.to_string(),
                };
                break;
            }
        }
    }

    tracing::info!(
        "{}: {} records from {} pages ({})",
        model_name(&probe, model_url),
        records.len(),
        state.pages(),
        outcome
    );

    ModelCrawl {
        model_url: model_url.clone(),
        title: probe.title,
        total: probe.total,
        records,
        pages: state.pages(),
        outcome,
    }
}

/// Walks one page; the first page also yields the model's title and total
async fn walk_page(
    fetcher: &PageFetcher,
    page_url: &Url,
    site_root: &Url,
    first_page: bool,
) -> Result<(Option<ModelProbe>, PageOutcome), FetchError> {
    if first_page {
        let (probe, page) = walk_first_page(fetcher, page_url, site_root).await?;
        Ok((Some(probe), page))
    } else {
        Ok((None, walk_one_page(fetcher, page_url, site_root).await?))
    }
}

/// Fetches a model's first page once and reads both its listings and its
/// title and announced total
pub async fn walk_first_page(
    fetcher: &PageFetcher,
    page_url: &Url,
    site_root: &Url,
) -> Result<(ModelProbe, PageOutcome), FetchError> {
    let page = fetcher.fetch(page_url).await?;
    let (probe, outcome) = parse_first_page(&page.body, site_root);

    tracing::debug!(
        "{}: {} listings, announced total: {:?}",
        page_url,
        outcome.records.len(),
        probe.total
    );

    Ok((probe, outcome))
}

/// Parses a model's first result page for its listings, title and total
pub fn parse_first_page(html: &str, site_root: &Url) -> (ModelProbe, PageOutcome) {
    let document = Html::parse_document(html);
    (
        probe_document(&document),
        parse_listing_document(&document, site_root),
    )
}

/// Reads the model title and the announced listing count from a result page
///
/// The title is the first token of the first listing's title link. The count
/// is displayed like `1,234件`; every non-digit is ignored.
pub fn parse_model_probe(html: &str) -> ModelProbe {
    probe_document(&Html::parse_document(html))
}

fn probe_document(document: &Html) -> ModelProbe {
    ModelProbe {
        title: first_text(document, MODEL_TITLE_SELECTOR)
            .and_then(|text| text.split_whitespace().next().map(str::to_string)),
        total: first_text(document, RESULT_COUNT_SELECTOR).and_then(|text| {
            let digits: String = text.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }),
    }
}

fn model_name(probe: &ModelProbe, model_url: &Url) -> String {
    probe
        .title
        .clone()
        .unwrap_or_else(|| model_url.to_string())
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

fn emit(
    progress: Option<&UnboundedSender<ProgressUpdate>>,
    model: &str,
    processed: usize,
    total: Option<u64>,
) {
    let (Some(sender), Some(total)) = (progress, total) else {
        return;
    };

    // A closed receiver only means nobody is displaying progress.
    let _ = sender.send(ProgressUpdate {
        model: model.to_string(),
        processed,
        total,
    });
}
