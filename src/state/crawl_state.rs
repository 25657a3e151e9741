//! Pagination state for a single model crawl
//!
//! A model starts `Active` on its first catalog page and moves to the next
//! page after every successful walk until no next page is announced, or the
//! announced page was already walked.
use std::collections::HashSet;
use url::Url;

/// Where a model's pagination currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlPhase {
    /// The page at this URL is the next one to fetch
    Active(Url),

    /// Pagination is exhausted
    Done,
}

/// Per-model crawl state
///
/// Created when a model crawl starts, advanced once per fetched page and
/// dropped when the walk ends.
#[derive(Debug, Clone)]
pub struct CrawlState {
    phase: CrawlPhase,

    /// Records extracted so far
    processed: usize,

    /// Pages successfully walked
    pages: usize,

    /// Listing count announced by the first page, if it could be read
    total: Option<u64>,

    /// Every page URL entered so far, including the current one
    visited: HashSet<Url>,
}

impl CrawlState {
    /// Starts a walk at the model's first catalog page
    pub fn new(start: Url, total: Option<u64>) -> Self {
        let visited = HashSet::from([start.clone()]);
        Self {
            phase: CrawlPhase::Active(start),
            processed: 0,
            pages: 0,
            total,
            visited,
        }
    }

    pub fn phase(&self) -> &CrawlPhase {
        &self.phase
    }

    /// The page to fetch next, or `None` once the walk is done
    pub fn current_url(&self) -> Option<&Url> {
        match &self.phase {
            CrawlPhase::Active(url) => Some(url),
            CrawlPhase::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, CrawlPhase::Done)
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Records the total announced by the first page
    pub fn set_total(&mut self, total: Option<u64>) {
        self.total = total;
    }

    /// Records a walked page and moves to `next`, or to `Done` when there is none
    ///
    /// A `next` page that was already walked also ends the walk, since the
    /// pager would otherwise cycle forever. Advancing a state that is already
    /// done is a no-op.
    pub fn advance(&mut self, records: usize, next: Option<Url>) {
        if self.is_done() {
            return;
        }

        self.processed += records;
        self.pages += 1;
        self.phase = match next {
            Some(url) if self.visited.contains(&url) => {
                tracing::warn!("Pager links back to already walked page {}, stopping", url);
                CrawlPhase::Done
            }
            Some(url) => {
                self.visited.insert(url.clone());
                CrawlPhase::Active(url)
            }
            None => CrawlPhase::Done,
        };
    }
}
