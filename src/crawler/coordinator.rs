//! Crawler coordinator - multi-model crawl orchestration
//!
//! This module ties the crawl together:
//! - Building the shared fetcher from configuration
//! - Discovering brands and the models above the threshold
//! - Crawling models concurrently, bounded by the scheduler
//! - Returning every model's records in discovery order

use crate::config::Config;
use crate::crawler::discovery::{discover_brands, discover_models, ModelEntry};
use crate::crawler::driver::{crawl_model, ModelCrawl, ProgressUpdate};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::scheduler::Scheduler;
use crate::state::ModelOutcome;
use crate::HarvestError;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: PageFetcher,
    site_root: Url,
    threshold: u64,
    scheduler: Scheduler,
    cancel: CancellationToken,
    progress: Option<UnboundedSender<ProgressUpdate>>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The site root or HTTP client could not be set up
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = PageFetcher::from_config(config)?;
        let site_root = Url::parse(&config.crawler.site_root)?;
        let scheduler = Scheduler::new(config.crawler.max_concurrent_models as usize);

        Ok(Self {
            fetcher,
            site_root,
            threshold: config.crawler.threshold,
            scheduler,
            cancel: CancellationToken::new(),
            progress: None,
        })
    }

    /// Sends a [`ProgressUpdate`] to `sender` after every walked page
    pub fn with_progress(mut self, sender: UnboundedSender<ProgressUpdate>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Token that stops every model crawl before its next page
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn site_root(&self) -> &Url {
        &self.site_root
    }

    /// Discovers brands, then the models at or above the threshold
    pub async fn discover(&self) -> Result<Vec<ModelEntry>, HarvestError> {
        let brands = discover_brands(&self.fetcher, &self.site_root, &self.cancel).await?;
        let models = discover_models(
            &self.fetcher,
            &self.site_root,
            &brands,
            self.threshold,
            &self.cancel,
        )
        .await?;
        Ok(models)
    }

    /// Crawls the given model URLs, at most `max_concurrent_models` at a time
    ///
    /// Results come back in the order of `model_urls`. A model whose task
    /// panicked is logged and left out; every other model is returned, even if
    /// its crawl ended early. Models still waiting for a slot when the crawl is
    /// cancelled are returned as cancelled without sending any request.
    pub async fn crawl_models(&self, model_urls: Vec<Url>) -> Vec<ModelCrawl> {
        let total_models = model_urls.len();
        let mut tasks = JoinSet::new();

        tracing::info!(
            "Crawling {} models ({} at a time)",
            total_models,
            self.scheduler.max_concurrent()
        );

        for (index, model_url) in model_urls.into_iter().enumerate() {
            let scheduler = self.scheduler.clone();
            let fetcher = self.fetcher.clone();
            let site_root = self.site_root.clone();
            let progress = self.progress.clone();
            let cancel = self.cancel.clone();

            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = scheduler.acquire() => permit,
                };

                let Some(_permit) = permit else {
                    let outcome = if cancel.is_cancelled() {
                        ModelOutcome::Cancelled
                    } else {
                        tracing::error!("{}: no crawl slot available, skipping", model_url);
                        ModelOutcome::Failed {
                            error: "crawl scheduler closed".to_string(),
                        }
                    };
                    return (index, ModelCrawl::unstarted(model_url, outcome));
                };

                let crawl =
                    crawl_model(&fetcher, &site_root, &model_url, progress.as_ref(), &cancel)
                        .await;
                (index, crawl)
            });
        }

        let mut crawls = Vec::with_capacity(total_models);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => crawls.push(result),
                Err(e) => tracing::error!("Model crawl task failed: {}", e),
            }
        }

        crawls.sort_by_key(|(index, _)| *index);
        crawls.into_iter().map(|(_, crawl)| crawl).collect()
    }

    /// Runs discovery followed by the crawl of every discovered model
    pub async fn run(&self) -> Result<Vec<ModelCrawl>, HarvestError> {
        let start_time = std::time::Instant::now();

        let models = self.discover().await?;
        let urls = models.into_iter().map(|m| m.url).collect();
        let crawls = self.crawl_models(urls).await;

        let records: usize = crawls.iter().map(|c| c.records.len()).sum();
        tracing::info!(
            "Crawl completed: {} models, {} records in {:?}",
            crawls.len(),
            records,
            start_time.elapsed()
        );

        Ok(crawls)
    }
}

/// Runs a complete discovery-and-crawl with the given configuration
///
/// # Example
///
/// ```no_run
/// use carsensor_crawler::config::load_config;
/// use carsensor_crawler::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let crawls = run_crawl(&config).await?;
/// println!("{} models crawled", crawls.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<Vec<ModelCrawl>, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, OutputConfig, UserAgentConfig};
    use crate::DiscoveryError;

    fn create_test_config(site_root: &str) -> Config {
        Config {
            crawler: CrawlerConfig {
                site_root: site_root.to_string(),
                threshold: 10,
                max_concurrent_models: 2,
                request_timeout_secs: 5,
                connect_timeout_secs: 2,
                minimum_request_interval_ms: 0,
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                csv_path: "./listings.csv".to_string(),
                database_path: None,
            },
        }
    }

    #[test]
    fn test_coordinator_creation() {
        let coordinator = Coordinator::new(&create_test_config("https://www.carsensor.net/"));
        assert!(coordinator.is_ok());
    }

    #[test]
    fn test_coordinator_rejects_bad_root() {
        let coordinator = Coordinator::new(&create_test_config("not a url"));
        assert!(matches!(coordinator, Err(HarvestError::UrlParse(_))));
    }

    #[tokio::test]
    async fn test_closed_scheduler_skips_models() {
        let coordinator = Coordinator::new(&create_test_config("http://127.0.0.1:9/")).unwrap();
        coordinator.scheduler.close();

        let url = Url::parse("http://127.0.0.1:9/usedcar/bTO/s001/index.html").unwrap();
        let crawls = coordinator.crawl_models(vec![url]).await;

        assert_eq!(crawls.len(), 1);
        assert!(matches!(crawls[0].outcome, ModelOutcome::Failed { .. }));
        assert_eq!(crawls[0].pages, 0);
    }

    #[tokio::test]
    async fn test_cancelled_discovery_stops() {
        let coordinator = Coordinator::new(&create_test_config("http://127.0.0.1:9/")).unwrap();
        coordinator.cancellation_token().cancel();

        let result = coordinator.discover().await;
        assert!(matches!(
            result,
            Err(HarvestError::Discovery(DiscoveryError::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_crawl_models_empty() {
        let coordinator = Coordinator::new(&create_test_config("https://www.carsensor.net/"))
            .unwrap();
        assert!(coordinator.crawl_models(Vec::new()).await.is_empty());
    }
}
