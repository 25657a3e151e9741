//! Harvest statistics
//!
//! Summarizes the collected model crawls. Per-field sentinel counts make
//! markup drift visible: a field that suddenly reads `-` on every listing
//! points at a changed page layout rather than missing data.

use crate::crawler::ModelCrawl;
use crate::record::{FIELD_COUNT, FIELD_NAMES, SENTINEL};
use crate::state::ModelOutcome;

/// Harvest statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestStatistics {
    /// Number of models crawled
    pub models: usize,

    /// Models whose pagination ran to the last page
    pub completed: usize,

    /// Models whose walk stopped on a failing fetch
    pub failed: usize,

    /// Models stopped by cancellation
    pub cancelled: usize,

    /// Total number of pages walked
    pub pages: usize,

    /// Total number of records extracted
    pub records: usize,

    /// Number of sentinel values per field, in column order
    pub sentinels: [usize; FIELD_COUNT],
}

impl HarvestStatistics {
    /// Computes statistics from the collected model crawls
    pub fn from_crawls(crawls: &[ModelCrawl]) -> Self {
        let mut stats = Self {
            models: crawls.len(),
            ..Default::default()
        };

        for crawl in crawls {
            match crawl.outcome {
                ModelOutcome::Completed => stats.completed += 1,
                ModelOutcome::Failed { .. } => stats.failed += 1,
                ModelOutcome::Cancelled => stats.cancelled += 1,
            }

            stats.pages += crawl.pages;
            stats.records += crawl.records.len();

            for record in &crawl.records {
                for (count, value) in stats.sentinels.iter_mut().zip(record.fields()) {
                    if value == SENTINEL {
                        *count += 1;
                    }
                }
            }
        }

        stats
    }

    /// Sentinel count for a field by column name
    pub fn sentinels_for(&self, field: &str) -> Option<usize> {
        FIELD_NAMES
            .iter()
            .position(|name| *name == field)
            .map(|index| self.sentinels[index])
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Models crawled: {}", stats.models);
    println!("  Completed: {}", stats.completed);
    println!("  Failed: {}", stats.failed);
    println!("  Cancelled: {}", stats.cancelled);
    println!("  Pages walked: {}", stats.pages);
    println!("  Records extracted: {}", stats.records);
    println!();

    if stats.records == 0 {
        return;
    }

    println!("Missing Values by Field:");
    for (name, count) in FIELD_NAMES.iter().zip(stats.sentinels) {
        let percentage = (count as f64 / stats.records as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", name, count, percentage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ExtractedFields;
    use url::Url;

    fn crawl(records: usize, pages: usize, outcome: ModelOutcome) -> ModelCrawl {
        ModelCrawl {
            model_url: Url::parse("https://www.carsensor.net/usedcar/bHO/s001/index.html")
                .unwrap(),
            title: None,
            total: None,
            pages,
            records: (0..records)
                .map(|_| {
                    ExtractedFields {
                        brand: Some("ホンダ".to_string()),
                        year: Some("2019".to_string()),
                        ..Default::default()
                    }
                    .into_record()
                })
                .collect(),
            outcome,
        }
    }

    #[test]
    fn test_from_crawls() {
        let crawls = vec![
            crawl(47, 3, ModelOutcome::Completed),
            crawl(40, 2, ModelOutcome::Failed {
                error: "HTTP 500".to_string(),
            }),
            crawl(0, 0, ModelOutcome::Cancelled),
        ];

        let stats = HarvestStatistics::from_crawls(&crawls);

        assert_eq!(stats.models, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.pages, 5);
        assert_eq!(stats.records, 87);
        assert_eq!(stats.sentinels_for("brand"), Some(0));
        assert_eq!(stats.sentinels_for("year"), Some(0));
        assert_eq!(stats.sentinels_for("price"), Some(87));
        assert_eq!(stats.sentinels_for("unknown"), None);
    }

    #[test]
    fn test_empty_statistics() {
        let stats = HarvestStatistics::from_crawls(&[]);
        assert_eq!(stats, HarvestStatistics::default());
    }
}
