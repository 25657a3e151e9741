//! Scheduling for concurrent model crawls
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore (one permit per model crawl)
//! - Respecting a minimum delay between consecutive requests to the site
//!
//! Pagination inside a model stays strictly sequential; only whole models are
//! crawled side by side.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Spaces out requests shared by every crawl task
///
/// Each caller reserves the next free slot and sleeps until it arrives, so
/// concurrent tasks are served one interval apart in arrival order.
#[derive(Debug)]
pub struct RequestPacer {
    minimum_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(minimum_interval: Duration) -> Self {
        Self {
            minimum_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn minimum_interval(&self) -> Duration {
        self.minimum_interval
    }

    /// Waits until this caller may send its request
    pub async fn wait_turn(&self) {
        if self.minimum_interval.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next_slot {
            Some(at) if at > now => at,
            _ => now,
        };

        if slot > now {
            tokio::time::sleep_until(slot).await;
        }

        *next_slot = Some(slot + self.minimum_interval);
    }
}

/// Limits how many models are crawled at the same time
#[derive(Debug, Clone)]
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl Scheduler {
    /// Creates a scheduler admitting at most `max_concurrent` model crawls
    ///
    /// A limit of zero is raised to one so the crawl can always make progress.
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of crawls that could start right now
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free crawl slot
    ///
    /// The slot is released when the returned permit is dropped. Returns None
    /// only if the semaphore was closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().acquire_owned().await.ok()
    }

    /// Stops admitting crawls; pending and later `acquire` calls return None
    #[cfg(test)]
    pub(crate) fn close(&self) {
        self.semaphore.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scheduler_limits_slots() {
        let scheduler = Scheduler::new(2);
        assert_eq!(scheduler.available_slots(), 2);

        let first = scheduler.acquire().await.unwrap();
        let _second = scheduler.acquire().await.unwrap();
        assert_eq!(scheduler.available_slots(), 0);

        drop(first);
        assert_eq!(scheduler.available_slots(), 1);
    }

    #[tokio::test]
    async fn test_closed_scheduler_admits_nothing() {
        let scheduler = Scheduler::new(2);
        scheduler.close();
        assert!(scheduler.acquire().await.is_none());
    }

    #[test]
    fn test_scheduler_zero_limit_is_raised() {
        let scheduler = Scheduler::new(0);
        assert_eq!(scheduler.max_concurrent(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_spaces_requests() {
        let pacer = RequestPacer::new(Duration::from_millis(500));
        let start = Instant::now();

        pacer.wait_turn().await;
        pacer.wait_turn().await;
        pacer.wait_turn().await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_without_interval_never_waits() {
        let pacer = RequestPacer::new(Duration::ZERO);
        let start = Instant::now();

        for _ in 0..10 {
            pacer.wait_turn().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
