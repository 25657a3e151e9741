//! State module for tracking per-model crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the pagination state machine of one model (active page or done)
//! - `ModelOutcome`: how a model's crawl ended (completed, failed, cancelled)

mod crawl_state;
mod model_outcome;

// Re-export main types
pub use crawl_state::{CrawlPhase, CrawlState};
pub use model_outcome::ModelOutcome;
