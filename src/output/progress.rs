//! Progress display
//!
//! Model crawls report their progress over an unbounded channel; the logger
//! task renders each update as a fixed-width text bar.

use crate::crawler::ProgressUpdate;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Width of the bar between the brackets
pub const BAR_WIDTH: usize = 30;

/// Renders an update as `title [=====     ] processed/total`
///
/// Progress beyond the announced total fills the bar; a total of zero
/// renders an empty bar.
pub fn render_progress(update: &ProgressUpdate) -> String {
    let filled = if update.total == 0 {
        0
    } else {
        let ratio = (update.processed as f64 / update.total as f64).min(1.0);
        (ratio * BAR_WIDTH as f64).round() as usize
    };

    format!(
        "{} [{}{}] {}/{}",
        update.model,
        "=".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        update.processed,
        update.total
    )
}

/// Spawns a task logging every update until all senders are dropped
pub fn spawn_progress_logger(mut receiver: UnboundedReceiver<ProgressUpdate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(update) = receiver.recv().await {
            tracing::info!("{}", render_progress(&update));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(processed: usize, total: u64) -> ProgressUpdate {
        ProgressUpdate {
            model: "N-BOX".to_string(),
            processed,
            total,
        }
    }

    #[test]
    fn test_render_progress() {
        assert_eq!(
            render_progress(&update(0, 47)),
            format!("N-BOX [{}] 0/47", " ".repeat(30))
        );
        assert_eq!(
            render_progress(&update(20, 40)),
            format!("N-BOX [{}{}] 20/40", "=".repeat(15), " ".repeat(15))
        );
        assert_eq!(
            render_progress(&update(47, 47)),
            format!("N-BOX [{}] 47/47", "=".repeat(30))
        );
    }

    #[test]
    fn test_render_progress_clamps() {
        assert_eq!(
            render_progress(&update(60, 47)),
            format!("N-BOX [{}] 60/47", "=".repeat(30))
        );
        assert_eq!(
            render_progress(&update(5, 0)),
            format!("N-BOX [{}] 5/0", " ".repeat(30))
        );
    }

    #[tokio::test]
    async fn test_logger_stops_when_senders_drop() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = spawn_progress_logger(rx);

        tx.send(update(20, 47)).unwrap();
        drop(tx);

        assert!(handle.await.is_ok());
    }
}
