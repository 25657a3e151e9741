//! How a model's crawl ended
//!
//! Every outcome keeps the records gathered before it was reached.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome {
    /// Pagination ran until no next page remained
    Completed,

    /// A page fetch failed; the walk stopped there
    Failed { error: String },

    /// The run was cancelled between two pages
    Cancelled,
}

impl ModelOutcome {
    /// Returns true if the records may be missing later pages
    pub fn is_partial(&self) -> bool {
        !matches!(self, Self::Completed)
    }

    /// Converts the outcome to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Error message of a failed crawl
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for ModelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { error } => write!(f, "failed ({})", error),
            other => write!(f, "{}", other.to_db_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_partial() {
        assert!(!ModelOutcome::Completed.is_partial());
        assert!(ModelOutcome::Cancelled.is_partial());
        assert!(ModelOutcome::Failed {
            error: "HTTP 500".to_string()
        }
        .is_partial());
    }

    #[test]
    fn test_display() {
        let failed = ModelOutcome::Failed {
            error: "HTTP 503 for https://example.com/".to_string(),
        };
        assert_eq!(failed.to_string(), "failed (HTTP 503 for https://example.com/)");
        assert_eq!(ModelOutcome::Completed.to_string(), "completed");
        assert_eq!(failed.error(), Some("HTTP 503 for https://example.com/"));
    }
}
