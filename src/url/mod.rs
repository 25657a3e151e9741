//! URL handling for catalog and pagination links
//!
//! The marketplace uses site-relative links everywhere: brand navigation,
//! model lists, and the `onclick` handler of the pager's "next" button. This
//! module resolves them to absolute URLs against the site root.

mod resolve;

// Re-export main functions
pub use resolve::{extract_quoted_target, resolve_link, strip_map_segment};
