use url::Url;

/// Path segment that switches a model page to its map view
const MAP_SEGMENT: &str = "map/";

/// Resolves a link href to an absolute URL
///
/// Returns None if the link cannot be followed:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Example
///
/// ```
/// use carsensor_crawler::url::resolve_link;
/// use url::Url;
///
/// let root = Url::parse("https://www.carsensor.net/").unwrap();
/// let url = resolve_link("/usedcar/bHO/index.html", &root).unwrap();
/// assert_eq!(url.as_str(), "https://www.carsensor.net/usedcar/bHO/index.html");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url)
    } else {
        None
    }
}

/// Removes the map-view segment from a model link
///
/// Model lists link to the map view of each model; the tabular listing view
/// lives at the same path without the `map/` segment.
pub fn strip_map_segment(href: &str) -> String {
    href.replace(MAP_SEGMENT, "")
}

/// Extracts the target embedded in an inline handler such as
/// `location.href='/usedcar/bHO/s001/index2.html'`
///
/// The target is the text between the first quote character (`'` or `"`) and
/// the next occurrence of that same character. Returns None when there is no
/// closed, non-empty quoted substring.
pub fn extract_quoted_target(attr: &str) -> Option<&str> {
    let (open, quote) = attr.char_indices().find(|(_, c)| *c == '\'' || *c == '"')?;
    let rest = &attr[open + quote.len_utf8()..];
    let close = rest.find(quote)?;
    let target = rest[..close].trim();

    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}
