//! Catalog discovery
//!
//! Discovery runs in two steps: the site root lists every brand, and each
//! brand page lists its models together with the number of vehicles on
//! offer. Only models at or above the configured threshold are crawled.
//!
//! Unlike listing extraction, discovery does not degrade gracefully: a brand
//! list or model entry that cannot be read aborts discovery, because there is
//! no useful partial answer to "what should be crawled".

use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::url::{resolve_link, strip_map_segment};
use crate::DiscoveryError;
use scraper::{ElementRef, Html, Selector};
use tokio_util::sync::CancellationToken;
use url::Url;

const BRAND_NAV_SELECTOR: &str = "ul.makerNav__list";
const MODEL_LINK_SELECTOR: &str = ".shashuList__category__item > label > a";

/// A model catalog page and its displayed inventory count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    /// Tabular listing view of the model
    pub url: Url,

    /// Number of vehicles the brand page announces for this model
    pub count: u64,
}

/// Fetches the site root and returns every brand catalog URL
pub async fn discover_brands(
    fetcher: &PageFetcher,
    site_root: &Url,
    cancel: &CancellationToken,
) -> Result<Vec<Url>, DiscoveryError> {
    let page = fetch_unless_cancelled(fetcher, site_root, cancel).await?;
    let brands = parse_brand_nav(&page.body, site_root)?;
    tracing::info!("Discovered {} brands", brands.len());
    Ok(brands)
}

/// Fetches each brand page and returns the models whose count is at least
/// `threshold`, in brand order then page order
///
/// A threshold of 0 keeps every model. The first error aborts discovery, and
/// so does a cancellation, which is checked before every brand page.
pub async fn discover_models(
    fetcher: &PageFetcher,
    site_root: &Url,
    brand_urls: &[Url],
    threshold: u64,
    cancel: &CancellationToken,
) -> Result<Vec<ModelEntry>, DiscoveryError> {
    let mut models = Vec::new();

    for brand_url in brand_urls {
        let page = fetch_unless_cancelled(fetcher, brand_url, cancel).await?;
        let entries = parse_model_list(&page.body, brand_url, site_root)?;
        let listed = entries.len();
        let kept = filter_by_threshold(entries, threshold);

        tracing::debug!(
            "{}: {} of {} models at or above threshold {}",
            brand_url,
            kept.len(),
            listed,
            threshold
        );

        models.extend(kept);
    }

    tracing::info!(
        "Discovered {} models with at least {} listings",
        models.len(),
        threshold
    );

    Ok(models)
}

/// Fetches `url` unless the token is (or becomes) cancelled first
async fn fetch_unless_cancelled(
    fetcher: &PageFetcher,
    url: &Url,
    cancel: &CancellationToken,
) -> Result<FetchedPage, DiscoveryError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DiscoveryError::Cancelled),
        page = fetcher.fetch(url) => Ok(page?),
    }
}

/// Keeps entries whose count is at least `threshold`
pub fn filter_by_threshold(entries: Vec<ModelEntry>, threshold: u64) -> Vec<ModelEntry> {
    entries
        .into_iter()
        .filter(|entry| entry.count >= threshold)
        .collect()
}

/// Reads the brand navigation list of the site root
///
/// Only the first navigation list is used; every link in it is a brand.
pub fn parse_brand_nav(html: &str, site_root: &Url) -> Result<Vec<Url>, DiscoveryError> {
    let document = Html::parse_document(html);
    let nav_selector = selector(BRAND_NAV_SELECTOR)?;
    let link_selector = selector("a")?;

    let nav = document
        .select(&nav_selector)
        .next()
        .ok_or_else(|| DiscoveryError::MissingMarkup {
            url: site_root.to_string(),
            what: "brand navigation list",
        })?;

    let brands = nav
        .select(&link_selector)
        .map(|link| link_target(&link, site_root, site_root, "brand link"))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(brands)
}

/// Reads every model entry of a brand page, without threshold filtering
pub fn parse_model_list(
    html: &str,
    page_url: &Url,
    site_root: &Url,
) -> Result<Vec<ModelEntry>, DiscoveryError> {
    let document = Html::parse_document(html);
    let link_selector = selector(MODEL_LINK_SELECTOR)?;
    let count_selector = selector("span")?;

    let models = document
        .select(&link_selector)
        .map(|link| {
            let count_text = link
                .select(&count_selector)
                .next()
                .map(|span| span.text().collect::<String>())
                .ok_or_else(|| DiscoveryError::MissingMarkup {
                    url: page_url.to_string(),
                    what: "model inventory count",
                })?;

            let count =
                parse_inventory_count(&count_text).ok_or_else(|| DiscoveryError::InvalidCount {
                    url: page_url.to_string(),
                    text: count_text.clone(),
                })?;

            let url = link_target(&link, page_url, site_root, "model link")?;

            Ok(ModelEntry { url, count })
        })
        .collect::<Result<Vec<_>, DiscoveryError>>()?;

    Ok(models)
}

/// Parses a count displayed as `(1,234)`
///
/// The wrapping characters are dropped positionally (first and last
/// character, whatever they are) and thousands separators are ignored.
pub fn parse_inventory_count(text: &str) -> Option<u64> {
    let text = text.trim();
    let mut chars = text.chars();
    chars.next()?;
    chars.next_back()?;
    let digits: String = chars.as_str().chars().filter(|c| *c != ',').collect();
    digits.trim().parse().ok()
}

/// Resolves a link's href (minus any map-view segment) against the site root
fn link_target(
    link: &ElementRef<'_>,
    page_url: &Url,
    site_root: &Url,
    what: &'static str,
) -> Result<Url, DiscoveryError> {
    let href = link
        .value()
        .attr("href")
        .ok_or_else(|| DiscoveryError::MissingMarkup {
            url: page_url.to_string(),
            what,
        })?;

    resolve_link(&strip_map_segment(href), site_root).ok_or_else(|| DiscoveryError::InvalidLink {
        url: page_url.to_string(),
        href: href.to_string(),
    })
}

fn selector(css: &'static str) -> Result<Selector, DiscoveryError> {
    Selector::parse(css).map_err(|_| DiscoveryError::InvalidSelector(css))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("https://www.carsensor.net/").unwrap()
    }

    fn brand_page(models: &[(&str, &str)]) -> String {
        let items: String = models
            .iter()
            .map(|(href, count)| {
                format!(
                    r#"<li class="shashuList__category__item"><label><a href="{}">モデル<span>{}</span></a></label></li>"#,
                    href, count
                )
            })
            .collect();
        format!(
            r#"<html><body><ul class="shashuList__category">{}</ul></body></html>"#,
            items
        )
    }

    #[test]
    fn test_selectors_parse() {
        for css in [BRAND_NAV_SELECTOR, MODEL_LINK_SELECTOR, "a", "span"] {
            assert!(selector(css).is_ok(), "{css}");
        }
    }

    #[test]
    fn test_parse_brand_nav() {
        let html = r#"<html><body>
            <ul class="makerNav__list">
              <li><a href="/usedcar/bTO/index.html">トヨタ</a></li>
              <li><a href="/usedcar/bHO/index.html">ホンダ</a></li>
            </ul>
            <ul class="makerNav__list"><li><a href="/usedcar/bXX/index.html">other</a></li></ul>
            </body></html>"#;

        let brands = parse_brand_nav(html, &root()).unwrap();
        assert_eq!(
            brands.iter().map(Url::as_str).collect::<Vec<_>>(),
            vec![
                "https://www.carsensor.net/usedcar/bTO/index.html",
                "https://www.carsensor.net/usedcar/bHO/index.html",
            ]
        );
    }

    #[test]
    fn test_parse_brand_nav_missing_list() {
        let result = parse_brand_nav("<html><body></body></html>", &root());
        assert!(matches!(
            result,
            Err(DiscoveryError::MissingMarkup { .. })
        ));
    }

    #[test]
    fn test_parse_model_list_strips_map_segment() {
        let html = brand_page(&[("/usedcar/bHO/s001/map/index.html", "(1,234)")]);
        let page_url = root().join("/usedcar/bHO/index.html").unwrap();

        let models = parse_model_list(&html, &page_url, &root()).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(
            models[0].url.as_str(),
            "https://www.carsensor.net/usedcar/bHO/s001/index.html"
        );
        assert_eq!(models[0].count, 1234);
    }

    #[test]
    fn test_parse_model_list_invalid_count() {
        let html = brand_page(&[("/usedcar/bHO/s001/map/index.html", "(many)")]);
        let result = parse_model_list(&html, &root(), &root());
        assert!(matches!(result, Err(DiscoveryError::InvalidCount { .. })));
    }

    #[test]
    fn test_threshold_filtering() {
        let html = brand_page(&[
            ("/usedcar/bHO/s001/map/index.html", "(50)"),
            ("/usedcar/bHO/s002/map/index.html", "(10)"),
            ("/usedcar/bHO/s003/map/index.html", "(9)"),
        ]);
        let entries = parse_model_list(&html, &root(), &root()).unwrap();

        let kept = filter_by_threshold(entries.clone(), 10);
        assert_eq!(
            kept.iter().map(|m| m.count).collect::<Vec<_>>(),
            vec![50, 10]
        );

        let all = filter_by_threshold(entries, 0);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_parse_inventory_count() {
        assert_eq!(parse_inventory_count("(50)"), Some(50));
        assert_eq!(parse_inventory_count(" (12,345) "), Some(12345));
        assert_eq!(parse_inventory_count("（7）"), Some(7));
        assert_eq!(parse_inventory_count("(0)"), Some(0));
        assert_eq!(parse_inventory_count("()"), None);
        assert_eq!(parse_inventory_count("5"), None);
        assert_eq!(parse_inventory_count(""), None);
    }
}
