//! Listing records
//!
//! A [`ListingRecord`] is the fixed 14-field row extracted from one vehicle
//! listing. Extraction produces [`ExtractedFields`], where every lookup is an
//! `Option`; the conversion into a record is the single place where a missing
//! value becomes the [`SENTINEL`].

/// Placeholder for any field whose markup was absent or unparsable
pub const SENTINEL: &str = "-";

/// Number of fields in every record
pub const FIELD_COUNT: usize = 14;

/// Column names, in record order
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "brand",
    "title",
    "body_type",
    "year",
    "distance",
    "displacement",
    "inspection_expiry",
    "repair_history",
    "color",
    "price",
    "monthly_payment",
    "location",
    "review_score",
    "review_count",
];

/// One extracted vehicle listing
///
/// Every field holds either a non-empty extracted string or [`SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub brand: String,
    pub title: String,
    pub body_type: String,
    pub year: String,
    pub distance: String,
    pub displacement: String,
    pub inspection_expiry: String,
    pub repair_history: String,
    pub color: String,
    pub price: String,
    pub monthly_payment: String,
    pub location: String,
    pub review_score: String,
    pub review_count: String,
}

impl ListingRecord {
    /// Returns the fields in column order (see [`FIELD_NAMES`])
    pub fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            self.brand.as_str(),
            self.title.as_str(),
            self.body_type.as_str(),
            self.year.as_str(),
            self.distance.as_str(),
            self.displacement.as_str(),
            self.inspection_expiry.as_str(),
            self.repair_history.as_str(),
            self.color.as_str(),
            self.price.as_str(),
            self.monthly_payment.as_str(),
            self.location.as_str(),
            self.review_score.as_str(),
            self.review_count.as_str(),
        ]
    }

    /// Number of fields that fell back to the sentinel
    pub fn sentinel_count(&self) -> usize {
        self.fields().iter().filter(|f| **f == SENTINEL).count()
    }
}

/// Raw per-field lookup results for one listing
///
/// The review score and count come from a single lookup and are therefore
/// stored as one pair: either both were found or neither was.
#[derive(Debug, Clone, Default)]
pub struct ExtractedFields {
    pub brand: Option<String>,
    pub title: Option<String>,
    pub body_type: Option<String>,
    pub year: Option<String>,
    pub distance: Option<String>,
    pub displacement: Option<String>,
    pub inspection_expiry: Option<String>,
    pub repair_history: Option<String>,
    pub color: Option<String>,
    pub price: Option<String>,
    pub monthly_payment: Option<String>,
    pub location: Option<String>,
    pub review: Option<(String, String)>,
}

impl ExtractedFields {
    /// Collapses every missing or blank value to [`SENTINEL`]
    pub fn into_record(self) -> ListingRecord {
        let (review_score, review_count) = match self
            .review
            .and_then(|(score, count)| Some((clean(Some(score))?, clean(Some(count))?)))
        {
            Some((score, count)) => (score, count),
            None => (SENTINEL.to_string(), SENTINEL.to_string()),
        };

        ListingRecord {
            brand: or_sentinel(self.brand),
            title: or_sentinel(self.title),
            body_type: or_sentinel(self.body_type),
            year: or_sentinel(self.year),
            distance: or_sentinel(self.distance),
            displacement: or_sentinel(self.displacement),
            inspection_expiry: or_sentinel(self.inspection_expiry),
            repair_history: or_sentinel(self.repair_history),
            color: or_sentinel(self.color),
            price: or_sentinel(self.price),
            monthly_payment: or_sentinel(self.monthly_payment),
            location: or_sentinel(self.location),
            review_score,
            review_count,
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_sentinel(value: Option<String>) -> String {
    clean(value).unwrap_or_else(|| SENTINEL.to_string())
}
