//! Field extraction for a single listing
//!
//! Every field is looked up independently through a fixed selector path and a
//! text rule. A lookup that finds no element, runs past the end of a list or
//! has too few text tokens yields `None` for that field only; the remaining
//! fields are still extracted. `None` becomes the sentinel when the
//! [`ExtractedFields`] are turned into a [`ListingRecord`].
//!
//! Lookups are positional (`nth` element of a selector match), mirroring the
//! site's markup. A change in the upstream markup shows up as more sentinel
//! values rather than as an error.

use crate::record::{ExtractedFields, ListingRecord};
use scraper::{ElementRef, Selector};

const MAKER: &str = ".casetMedia__body__maker";
const TITLE: &str = ".casetMedia__body__title";
const SPEC: &str = ".casetMedia__body__spec";
const SPEC_PARAGRAPH: &str = ".casetMedia__body__spec > p";
const SPEC_BOX: &str = ".specWrap__box";
const SPEC_BOX_NUM: &str = ".specWrap__box__num";
const BASE_PRICE: &str = ".basePrice__price";
const TOTAL_PRICE: &str = ".totalPrice__price";
const AREA_PARAGRAPH: &str = ".casetSub__area > p";
const REVIEW_SPANS: &str = ".casetSub__review__score.js_shop > a > span";

/// Position of each entry in the spec box row
const BOX_YEAR: usize = 0;
const BOX_DISTANCE: usize = 1;
const BOX_DISPLACEMENT: usize = 2;
const BOX_INSPECTION: usize = 3;
const BOX_REPAIR: usize = 4;

/// Extracts one listing fragment into a record
///
/// Never fails: every field that cannot be read becomes the sentinel.
pub fn extract_listing(fragment: &ElementRef<'_>) -> ListingRecord {
    extract_fields(fragment).into_record()
}

/// Runs every field lookup against the fragment
pub fn extract_fields(fragment: &ElementRef<'_>) -> ExtractedFields {
    ExtractedFields {
        brand: brand(fragment),
        title: title(fragment),
        body_type: body_type(fragment),
        year: year(fragment),
        distance: distance(fragment),
        displacement: displacement(fragment),
        inspection_expiry: inspection_expiry(fragment),
        repair_history: repair_history(fragment),
        color: color(fragment),
        price: price(fragment),
        monthly_payment: monthly_payment(fragment),
        location: location(fragment),
        review: review(fragment),
    }
}

fn brand(fragment: &ElementRef<'_>) -> Option<String> {
    select_nth(fragment, MAKER, 0).map(|el| text_of(&el))
}

/// First token of the title; the rest is the grade name
fn title(fragment: &ElementRef<'_>) -> Option<String> {
    let el = select_nth(fragment, TITLE, 0)?;
    nth_token(&text_of(&el), 0)
}

fn body_type(fragment: &ElementRef<'_>) -> Option<String> {
    select_nth(fragment, SPEC_PARAGRAPH, 0).map(|el| text_of(&el))
}

fn year(fragment: &ElementRef<'_>) -> Option<String> {
    spec_box_number(fragment, BOX_YEAR)
}

/// Mileage value and unit are separate paragraphs, e.g. `3.5` + `万km`
fn distance(fragment: &ElementRef<'_>) -> Option<String> {
    let spec_box = select_nth(fragment, SPEC_BOX, BOX_DISTANCE)?;
    let value = select_nth(&spec_box, "p", 1)?;
    let unit = select_nth(&spec_box, "p", 2)?;
    Some(format!("{}{}", text_of(&value).trim(), text_of(&unit).trim()))
}

fn displacement(fragment: &ElementRef<'_>) -> Option<String> {
    spec_box_number(fragment, BOX_DISPLACEMENT)
}

/// Every token after the box label, joined without separators
fn inspection_expiry(fragment: &ElementRef<'_>) -> Option<String> {
    let spec_box = select_nth(fragment, SPEC_BOX, BOX_INSPECTION)?;
    let joined: String = text_of(&spec_box).split_whitespace().skip(1).collect();
    Some(joined)
}

fn repair_history(fragment: &ElementRef<'_>) -> Option<String> {
    let spec_box = select_nth(fragment, SPEC_BOX, BOX_REPAIR)?;
    nth_token(&text_of(&spec_box), 1)
}

/// Third token of the spec line: body type, doors, then color
fn color(fragment: &ElementRef<'_>) -> Option<String> {
    let spec = select_nth(fragment, SPEC, 0)?;
    nth_token(&text_of(&spec), 2)
}

fn price(fragment: &ElementRef<'_>) -> Option<String> {
    let el = select_nth(fragment, BASE_PRICE, 0)?;
    nth_token(&text_of(&el), 0)
}

fn monthly_payment(fragment: &ElementRef<'_>) -> Option<String> {
    let el = select_nth(fragment, TOTAL_PRICE, 0)?;
    nth_token(&text_of(&el), 0)
}

fn location(fragment: &ElementRef<'_>) -> Option<String> {
    select_nth(fragment, AREA_PARAGRAPH, 0).map(|el| text_of(&el))
}

/// Score and count come from one lookup; both spans must be present
fn review(fragment: &ElementRef<'_>) -> Option<(String, String)> {
    let selector = Selector::parse(REVIEW_SPANS).ok()?;
    let mut spans = fragment.select(&selector);
    let score = spans.next()?;
    let count = spans.next()?;
    Some((text_of(&score), text_of(&count)))
}

/// The numeric entry inside the spec box at `position`
fn spec_box_number(fragment: &ElementRef<'_>, position: usize) -> Option<String> {
    let spec_box = select_nth(fragment, SPEC_BOX, position)?;
    select_nth(&spec_box, SPEC_BOX_NUM, 0).map(|el| text_of(&el))
}

fn select_nth<'a>(scope: &ElementRef<'a>, css: &str, n: usize) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).nth(n)
}

fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn nth_token(text: &str, n: usize) -> Option<String> {
    text.split_whitespace().nth(n).map(str::to_string)
}
