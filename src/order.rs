//! Chapter ordering inferred from free-form chapter titles.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

const NUMBER: &str = r"(\d+(?:\.\d+)?)";

/// Labeled number: chapter/episode/part/volume keywords in English and Indonesian.
/// A trailing range (`12-13`) is accepted but only the first bound is captured.
fn labeled() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)(?:\b(?:chapter|chap|ch|episode|eps|ep|part|pt|volume|vol|bagian|bab|jilid)|#)\.?\s*{}(?:\s*[-–~]\s*\d+(?:\.\d+)?)?",
            NUMBER
        ))
        .unwrap()
    })
}

fn bare() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NUMBER).unwrap())
}

/// Sortable order key for a chapter title.
///
/// Labeled numbers ("Chapter 12", "Bab 12.5", "Vol. 3") win over bare ones; without a label the
/// first bare number is used ("12.5 - The End"). Titles without any number have no key.
pub fn parse_order_key(title: &str) -> Option<f64> {
    labeled()
        .captures(title)
        .or_else(|| bare().captures(title))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Descending by key, chapters without a key last.
pub fn cmp_order_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
