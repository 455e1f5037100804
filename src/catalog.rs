//! Entities produced by the pipeline stages, before they reach storage.

use crate::source::Source;
use serde::Serialize;
use url::Url;

/// Minimal catalog item captured from a listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stub {
    pub id: String,
    pub title: String,
    pub cover: Option<String>,
    pub kind: Option<String>,
    pub url: Url,
}

/// One page image. Ordinals are 1-based and follow extraction order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub ordinal: i32,
    pub image_url: String,
}

impl Page {
    /// Numbers image URLs `1..=N` in the order given.
    pub fn sequence<I: IntoIterator<Item = String>>(urls: I) -> Vec<Page> {
        urls.into_iter()
            .enumerate()
            .map(|(idx, image_url)| Page {
                ordinal: idx as i32 + 1, // 1-based index
                image_url,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub order_key: Option<f64>,
    pub url: Option<Url>,
    pub pages: Vec<Page>,
}

/// A fully resolved work, ready for reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Work {
    pub id: String,
    pub title: String,
    pub source: Source,
    pub url: Url,
    pub cover: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub genres: Vec<String>,
    pub chapters: Vec<Chapter>,
}

impl Work {
    pub fn page_count(&self) -> usize {
        self.chapters.iter().map(|ch| ch.pages.len()).sum()
    }
}
