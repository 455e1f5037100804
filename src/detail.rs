//! Detail resolver: expands a stub into work metadata and its chapter list.

use crate::catalog::{Chapter, Stub, Work};
use crate::document::{Document, Scope};
use crate::error::Result;
use crate::order::parse_order_key;
use crate::session::Session;
use crate::source::{DetailStrategies, SourceConfig};
use crate::util::{absolutize, derive_identifier, query_identifier, squash_whitespace, strip_prefix_ignore_case};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn author_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:author|pengarang|penulis|komikus)\s*:\s*([^\n,]+)").unwrap()
    })
}

/// Navigates to the stub's detail page and extracts the work.
/// The returned chapters carry no pages yet.
pub fn resolve<S: Session + ?Sized>(session: &mut S, config: &SourceConfig, stub: &Stub) -> Result<Work> {
    session.navigate(&stub.url, config.timeouts.detail)?;
    let doc = session.document()?;
    Ok(extract_work(&doc, config, stub))
}

pub fn extract_work<D: Document + ?Sized>(doc: &D, config: &SourceConfig, stub: &Stub) -> Work {
    let detail = &config.detail;

    let title = detail
        .title
        .resolve_one(doc, None)
        .map(|t| clean_title(&t, detail.title_prefix.as_deref()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| stub.title.clone());

    let cover = detail
        .cover
        .resolve_one(doc, None)
        .and_then(|raw| absolutize(doc.url(), &raw))
        .map(String::from)
        .or_else(|| stub.cover.clone());

    let description = Some(
        detail
            .synopsis
            .resolve(doc, None)
            .iter()
            .map(|p| squash_whitespace(p))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
    .filter(|d| !d.is_empty());

    let chapters = extract_chapters(doc, detail);
    log::debug!("{}: {} chapters", stub.id, chapters.len());

    Work {
        id: stub.id.clone(),
        title,
        source: config.source,
        url: stub.url.clone(),
        cover,
        author: find_author(doc, detail),
        description,
        kind: stub.kind.clone(),
        genres: extract_genres(doc, detail),
        chapters,
    }
}

/// Strips the decorative prefix only when a space separates it from the rest of the title.
fn clean_title(raw: &str, prefix: Option<&str>) -> String {
    let title = squash_whitespace(raw);
    let prefix = match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => prefix,
        None => return title,
    };
    match title.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) && title[prefix.len()..].starts_with(' ') => {
            title[prefix.len()..].trim().to_string()
        }
        _ => title,
    }
}

/// Author from labelled info rows, then from labelled text anywhere on the page.
pub fn find_author<D: Document + ?Sized>(doc: &D, detail: &DetailStrategies) -> Option<String> {
    for row in detail.info_rows.resolve(doc, None) {
        let label = doc.scope_text(row).to_lowercase();
        if !detail.author_labels.iter().any(|l| label.contains(l.as_str())) {
            continue;
        }
        if let Some(author) = row_value(doc, detail, row) {
            return Some(author);
        }
    }

    let text = doc.body_text();
    author_pattern()
        .captures(&text)
        .map(|caps| squash_whitespace(&caps[1]))
        .filter(|a| !a.is_empty())
}

fn row_value<D: Document + ?Sized>(doc: &D, detail: &DetailStrategies, row: Scope) -> Option<String> {
    let candidates = detail
        .info_value
        .resolve_one(doc, Some(row))
        .into_iter()
        .chain(doc.next_sibling(row).map(|s| doc.scope_text(s)))
        .chain(std::iter::once(doc.scope_text(row)));

    candidates
        .map(|value| strip_author_label(&squash_whitespace(&value), &detail.author_labels))
        .find(|value| !value.is_empty())
}

/// Removes a leading `Label:` from an author value.
fn strip_author_label(value: &str, labels: &[String]) -> String {
    for label in labels {
        let rest = strip_prefix_ignore_case(value, label);
        if rest.len() == value.len() {
            continue;
        }
        if rest.is_empty() || rest.starts_with(':') || value[label.len()..].starts_with(char::is_whitespace) {
            return rest.trim_start_matches(':').trim().to_string();
        }
    }
    value.trim().to_string()
}

/// Genre names, whitespace-normalized and deduplicated in page order.
pub fn extract_genres<D: Document + ?Sized>(doc: &D, detail: &DetailStrategies) -> Vec<String> {
    let mut seen = HashSet::new();
    detail
        .genres
        .resolve(doc, None)
        .iter()
        .map(|g| squash_whitespace(g))
        .filter(|g| !g.is_empty())
        .filter(|g| detail.max_genre_len == 0 || g.chars().count() <= detail.max_genre_len)
        .filter(|g| seen.insert(g.clone()))
        .collect()
}

/// Chapters in detail-page order. Entries without title and URL, or without an
/// identifier, are dropped; a repeated URL or identifier keeps the first entry.
/// Chapter URLs that share a path segment and differ in the query get a query-based identifier.
pub fn extract_chapters<D: Document + ?Sized>(doc: &D, detail: &DetailStrategies) -> Vec<Chapter> {
    let mut seen = HashSet::new();
    let mut seen_urls = HashSet::new();
    detail
        .chapters
        .resolve(doc, None)
        .into_iter()
        .filter_map(|scope| {
            let title = detail
                .chapter_title
                .resolve_one(doc, Some(scope))
                .map(|t| squash_whitespace(&t))
                .filter(|t| !t.is_empty());
            let url = detail
                .chapter_url
                .resolve_one(doc, Some(scope))
                .and_then(|raw| absolutize(doc.url(), &raw));
            if title.is_none() && url.is_none() {
                return None;
            }
            if let Some(url) = &url {
                if !seen_urls.insert(url.clone()) {
                    log::debug!("Dropping repeated chapter link {}", url);
                    return None;
                }
            }
            let mut id = derive_identifier(url.as_ref(), title.as_deref().unwrap_or_default())?;
            if seen.contains(&id) {
                if let Some(alt) = url.as_ref().and_then(query_identifier) {
                    id = alt;
                }
            }
            if !seen.insert(id.clone()) {
                log::debug!("Dropping repeated chapter {}", id);
                return None;
            }
            let title = title.unwrap_or_else(|| id.clone());
            Some(Chapter {
                order_key: parse_order_key(&title),
                id,
                title,
                url,
                pages: Vec::new(),
            })
        })
        .collect()
}
