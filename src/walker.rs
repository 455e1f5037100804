//! List walker: follows listing pagination and collects catalog stubs.

use crate::catalog::Stub;
use crate::document::Document;
use crate::error::Result;
use crate::report::{EventKind, RunEvent, Stage, StopReason};
use crate::session::Session;
use crate::source::{ListingStrategies, SourceConfig};
use crate::util::{absolutize, derive_identifier};
use std::collections::HashSet;
use std::time::Instant;
use url::Url;

#[derive(Debug, Clone, Copy)]
pub struct WalkLimits {
    pub max_pages: usize,
    pub max_items: Option<usize>,
    pub deadline: Option<Instant>,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_pages: 20,
            max_items: None,
            deadline: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Walk {
    /// Deduplicated stubs, first seen wins.
    pub stubs: Vec<Stub>,
    pub pages_visited: usize,
    pub stopped: Option<StopReason>,
    pub events: Vec<RunEvent>,
}

impl Walk {
    /// Appends stubs not seen before; returns how many were new.
    fn absorb(&mut self, seen: &mut HashSet<String>, stubs: Vec<Stub>) -> usize {
        let before = self.stubs.len();
        for stub in stubs {
            if seen.insert(stub.id.clone()) {
                self.stubs.push(stub);
            } else {
                log::debug!("Dropping duplicate stub {}", stub.id);
            }
        }
        self.stubs.len() - before
    }
}

/// Walks listing pages starting at the seed.
///
/// Failing to load the seed page is an error. Failing on a later page ends the
/// walk with what was collected so far.
pub fn walk<S: Session + ?Sized>(
    session: &mut S,
    config: &SourceConfig,
    limits: &WalkLimits,
) -> Result<Walk> {
    let mut walk = Walk::default();
    let mut seen = HashSet::new();
    let mut visited = HashSet::new();
    let mut next = Some(config.seed_url.clone());

    while let Some(url) = next.take() {
        if walk.pages_visited >= limits.max_pages {
            walk.stopped = Some(StopReason::MaxPages);
            break;
        }
        if limits.deadline.map_or(false, |d| Instant::now() >= d) {
            walk.stopped = Some(StopReason::Deadline);
            break;
        }
        if !visited.insert(url.to_string()) {
            log::warn!("Listing pagination loops back to {}", url);
            walk.stopped = Some(StopReason::PaginationLoop);
            break;
        }

        log::info!("Walking listing page {} ({})", walk.pages_visited + 1, url);
        if let Err(e) = session.navigate(&url, config.timeouts.listing) {
            if walk.pages_visited == 0 {
                return Err(e);
            }
            log::warn!("Cannot load listing page {}: {}", url, e);
            walk.events.push(RunEvent::new(
                Stage::Listing,
                EventKind::Stopped,
                url.as_str(),
                e.to_string(),
            ));
            break;
        }
        walk.pages_visited += 1;

        let doc = session.document()?;
        let stubs = extract_stubs(&doc, &config.listing);
        let found = stubs.len();
        let new = walk.absorb(&mut seen, stubs);
        log::info!("Found {} stubs ({} new) on {}", found, new, url);

        if let Some(max) = limits.max_items {
            if walk.stubs.len() >= max {
                walk.stubs.truncate(max);
                walk.stopped = Some(StopReason::MaxItems);
                break;
            }
        }

        next = next_page_url(&doc, &config.listing, &config.origin());
    }

    Ok(walk)
}

/// Stubs on one listing page, in page order. Items missing identifier, title or URL are dropped.
pub fn extract_stubs<D: Document + ?Sized>(doc: &D, listing: &ListingStrategies) -> Vec<Stub> {
    listing
        .items
        .resolve(doc, None)
        .into_iter()
        .filter_map(|item| {
            let title = listing.title.resolve_one(doc, Some(item))?;
            let url = listing
                .url
                .resolve_one(doc, Some(item))
                .and_then(|raw| absolutize(doc.url(), &raw));
            let url = match url {
                Some(url) => url,
                None => {
                    log::debug!("Dropping stub without URL: {}", title);
                    return None;
                }
            };
            let id = derive_identifier(Some(&url), &title)?;

            let kind = listing.kind.resolve_one(doc, Some(item)).or_else(|| {
                if listing.infer_kind {
                    infer_kind(&doc.scope_text(item))
                } else {
                    None
                }
            });
            if !listing.allowed_kinds.is_empty() {
                let allowed = kind.as_ref().map_or(false, |k| {
                    listing.allowed_kinds.iter().any(|a| a.eq_ignore_ascii_case(k))
                });
                if !allowed {
                    log::debug!("Skipping {} of kind {:?}", id, kind);
                    return None;
                }
            }

            let cover = listing
                .cover
                .resolve_one(doc, Some(item))
                .and_then(|raw| absolutize(doc.url(), &raw))
                .map(String::from);

            Some(Stub {
                id,
                title,
                cover,
                kind,
                url,
            })
        })
        .collect()
}

/// Absolute URL of the next listing page. Links leaving `origin` are not followed.
pub fn next_page_url<D: Document + ?Sized>(doc: &D, listing: &ListingStrategies, origin: &Url) -> Option<Url> {
    listing
        .next_page
        .resolve(doc, None)
        .into_iter()
        .filter_map(|raw| absolutize(doc.url(), &raw))
        .find(|url| url != doc.url() && url.origin() == origin.origin())
}

fn infer_kind(text: &str) -> Option<String> {
    let text = text.to_lowercase();
    if text.contains("manhwa") {
        Some("Manhwa".to_string())
    } else if text.contains("manhua") {
        Some("Manhua".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{Cascade, ScopeCascade, Strategy};
    use crate::document::Selector;
    use crate::session::fixture::FixtureSession;
    use crate::source::Source;
    use select::predicate::{And, Class, Descendant, Name};

    fn listing() -> ListingStrategies {
        ListingStrategies {
            items: ScopeCascade::new(vec![Selector::new(And(Name("div"), Class("item")))]),
            title: Cascade::new(vec![Strategy::text(Descendant(Name("h4"), Name("a")))]),
            url: Cascade::new(vec![Strategy::attr(Descendant(Name("h4"), Name("a")), "href")]),
            cover: Cascade::new(vec![Strategy::attr(Name("img"), "src")]),
            kind: Cascade::new(vec![Strategy::text(And(Name("span"), Class("type")))]),
            next_page: Cascade::new(vec![Strategy::attr(And(Name("a"), Class("next")), "href")]),
            allowed_kinds: Vec::new(),
            infer_kind: false,
        }
    }

    fn config(listing: ListingStrategies) -> SourceConfig {
        SourceConfig::builder()
            .source(Source::Komiku)
            .seed_url(Url::parse("https://example.com/list/").unwrap())
            .listing(listing)
            .finish()
            .unwrap()
    }

    fn item(id: &str, title: &str) -> String {
        format!(
            r#"<div class="item"><img src="/covers/{id}.jpg"><h4><a href="/manga/{id}/">{title}</a></h4><span class="type">Manhwa</span></div>"#,
            id = id,
            title = title
        )
    }

    #[test]
    fn duplicates_are_dropped_first_seen_wins() {
        let html = format!("{}{}{}", item("a", "First A"), item("a", "Second A"), item("b", "B"));
        let mut session = FixtureSession::new().page("https://example.com/list/", &html);
        let walk = walk(&mut session, &config(listing()), &WalkLimits::default()).unwrap();

        assert_eq!(walk.stubs.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(walk.stubs[0].title, "First A");
        assert_eq!(walk.stubs[0].url.as_str(), "https://example.com/manga/a/");
        assert_eq!(walk.stubs[0].cover.as_deref(), Some("https://example.com/covers/a.jpg"));
        assert_eq!(walk.stubs[0].kind.as_deref(), Some("Manhwa"));
        assert_eq!(walk.stopped, None);
    }

    #[test]
    fn incomplete_items_are_dropped() {
        let html = r#"
            <div class="item"><h4><a href="/manga/no-title/"></a></h4></div>
            <div class="item"><h4>No link</h4></div>
            <div class="item"><h4><a href="/manga/ok/">Ok</a></h4></div>"#;
        let mut session = FixtureSession::new().page("https://example.com/list/", html);
        let walk = walk(&mut session, &config(listing()), &WalkLimits::default()).unwrap();
        assert_eq!(walk.stubs.len(), 1);
        assert_eq!(walk.stubs[0].id, "ok");
    }

    #[test]
    fn follows_pagination_across_pages() {
        let page1 = format!(r#"{}{}<a class="next" href="/list/page/2/">Next</a>"#, item("a", "A"), item("b", "B"));
        let page2 = format!("{}{}", item("b", "B again"), item("c", "C"));
        let mut session = FixtureSession::new()
            .page("https://example.com/list/", &page1)
            .page("https://example.com/list/page/2/", &page2);
        let walk = walk(&mut session, &config(listing()), &WalkLimits::default()).unwrap();

        assert_eq!(walk.pages_visited, 2);
        assert_eq!(walk.stubs.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(session.visited.len(), 2);
    }

    #[test]
    fn max_pages_guards_pagination_loops() {
        let page1 = format!(r#"{}<a class="next" href="/list/page/2/">Next</a>"#, item("a", "A"));
        let page2 = format!(r#"{}<a class="next" href="/list/">Next</a>"#, item("b", "B"));
        let make = || {
            FixtureSession::new()
                .page("https://example.com/list/", &page1)
                .page("https://example.com/list/page/2/", &page2)
        };

        let mut session = make();
        let limits = WalkLimits {
            max_pages: 1,
            ..WalkLimits::default()
        };
        let first = walk(&mut session, &config(listing()), &limits).unwrap();
        assert_eq!(first.stubs.len(), 1);
        assert_eq!(first.stopped, Some(StopReason::MaxPages));

        let mut session = make();
        let looped = walk(&mut session, &config(listing()), &WalkLimits::default()).unwrap();
        assert_eq!(looped.stubs.len(), 2);
        assert_eq!(looped.stopped, Some(StopReason::PaginationLoop));
        assert_eq!(session.visited.len(), 2);
    }

    #[test]
    fn off_site_next_page_is_ignored() {
        let html = format!(
            r#"{}<a class="next" href="https://ads.example.net/list/page/2/">Next</a>"#,
            item("a", "A")
        );
        let mut session = FixtureSession::new().page("https://example.com/list/", &html);
        let walk = walk(&mut session, &config(listing()), &WalkLimits::default()).unwrap();
        assert_eq!(walk.pages_visited, 1);
        assert_eq!(session.visited.len(), 1);
    }

    #[test]
    fn max_items_truncates() {
        let html = format!("{}{}{}", item("a", "A"), item("b", "B"), item("c", "C"));
        let mut session = FixtureSession::new().page("https://example.com/list/", &html);
        let limits = WalkLimits {
            max_items: Some(2),
            ..WalkLimits::default()
        };
        let walk = walk(&mut session, &config(listing()), &limits).unwrap();
        assert_eq!(walk.stubs.len(), 2);
        assert_eq!(walk.stopped, Some(StopReason::MaxItems));
    }

    #[test]
    fn seed_failure_is_an_error_later_failure_is_not() {
        let mut session = FixtureSession::new().failing("https://example.com/list/");
        assert!(walk(&mut session, &config(listing()), &WalkLimits::default()).is_err());

        let page1 = format!(r#"{}<a class="next" href="/list/page/2/">Next</a>"#, item("a", "A"));
        let mut session = FixtureSession::new()
            .page("https://example.com/list/", &page1)
            .failing("https://example.com/list/page/2/");
        let walk = walk(&mut session, &config(listing()), &WalkLimits::default()).unwrap();
        assert_eq!(walk.stubs.len(), 1);
        assert_eq!(walk.events.len(), 1);
        assert_eq!(walk.events[0].kind, EventKind::Stopped);
    }

    #[test]
    fn kind_filter_and_inference() {
        let mut strategies = listing();
        strategies.kind = Cascade::default();
        strategies.infer_kind = true;
        strategies.allowed_kinds = vec!["Manhwa".to_string(), "Manhua".to_string()];
        let html = r#"
            <div class="item"><h4><a href="/manga/x/">X</a></h4><p>Manhua berwarna</p></div>
            <div class="item"><h4><a href="/manga/y/">Y</a></h4><p>Manga</p></div>"#;
        let doc = crate::document::HtmlDocument::parse(Url::parse("https://example.com/list/").unwrap(), html);
        let stubs = extract_stubs(&doc, &strategies);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].id, "x");
        assert_eq!(stubs[0].kind.as_deref(), Some("Manhua"));
    }
}
