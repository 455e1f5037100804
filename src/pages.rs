//! Page resolver: materializes lazy-loaded reader pages and numbers their images.

use crate::catalog::Page;
use crate::document::Document;
use crate::error::Result;
use crate::session::{Scroller, Session};
use crate::source::SourceConfig;
use crate::util::absolutize;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Scroll-and-wait settings for lazy-loading reader pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollOptions {
    /// Distance of each scroll step, in pixels.
    pub step: u32,
    /// Wait after each step.
    pub pause: Duration,
    /// Unchanged heights at the bottom of the page needed to stop.
    pub stable_rounds: u32,
    pub max_steps: u32,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            step: 800,
            pause: Duration::from_millis(500),
            stable_rounds: 3,
            max_steps: 60,
        }
    }
}

/// Loads a chapter reader page and returns its images as pages `1..=N`.
///
/// Finding no image is not an error. A source without reader strategies never navigates.
pub fn resolve<S: Session + ?Sized>(
    session: &mut S,
    config: &SourceConfig,
    chapter_url: &Url,
    scroll: &ScrollOptions,
) -> Result<Vec<Page>> {
    if config.reader.is_empty() {
        return Ok(Vec::new());
    }

    session.navigate(chapter_url, config.timeouts.chapter)?;
    if let Some(scroller) = session.scroller() {
        let steps = settle(scroller, scroll)?;
        log::trace!("{} settled after {} scroll steps", chapter_url, steps);
    }

    let doc = session.document()?;
    let pages = Page::sequence(image_urls(&doc, config));
    if pages.is_empty() {
        log::warn!("No page images found on {}", chapter_url);
    }
    Ok(pages)
}

/// Scrolls until the page height stops growing at the bottom. Returns the number of steps taken.
fn settle(scroller: &mut dyn Scroller, scroll: &ScrollOptions) -> Result<u32> {
    let mut height = scroller.scroll_state()?.height;
    let mut stable = 0;
    let mut steps = 0;

    while steps < scroll.max_steps {
        scroller.scroll_by(scroll.step)?;
        steps += 1;
        if !scroll.pause.is_zero() {
            std::thread::sleep(scroll.pause);
        }

        let state = scroller.scroll_state()?;
        if state.height == height && state.at_bottom() {
            stable += 1;
            if stable >= scroll.stable_rounds {
                break;
            }
        } else {
            stable = 0;
            height = state.height;
        }
    }

    Ok(steps)
}

/// Reader image URLs in document order, absolute, exact duplicates removed.
pub fn image_urls<D: Document + ?Sized>(doc: &D, config: &SourceConfig) -> Vec<String> {
    let mut seen = HashSet::new();
    config
        .reader
        .resolve(doc, None)
        .iter()
        .filter_map(|raw| absolutize(doc.url(), raw))
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{Cascade, Strategy};
    use crate::document::Extract;
    use crate::session::fixture::FixtureSession;
    use select::predicate::{Attr, Class, Descendant, Name};
    use crate::source::Source;

    const CHAPTER: &str = "https://example.com/read/ch-1/";

    fn config() -> SourceConfig {
        SourceConfig::builder()
            .source(Source::Westmanga)
            .seed_url(Url::parse("https://example.com/manga/").unwrap())
            .reader(Cascade::new(vec![
                Strategy::new(
                    Descendant(Attr("id", "readerarea"), Name("img")),
                    Extract::first_attr(&["data-src", "src"]),
                ),
                Strategy::new(Descendant(Class("reader-area"), Name("img")), Extract::attr("src")),
            ]))
            .finish()
            .unwrap()
    }

    fn quick() -> ScrollOptions {
        ScrollOptions {
            pause: Duration::from_millis(0),
            ..ScrollOptions::default()
        }
    }

    fn ordinals_and_urls(pages: &[Page]) -> Vec<(i32, &str)> {
        pages.iter().map(|p| (p.ordinal, p.image_url.as_str())).collect()
    }

    #[test]
    fn duplicates_removed_order_kept() {
        let html = r#"<div class="reader-area">
            <img src="img1.jpg"><img src="img1.jpg"><img src="img2.jpg">
        </div>"#;
        let mut session = FixtureSession::new().page(CHAPTER, html);
        let pages = resolve(&mut session, &config(), &Url::parse(CHAPTER).unwrap(), &quick()).unwrap();
        assert_eq!(
            ordinals_and_urls(&pages),
            vec![
                (1, "https://example.com/read/ch-1/img1.jpg"),
                (2, "https://example.com/read/ch-1/img2.jpg"),
            ]
        );
    }

    #[test]
    fn markup_page_numbers_are_ignored() {
        let html = r#"<div id="readerarea">
            <img data-src="/p/3.jpg" src="/blank.gif" data-page="3">
            <img data-src="/p/1.jpg" src="/blank.gif" data-page="1">
            <img src="https://cdn.example.net/p/2.jpg" data-page="2">
        </div>"#;
        let mut session = FixtureSession::new().page(CHAPTER, html);
        let pages = resolve(&mut session, &config(), &Url::parse(CHAPTER).unwrap(), &quick()).unwrap();
        assert_eq!(
            ordinals_and_urls(&pages),
            vec![
                (1, "https://example.com/p/3.jpg"),
                (2, "https://example.com/p/1.jpg"),
                (3, "https://cdn.example.net/p/2.jpg"),
            ]
        );
    }

    #[test]
    fn scrolling_materializes_lazy_images() {
        let frames = [
            r#"<div class="reader-area"><img src="a.jpg"></div>"#,
            r#"<div class="reader-area"><img src="a.jpg"><img src="b.jpg"></div>"#,
            r#"<div class="reader-area"><img src="a.jpg"><img src="b.jpg"><img src="c.jpg"></div>"#,
        ];
        let mut session = FixtureSession::new().lazy_page(CHAPTER, &frames);
        let pages = resolve(&mut session, &config(), &Url::parse(CHAPTER).unwrap(), &quick()).unwrap();
        assert_eq!(pages.iter().map(|p| p.ordinal).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(pages[2].image_url.ends_with("/c.jpg"));
    }

    #[test]
    fn scroll_stops_once_height_is_stable() {
        let frames = ["<p>1</p>", "<p>2</p>", "<p>3</p>"];
        let mut session = FixtureSession::new().lazy_page(CHAPTER, &frames);
        session.navigate(&Url::parse(CHAPTER).unwrap(), Duration::from_secs(1)).unwrap();
        // two growing steps, then three unchanged heights at the bottom
        assert_eq!(settle(&mut session, &quick()).unwrap(), 5);

        let mut session = FixtureSession::new().lazy_page(CHAPTER, &frames);
        session.navigate(&Url::parse(CHAPTER).unwrap(), Duration::from_secs(1)).unwrap();
        let capped = ScrollOptions {
            max_steps: 2,
            ..quick()
        };
        assert_eq!(settle(&mut session, &capped).unwrap(), 2);
    }

    #[test]
    fn no_images_is_an_empty_chapter() {
        let mut session = FixtureSession::new().page(CHAPTER, "<p>Coming soon</p>");
        let pages = resolve(&mut session, &config(), &Url::parse(CHAPTER).unwrap(), &quick()).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn sources_without_reader_skip_navigation() {
        let config = Source::Nineanime.config().unwrap();
        let mut session = FixtureSession::new();
        let pages = resolve(&mut session, &config, &Url::parse(CHAPTER).unwrap(), &quick()).unwrap();
        assert!(pages.is_empty());
        assert!(session.visited.is_empty());
    }

    #[test]
    fn navigation_failure_is_reported() {
        let mut session = FixtureSession::new().failing(CHAPTER);
        assert!(resolve(&mut session, &config(), &Url::parse(CHAPTER).unwrap(), &quick()).is_err());
    }
}
