//! Browsing sessions. A run owns exactly one session and navigates it sequentially.

use crate::document::HtmlDocument;
use crate::error::{Error, Result};
use crate::util::decode_body;
use rand::Rng;
use std::io::Read;
use std::time::Duration;
use url::Url;

pub(crate) const FAKE_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Response bodies above this size are truncated.
const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// Viewport position after scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollState {
    /// Bottom edge of the viewport, in pixels from the top of the page.
    pub offset: u64,
    /// Total document height.
    pub height: u64,
}

impl ScrollState {
    pub fn at_bottom(&self) -> bool {
        self.offset >= self.height
    }
}

/// Scroll control over the current page of a session that runs page scripts.
pub trait Scroller {
    /// Scrolls the current page down by `distance` pixels.
    fn scroll_by(&mut self, distance: u32) -> Result<()>;

    fn scroll_state(&mut self) -> Result<ScrollState>;
}

/// A single-page browsing session.
pub trait Session {
    /// Loads `url` as the current page.
    fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<()>;

    /// Snapshot of the current page.
    fn document(&self) -> Result<HtmlDocument>;

    /// Scroll control, when scrolling can attach new content. Sessions that
    /// only see the served HTML return `None` and skip the scroll-and-wait loop.
    fn scroller(&mut self) -> Option<&mut dyn Scroller> {
        None
    }
}

/// Randomized pause taken before every navigation except the first.
#[derive(Debug)]
pub(crate) struct Pacer {
    delay: (Duration, Duration),
    navigations: usize,
}

impl Pacer {
    /// `delay` is the inclusive range of the pause.
    pub(crate) fn new(delay: (Duration, Duration)) -> Result<Self> {
        if delay.0 > delay.1 {
            return Err(Error::SessionStart(format!(
                "invalid delay range {:?}..={:?}",
                delay.0, delay.1
            )));
        }
        Ok(Self { delay, navigations: 0 })
    }

    pub(crate) fn wait(&mut self) {
        self.navigations += 1;
        if self.navigations == 1 || self.delay.1.as_millis() == 0 {
            return;
        }
        let (min, max) = (self.delay.0.as_millis() as u64, self.delay.1.as_millis() as u64);
        let wait = rand::rng().random_range(min..=max);
        log::trace!("pausing {}ms before next navigation", wait);
        std::thread::sleep(Duration::from_millis(wait));
    }
}

/// Plain HTTP session: fetches HTML without running scripts.
pub struct HttpSession {
    agent: ureq::Agent,
    pacer: Pacer,
    current: Option<(Url, String)>,
}

impl HttpSession {
    /// Opens a session. `delay` is the inclusive range of the randomized pause
    /// taken before every navigation except the first.
    pub fn open(user_agent: Option<&str>, delay: (Duration, Duration)) -> Result<Self> {
        let pacer = Pacer::new(delay)?;
        let agent = ureq::AgentBuilder::new()
            .user_agent(user_agent.unwrap_or(FAKE_UA))
            .redirects(5)
            .build();

        Ok(Self {
            agent,
            pacer,
            current: None,
        })
    }
}

impl Session for HttpSession {
    fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<()> {
        self.pacer.wait();
        self.current = None;

        log::debug!("GET {}", url);
        let resp = self
            .agent
            .get(url.as_str())
            .timeout(timeout)
            .call()
            .map_err(|e| match Error::from(e) {
                e if e.is_timeout() => Error::Timeout(url.to_string()),
                e => e,
            })?;

        let final_url = Url::parse(resp.get_url())?;
        let charset = resp.charset().to_string();
        let mut body = Vec::new();
        resp.into_reader()
            .take(MAX_BODY_BYTES)
            .read_to_end(&mut body)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                    Error::Timeout(url.to_string())
                }
                _ => Error::IO(e),
            })?;

        self.current = Some((final_url, decode_body(&body, &charset)));
        Ok(())
    }

    fn document(&self) -> Result<HtmlDocument> {
        let (url, html) = self.current.as_ref().ok_or("No page loaded in session")?;
        Ok(HtmlDocument::parse(url.clone(), html))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_delay_range_is_rejected() {
        let delay = (Duration::from_millis(800), Duration::from_millis(300));
        assert!(matches!(HttpSession::open(None, delay), Err(Error::SessionStart(_))));
    }

    #[test]
    fn first_navigation_is_not_delayed() {
        let mut pacer = Pacer::new((Duration::from_secs(5), Duration::from_secs(5))).unwrap();
        let started = std::time::Instant::now();
        pacer.wait();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn http_sessions_do_not_scroll() {
        let mut session = HttpSession::open(None, (Duration::from_millis(0), Duration::from_millis(0))).unwrap();
        assert!(session.scroller().is_none());
        assert!(session.document().is_err());
    }
}
