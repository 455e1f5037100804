//! Headless Chromium session. Runs page scripts, so reader pages that attach
//! images while scrolling can be settled before extraction.

use crate::document::HtmlDocument;
use crate::error::{Error, Result};
use crate::session::{Pacer, ScrollState, Scroller, Session, FAKE_UA};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use url::Url;

const SCROLL_STATE_JS: &str = "({ offset: window.scrollY + window.innerHeight, \
     height: Math.max(document.body ? document.body.scrollHeight : 0, document.documentElement.scrollHeight) })";

/// Status of the main document request. 0 when the browser does not report it.
const RESPONSE_STATUS_JS: &str = "(() => { const nav = performance.getEntriesByType('navigation')[0]; \
     return nav && nav.responseStatus ? nav.responseStatus : 0; })()";

#[derive(Debug, Deserialize)]
struct RawScroll {
    offset: f64,
    height: f64,
}

impl From<RawScroll> for ScrollState {
    fn from(raw: RawScroll) -> Self {
        Self {
            offset: raw.offset.max(0.0).ceil() as u64,
            height: raw.height.max(0.0) as u64,
        }
    }
}

fn browser_error(e: CdpError) -> Error {
    match e {
        CdpError::Timeout => Error::Timeout("browser request".to_string()),
        e => Error::Browser(e.to_string()),
    }
}

/// One browser tab driven from blocking code. The tokio runtime lives as long as the session.
pub struct BrowserSession {
    runtime: Runtime,
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    pacer: Pacer,
    loaded: Option<Url>,
}

impl BrowserSession {
    /// Launches a local Chromium. `delay` works as in [`crate::session::HttpSession::open`].
    pub fn launch(user_agent: Option<&str>, delay: (Duration, Duration)) -> Result<Self> {
        let pacer = Pacer::new(delay)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        let config = BrowserConfig::builder()
            .arg(format!("--user-agent={}", user_agent.unwrap_or(FAKE_UA)))
            .build()
            .map_err(Error::SessionStart)?;

        let (browser, handler, page) = runtime.block_on(async {
            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| Error::SessionStart(e.to_string()))?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        log::warn!("Browser connection closed: {}", e);
                        break;
                    }
                }
            });
            let page = browser.new_page("about:blank").await.map_err(browser_error)?;
            Ok::<_, Error>((browser, handler, page))
        })?;
        log::info!("Browser session started");

        Ok(Self {
            runtime,
            browser,
            handler,
            page,
            pacer,
            loaded: None,
        })
    }

    fn evaluate<T: DeserializeOwned>(&self, expression: &str) -> Result<T> {
        let result = self
            .runtime
            .block_on(self.page.evaluate(expression))
            .map_err(browser_error)?;
        Ok(result.into_value()?)
    }
}

impl Session for BrowserSession {
    fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<()> {
        self.pacer.wait();
        self.loaded = None;

        log::debug!("Browser GET {}", url);
        let page = &self.page;
        self.runtime.block_on(async {
            match tokio::time::timeout(timeout, page.goto(url.as_str())).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(browser_error(e)),
                Err(_) => Err(Error::Timeout(url.to_string())),
            }
        })?;

        let status: u16 = self.evaluate(RESPONSE_STATUS_JS)?;
        if status >= 400 {
            return Err(Error::Status(status, url.to_string()));
        }

        let current = self.runtime.block_on(self.page.url()).map_err(browser_error)?;
        self.loaded = Some(match current {
            Some(current) => Url::parse(&current)?,
            None => url.clone(),
        });
        Ok(())
    }

    fn document(&self) -> Result<HtmlDocument> {
        let url = self.loaded.clone().ok_or("No page loaded in session")?;
        let html = self.runtime.block_on(self.page.content()).map_err(browser_error)?;
        Ok(HtmlDocument::parse(url, &html))
    }

    fn scroller(&mut self) -> Option<&mut dyn Scroller> {
        Some(self)
    }
}

impl Scroller for BrowserSession {
    fn scroll_by(&mut self, distance: u32) -> Result<()> {
        let _: bool = self.evaluate(&format!("window.scrollBy(0, {}); true", distance))?;
        Ok(())
    }

    fn scroll_state(&mut self) -> Result<ScrollState> {
        let raw: RawScroll = self.evaluate(SCROLL_STATE_JS)?;
        Ok(raw.into())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.runtime.block_on(self.browser.close()) {
            log::warn!("Cannot close browser: {}", e);
        }
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{self, ScrollOptions};
    use crate::source::Source;

    #[test]
    fn scroll_state_from_script_values() {
        let raw: RawScroll = serde_json::from_value(serde_json::json!({ "offset": 1719.5, "height": 4200 })).unwrap();
        assert_eq!(ScrollState::from(raw), ScrollState { offset: 1720, height: 4200 });

        let raw: RawScroll = serde_json::from_value(serde_json::json!({ "offset": 900, "height": 900 })).unwrap();
        assert!(ScrollState::from(raw).at_bottom());
    }

    const LAZY_READER: &str = r#"<html><body style="margin:0">
      <div class="reader-area"><img src="/p1.jpg" style="display:block;height:1500px"></div>
      <script>
        let next = 2;
        window.addEventListener('scroll', () => {
          if (next > 4 || window.scrollY + window.innerHeight < document.body.scrollHeight - 10) return;
          const img = document.createElement('img');
          img.src = '/p' + next++ + '.jpg';
          img.style = 'display:block;height:1500px';
          document.querySelector('.reader-area').appendChild(img);
        });
      </script>
    </body></html>"#;

    #[test]
    #[ignore = "needs a local Chromium"]
    fn settles_script_loaded_reader() {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let base = format!("http://{}", server.server_addr());
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                let response = if request.url() == "/chapter-1/" {
                    tiny_http::Response::from_string(LAZY_READER).with_header(
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]).unwrap(),
                    )
                } else {
                    tiny_http::Response::from_string("").with_status_code(tiny_http::StatusCode(404))
                };
                let _ = request.respond(response);
            }
        });

        let config = Source::Westmanga.config().unwrap();
        let scroll = ScrollOptions {
            pause: Duration::from_millis(200),
            ..ScrollOptions::default()
        };
        let mut session = BrowserSession::launch(None, (Duration::from_millis(0), Duration::from_millis(0))).unwrap();
        let chapter = Url::parse(&format!("{}/chapter-1/", base)).unwrap();
        let pages = pages::resolve(&mut session, &config, &chapter, &scroll).unwrap();
        assert_eq!(
            pages.iter().map(|p| p.image_url.clone()).collect::<Vec<_>>(),
            (1..=4).map(|n| format!("{}/p{}.jpg", base, n)).collect::<Vec<_>>()
        );

        let missing = Url::parse(&format!("{}/gone/", base)).unwrap();
        assert!(matches!(
            session.navigate(&missing, Duration::from_secs(30)),
            Err(Error::Status(404, _))
        ));
    }
}
