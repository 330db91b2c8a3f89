//! Real browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature enabled, [`Browser`] launches Chromium via
//! chromiumoxide and [`BrowserPage`] implements [`crate::driver::PageDriver`]
//! against the live page, so the same registries, waits and flows run
//! unchanged against a real browser. Without the feature, a mock keeps the
//! API compiling; unit tests use [`crate::sim::SimulatedPage`] instead.

use crate::result::Result;

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1440,
            viewport_height: 900,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use std::path::PathBuf;
    use std::sync::Arc;

    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::page::{Page as CdpPage, ScreenshotParams};
    use futures::StreamExt;
    use serde::Deserialize;

    use super::{BrowserConfig, Result};
    use crate::driver::{ElementState, PageDriver, Probe};
    use crate::export::Download;
    use crate::registry::Query;
    use crate::result::Error;

    /// A launched Chromium instance, driven synchronously from test code.
    pub struct Browser {
        config: BrowserConfig,
        runtime: Arc<tokio::runtime::Runtime>,
        inner: CdpBrowser,
        #[allow(dead_code)]
        handle: tokio::task::JoinHandle<()>,
    }

    impl std::fmt::Debug for Browser {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Browser")
                .field("config", &self.config)
                .finish_non_exhaustive()
        }
    }

    impl Browser {
        /// Launch a browser instance.
        pub fn launch(config: BrowserConfig) -> Result<Self> {
            let runtime = Arc::new(tokio::runtime::Runtime::new()?);

            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height);
            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let cdp_config = builder.build().map_err(|e| Error::BrowserLaunch {
                message: e.to_string(),
            })?;

            let (inner, mut handler) = runtime
                .block_on(CdpBrowser::launch(cdp_config))
                .map_err(|e| Error::BrowserLaunch {
                    message: e.to_string(),
                })?;

            let handle = runtime.spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(Self {
                config,
                runtime,
                inner,
                handle,
            })
        }

        /// Open a new page.
        pub fn new_page(&self) -> Result<BrowserPage> {
            let page = self
                .runtime
                .block_on(self.inner.new_page("about:blank"))
                .map_err(|e| Error::Page {
                    message: e.to_string(),
                })?;
            Ok(BrowserPage {
                runtime: Arc::clone(&self.runtime),
                page,
            })
        }

        /// Browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser.
        pub fn close(mut self) -> Result<()> {
            self.runtime
                .block_on(self.inner.close())
                .map_err(|e| Error::BrowserLaunch {
                    message: e.to_string(),
                })?;
            Ok(())
        }
    }

    /// A live page backed by a CDP connection.
    #[derive(Clone)]
    pub struct BrowserPage {
        runtime: Arc<tokio::runtime::Runtime>,
        page: CdpPage,
    }

    impl std::fmt::Debug for BrowserPage {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("BrowserPage").finish_non_exhaustive()
        }
    }

    #[derive(Debug, Deserialize)]
    struct JsState {
        attached: bool,
        visible: bool,
        enabled: bool,
        editable: bool,
        text: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct JsProbe {
        count: usize,
        state: Option<JsState>,
    }

    impl BrowserPage {
        fn eval<T: serde::de::DeserializeOwned>(&self, expr: &str) -> Result<T> {
            let result = self
                .runtime
                .block_on(self.page.evaluate(expr))
                .map_err(|e| Error::Page {
                    message: e.to_string(),
                })?;
            result.into_value().map_err(|e| Error::Page {
                message: e.to_string(),
            })
        }

        // IIFE acting on the first match; the body sees `el`.
        fn eval_on_first(&self, query: &Query, body: &str) -> Result<()> {
            let expr = format!(
                "(() => {{ const el = {}; if (!el) return false; {body}; return true; }})()",
                query.to_js_first()
            );
            let hit: bool = self.eval(&expr)?;
            if hit {
                Ok(())
            } else {
                Err(Error::Interaction {
                    message: format!("no element matches {}", query.selector_text()),
                })
            }
        }

        /// Take a PNG screenshot of the current viewport.
        pub fn screenshot(&self) -> Result<Vec<u8>> {
            self.runtime
                .block_on(self.page.screenshot(ScreenshotParams::builder().build()))
                .map_err(|e| Error::Page {
                    message: e.to_string(),
                })
        }
    }

    impl PageDriver for BrowserPage {
        fn goto(&self, url: &str) -> Result<()> {
            self.runtime
                .block_on(self.page.goto(url))
                .map_err(|e| Error::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        fn current_url(&self) -> String {
            self.runtime
                .block_on(self.page.url())
                .ok()
                .flatten()
                .unwrap_or_else(|| "about:blank".to_string())
        }

        fn probe(&self, query: &Query) -> Result<Probe> {
            let expr = format!(
                "(() => {{ const el = {first}; return {{ \
                   count: {count}, \
                   state: el ? {{ \
                     attached: el.isConnected, \
                     visible: el.getClientRects().length > 0, \
                     enabled: !el.disabled, \
                     editable: el.isContentEditable || (('value' in el) && !el.readOnly && !el.disabled), \
                     text: el.textContent \
                   }} : null }}; }})()",
                first = query.to_js_first(),
                count = query.to_js_count(),
            );
            let js: JsProbe = self.eval(&expr)?;
            Ok(Probe {
                count: js.count,
                first: js.state.map(|s| ElementState {
                    attached: s.attached,
                    visible: s.visible,
                    enabled: s.enabled,
                    editable: s.editable,
                    text: s.text,
                }),
            })
        }

        fn texts(&self, query: &Query) -> Result<Vec<String>> {
            self.eval(&query.to_js_texts())
        }

        fn click(&self, query: &Query) -> Result<()> {
            self.eval_on_first(query, "el.scrollIntoView({block: 'center'}); el.click()")
        }

        fn dblclick(&self, query: &Query) -> Result<()> {
            self.eval_on_first(
                query,
                "el.scrollIntoView({block: 'center'}); \
                 el.dispatchEvent(new MouseEvent('dblclick', {bubbles: true}))",
            )
        }

        fn fill(&self, query: &Query, text: &str) -> Result<()> {
            let value = serde_json::to_string(text)?;
            self.eval_on_first(
                query,
                &format!(
                    "el.focus(); el.value = {value}; \
                     el.dispatchEvent(new Event('input', {{bubbles: true}})); \
                     el.dispatchEvent(new Event('change', {{bubbles: true}}))"
                ),
            )
        }

        fn select_option(&self, query: &Query, option: &str) -> Result<()> {
            let label = serde_json::to_string(option)?;
            self.eval_on_first(
                query,
                &format!(
                    "const opt = Array.from(el.options).find((o) => o.label === {label} || o.textContent.trim() === {label}); \
                     if (!opt) return false; \
                     el.value = opt.value; \
                     el.dispatchEvent(new Event('change', {{bubbles: true}}))"
                ),
            )
        }

        fn press_key(&self, query: &Query, key: &str) -> Result<()> {
            let key = serde_json::to_string(key)?;
            self.eval_on_first(
                query,
                &format!(
                    "el.dispatchEvent(new KeyboardEvent('keydown', {{key: {key}, bubbles: true}})); \
                     el.dispatchEvent(new KeyboardEvent('keyup', {{key: {key}, bubbles: true}}))"
                ),
            )
        }

        fn type_text(&self, query: &Query, text: &str) -> Result<()> {
            let value = serde_json::to_string(text)?;
            self.eval_on_first(
                query,
                &format!(
                    "el.focus(); \
                     for (const ch of {value}) {{ \
                       el.dispatchEvent(new KeyboardEvent('keydown', {{key: ch, bubbles: true}})); \
                       if ('value' in el) el.value += ch; \
                       el.dispatchEvent(new Event('input', {{bubbles: true}})); \
                       el.dispatchEvent(new KeyboardEvent('keyup', {{key: ch, bubbles: true}})); \
                     }}"
                ),
            )
        }

        fn scroll_into_view(&self, query: &Query) -> Result<()> {
            self.eval_on_first(query, "el.scrollIntoView({block: 'center'})")
        }

        // TODO: drive DOM.setFileInputFiles with the resolved node id so
        // scoped queries work; plain CSS via a JS-resolved node is not
        // enough for the CDP command.
        fn set_input_files(&self, _query: &Query, _files: &[PathBuf]) -> Result<()> {
            Err(Error::Page {
                message: "file inputs are not wired up on the CDP backend yet".to_string(),
            })
        }

        // TODO: intercept Page.fileChooserOpened; until then upload flows
        // against a real browser must target the input element directly.
        fn arm_file_chooser(&self, _files: &[PathBuf]) -> Result<()> {
            Err(Error::Page {
                message: "file chooser interception is not wired up on the CDP backend yet"
                    .to_string(),
            })
        }

        fn is_network_idle(&self) -> bool {
            self.eval::<String>("document.readyState")
                .map(|s| s == "complete")
                .unwrap_or(false)
        }

        fn take_download(&self) -> Option<Download> {
            // Downloads need Browser.setDownloadBehavior plus an event
            // listener; not wired up on the CDP backend yet.
            None
        }

        fn storage_snapshot(&self) -> Result<serde_json::Value> {
            self.eval(
                "(() => ({ \
                   cookies: document.cookie, \
                   localStorage: Object.fromEntries(Object.entries(localStorage)) \
                 }))()",
            )
        }
    }
}

// ============================================================================
// Mock implementation (when `browser` feature is NOT enabled)
// ============================================================================

#[cfg(not(feature = "browser"))]
#[allow(clippy::missing_const_for_fn, clippy::unnecessary_wraps)]
mod mock {
    use std::path::PathBuf;

    use super::{BrowserConfig, Result};
    use crate::driver::{PageDriver, Probe};
    use crate::export::Download;
    use crate::registry::Query;
    use crate::result::Error;

    fn feature_disabled() -> Error {
        Error::Page {
            message: "browser feature not enabled; enable 'browser' for real CDP support"
                .to_string(),
        }
    }

    /// Browser instance (mock when `browser` feature is disabled)
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
    }

    impl Browser {
        /// Launch a browser instance (mock)
        pub fn launch(config: BrowserConfig) -> Result<Self> {
            Ok(Self { config })
        }

        /// Open a new page (mock)
        pub fn new_page(&self) -> Result<BrowserPage> {
            Ok(BrowserPage {})
        }

        /// Browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser (mock)
        pub fn close(self) -> Result<()> {
            Ok(())
        }
    }

    /// A browser page (mock when `browser` feature is disabled)
    #[derive(Debug, Clone)]
    pub struct BrowserPage {}

    impl BrowserPage {
        /// Take a screenshot (mock returns empty bytes)
        pub fn screenshot(&self) -> Result<Vec<u8>> {
            Ok(vec![])
        }
    }

    impl PageDriver for BrowserPage {
        fn goto(&self, _url: &str) -> Result<()> {
            Err(feature_disabled())
        }

        fn current_url(&self) -> String {
            "about:blank".to_string()
        }

        fn probe(&self, _query: &Query) -> Result<Probe> {
            Err(feature_disabled())
        }

        fn texts(&self, _query: &Query) -> Result<Vec<String>> {
            Err(feature_disabled())
        }

        fn click(&self, _query: &Query) -> Result<()> {
            Err(feature_disabled())
        }

        fn dblclick(&self, _query: &Query) -> Result<()> {
            Err(feature_disabled())
        }

        fn fill(&self, _query: &Query, _text: &str) -> Result<()> {
            Err(feature_disabled())
        }

        fn select_option(&self, _query: &Query, _option: &str) -> Result<()> {
            Err(feature_disabled())
        }

        fn press_key(&self, _query: &Query, _key: &str) -> Result<()> {
            Err(feature_disabled())
        }

        fn type_text(&self, _query: &Query, _text: &str) -> Result<()> {
            Err(feature_disabled())
        }

        fn scroll_into_view(&self, _query: &Query) -> Result<()> {
            Err(feature_disabled())
        }

        fn set_input_files(&self, _query: &Query, _files: &[PathBuf]) -> Result<()> {
            Err(feature_disabled())
        }

        fn arm_file_chooser(&self, _files: &[PathBuf]) -> Result<()> {
            Err(feature_disabled())
        }

        fn is_network_idle(&self) -> bool {
            true
        }

        fn take_download(&self) -> Option<Download> {
            None
        }

        fn storage_snapshot(&self) -> Result<serde_json::Value> {
            Err(feature_disabled())
        }
    }
}

// Re-export based on feature
#[cfg(feature = "browser")]
pub use cdp::{Browser, BrowserPage};

#[cfg(not(feature = "browser"))]
pub use mock::{Browser, BrowserPage};
