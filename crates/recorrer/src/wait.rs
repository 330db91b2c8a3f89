//! Bounded wait-and-resolve engine.
//!
//! Every wait polls the driver at a fixed interval up to a deadline and
//! always probes at least once, so a zero timeout still observes the page.
//! Timeouts are typed errors carrying the last observation, never a panic
//! and never a silent `false`.

use std::time::{Duration, Instant};

use regex::Regex;

use crate::driver::{ElementState, PageDriver, Probe};
use crate::export::Download;
use crate::registry::Query;
use crate::result::{Error, Result};

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (150ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 150;

/// Element condition a wait can resolve on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// At least one match present in the DOM
    Attached,
    /// No match present in the DOM
    Detached,
    /// First match is visible
    Visible,
    /// No match, or the first match is not visible
    Hidden,
    /// First match is visible and enabled
    Enabled,
    /// First match is visible but disabled
    Disabled,
    /// First match is visible, enabled and accepts text input
    Editable,
    /// At least `n` matches present
    CountAtLeast(usize),
    /// At most `n` matches present
    CountAtMost(usize),
    /// Exactly `n` matches present
    CountEquals(usize),
}

impl Condition {
    /// Evaluate against a point-in-time probe
    #[must_use]
    pub fn holds(&self, probe: &Probe) -> bool {
        let first = probe.first.as_ref();
        let visible = first.is_some_and(|s| s.attached && s.visible);
        match self {
            Self::Attached => probe.count > 0,
            Self::Detached => probe.count == 0,
            Self::Visible => visible,
            Self::Hidden => !visible,
            Self::Enabled => visible && first.is_some_and(|s| s.enabled),
            Self::Disabled => visible && first.is_some_and(|s| !s.enabled),
            Self::Editable => visible && first.is_some_and(|s| s.enabled && s.editable),
            Self::CountAtLeast(n) => probe.count >= *n,
            Self::CountAtMost(n) => probe.count <= *n,
            Self::CountEquals(n) => probe.count == *n,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attached => write!(f, "attached"),
            Self::Detached => write!(f, "detached"),
            Self::Visible => write!(f, "visible"),
            Self::Hidden => write!(f, "hidden"),
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
            Self::Editable => write!(f, "editable"),
            Self::CountAtLeast(n) => write!(f, "count >= {n}"),
            Self::CountAtMost(n) => write!(f, "count <= {n}"),
            Self::CountEquals(n) => write!(f, "count == {n}"),
        }
    }
}

/// URL patterns for navigation waits
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// URL starts with prefix
    Prefix(String),
    /// URL contains substring
    Contains(String),
    /// URL matches a regular expression
    Regex(Regex),
}

impl UrlPattern {
    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(expected) => url == expected,
            Self::Prefix(prefix) => url.starts_with(prefix.as_str()),
            Self::Contains(fragment) => url.contains(fragment.as_str()),
            Self::Regex(re) => re.is_match(url),
        }
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "exactly '{s}'"),
            Self::Prefix(s) => write!(f, "starting with '{s}'"),
            Self::Contains(s) => write!(f, "containing '{s}'"),
            Self::Regex(re) => write!(f, "matching /{re}/"),
        }
    }
}

/// Options for wait operations
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// A successfully resolved wait: the query, what was observed, and how
/// long resolution took.
#[derive(Debug, Clone)]
pub struct ResolvedHandle {
    /// The query that resolved
    pub query: Query,
    /// Match count at resolution
    pub count: usize,
    /// First match's state at resolution
    pub state: Option<ElementState>,
    /// Time spent polling
    pub elapsed: Duration,
}

/// Polls a [`PageDriver`] until conditions hold or a deadline passes.
pub struct Waiter<'d> {
    driver: &'d dyn PageDriver,
    options: WaitOptions,
}

impl std::fmt::Debug for Waiter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'d> Waiter<'d> {
    /// Create a waiter with default options
    #[must_use]
    pub fn new(driver: &'d dyn PageDriver) -> Self {
        Self {
            driver,
            options: WaitOptions::default(),
        }
    }

    /// Create a waiter with custom options
    #[must_use]
    pub fn with_options(driver: &'d dyn PageDriver, options: WaitOptions) -> Self {
        Self { driver, options }
    }

    /// Default options used when the caller does not pass any
    #[must_use]
    pub fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Wait until `condition` holds for `query`, with the waiter's default
    /// options.
    pub fn wait_for(&self, query: &Query, condition: &Condition) -> Result<ResolvedHandle> {
        self.wait_for_with(query, condition, &self.options.clone())
    }

    /// Wait until `condition` holds for `query`.
    ///
    /// Probes at least once even with a zero timeout. On timeout the error
    /// carries the last observed count and state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the condition never holds, or any
    /// driver error from probing.
    pub fn wait_for_with(
        &self,
        query: &Query,
        condition: &Condition,
        options: &WaitOptions,
    ) -> Result<ResolvedHandle> {
        let start = Instant::now();
        loop {
            let probe = self.driver.probe(query)?;
            if condition.holds(&probe) {
                return Ok(ResolvedHandle {
                    query: query.clone(),
                    count: probe.count,
                    state: probe.first,
                    elapsed: start.elapsed(),
                });
            }
            if start.elapsed() >= options.timeout() {
                return Err(self.timeout_error(query, condition, start.elapsed(), &probe));
            }
            std::thread::sleep(options.poll_interval());
        }
    }

    fn timeout_error(
        &self,
        query: &Query,
        condition: &Condition,
        elapsed: Duration,
        last: &Probe,
    ) -> Error {
        Error::Timeout {
            selector: query.to_string(),
            condition: condition.to_string(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            last_count: last.count,
            last_state: last
                .first
                .as_ref()
                .map_or_else(|| "absent".to_string(), ElementState::summary),
        }
    }

    /// Current match count (single probe, no waiting)
    pub fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.driver.probe(query)?.count)
    }

    /// Resolve whichever of `candidates` becomes visible first.
    ///
    /// The deadline is shared across all candidates, each polled in order
    /// every interval. Returns `Ok(None)` when none appeared: absence of an
    /// optional element is an outcome here, not a failure.
    pub fn first_matching(
        &self,
        candidates: &[Query],
        options: &WaitOptions,
    ) -> Result<Option<Query>> {
        let start = Instant::now();
        loop {
            for candidate in candidates {
                let probe = self.driver.probe(candidate)?;
                if Condition::Visible.holds(&probe) {
                    return Ok(Some(candidate.clone()));
                }
            }
            if start.elapsed() >= options.timeout() {
                return Ok(None);
            }
            std::thread::sleep(options.poll_interval());
        }
    }

    /// Wait for the page URL to match a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the URL never matches.
    pub fn wait_for_url(&self, pattern: &UrlPattern, options: &WaitOptions) -> Result<String> {
        let start = Instant::now();
        let mut url = self.driver.current_url();
        loop {
            if pattern.matches(&url) {
                return Ok(url);
            }
            if start.elapsed() >= options.timeout() {
                break;
            }
            std::thread::sleep(options.poll_interval());
            url = self.driver.current_url();
        }
        Err(Error::Timeout {
            selector: format!("page url (last: '{url}')"),
            condition: format!("url {pattern}"),
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            last_count: 0,
            last_state: "n/a".to_string(),
        })
    }

    /// Poll until the driver reports network idle or the bound elapses.
    /// Best-effort: returns whether idle was reached, never errors.
    #[must_use]
    pub fn wait_network_idle(&self, bound: Duration, poll: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.driver.is_network_idle() {
                return true;
            }
            if start.elapsed() >= bound {
                return false;
            }
            std::thread::sleep(poll);
        }
    }

    /// Wait for a completed download to become available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if no download completes in time.
    pub fn wait_for_download(&self, options: &WaitOptions) -> Result<Download> {
        let start = Instant::now();
        loop {
            if let Some(download) = self.driver.take_download() {
                return Ok(download);
            }
            if start.elapsed() >= options.timeout() {
                return Err(Error::Timeout {
                    selector: "download".to_string(),
                    condition: "completed".to_string(),
                    elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    last_count: 0,
                    last_state: "none".to_string(),
                });
            }
            std::thread::sleep(options.poll_interval());
        }
    }
}
