//! Abstract page-driver seam to the browser automation engine.
//!
//! The engine itself (process control, DOM query execution, network
//! interception) is an external capability: everything above this trait is
//! engine-agnostic, and a fake implementation ([`crate::sim::SimulatedPage`])
//! drives the whole stack in unit tests without a real browser.
//!
//! Drivers are passed explicitly into every layer — there is no ambient or
//! global page handle — so parallel isolated sessions stay isolated.

use std::path::PathBuf;

use crate::export::Download;
use crate::registry::Query;
use crate::result::Result;

/// Point-in-time state of the first element matching a query.
///
/// Never assume this is stable across actions: the DOM may re-render
/// between steps, so consumers re-probe before acting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementState {
    /// Present in the DOM
    pub attached: bool,
    /// Visible (rendered, non-zero box, not display:none)
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Accepts text input
    pub editable: bool,
    /// Current text content
    pub text: Option<String>,
}

impl ElementState {
    /// A visible, enabled element (buttons, links, tabs)
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            attached: true,
            visible: true,
            enabled: true,
            editable: false,
            text: None,
        }
    }

    /// A visible, enabled, editable element (inputs, textareas)
    #[must_use]
    pub fn editable() -> Self {
        Self {
            editable: true,
            ..Self::interactive()
        }
    }

    /// An attached but not visible element (hidden file inputs, collapsed
    /// panels)
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            attached: true,
            ..Self::default()
        }
    }

    /// A visible but disabled element
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::interactive()
        }
    }

    /// Attach text content (builder style)
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Short human-readable summary for timeout diagnostics
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.attached {
            return "detached".to_string();
        }
        let mut parts = vec![if self.visible { "visible" } else { "hidden" }];
        parts.push(if self.enabled { "enabled" } else { "disabled" });
        if self.editable {
            parts.push("editable");
        }
        parts.join("+")
    }
}

/// Result of probing a query against the live DOM: current match count and
/// the state of the first match, observed in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Probe {
    /// Number of elements currently matching
    pub count: usize,
    /// State of the first match, `None` when count is zero
    pub first: Option<ElementState>,
}

impl Probe {
    /// Probe for a query with no matches
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Probe with `count` matches all in state `first`
    #[must_use]
    pub fn of(count: usize, first: ElementState) -> Self {
        Self {
            count,
            first: Some(first),
        }
    }
}

/// The external automation-engine capability the core depends on.
///
/// Implementations execute concrete queries against a live (or simulated)
/// DOM and perform native interactions. All methods are point-in-time:
/// nothing here waits — waiting belongs to [`crate::wait::Waiter`].
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL and wait for the engine's load event
    fn goto(&self, url: &str) -> Result<()>;

    /// Current page URL
    fn current_url(&self) -> String;

    /// Count matches and observe the first match's state in one pass
    fn probe(&self, query: &Query) -> Result<Probe>;

    /// Text content of every current match, in DOM order
    fn texts(&self, query: &Query) -> Result<Vec<String>>;

    /// Click the first match
    fn click(&self, query: &Query) -> Result<()>;

    /// Double-click the first match
    fn dblclick(&self, query: &Query) -> Result<()>;

    /// Replace the value of the first match
    fn fill(&self, query: &Query, text: &str) -> Result<()>;

    /// Select an option of a native select element by visible label
    fn select_option(&self, query: &Query, option: &str) -> Result<()>;

    /// Press a single key (e.g. "Enter", "Escape") on the first match
    fn press_key(&self, query: &Query, key: &str) -> Result<()>;

    /// Type text as individual keystrokes into the first match
    fn type_text(&self, query: &Query, text: &str) -> Result<()>;

    /// Scroll the first match into view
    fn scroll_into_view(&self, query: &Query) -> Result<()>;

    /// Set files on a native `<input type="file">`
    fn set_input_files(&self, query: &Query, files: &[PathBuf]) -> Result<()>;

    /// Arm a one-shot file-chooser interception with the given files.
    ///
    /// Must be called BEFORE the click that opens the chooser: the chooser
    /// event is one-shot and fires synchronously with that click.
    fn arm_file_chooser(&self, files: &[PathBuf]) -> Result<()>;

    /// True when no network requests have been in flight recently
    fn is_network_idle(&self) -> bool;

    /// Take the most recent completed download, if any (consumes it)
    fn take_download(&self) -> Option<Download>;

    /// Opaque serialized storage snapshot (cookies + local storage).
    /// The core never parses this; it is persisted and reloaded as-is.
    fn storage_snapshot(&self) -> Result<serde_json::Value>;
}
