//! Scripted in-memory page: a [`PageDriver`] for driving the whole stack in
//! unit tests without a real browser.
//!
//! Elements are registered against the canonical selector text of the query
//! that should find them. Scoped (composed) queries only match when both the
//! parent scope and the full scoped selector are present — registering a
//! bare child selector never leaks into a scoped lookup.
//!
//! Reaction hooks let tests model the application: "when this button is
//! clicked, make the modal appear".

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::driver::{ElementState, PageDriver, Probe};
use crate::export::Download;
use crate::registry::Query;
use crate::result::{Error, Result};

/// One recorded interaction performed against the simulated page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// Interaction verb ("click", "fill", ...)
    pub verb: String,
    /// Canonical selector text of the target ("" for page-level verbs)
    pub selector: String,
    /// Verb-specific detail (fill text, pressed key, file list, URL)
    pub detail: String,
}

/// Mutable simulated DOM state, exposed to reaction hooks.
#[derive(Debug, Default)]
pub struct SimDom {
    elements: HashMap<String, Vec<ElementState>>,
    url: String,
    network_idle: bool,
    storage: serde_json::Value,
    download: Option<Download>,
    armed_files: Option<Vec<PathBuf>>,
    interactions: Vec<Interaction>,
}

impl SimDom {
    /// Register elements matched by `selector` (canonical selector text)
    pub fn register_selector(&mut self, selector: &str, states: Vec<ElementState>) {
        let _ = self.elements.insert(selector.to_string(), states);
    }

    /// Remove all elements matched by `selector`
    pub fn clear_selector(&mut self, selector: &str) {
        let _ = self.elements.remove(selector);
    }

    /// Set the current page URL
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Toggle the network-idle signal
    pub fn set_network_idle(&mut self, idle: bool) {
        self.network_idle = idle;
    }

    /// Queue a completed download
    pub fn set_download(&mut self, download: Download) {
        self.download = Some(download);
    }

    /// Set the opaque storage snapshot returned by the driver
    pub fn set_storage(&mut self, storage: serde_json::Value) {
        self.storage = storage;
    }

    fn count_of(&self, query: &Query) -> usize {
        if let Some(parent) = query.parent_scope() {
            if self.count_of(&parent) == 0 {
                return 0;
            }
        }
        self.elements
            .get(&query.selector_text())
            .map_or(0, Vec::len)
    }

    fn states_of(&self, query: &Query) -> Option<&Vec<ElementState>> {
        if self.count_of(query) == 0 {
            return None;
        }
        self.elements.get(&query.selector_text())
    }
}

type Hook = Box<dyn Fn(&mut SimDom) + Send + Sync>;

struct Inner {
    state: Mutex<SimDom>,
    hooks: Mutex<HashMap<(String, String), Vec<Hook>>>,
}

/// Clonable, thread-safe scripted page driver.
#[derive(Clone)]
pub struct SimulatedPage {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SimulatedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock().expect("sim lock");
        f.debug_struct("SimulatedPage")
            .field("url", &state.url)
            .field("elements", &state.elements.len())
            .field("interactions", &state.interactions.len())
            .finish()
    }
}

impl Default for SimulatedPage {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPage {
    /// Create an empty simulated page (network idle, blank URL)
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SimDom {
                    network_idle: true,
                    url: "about:blank".to_string(),
                    storage: serde_json::Value::Null,
                    ..SimDom::default()
                }),
                hooks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register elements matched by `query`
    pub fn register(&self, query: &Query, states: Vec<ElementState>) {
        self.mutate(|dom| dom.register_selector(&query.selector_text(), states));
    }

    /// Register a single element matched by `query`
    pub fn register_one(&self, query: &Query, state: ElementState) {
        self.register(query, vec![state]);
    }

    /// Remove all elements matched by `query`
    pub fn clear(&self, query: &Query) {
        self.mutate(|dom| dom.clear_selector(&query.selector_text()));
    }

    /// Apply an arbitrary mutation to the simulated DOM
    pub fn mutate(&self, f: impl FnOnce(&mut SimDom)) {
        let mut state = self.inner.state.lock().expect("sim lock");
        f(&mut state);
    }

    /// Install a reaction hook: after `verb` is performed on `query`, the
    /// hook mutates the DOM (models application re-renders).
    pub fn on(&self, verb: &str, query: &Query, hook: impl Fn(&mut SimDom) + Send + Sync + 'static) {
        let mut hooks = self.inner.hooks.lock().expect("sim lock");
        hooks
            .entry((verb.to_string(), query.selector_text()))
            .or_default()
            .push(Box::new(hook));
    }

    /// All interactions recorded so far, in order
    #[must_use]
    pub fn interactions(&self) -> Vec<Interaction> {
        self.inner.state.lock().expect("sim lock").interactions.clone()
    }

    /// True when `verb` was performed on `query` at least once
    #[must_use]
    pub fn saw(&self, verb: &str, query: &Query) -> bool {
        let selector = query.selector_text();
        self.interactions()
            .iter()
            .any(|i| i.verb == verb && i.selector == selector)
    }

    fn record(&self, verb: &str, selector: &str, detail: &str) {
        let mut state = self.inner.state.lock().expect("sim lock");
        state.interactions.push(Interaction {
            verb: verb.to_string(),
            selector: selector.to_string(),
            detail: detail.to_string(),
        });
    }

    fn run_hooks(&self, verb: &str, selector: &str) {
        let hooks = self.inner.hooks.lock().expect("sim lock");
        if let Some(list) = hooks.get(&(verb.to_string(), selector.to_string())) {
            let mut state = self.inner.state.lock().expect("sim lock");
            for hook in list {
                hook(&mut state);
            }
        }
    }

    fn require_match(&self, verb: &str, query: &Query) -> Result<()> {
        let state = self.inner.state.lock().expect("sim lock");
        if state.count_of(query) == 0 {
            return Err(Error::Interaction {
                message: format!("{verb}: no element matches {}", query.selector_text()),
            });
        }
        Ok(())
    }

    fn interact(&self, verb: &str, query: &Query, detail: &str) -> Result<()> {
        self.require_match(verb, query)?;
        self.record(verb, &query.selector_text(), detail);
        self.run_hooks(verb, &query.selector_text());
        Ok(())
    }
}

impl PageDriver for SimulatedPage {
    fn goto(&self, url: &str) -> Result<()> {
        self.mutate(|dom| dom.set_url(url));
        self.record("goto", "", url);
        Ok(())
    }

    fn current_url(&self) -> String {
        self.inner.state.lock().expect("sim lock").url.clone()
    }

    fn probe(&self, query: &Query) -> Result<Probe> {
        let state = self.inner.state.lock().expect("sim lock");
        let count = state.count_of(query);
        let first = state
            .states_of(query)
            .and_then(|states| states.first().cloned());
        Ok(Probe { count, first })
    }

    fn texts(&self, query: &Query) -> Result<Vec<String>> {
        let state = self.inner.state.lock().expect("sim lock");
        Ok(state
            .states_of(query)
            .map(|states| {
                states
                    .iter()
                    .map(|s| s.text.clone().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn click(&self, query: &Query) -> Result<()> {
        self.require_match("click", query)?;
        // A one-shot armed chooser fires with the click that opens it.
        let armed = {
            let mut state = self.inner.state.lock().expect("sim lock");
            state.armed_files.take()
        };
        self.record("click", &query.selector_text(), "");
        if let Some(files) = armed {
            let detail = files
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(",");
            self.record("chooser-upload", &query.selector_text(), &detail);
        }
        self.run_hooks("click", &query.selector_text());
        Ok(())
    }

    fn dblclick(&self, query: &Query) -> Result<()> {
        self.interact("dblclick", query, "")
    }

    fn fill(&self, query: &Query, text: &str) -> Result<()> {
        self.require_match("fill", query)?;
        {
            let mut state = self.inner.state.lock().expect("sim lock");
            let key = query.selector_text();
            if let Some(states) = state.elements.get_mut(&key) {
                if let Some(first) = states.first_mut() {
                    first.text = Some(text.to_string());
                }
            }
        }
        self.record("fill", &query.selector_text(), text);
        self.run_hooks("fill", &query.selector_text());
        Ok(())
    }

    fn select_option(&self, query: &Query, option: &str) -> Result<()> {
        self.interact("select-option", query, option)
    }

    fn press_key(&self, query: &Query, key: &str) -> Result<()> {
        self.interact("press-key", query, key)
    }

    fn type_text(&self, query: &Query, text: &str) -> Result<()> {
        self.interact("type-text", query, text)
    }

    fn scroll_into_view(&self, query: &Query) -> Result<()> {
        self.interact("scroll", query, "")
    }

    fn set_input_files(&self, query: &Query, files: &[PathBuf]) -> Result<()> {
        let detail = files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.interact("set-input-files", query, &detail)
    }

    fn arm_file_chooser(&self, files: &[PathBuf]) -> Result<()> {
        self.mutate(|dom| dom.armed_files = Some(files.to_vec()));
        Ok(())
    }

    fn is_network_idle(&self) -> bool {
        self.inner.state.lock().expect("sim lock").network_idle
    }

    fn take_download(&self) -> Option<Download> {
        self.inner.state.lock().expect("sim lock").download.take()
    }

    fn storage_snapshot(&self) -> Result<serde_json::Value> {
        Ok(self.inner.state.lock().expect("sim lock").storage.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn button() -> Query {
        Query::css("button:has-text(\"Create Project\")")
    }

    #[test]
    fn test_probe_unregistered_is_empty() {
        let page = SimulatedPage::new();
        let probe = page.probe(&button()).unwrap();
        assert_eq!(probe, Probe::empty());
    }

    #[test]
    fn test_register_and_probe() {
        let page = SimulatedPage::new();
        page.register_one(&button(), ElementState::interactive());
        let probe = page.probe(&button()).unwrap();
        assert_eq!(probe.count, 1);
        assert!(probe.first.unwrap().visible);
    }

    #[test]
    fn test_click_unmatched_fails() {
        let page = SimulatedPage::new();
        let err = page.click(&button()).unwrap_err();
        assert!(matches!(err, Error::Interaction { .. }));
    }

    #[test]
    fn test_click_recorded() {
        let page = SimulatedPage::new();
        page.register_one(&button(), ElementState::interactive());
        page.click(&button()).unwrap();
        assert!(page.saw("click", &button()));
    }

    #[test]
    fn test_fill_updates_text() {
        let page = SimulatedPage::new();
        let input = Query::css("input[name=\"email\"]");
        page.register_one(&input, ElementState::editable());
        page.fill(&input, "qa@example.com").unwrap();
        let probe = page.probe(&input).unwrap();
        assert_eq!(probe.first.unwrap().text.unwrap(), "qa@example.com");
    }

    #[test]
    fn test_click_hook_models_rerender() {
        let page = SimulatedPage::new();
        let modal = Query::css("section[role=\"dialog\"]");
        page.register_one(&button(), ElementState::interactive());
        let modal_selector = modal.selector_text();
        page.on("click", &button(), move |dom| {
            dom.register_selector(&modal_selector, vec![ElementState::interactive()]);
        });
        assert_eq!(page.probe(&modal).unwrap().count, 0);
        page.click(&button()).unwrap();
        assert_eq!(page.probe(&modal).unwrap().count, 1);
    }

    #[test]
    fn test_chooser_consumed_by_next_click_only_when_armed_first() {
        let page = SimulatedPage::new();
        let trigger = Query::css("button:has-text(\"From device\")");
        page.register_one(&trigger, ElementState::interactive());

        // Click before arming: nothing uploaded.
        page.click(&trigger).unwrap();
        assert!(!page.saw("chooser-upload", &trigger));

        page.arm_file_chooser(&[PathBuf::from("files/property_data.csv")])
            .unwrap();
        page.click(&trigger).unwrap();
        assert!(page.saw("chooser-upload", &trigger));
    }

    mod scoping_tests {
        use super::*;
        use crate::registry::{Registry, Strategy};

        // Two "Cancel" buttons exist: one inside the reset modal, one
        // elsewhere. The scoped query must not match the outside one.
        #[test]
        fn test_scoped_lookup_does_not_leak() {
            let mut registry = Registry::new();
            registry
                .define("reset-modal", Strategy::css("section[role=\"dialog\"]"))
                .unwrap();
            registry
                .define_child(
                    "modal-cancel",
                    "reset-modal",
                    Strategy::css("button:has-text(\"Cancel\")"),
                )
                .unwrap();
            let scoped = registry.query("modal-cancel").unwrap();
            let bare = Query::css("button:has-text(\"Cancel\")");

            let page = SimulatedPage::new();
            // Outside-the-modal cancel button exists.
            page.register_one(&bare, ElementState::interactive());
            // Modal not open yet: scoped query matches nothing.
            assert_eq!(page.probe(&scoped).unwrap().count, 0);

            // Modal opens and contains its own cancel button.
            page.register_one(
                &registry.query("reset-modal").unwrap(),
                ElementState::interactive(),
            );
            page.register_one(&scoped, ElementState::interactive());
            assert_eq!(page.probe(&scoped).unwrap().count, 1);

            // Modal closes: scoped query goes back to zero even though both
            // child registrations are still present.
            page.clear(&registry.query("reset-modal").unwrap());
            assert_eq!(page.probe(&scoped).unwrap().count, 0);
            assert_eq!(page.probe(&bare).unwrap().count, 1);
        }
    }

    #[test]
    fn test_download_is_consumed_once() {
        let page = SimulatedPage::new();
        page.mutate(|dom| dom.set_download(Download::new("export.csv", b"A,B\n1,2".to_vec())));
        assert!(page.take_download().is_some());
        assert!(page.take_download().is_none());
    }

    #[test]
    fn test_storage_snapshot_round_trip() {
        let page = SimulatedPage::new();
        let snapshot = serde_json::json!({"cookies": [{"name": "sid"}]});
        page.mutate(|dom| dom.set_storage(snapshot.clone()));
        assert_eq!(page.storage_snapshot().unwrap(), snapshot);
    }
}
