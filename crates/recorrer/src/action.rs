//! Action primitives: interactions gated on actionability and followed by
//! an explicit settle step.
//!
//! Every primitive waits for its target to reach the right state first
//! (clicks need enabled, fills need editable), performs the interaction,
//! then lets the page settle. Settling is bounded best-effort: a page that
//! never goes network-idle delays the next action, it does not fail it.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::driver::PageDriver;
use crate::registry::Query;
use crate::result::Result;
use crate::wait::{Condition, WaitOptions, Waiter};

/// How an action lets the page settle after interacting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Poll for network idle up to a bound, then pause briefly for
    /// re-render. The fallback delay applies whether or not idle was
    /// reached.
    NetworkIdle {
        /// Maximum time to poll for idle, in milliseconds
        bound_ms: u64,
        /// Post-idle render pause, in milliseconds
        fallback_delay_ms: u64,
    },
    /// Fixed pause after every action
    FixedDelay {
        /// Pause in milliseconds
        ms: u64,
    },
    /// No settling (unit tests)
    None,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self::NetworkIdle {
            bound_ms: 5_000,
            fallback_delay_ms: 250,
        }
    }
}

/// Actionability-gated interactions against a single page.
pub struct Actions<'d> {
    driver: &'d dyn PageDriver,
    options: WaitOptions,
    settle: SettlePolicy,
}

impl std::fmt::Debug for Actions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actions")
            .field("options", &self.options)
            .field("settle", &self.settle)
            .finish_non_exhaustive()
    }
}

impl<'d> Actions<'d> {
    /// Create actions with default wait options and settle policy
    #[must_use]
    pub fn new(driver: &'d dyn PageDriver) -> Self {
        Self {
            driver,
            options: WaitOptions::default(),
            settle: SettlePolicy::default(),
        }
    }

    /// Override the wait options used for actionability gating
    #[must_use]
    pub fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the settle policy
    #[must_use]
    pub fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// The underlying driver
    #[must_use]
    pub fn driver(&self) -> &'d dyn PageDriver {
        self.driver
    }

    /// The wait options used for actionability gating
    #[must_use]
    pub fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// A waiter sharing this action set's options
    #[must_use]
    pub fn waiter(&self) -> Waiter<'d> {
        Waiter::with_options(self.driver, self.options.clone())
    }

    fn settle(&self) {
        match &self.settle {
            SettlePolicy::NetworkIdle {
                bound_ms,
                fallback_delay_ms,
            } => {
                let idle = self.waiter().wait_network_idle(
                    Duration::from_millis(*bound_ms),
                    Duration::from_millis(50),
                );
                if !idle {
                    debug!(bound_ms, "network did not go idle within settle bound");
                }
                std::thread::sleep(Duration::from_millis(*fallback_delay_ms));
            }
            SettlePolicy::FixedDelay { ms } => {
                std::thread::sleep(Duration::from_millis(*ms));
            }
            SettlePolicy::None => {}
        }
    }

    fn gate(&self, query: &Query, condition: &Condition) -> Result<()> {
        self.waiter()
            .wait_for_with(query, condition, &self.options)?;
        Ok(())
    }

    /// Click once the target is visible and enabled
    pub fn click(&self, query: &Query) -> Result<()> {
        debug!(target = %query, "click");
        self.gate(query, &Condition::Enabled)?;
        self.driver.click(query)?;
        self.settle();
        Ok(())
    }

    /// Double-click once the target is visible and enabled
    pub fn dblclick(&self, query: &Query) -> Result<()> {
        debug!(target = %query, "dblclick");
        self.gate(query, &Condition::Enabled)?;
        self.driver.dblclick(query)?;
        self.settle();
        Ok(())
    }

    /// Replace the target's value once it is editable
    pub fn fill(&self, query: &Query, text: &str) -> Result<()> {
        debug!(target = %query, "fill");
        self.gate(query, &Condition::Editable)?;
        self.driver.fill(query, text)?;
        self.settle();
        Ok(())
    }

    /// Select a native `<select>` option by visible label
    pub fn select_option(&self, query: &Query, option: &str) -> Result<()> {
        debug!(target = %query, option, "select option");
        self.gate(query, &Condition::Enabled)?;
        self.driver.select_option(query, option)?;
        self.settle();
        Ok(())
    }

    /// Open a custom dropdown via its trigger, then click the option.
    /// Covers the app's non-native listbox widgets.
    pub fn pick_from_dropdown(&self, trigger: &Query, option: &Query) -> Result<()> {
        debug!(trigger = %trigger, option = %option, "pick from dropdown");
        self.gate(trigger, &Condition::Enabled)?;
        self.driver.click(trigger)?;
        self.gate(option, &Condition::Visible)?;
        self.driver.click(option)?;
        self.settle();
        Ok(())
    }

    /// Press a key on the target once it is visible
    pub fn press_key(&self, query: &Query, key: &str) -> Result<()> {
        debug!(target = %query, key, "press key");
        self.gate(query, &Condition::Visible)?;
        self.driver.press_key(query, key)?;
        self.settle();
        Ok(())
    }

    /// Scroll the target into view once it is attached (it may be off-screen
    /// and therefore not yet visible)
    pub fn scroll_into_view(&self, query: &Query) -> Result<()> {
        debug!(target = %query, "scroll into view");
        self.gate(query, &Condition::Attached)?;
        self.driver.scroll_into_view(query)?;
        Ok(())
    }

    /// Set files directly on a file input. Gated on attached, not visible:
    /// upload inputs are routinely hidden behind styled buttons.
    pub fn upload_via_input(&self, query: &Query, files: &[PathBuf]) -> Result<()> {
        debug!(target = %query, count = files.len(), "upload via input");
        self.gate(query, &Condition::Attached)?;
        self.driver.set_input_files(query, files)?;
        self.settle();
        Ok(())
    }

    /// Upload through a native file-chooser dialog.
    ///
    /// The chooser interception is armed before the trigger is clicked; the
    /// chooser event is one-shot and fires with that click, so arming after
    /// would hang.
    pub fn upload_via_chooser(&self, trigger: &Query, files: &[PathBuf]) -> Result<()> {
        debug!(trigger = %trigger, count = files.len(), "upload via chooser");
        self.gate(trigger, &Condition::Enabled)?;
        self.driver.arm_file_chooser(files)?;
        self.driver.click(trigger)?;
        self.settle();
        Ok(())
    }

    /// Edit an in-grid cell: double-click to enter edit mode, find whichever
    /// editor variant the grid mounted, write the value, commit with Enter.
    ///
    /// Grid cells mount either an input or a textarea depending on column
    /// type; `editors` lists the candidates in preference order. When no
    /// editor appears within the editor bound, keystrokes are typed straight
    /// at the cell, which grids also accept.
    pub fn edit_cell(&self, cell: &Query, editors: &[Query], value: &str) -> Result<()> {
        debug!(cell = %cell, "edit cell");
        self.gate(cell, &Condition::Visible)?;
        self.driver.scroll_into_view(cell)?;
        self.driver.dblclick(cell)?;

        let editor_bound = WaitOptions::new()
            .with_timeout(2_000)
            .with_poll_interval(50);
        let editor = self.waiter().first_matching(editors, &editor_bound)?;
        match editor {
            Some(editor) => {
                self.driver.fill(&editor, value)?;
                self.driver.press_key(&editor, "Enter")?;
            }
            None => {
                self.driver.type_text(cell, value)?;
                self.driver.press_key(cell, "Enter")?;
            }
        }
        self.settle();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::ElementState;
    use crate::sim::SimulatedPage;

    fn actions(page: &SimulatedPage) -> Actions<'_> {
        Actions::new(page)
            .with_options(WaitOptions::new().with_timeout(200).with_poll_interval(10))
            .with_settle(SettlePolicy::None)
    }

    #[test]
    fn test_click_waits_for_enabled() {
        let page = SimulatedPage::new();
        let q = Query::css("#save");
        page.register_one(&q, ElementState::disabled());
        let err = actions(&page).click(&q).unwrap_err();
        assert!(err.is_timeout());

        page.register_one(&q, ElementState::interactive());
        actions(&page).click(&q).unwrap();
        assert!(page.saw("click", &q));
    }

    #[test]
    fn test_fill_requires_editable() {
        let page = SimulatedPage::new();
        let q = Query::css("input[name=\"email\"]");
        page.register_one(&q, ElementState::interactive());
        assert!(actions(&page).fill(&q, "x").unwrap_err().is_timeout());

        page.register_one(&q, ElementState::editable());
        actions(&page).fill(&q, "qa@example.com").unwrap();
    }

    #[test]
    fn test_pick_from_dropdown_clicks_trigger_then_option() {
        let page = SimulatedPage::new();
        let trigger = Query::css("[data-testid=\"status-dropdown\"]");
        let option = Query::css("li:has-text(\"Active\")");
        page.register_one(&trigger, ElementState::interactive());
        let option_selector = option.selector_text();
        page.on("click", &trigger, move |dom| {
            dom.register_selector(&option_selector, vec![ElementState::interactive()]);
        });
        actions(&page).pick_from_dropdown(&trigger, &option).unwrap();
        assert!(page.saw("click", &option));
    }

    #[test]
    fn test_upload_via_input_accepts_hidden_input() {
        let page = SimulatedPage::new();
        let input = Query::css("input[type=\"file\"]");
        page.register_one(&input, ElementState::hidden());
        actions(&page)
            .upload_via_input(&input, &[PathBuf::from("files/data.csv")])
            .unwrap();
        assert!(page.saw("set-input-files", &input));
    }

    #[test]
    fn test_upload_via_chooser_arms_before_click() {
        let page = SimulatedPage::new();
        let trigger = Query::css("button:has-text(\"From device\")");
        page.register_one(&trigger, ElementState::interactive());
        actions(&page)
            .upload_via_chooser(&trigger, &[PathBuf::from("files/data.csv")])
            .unwrap();
        // The sim only records a chooser upload when the chooser was armed
        // at click time.
        assert!(page.saw("chooser-upload", &trigger));
    }

    mod edit_cell_tests {
        use super::*;

        #[test]
        fn test_edit_cell_uses_mounted_editor() {
            let page = SimulatedPage::new();
            let cell = Query::css("[row-id=\"3\"] [col-id=\"bid\"]");
            let input = Query::css("input.grid-editor");
            let textarea = Query::css("textarea.grid-editor");
            page.register_one(&cell, ElementState::interactive());
            let textarea_selector = textarea.selector_text();
            page.on("dblclick", &cell, move |dom| {
                dom.register_selector(&textarea_selector, vec![ElementState::editable()]);
            });

            actions(&page)
                .edit_cell(&cell, &[input, textarea.clone()], "1500")
                .unwrap();
            assert!(page.saw("fill", &textarea));
            assert!(page.saw("press-key", &textarea));
        }

        #[test]
        fn test_edit_cell_falls_back_to_typing() {
            let page = SimulatedPage::new();
            let cell = Query::css("[row-id=\"3\"] [col-id=\"bid\"]");
            page.register_one(&cell, ElementState::interactive());

            actions(&page)
                .edit_cell(&cell, &[Query::css("input.grid-editor")], "1500")
                .unwrap();
            assert!(page.saw("type-text", &cell));
            assert!(page.saw("press-key", &cell));
        }
    }

    // A side effect observed right after an action returns is still there
    // one poll interval later.
    #[test]
    fn test_side_effect_stable_after_action_returns() {
        let page = SimulatedPage::new();
        let submit = Query::css("button:has-text(\"Add Property\")");
        let row = Query::css("div[role=\"row\"]:has-text(\"Acme Lofts\")");
        page.register_one(&submit, ElementState::interactive());
        let row_selector = row.selector_text();
        page.on("click", &submit, move |dom| {
            dom.register_selector(&row_selector, vec![ElementState::interactive()]);
        });

        let acts = actions(&page);
        acts.click(&submit).unwrap();
        let waiter = acts.waiter();
        assert_eq!(waiter.count(&row).unwrap(), 1);
        std::thread::sleep(acts.options().poll_interval());
        assert_eq!(waiter.count(&row).unwrap(), 1);
    }

    #[test]
    fn test_fixed_delay_settle_pauses() {
        let page = SimulatedPage::new();
        let q = Query::css("#save");
        page.register_one(&q, ElementState::interactive());
        let acts = Actions::new(&page)
            .with_options(WaitOptions::new().with_timeout(100).with_poll_interval(10))
            .with_settle(SettlePolicy::FixedDelay { ms: 30 });
        let start = std::time::Instant::now();
        acts.click(&q).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_settle_never_fails_when_network_stays_busy() {
        let page = SimulatedPage::new();
        page.mutate(|dom| dom.set_network_idle(false));
        let q = Query::css("#save");
        page.register_one(&q, ElementState::interactive());
        let acts = Actions::new(&page)
            .with_options(WaitOptions::new().with_timeout(100).with_poll_interval(10))
            .with_settle(SettlePolicy::NetworkIdle {
                bound_ms: 50,
                fallback_delay_ms: 10,
            });
        acts.click(&q).unwrap();
    }
}
