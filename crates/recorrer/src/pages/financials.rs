//! Financials category screen: table presence checks, export control
//! discovery and document upload through the OS file chooser.

use std::path::PathBuf;

use tracing::info;

use crate::action::Actions;
use crate::flow::{Check, Flow, OptionalOutcome};
use crate::registry::{Query, Registry, Strategy};
use crate::result::Result;
use crate::wait::{Condition, WaitOptions};

/// The category page under the Financials section.
#[derive(Debug)]
pub struct FinancialsCategoryPage {
    locators: Registry,
}

impl FinancialsCategoryPage {
    /// Build the page object.
    pub fn new() -> Result<Self> {
        let mut locators = Registry::new();
        locators.define(
            "financials-nav",
            Strategy::css("nav a.mantine-NavLink-root:has-text(\"Financials\")"),
        )?;
        locators.define(
            "category-link",
            Strategy::css("a.mantine-NavLink-root:has-text(\"Category\")"),
        )?;
        // The table renders as one of several widgets depending on data.
        locators.define("ag-grid", Strategy::css(".ag-root-wrapper"))?;
        locators.define("plain-table", Strategy::css("table"))?;
        locators.define("role-grid", Strategy::css("[role=\"grid\"]"))?;
        locators.define(
            "download-icon",
            Strategy::css("button:has(svg.lucide-download)"),
        )?;
        locators.define(
            "export-text-button",
            Strategy::css("button:has-text(\"Export\")"),
        )?;
        locators.define(
            "upload-files-button",
            Strategy::role("button", "Upload Files"),
        )?;
        locators.define("upload-dialog", Strategy::css("dialog[open]"))?;
        locators.define_child(
            "upload-list",
            "upload-dialog",
            Strategy::css("uc-upload-list"),
        )?;
        Ok(Self { locators })
    }

    fn q(&self, name: &str) -> Result<Query> {
        self.locators.query(name)
    }

    fn probe_options() -> WaitOptions {
        WaitOptions::new().with_timeout(2_000).with_poll_interval(100)
    }

    /// Navigate Financials into the category page.
    pub fn open(&self, actions: &Actions<'_>) -> Result<()> {
        let nav = self.q("financials-nav")?;
        let link = self.q("category-link")?;
        Flow::new("open financials category")
            .require(Check::element(nav.clone(), Condition::Visible))
            .step("expand financials", move |a| a.click(&nav))
            .step("open category", move |a| a.click(&link))
            .run(actions)
    }

    /// Whether any of the known table widgets is currently rendered.
    pub fn table_visible(&self, actions: &Actions<'_>) -> Result<OptionalOutcome> {
        let candidates = [self.q("ag-grid")?, self.q("plain-table")?, self.q("role-grid")?];
        let found = actions
            .waiter()
            .first_matching(&candidates, &Self::probe_options())?;
        Ok(if found.is_some() {
            OptionalOutcome::Found
        } else {
            OptionalOutcome::NotPresent
        })
    }

    /// Whether an export/download control is currently on screen.
    pub fn export_available(&self, actions: &Actions<'_>) -> Result<OptionalOutcome> {
        let candidates = [self.q("download-icon")?, self.q("export-text-button")?];
        let found = actions
            .waiter()
            .first_matching(&candidates, &Self::probe_options())?;
        Ok(if found.is_some() {
            OptionalOutcome::Found
        } else {
            OptionalOutcome::NotPresent
        })
    }

    /// Upload documents through the Upload Files button, which opens the
    /// OS file chooser rather than exposing a file input.
    pub fn upload_documents(&self, actions: &Actions<'_>, files: &[PathBuf]) -> Result<()> {
        let button = self.q("upload-files-button")?;
        let upload_list = self.q("upload-list")?;
        actions.upload_via_chooser(&button, files)?;
        actions
            .waiter()
            .wait_for(&upload_list, &Condition::Visible)?;
        info!(count = files.len(), "documents uploaded");
        Ok(())
    }
}
