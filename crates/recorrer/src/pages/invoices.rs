//! Invoices tab of a job: invoice creation, contract statistics, change
//! orders and their export.

use std::path::Path;

use tracing::info;

use crate::action::Actions;
use crate::export::Download;
use crate::flow::{Check, Flow, OptionalOutcome};
use crate::registry::{ParamSpec, Params, Query, Registry, Strategy};
use crate::result::{Error, Result};
use crate::wait::{Condition, UrlPattern, WaitOptions};

/// Contract-level amounts shown above the invoice grid. Values are the raw
/// display strings; absent panels read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceStats {
    /// "Current Contract" amount
    pub current_contract: Option<String>,
    /// "Approved Invoices" amount
    pub approved_invoices: Option<String>,
    /// "Contract Remaining" amount
    pub contract_remaining: Option<String>,
    /// "Pending Invoices" amount
    pub pending_invoices: Option<String>,
}

/// The invoice and change-order screens of one job.
#[derive(Debug)]
pub struct InvoicesPage {
    locators: Registry,
}

impl InvoicesPage {
    /// Build the page object.
    pub fn new() -> Result<Self> {
        let mut locators = Registry::new();
        locators.define("invoice-tab", Strategy::role("tab", "Invoice"))?;
        locators.define(
            "change-orders-tab",
            Strategy::css("[role=\"tab\"]:has-text(\"Change Orders\")"),
        )?;
        locators.define("add-invoice-button", Strategy::role("button", "Invoice"))?;
        locators.define(
            "add-change-order-button",
            Strategy::css("button:has-text(\"Change Order\")"),
        )?;
        locators.define(
            "grid-rows",
            Strategy::css("div[role=\"grid\"] div[role=\"row\"]"),
        )?;
        // The detail form renders either input variant depending on layout.
        locators.define(
            "title-input",
            Strategy::css("input[placeholder=\"Enter title\"]"),
        )?;
        locators.define(
            "title-textarea",
            Strategy::css("textarea[placeholder=\"Enter title\"]"),
        )?;
        locators.define("amount-input", Strategy::css("input[type=\"number\"]"))?;
        locators.define(
            "description-input",
            Strategy::css(
                "input[placeholder=\"Enter description\"], textarea[placeholder=\"Enter description\"]",
            ),
        )?;
        locators.define("file-input", Strategy::css("input[type=\"file\"]"))?;
        locators.define("save-button", Strategy::css("button:has-text(\"Save\")"))?;
        locators.define(
            "confirm-button",
            Strategy::css("button:has-text(\"Confirm\")"),
        )?;
        locators.define(
            "submit-button",
            Strategy::css("button:has-text(\"Submit\")"),
        )?;
        locators.define(
            "export-button",
            Strategy::css("button:has-text(\"Export\"), button:has-text(\"Download\")"),
        )?;
        locators.define("page-body", Strategy::css("body"))?;
        // Stat panels: a label element followed by the amount paragraph.
        locators.define_with(
            "stat-value",
            Strategy::xpath("//*[text()=\"{label}\"]/following-sibling::p"),
            vec![ParamSpec::free_text("label")],
        )?;
        Ok(Self { locators })
    }

    fn q(&self, name: &str) -> Result<Query> {
        self.locators.query(name)
    }

    /// Open the invoices tab of a job directly by URL.
    pub fn open(&self, actions: &Actions<'_>, job_url: &str) -> Result<()> {
        actions.driver().goto(job_url)?;
        let waiter = actions.waiter();
        let options = waiter.options().clone();
        let url = waiter.wait_for_url(&UrlPattern::Contains("tab=invoices".into()), &options)?;
        info!(%url, "invoices tab open");
        Ok(())
    }

    /// Fill the title field, probing both input variants the detail form
    /// can render.
    fn fill_title(&self, actions: &Actions<'_>, title: &str) -> Result<()> {
        let candidates = [self.q("title-input")?, self.q("title-textarea")?];
        let bound = WaitOptions::new().with_timeout(2_000).with_poll_interval(50);
        match actions.waiter().first_matching(&candidates, &bound)? {
            Some(field) => actions.fill(&field, title),
            None => Err(Error::Interaction {
                message: "no title field variant appeared on the invoice detail form".to_string(),
            }),
        }
    }

    /// Click whichever save/confirm/submit button the detail form renders.
    ///
    /// Returns `NotPresent` when none is on screen, so callers decide
    /// whether a missing save action is fatal.
    pub fn save(&self, actions: &Actions<'_>) -> Result<OptionalOutcome> {
        let candidates = [
            self.q("save-button")?,
            self.q("confirm-button")?,
            self.q("submit-button")?,
        ];
        let bound = WaitOptions::new().with_timeout(3_000).with_poll_interval(100);
        match actions.waiter().first_matching(&candidates, &bound)? {
            Some(button) => {
                actions.click(&button)?;
                Ok(OptionalOutcome::Found)
            }
            None => Ok(OptionalOutcome::NotPresent),
        }
    }

    /// Create an invoice through the detail form. The amount is derived by
    /// the application from selected items, so only title, description and
    /// an optional attachment are entered.
    pub fn create_invoice(
        &self,
        actions: &Actions<'_>,
        title: &str,
        description: &str,
        attachment: Option<&Path>,
    ) -> Result<()> {
        let add_button = self.q("add-invoice-button")?;
        let description_input = self.q("description-input")?;
        let file_input = self.q("file-input")?;
        let rows = self.q("grid-rows")?;
        let title = title.to_string();
        let description = description.to_string();
        let attachment = attachment.map(Path::to_path_buf);
        let page = self;

        Flow::new("create invoice")
            .require(Check::element(add_button.clone(), Condition::Visible))
            .step("open detail form", move |a| a.click(&add_button))
            .step("enter title", move |a| page.fill_title(a, &title))
            .step("enter description", move |a| {
                a.fill(&description_input, &description)
            })
            .step("attach image", move |a| match &attachment {
                Some(path) => a.upload_via_input(&file_input, &[path.clone()]),
                None => Ok(()),
            })
            .step("save", move |a| match page.save(a)? {
                OptionalOutcome::Found => Ok(()),
                OptionalOutcome::NotPresent => Err(Error::Interaction {
                    message: "no save button on the invoice detail form".to_string(),
                }),
            })
            .ensure(Check::element(rows, Condition::CountAtLeast(1)))
            .run(actions)?;
        info!("invoice created");
        Ok(())
    }

    /// Close the invoice detail view with Escape and return to the tab.
    pub fn close_details(&self, actions: &Actions<'_>) -> Result<()> {
        actions.press_key(&self.q("page-body")?, "Escape")?;
        actions.click(&self.q("invoice-tab")?)
    }

    /// Current number of rows in the invoice/change-order grid.
    pub fn row_count(&self, actions: &Actions<'_>) -> Result<usize> {
        actions.waiter().count(&self.q("grid-rows")?)
    }

    /// Read the contract statistic panels. Absent panels yield `None`
    /// rather than failing, since not every job shows all four.
    pub fn stats(&self, actions: &Actions<'_>) -> Result<InvoiceStats> {
        let read = |label: &str| -> Result<Option<String>> {
            let query = self
                .locators
                .resolve("stat-value", &Params::one("label", label))?;
            let texts = actions.driver().texts(&query)?;
            Ok(texts.first().map(|t| t.trim().to_string()))
        };
        Ok(InvoiceStats {
            current_contract: read("Current Contract")?,
            approved_invoices: read("Approved Invoices")?,
            contract_remaining: read("Contract Remaining")?,
            pending_invoices: read("Pending Invoices")?,
        })
    }

    /// Switch to the change-orders tab.
    pub fn open_change_orders(&self, actions: &Actions<'_>) -> Result<()> {
        actions.click(&self.q("change-orders-tab")?)
    }

    /// Create a change order with title, amount and description.
    pub fn create_change_order(
        &self,
        actions: &Actions<'_>,
        title: &str,
        amount: &str,
        description: &str,
    ) -> Result<()> {
        let add_button = self.q("add-change-order-button")?;
        let amount_input = self.q("amount-input")?;
        let description_input = self.q("description-input")?;
        let rows = self.q("grid-rows")?;
        let title = title.to_string();
        let amount = amount.to_string();
        let description = description.to_string();
        let page = self;

        Flow::new("create change order")
            .require(Check::element(add_button.clone(), Condition::Visible))
            .step("open form", move |a| a.click(&add_button))
            .step("enter title", move |a| page.fill_title(a, &title))
            .step("enter amount", move |a| a.fill(&amount_input, &amount))
            .step("enter description", move |a| {
                a.fill(&description_input, &description)
            })
            .step("save", move |a| match page.save(a)? {
                OptionalOutcome::Found => Ok(()),
                OptionalOutcome::NotPresent => Err(Error::Interaction {
                    message: "no save button on the change-order form".to_string(),
                }),
            })
            .ensure(Check::element(rows, Condition::CountAtLeast(1)))
            .run(actions)?;
        info!("change order created");
        Ok(())
    }

    /// Export the change-order grid if an export control is present,
    /// saving the download into `dir`.
    pub fn export_change_orders(
        &self,
        actions: &Actions<'_>,
        dir: &Path,
    ) -> Result<OptionalOutcome> {
        let export = self.q("export-button")?;
        let bound = WaitOptions::new().with_timeout(3_000).with_poll_interval(100);
        if actions.waiter().first_matching(&[export.clone()], &bound)?.is_none() {
            info!("no export control on the change-order grid");
            return Ok(OptionalOutcome::NotPresent);
        }
        actions.click(&export)?;
        let waiter = actions.waiter();
        let options = waiter.options().clone();
        let download: Download = waiter.wait_for_download(&options)?;
        if !download.has_allowed_extension() {
            return Err(Error::Export {
                message: format!("unexpected export file name '{}'", download.file_name),
            });
        }
        let path = download.save_to(dir)?;
        info!(path = %path.display(), "change orders exported");
        Ok(OptionalOutcome::Found)
    }
}
