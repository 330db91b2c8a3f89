//! Properties screen: creation modal, list search, type filtering,
//! export and deletion.

use std::path::Path;

use tracing::info;

use crate::action::Actions;
use crate::config::Config;
use crate::export::CsvTable;
use crate::flow::{Check, Flow, OptionalOutcome};
use crate::registry::{ParamSpec, Params, Query, Registry, Strategy};
use crate::result::{Error, Result};
use crate::wait::Condition;

/// The property list and its add-property modal.
#[derive(Debug)]
pub struct PropertiesPage {
    config: Config,
    locators: Registry,
}

impl PropertiesPage {
    /// Build the page object for a configured environment.
    pub fn new(config: Config) -> Result<Self> {
        let mut locators = Registry::new();
        locators.define(
            "properties-nav",
            Strategy::css("nav a.mantine-NavLink-root:has-text(\"Properties\")"),
        )?;
        locators.define(
            "create-button",
            Strategy::css("button:has-text(\"Create Property\")"),
        )?;

        locators.define("add-modal", Strategy::css("section[role=\"dialog\"]"))?;
        locators.define_child("name-input", "add-modal", Strategy::css("input[name=\"name\"]"))?;
        locators.define_child(
            "address-input",
            "add-modal",
            Strategy::css("input[name=\"address\"]"),
        )?;
        locators.define_child("type-input", "add-modal", Strategy::css("input[name=\"type\"]"))?;
        locators.define_child(
            "submit-button",
            "add-modal",
            Strategy::css("button:has-text(\"Add Property\")"),
        )?;
        locators.define_with(
            "address-suggestion",
            Strategy::css("div[role=\"option\"]:has-text(\"{address}\")"),
            vec![ParamSpec::free_text("address")],
        )?;
        locators.define_with(
            "type-option",
            Strategy::css("div[role=\"option\"]:has-text(\"{type}\")"),
            vec![ParamSpec::free_text("type")],
        )?;
        locators.define_with(
            "breadcrumb",
            Strategy::css(".mantine-Breadcrumbs-root:has-text(\"{name}\")"),
            vec![ParamSpec::free_text("name")],
        )?;

        locators.define(
            "search-input",
            Strategy::css("input[placeholder=\"Search...\"]"),
        )?;
        locators.define(
            "first-row-name-cell",
            Strategy::css(
                ".ag-center-cols-container div[role=\"row\"][row-index=\"0\"] div[col-id=\"name\"]",
            ),
        )?;
        locators.define_with(
            "row-by-name",
            Strategy::css(".ag-center-cols-container div[role=\"row\"]:has-text(\"{name}\")"),
            vec![ParamSpec::free_text("name")],
        )?;
        locators.define_child(
            "row-delete-icon",
            "row-by-name",
            Strategy::css("button:has(svg.lucide-trash-2)"),
        )?;
        locators.define(
            "delete-confirm",
            Strategy::css(".mantine-Popover-dropdown button:has-text(\"Delete\")"),
        )?;

        // Filter checkboxes are keyed by the snake_cased type value.
        locators.define_with(
            "filter-checkbox",
            Strategy::css("input[name=\"{kind}\"]"),
            vec![ParamSpec::identifier("kind")],
        )?;
        locators.define(
            "filter-badges",
            Strategy::css(".ag-center-cols-container div[col-id=\"type\"] .mantine-Badge-label"),
        )?;
        locators.define(
            "clear-filters",
            Strategy::css("button:has-text(\"Clear all\")"),
        )?;
        locators.define(
            "export-button",
            Strategy::css(".mantine-ActionIcon-icon .lucide-download"),
        )?;
        Ok(Self { config, locators })
    }

    fn q(&self, name: &str) -> Result<Query> {
        self.locators.query(name)
    }

    /// Navigate to the property list via the left panel.
    pub fn open(&self, actions: &Actions<'_>) -> Result<()> {
        actions.driver().goto(&self.config.dashboard_url)?;
        actions.click(&self.q("properties-nav")?)
    }

    /// Create a property through the add-property modal and verify it
    /// appears back in the list.
    pub fn create(
        &self,
        actions: &Actions<'_>,
        name: &str,
        address: &str,
        property_type: &str,
    ) -> Result<()> {
        let create_button = self.q("create-button")?;
        let modal = self.q("add-modal")?;
        let name_input = self.q("name-input")?;
        let address_input = self.q("address-input")?;
        let type_input = self.q("type-input")?;
        let submit = self.q("submit-button")?;
        let suggestion = self
            .locators
            .resolve("address-suggestion", &Params::one("address", address))?;
        let type_option = self
            .locators
            .resolve("type-option", &Params::one("type", property_type))?;
        let breadcrumb = self
            .locators
            .resolve("breadcrumb", &Params::one("name", name))?;
        let nav_back = self.q("properties-nav")?;
        let row = self
            .locators
            .resolve("row-by-name", &Params::one("name", name))?;

        let name = name.to_string();
        let address = address.to_string();
        let property_type = property_type.to_string();

        Flow::new("create property")
            .require(Check::element(create_button.clone(), Condition::Enabled))
            .step("open modal", move |a| a.click(&create_button))
            .step("wait for modal", {
                let modal = modal.clone();
                move |a: &Actions<'_>| {
                    a.waiter().wait_for(&modal, &Condition::Visible)?;
                    Ok(())
                }
            })
            .step("enter name", move |a| a.fill(&name_input, &name))
            .step("enter address", move |a| a.fill(&address_input, &address))
            .step("pick address suggestion", move |a| a.click(&suggestion))
            .step("enter type", move |a| a.fill(&type_input, &property_type))
            .step("pick type option", move |a| a.click(&type_option))
            .step("submit", move |a| a.click(&submit))
            .step("verify breadcrumb", move |a| {
                a.waiter().wait_for(&breadcrumb, &Condition::Visible)?;
                Ok(())
            })
            .step("back to list", move |a| a.click(&nav_back))
            .ensure(Check::element(row, Condition::Visible))
            .run(actions)?;
        info!("property created");
        Ok(())
    }

    /// Search the list and verify the first row is exactly `name`.
    pub fn search(&self, actions: &Actions<'_>, name: &str) -> Result<()> {
        let search_input = self.q("search-input")?;
        let first_cell = self.q("first-row-name-cell")?;
        let expected = name.to_string();

        Flow::new("search property")
            .step("type query", {
                let expected = expected.clone();
                move |a: &Actions<'_>| a.fill(&search_input, &expected)
            })
            .ensure(Check::predicate(
                format!("first row name cell reads '{expected}'"),
                move |a| {
                    let handle = a.waiter().wait_for(&first_cell, &Condition::Visible)?;
                    let text = handle
                        .state
                        .and_then(|s| s.text)
                        .unwrap_or_default();
                    Ok(text.trim() == expected)
                },
            ))
            .run(actions)
    }

    /// Filter the list by property type.
    ///
    /// When no rows match the filter is cleared without asserting badge
    /// text and `NotPresent` is returned; otherwise the first badge must
    /// read exactly the requested type.
    pub fn filter_by_type(
        &self,
        actions: &Actions<'_>,
        property_type: &str,
    ) -> Result<OptionalOutcome> {
        let normalized = property_type.to_lowercase().replace(' ', "_");
        let checkbox = self
            .locators
            .resolve("filter-checkbox", &Params::one("kind", normalized))?;
        let badges = self.q("filter-badges")?;
        let clear = self.q("clear-filters")?;

        actions.click(&checkbox)?;
        let count = actions.waiter().count(&badges)?;
        if count == 0 {
            info!(filter = property_type, "filter matched no rows, clearing");
            actions.click(&clear)?;
            return Ok(OptionalOutcome::NotPresent);
        }

        let texts = actions.driver().texts(&badges)?;
        let first = texts.first().map(|t| t.trim().to_string()).unwrap_or_default();
        if first != property_type {
            return Err(Error::AssertionFailed {
                message: format!(
                    "first filter badge reads '{first}', expected '{property_type}'"
                ),
            });
        }
        info!(filter = property_type, rows = count, "filter verified");
        actions.click(&clear)?;
        Ok(OptionalOutcome::Found)
    }

    /// Export the current list, save the download under `dir` and parse
    /// it as CSV.
    pub fn export_listing(&self, actions: &Actions<'_>, dir: &Path) -> Result<CsvTable> {
        let export = self.q("export-button")?;
        actions.click(&export)?;

        let waiter = actions.waiter();
        let options = waiter.options().clone();
        let download = waiter.wait_for_download(&options)?;
        if !download.has_allowed_extension() {
            return Err(Error::Export {
                message: format!("unexpected export file name: {}", download.file_name),
            });
        }
        let path = download.save_to(dir)?;
        info!(path = %path.display(), "export saved");
        CsvTable::parse(&download.text()?)
    }

    /// Delete a property by name and verify its row disappears.
    pub fn delete(&self, actions: &Actions<'_>, name: &str) -> Result<()> {
        let row = self
            .locators
            .resolve("row-by-name", &Params::one("name", name))?;
        let delete_icon = self
            .locators
            .resolve("row-delete-icon", &Params::one("name", name))?;
        let confirm = self.q("delete-confirm")?;

        Flow::new("delete property")
            .require(Check::element(row.clone(), Condition::Visible))
            .step("open row delete", move |a| a.click(&delete_icon))
            .step("confirm in popover", move |a| a.click(&confirm))
            .ensure(Check::element(row, Condition::Detached))
            .run(actions)?;
        info!(property = name, "property deleted");
        Ok(())
    }
}
