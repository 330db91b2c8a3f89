//! Left navigation panel: label listing and section collapse/expand.

use tracing::debug;

use crate::action::Actions;
use crate::flow::{Check, Flow};
use crate::registry::{Params, Query, Registry, Strategy};
use crate::result::Result;
use crate::wait::Condition;

/// The collapsible left navigation panel.
#[derive(Debug)]
pub struct NavPanel {
    locators: Registry,
}

impl NavPanel {
    /// Build the panel's locator catalog.
    pub fn new() -> Result<Self> {
        let mut locators = Registry::new();
        locators.define(
            "nav-labels",
            Strategy::css("nav a.mantine-NavLink-root span.mantine-NavLink-label"),
        )?;
        locators.define_with(
            "section",
            Strategy::css("nav a.mantine-NavLink-root:has-text(\"{label}\")"),
            vec![crate::registry::ParamSpec::free_text("label")],
        )?;
        // Sub-options live in the collapse container under their section.
        locators.define_child(
            "section-suboptions",
            "section",
            Strategy::css(".mantine-Collapse-root a"),
        )?;
        Ok(Self { locators })
    }

    fn section(&self, label: &str) -> Result<Query> {
        self.locators.resolve("section", &Params::one("label", label))
    }

    fn suboptions(&self, label: &str) -> Result<Query> {
        self.locators
            .resolve("section-suboptions", &Params::one("label", label))
    }

    /// All non-empty navigation labels, in panel order.
    pub fn labels(&self, actions: &Actions<'_>) -> Result<Vec<String>> {
        let texts = actions.driver().texts(&self.locators.query("nav-labels")?)?;
        let labels: Vec<String> = texts
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        debug!(count = labels.len(), "navigation labels read");
        Ok(labels)
    }

    /// Collapse then re-expand a section, verifying sub-options disappear
    /// and come back.
    pub fn toggle_section(&self, actions: &Actions<'_>, label: &str) -> Result<()> {
        let section = self.section(label)?;
        let suboptions = self.suboptions(label)?;

        Flow::new(format!("toggle nav section '{label}'"))
            .require(Check::element(section.clone(), Condition::Visible))
            .step("collapse", {
                let section = section.clone();
                move |a: &Actions<'_>| a.click(&section)
            })
            .step("verify collapsed", {
                let suboptions = suboptions.clone();
                move |a: &Actions<'_>| {
                    a.waiter()
                        .wait_for(&suboptions, &Condition::CountEquals(0))?;
                    Ok(())
                }
            })
            .step("expand", move |a| a.click(&section))
            .ensure(Check::element(suboptions, Condition::CountAtLeast(1)))
            .run(actions)
    }
}
