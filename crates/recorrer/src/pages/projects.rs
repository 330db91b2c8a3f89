//! Projects screen: project creation, bids, vendor invitations, in-grid
//! bid editing and the reset-table modal.

use std::path::Path;

use tracing::info;

use crate::action::Actions;
use crate::config::Config;
use crate::flow::{click_if_present, Check, Flow, OptionalOutcome};
use crate::registry::{ParamSpec, Params, Query, Registry, Strategy};
use crate::result::Result;
use crate::session::HandoffRecord;
use crate::wait::{Condition, WaitOptions};

/// The project list, a project's bids tab and its vendor drawer.
#[derive(Debug)]
pub struct ProjectsPage {
    config: Config,
    locators: Registry,
}

impl ProjectsPage {
    /// Build the page object for a configured environment.
    pub fn new(config: Config) -> Result<Self> {
        let mut locators = Registry::new();
        locators.define(
            "projects-nav",
            Strategy::css("nav a.mantine-NavLink-root:has-text(\"Projects\")"),
        )?;
        locators.define(
            "create-button",
            Strategy::css("button:has-text(\"Create Project\")"),
        )?;
        locators.define("modal", Strategy::css("section[role=\"dialog\"]"))?;
        locators.define_child("name-input", "modal", Strategy::css("input[name=\"name\"]"))?;
        locators.define_child(
            "description-input",
            "modal",
            Strategy::css("textarea[name=\"description\"]"),
        )?;
        locators.define_child(
            "modal-submit",
            "modal",
            Strategy::css("button:has-text(\"Create\")"),
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

        locators.define("bids-tab", Strategy::css("button[role=\"tab\"]:has-text(\"Bids\")"))?;
        locators.define(
            "invite-vendors-button",
            Strategy::css("button:has-text(\"Invite vendors to bid\")"),
        )?;
        locators.define("vendors-drawer", Strategy::css(".mantine-Drawer-body"))?;
        locators.define_child(
            "drawer-search",
            "vendors-drawer",
            Strategy::css("input[placeholder=\"Search...\"]"),
        )?;
        locators.define_child_with(
            "drawer-vendor-row",
            "vendors-drawer",
            Strategy::css("div[role=\"row\"]:has-text(\"{email}\")"),
            vec![ParamSpec::free_text("email")],
        )?;
        locators.define_child(
            "drawer-invite",
            "vendors-drawer",
            Strategy::css("button:has-text(\"Invite\")"),
        )?;

        locators.define_with(
            "bid-row-by-vendor",
            Strategy::css(".ag-center-cols-container div[role=\"row\"]:has-text(\"{vendor}\")"),
            vec![ParamSpec::free_text("vendor")],
        )?;
        locators.define_child(
            "award-button",
            "bid-row-by-vendor",
            Strategy::css("button:has-text(\"Award\")"),
        )?;
        locators.define_child(
            "awarded-badge",
            "bid-row-by-vendor",
            Strategy::css(".mantine-Badge-label:has-text(\"Awarded\")"),
        )?;
        locators.define_with(
            "bid-cell",
            Strategy::css("div[role=\"row\"][row-index=\"{row}\"] div[col-id=\"{col}\"]"),
            vec![ParamSpec::identifier("row"), ParamSpec::identifier("col")],
        )?;

        locators.define(
            "reset-icon",
            Strategy::css("button:has(svg.lucide-rotate-ccw)"),
        )?;
        locators.define("reset-modal", Strategy::css("section[role=\"dialog\"]"))?;
        locators.define_child(
            "reset-title",
            "reset-modal",
            Strategy::css("h2.mantine-Modal-title"),
        )?;
        locators.define_child(
            "reset-confirm",
            "reset-modal",
            Strategy::css("button:has-text(\"Reset Table\")"),
        )?;
        locators.define_child(
            "reset-cancel",
            "reset-modal",
            Strategy::css("button:has-text(\"Cancel\")"),
        )?;
        locators.define(
            "grid-rows",
            Strategy::css(".ag-center-cols-container div[role=\"row\"]"),
        )?;
        Ok(Self { config, locators })
    }

    fn q(&self, name: &str) -> Result<Query> {
        self.locators.query(name)
    }

    /// Navigate to the project list via the left panel.
    pub fn open(&self, actions: &Actions<'_>) -> Result<()> {
        actions.driver().goto(&self.config.dashboard_url)?;
        actions.click(&self.q("projects-nav")?)
    }

    /// Create a project through the modal.
    pub fn create(&self, actions: &Actions<'_>, name: &str, description: &str) -> Result<()> {
        let create_button = self.q("create-button")?;
        let modal = self.q("modal")?;
        let name_input = self.q("name-input")?;
        let description_input = self.q("description-input")?;
        let submit = self.q("modal-submit")?;
        let name = name.to_string();
        let description = description.to_string();

        Flow::new("create project")
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
            .step("enter description", move |a| {
                a.fill(&description_input, &description)
            })
            .step("submit", move |a| a.click(&submit))
            .ensure(Check::element(modal, Condition::Hidden))
            .run(actions)?;
        info!("project created");
        Ok(())
    }

    /// Create a project and leave a handoff record for consuming suites.
    pub fn create_with_handoff(
        &self,
        actions: &Actions<'_>,
        name: &str,
        description: &str,
        handoff_path: &Path,
    ) -> Result<HandoffRecord> {
        self.create(actions, name, description)?;
        let record = HandoffRecord::new(name, description);
        record.write(handoff_path)?;
        Ok(record)
    }

    /// Search the list and verify the first matching row is `name`.
    pub fn search(&self, actions: &Actions<'_>, query_text: &str, name: &str) -> Result<()> {
        let search_input = self.q("search-input")?;
        let first_cell = self.q("first-row-name-cell")?;
        let query_text = query_text.to_string();
        let expected = name.to_string();

        Flow::new("search project")
            .step("type query", move |a: &Actions<'_>| {
                a.fill(&search_input, &query_text)
            })
            .ensure(Check::predicate(
                format!("first row name cell reads '{expected}'"),
                move |a| {
                    let handle = a.waiter().wait_for(&first_cell, &Condition::Visible)?;
                    let text = handle.state.and_then(|s| s.text).unwrap_or_default();
                    Ok(text.trim() == expected)
                },
            ))
            .run(actions)
    }

    /// Invite vendors to bid through the manage-vendors drawer.
    ///
    /// Returns `NotPresent` when the invite button is not on screen (the
    /// drawer is already minimized for this project).
    pub fn invite_vendors(
        &self,
        actions: &Actions<'_>,
        emails: &[&str],
    ) -> Result<OptionalOutcome> {
        let bids_tab = self.q("bids-tab")?;
        let invite_button = self.q("invite-vendors-button")?;
        let drawer = self.q("vendors-drawer")?;
        let drawer_search = self.q("drawer-search")?;
        let drawer_invite = self.q("drawer-invite")?;

        actions.click(&bids_tab)?;
        let bound = WaitOptions::new().with_timeout(3_000).with_poll_interval(100);
        if !click_if_present(actions, &invite_button, &bound)?.was_found() {
            info!("invite button absent, vendors already managed");
            return Ok(OptionalOutcome::NotPresent);
        }

        actions.waiter().wait_for(&drawer, &Condition::Visible)?;
        for email in emails {
            let vendor_row = self
                .locators
                .resolve("drawer-vendor-row", &Params::one("email", *email))?;
            actions.fill(&drawer_search, email)?;
            actions.click(&vendor_row)?;
        }
        actions.click(&drawer_invite)?;
        info!(count = emails.len(), "vendors invited");
        Ok(OptionalOutcome::Found)
    }

    /// Award the bid of `vendor` and verify the row shows its badge.
    pub fn award_bid(&self, actions: &Actions<'_>, vendor: &str) -> Result<()> {
        let row = self
            .locators
            .resolve("bid-row-by-vendor", &Params::one("vendor", vendor))?;
        let award = self
            .locators
            .resolve("award-button", &Params::one("vendor", vendor))?;
        let badge = self
            .locators
            .resolve("awarded-badge", &Params::one("vendor", vendor))?;

        Flow::new("award bid")
            .require(Check::element(row, Condition::Visible))
            .step("award", move |a| a.click(&award))
            .ensure(Check::element(badge, Condition::Visible))
            .run(actions)?;
        info!(vendor, "bid awarded");
        Ok(())
    }

    /// Edit one bid-grid cell in place and commit with Enter.
    pub fn update_bid_cell(
        &self,
        actions: &Actions<'_>,
        row: usize,
        col: &str,
        value: &str,
    ) -> Result<()> {
        let cell = self.locators.resolve(
            "bid-cell",
            &Params::new().set("row", row.to_string()).set("col", col),
        )?;
        // The grid mounts either editor depending on column type.
        let editors = [
            Query::css("input.ag-input-field-input"),
            Query::css("textarea.ag-input-field-input"),
        ];
        actions.edit_cell(&cell, &editors, value)
    }

    /// Reset the bid table through its confirmation modal and verify the
    /// table is left with at most two rows.
    pub fn reset_table(&self, actions: &Actions<'_>) -> Result<()> {
        let reset_icon = self.q("reset-icon")?;
        let modal = self.q("reset-modal")?;
        let title = self.q("reset-title")?;
        let confirm = self.q("reset-confirm")?;
        let rows = self.q("grid-rows")?;

        Flow::new("reset bid table")
            .require(Check::element(reset_icon.clone(), Condition::Enabled))
            .step("open modal", move |a| a.click(&reset_icon))
            .step("verify modal title", move |a| {
                let handle = a.waiter().wait_for(&title, &Condition::Visible)?;
                let text = handle.state.and_then(|s| s.text).unwrap_or_default();
                if text.trim() == "Reset Bid Table" {
                    Ok(())
                } else {
                    Err(crate::result::Error::AssertionFailed {
                        message: format!("modal title reads '{text}'"),
                    })
                }
            })
            .step("confirm", move |a| a.click(&confirm))
            .ensure(Check::element(modal, Condition::Hidden))
            .ensure(Check::element(rows, Condition::CountAtMost(2)))
            .run(actions)?;
        info!("bid table reset");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::action::SettlePolicy;
    use crate::driver::ElementState;
    use crate::sim::SimulatedPage;

    fn actions(page: &SimulatedPage) -> Actions<'_> {
        Actions::new(page)
            .with_options(WaitOptions::new().with_timeout(300).with_poll_interval(10))
            .with_settle(SettlePolicy::None)
    }

    fn page_object() -> ProjectsPage {
        ProjectsPage::new(Config::for_testing()).unwrap()
    }

    fn wire_create_modal(page: &SimulatedPage, projects: &ProjectsPage) {
        let create = projects.q("create-button").unwrap();
        page.register_one(&create, ElementState::interactive());
        let modal_selector = projects.q("modal").unwrap().selector_text();
        let name_selector = projects.q("name-input").unwrap().selector_text();
        let desc_selector = projects.q("description-input").unwrap().selector_text();
        let submit_selector = projects.q("modal-submit").unwrap().selector_text();
        page.on("click", &create, move |dom| {
            dom.register_selector(&modal_selector, vec![ElementState::interactive()]);
            dom.register_selector(&name_selector, vec![ElementState::editable()]);
            dom.register_selector(&desc_selector, vec![ElementState::editable()]);
            dom.register_selector(&submit_selector, vec![ElementState::interactive()]);
        });
        let modal_selector = projects.q("modal").unwrap().selector_text();
        page.on("click", &projects.q("modal-submit").unwrap(), move |dom| {
            dom.clear_selector(&modal_selector);
        });
    }

    // Create a uniquely named project, then search for its prefix and find
    // it in the first matching row.
    #[test]
    fn test_create_then_search_finds_project() {
        let page = SimulatedPage::new();
        let projects = page_object();
        wire_create_modal(&page, &projects);

        let name = crate::scenario::unique_name("Automa_Test");
        projects
            .create(&actions(&page), &name, "Auto_Description_XYZ1")
            .unwrap();

        page.register_one(&projects.q("search-input").unwrap(), ElementState::editable());
        page.register_one(
            &projects.q("first-row-name-cell").unwrap(),
            ElementState::interactive().with_text(name.clone()),
        );
        projects
            .search(&actions(&page), "Automa_Test", &name)
            .unwrap();
    }

    #[test]
    fn test_create_with_handoff_writes_record() {
        let page = SimulatedPage::new();
        let projects = page_object();
        wire_create_modal(&page, &projects);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handoff.json");
        let record = projects
            .create_with_handoff(&actions(&page), "P1", "seeded", &path)
            .unwrap();
        assert_eq!(HandoffRecord::read(&path).unwrap(), record);
    }

    mod vendor_tests {
        use super::*;

        #[test]
        fn test_invite_vendors_through_drawer() {
            let page = SimulatedPage::new();
            let projects = page_object();
            let bids_tab = projects.q("bids-tab").unwrap();
            let invite = projects.q("invite-vendors-button").unwrap();
            page.register_one(&bids_tab, ElementState::interactive());
            page.register_one(&invite, ElementState::interactive());

            // Clicking invite opens the drawer with its own search input.
            let drawer_selector = projects.q("vendors-drawer").unwrap().selector_text();
            let search_selector = projects.q("drawer-search").unwrap().selector_text();
            let invite_btn_selector = projects.q("drawer-invite").unwrap().selector_text();
            let vendor_row = projects
                .locators
                .resolve("drawer-vendor-row", &Params::one("email", "v1@acme.com"))
                .unwrap();
            let vendor_selector = vendor_row.selector_text();
            page.on("click", &invite, move |dom| {
                dom.register_selector(&drawer_selector, vec![ElementState::interactive()]);
                dom.register_selector(&search_selector, vec![ElementState::editable()]);
                dom.register_selector(&invite_btn_selector, vec![ElementState::interactive()]);
                dom.register_selector(&vendor_selector, vec![ElementState::interactive()]);
            });

            let outcome = projects
                .invite_vendors(&actions(&page), &["v1@acme.com"])
                .unwrap();
            assert_eq!(outcome, OptionalOutcome::Found);
            assert!(page.saw("click", &vendor_row));
        }

        // A same-shaped row outside the drawer must not satisfy the
        // drawer-scoped lookup.
        #[test]
        fn test_drawer_scoping_ignores_outside_rows() {
            let page = SimulatedPage::new();
            let projects = page_object();
            let bids_tab = projects.q("bids-tab").unwrap();
            let invite = projects.q("invite-vendors-button").unwrap();
            page.register_one(&bids_tab, ElementState::interactive());
            page.register_one(&invite, ElementState::interactive());

            // Row exists in the main grid but the drawer never opens
            // with a matching row inside it.
            page.register_one(
                &Query::css("div[role=\"row\"]:has-text(\"v1@acme.com\")"),
                ElementState::interactive(),
            );
            let drawer_selector = projects.q("vendors-drawer").unwrap().selector_text();
            let search_selector = projects.q("drawer-search").unwrap().selector_text();
            page.on("click", &invite, move |dom| {
                dom.register_selector(&drawer_selector, vec![ElementState::interactive()]);
                dom.register_selector(&search_selector, vec![ElementState::editable()]);
            });

            let err = projects
                .invite_vendors(&actions(&page), &["v1@acme.com"])
                .unwrap_err();
            assert!(err.is_timeout());
        }

        #[test]
        fn test_invite_button_absent_is_not_present() {
            let page = SimulatedPage::new();
            let projects = page_object();
            page.register_one(&projects.q("bids-tab").unwrap(), ElementState::interactive());
            let outcome = projects.invite_vendors(&actions(&page), &[]).unwrap();
            assert_eq!(outcome, OptionalOutcome::NotPresent);
        }
    }

    #[test]
    fn test_award_bid_shows_badge() {
        let page = SimulatedPage::new();
        let projects = page_object();
        let row = projects
            .locators
            .resolve("bid-row-by-vendor", &Params::one("vendor", "Acme Plumbing"))
            .unwrap();
        let award = projects
            .locators
            .resolve("award-button", &Params::one("vendor", "Acme Plumbing"))
            .unwrap();
        let badge = projects
            .locators
            .resolve("awarded-badge", &Params::one("vendor", "Acme Plumbing"))
            .unwrap();
        page.register_one(&row, ElementState::interactive());
        page.register_one(&award, ElementState::interactive());
        let badge_selector = badge.selector_text();
        page.on("click", &award, move |dom| {
            dom.register_selector(&badge_selector, vec![ElementState::interactive()]);
        });
        projects.award_bid(&actions(&page), "Acme Plumbing").unwrap();
    }

    #[test]
    fn test_update_bid_cell_edits_in_place() {
        let page = SimulatedPage::new();
        let projects = page_object();
        let cell = projects
            .locators
            .resolve(
                "bid-cell",
                &Params::new().set("row", "0").set("col", "unit_cost"),
            )
            .unwrap();
        page.register_one(&cell, ElementState::interactive());
        let editor = Query::css("input.ag-input-field-input");
        let editor_selector = editor.selector_text();
        page.on("dblclick", &cell, move |dom| {
            dom.register_selector(&editor_selector, vec![ElementState::editable()]);
        });

        projects
            .update_bid_cell(&actions(&page), 0, "unit_cost", "1500")
            .unwrap();
        assert!(page.saw("fill", &editor));
    }

    #[test]
    fn test_reset_table_leaves_at_most_two_rows() {
        let page = SimulatedPage::new();
        let projects = page_object();
        let icon = projects.q("reset-icon").unwrap();
        let rows = projects.q("grid-rows").unwrap();
        page.register_one(&icon, ElementState::interactive());
        page.register(&rows, vec![ElementState::interactive(); 7]);

        let modal_selector = projects.q("reset-modal").unwrap().selector_text();
        let title_selector = projects.q("reset-title").unwrap().selector_text();
        let confirm_selector = projects.q("reset-confirm").unwrap().selector_text();
        page.on("click", &icon, move |dom| {
            dom.register_selector(&modal_selector, vec![ElementState::interactive()]);
            dom.register_selector(
                &title_selector,
                vec![ElementState::interactive().with_text("Reset Bid Table")],
            );
            dom.register_selector(&confirm_selector, vec![ElementState::interactive()]);
        });
        let modal_selector = projects.q("reset-modal").unwrap().selector_text();
        let rows_selector = rows.selector_text();
        page.on("click", &projects.q("reset-confirm").unwrap(), move |dom| {
            dom.clear_selector(&modal_selector);
            dom.register_selector(&rows_selector, vec![ElementState::interactive(); 2]);
        });

        projects.reset_table(&actions(&page)).unwrap();
    }

    #[test]
    fn test_reset_table_wrong_title_fails() {
        let page = SimulatedPage::new();
        let projects = page_object();
        let icon = projects.q("reset-icon").unwrap();
        page.register_one(&icon, ElementState::interactive());
        let modal_selector = projects.q("reset-modal").unwrap().selector_text();
        let title_selector = projects.q("reset-title").unwrap().selector_text();
        page.on("click", &icon, move |dom| {
            dom.register_selector(&modal_selector, vec![ElementState::interactive()]);
            dom.register_selector(
                &title_selector,
                vec![ElementState::interactive().with_text("Delete Everything")],
            );
        });
        let err = projects.reset_table(&actions(&page)).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            crate::result::Error::AssertionFailed { .. }
        ));
    }
}
