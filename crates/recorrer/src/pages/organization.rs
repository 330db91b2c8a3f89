//! Organization management: member listing, user invitations with a role,
//! and invitation revocation.

use tracing::info;

use crate::action::Actions;
use crate::flow::{Check, Flow, OptionalOutcome};
use crate::registry::{ParamSpec, Params, Query, Registry, Strategy};
use crate::result::{Error, Result};
use crate::wait::{Condition, UrlPattern};

/// The organization screen reached through the account menu.
#[derive(Debug)]
pub struct OrganizationPage {
    locators: Registry,
}

impl OrganizationPage {
    /// Build the page object.
    pub fn new() -> Result<Self> {
        let mut locators = Registry::new();
        locators.define("account-menu", Strategy::css("div[aria-haspopup=\"menu\"]"))?;
        locators.define(
            "manage-organization",
            Strategy::css("button:has-text(\"Manage Organization\")"),
        )?;
        locators.define(
            "breadcrumb",
            Strategy::css(".mantine-Breadcrumbs-root:has-text(\"Organization\")"),
        )?;
        locators.define(
            "invite-button",
            Strategy::css("button:has-text(\"Invite User\")"),
        )?;
        locators.define("invite-dialog", Strategy::css("[role=\"dialog\"]"))?;
        locators.define_child(
            "invite-email",
            "invite-dialog",
            Strategy::css("input[name=\"email\"]"),
        )?;
        locators.define_child(
            "invite-role-trigger",
            "invite-dialog",
            Strategy::css("button[role=\"combobox\"]"),
        )?;
        locators.define_child(
            "invite-submit",
            "invite-dialog",
            Strategy::css("button:has-text(\"Invite\")"),
        )?;
        locators.define_with(
            "role-option",
            Strategy::css(".rt-SelectItem:has-text(\"{role}\")"),
            vec![ParamSpec::free_text("role")],
        )?;
        locators.define(
            "search-input",
            Strategy::css("input[placeholder=\"Search...\"]"),
        )?;
        locators.define_with(
            "member-row",
            Strategy::css("table tbody tr:has-text(\"{email}\")"),
            vec![ParamSpec::free_text("email")],
        )?;
        locators.define_child(
            "invited-badge",
            "member-row",
            Strategy::css("span.rt-Badge:has-text(\"Invited\")"),
        )?;
        locators.define_child(
            "row-actions-menu",
            "member-row",
            Strategy::css("button[aria-haspopup=\"menu\"]"),
        )?;
        locators.define(
            "revoke-menu-item",
            Strategy::css("[role=\"menuitem\"]:has-text(\"Revoke invite\")"),
        )?;
        locators.define("revoke-modal", Strategy::css("section[role=\"dialog\"]"))?;
        locators.define_child(
            "revoke-message",
            "revoke-modal",
            Strategy::css("p"),
        )?;
        locators.define_child(
            "revoke-confirm",
            "revoke-modal",
            Strategy::css("button:has-text(\"Revoke\")"),
        )?;
        Ok(Self { locators })
    }

    fn q(&self, name: &str) -> Result<Query> {
        self.locators.query(name)
    }

    fn for_email(&self, name: &str, email: &str) -> Result<Query> {
        self.locators.resolve(name, &Params::one("email", email))
    }

    /// Navigate from the account menu into organization management.
    pub fn open(&self, actions: &Actions<'_>) -> Result<()> {
        let menu = self.q("account-menu")?;
        let manage = self.q("manage-organization")?;
        let breadcrumb = self.q("breadcrumb")?;

        Flow::new("open organization")
            .require(Check::element(menu.clone(), Condition::Visible))
            .step("open account menu", move |a| a.click(&menu))
            .step("manage organization", move |a| a.click(&manage))
            .ensure(Check::element(breadcrumb, Condition::Visible))
            .ensure(Check::url(UrlPattern::Contains("/organization".into())))
            .run(actions)
    }

    /// Invite a user with a role through the invite dialog.
    pub fn invite_user(&self, actions: &Actions<'_>, email: &str, role: &str) -> Result<()> {
        let invite_button = self.q("invite-button")?;
        let dialog = self.q("invite-dialog")?;
        let email_input = self.q("invite-email")?;
        let role_trigger = self.q("invite-role-trigger")?;
        let role_option = self
            .locators
            .resolve("role-option", &Params::one("role", role))?;
        let submit = self.q("invite-submit")?;
        let email = email.to_string();

        Flow::new("invite user")
            .require(Check::element(invite_button.clone(), Condition::Enabled))
            .step("open dialog", move |a| a.click(&invite_button))
            .step("wait for dialog", {
                let dialog = dialog.clone();
                move |a: &Actions<'_>| {
                    a.waiter().wait_for(&dialog, &Condition::Visible)?;
                    Ok(())
                }
            })
            .step("enter email", move |a| a.fill(&email_input, &email))
            .step("pick role", move |a| {
                a.pick_from_dropdown(&role_trigger, &role_option)
            })
            .step("send invite", move |a| a.click(&submit))
            .ensure(Check::element(dialog, Condition::Hidden))
            .run(actions)?;
        info!(role, "user invited");
        Ok(())
    }

    /// Filter the member table.
    pub fn search(&self, actions: &Actions<'_>, text: &str) -> Result<()> {
        actions.fill(&self.q("search-input")?, text)
    }

    /// Wait for the Invited badge on the member's row.
    pub fn verify_invited(&self, actions: &Actions<'_>, email: &str) -> Result<()> {
        let badge = self.for_email("invited-badge", email)?;
        actions.waiter().wait_for(&badge, &Condition::Visible)?;
        Ok(())
    }

    /// Whether the member's row currently shows the Invited badge.
    pub fn invited_badge(&self, actions: &Actions<'_>, email: &str) -> Result<OptionalOutcome> {
        let count = actions
            .waiter()
            .count(&self.for_email("invited-badge", email)?)?;
        Ok(if count > 0 {
            OptionalOutcome::Found
        } else {
            OptionalOutcome::NotPresent
        })
    }

    /// Revoke a pending invitation through the row's action menu. The
    /// confirmation modal must name the invitee before it is confirmed.
    pub fn revoke_invite(&self, actions: &Actions<'_>, email: &str) -> Result<()> {
        let actions_menu = self.for_email("row-actions-menu", email)?;
        let menu_item = self.q("revoke-menu-item")?;
        let modal = self.q("revoke-modal")?;
        let message = self.q("revoke-message")?;
        let confirm = self.q("revoke-confirm")?;
        let badge = self.for_email("invited-badge", email)?;
        let email = email.to_string();

        Flow::new("revoke invitation")
            .require(Check::element(actions_menu.clone(), Condition::Visible))
            .step("open row menu", move |a| a.click(&actions_menu))
            .step("choose revoke", move |a| a.click(&menu_item))
            .step("verify confirmation names the invitee", move |a| {
                let handle = a.waiter().wait_for(&message, &Condition::Visible)?;
                let text = handle.state.and_then(|s| s.text).unwrap_or_default();
                if text.contains(&email) {
                    Ok(())
                } else {
                    Err(Error::AssertionFailed {
                        message: format!("revoke confirmation reads '{text}'"),
                    })
                }
            })
            .step("confirm", move |a| a.click(&confirm))
            .ensure(Check::element(modal, Condition::Hidden))
            .ensure(Check::element(badge, Condition::Detached))
            .run(actions)?;
        info!("invitation revoked");
        Ok(())
    }
}
