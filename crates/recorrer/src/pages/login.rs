//! Login page: credential entry, organization pick and session capture.

use std::path::Path;

use tracing::info;

use crate::action::Actions;
use crate::config::Config;
use crate::flow::{click_if_present, Check, Flow, OptionalOutcome};
use crate::registry::{Query, Registry, Strategy};
use crate::result::Result;
use crate::session::SessionState;
use crate::wait::{Condition, UrlPattern, WaitOptions};

/// The authentication screens: email step, password step, optional
/// organization picker.
#[derive(Debug)]
pub struct LoginPage {
    config: Config,
    locators: Registry,
}

impl LoginPage {
    /// Build the page object for a configured environment.
    pub fn new(config: Config) -> Result<Self> {
        let mut locators = Registry::new();
        locators.define(
            "email-input",
            Strategy::css("input[name=\"email\"], input[type=\"email\"]"),
        )?;
        locators.define(
            "password-input",
            Strategy::css("input[name=\"password\"], input[type=\"password\"]"),
        )?;
        locators.define(
            "continue-button",
            Strategy::css("button[type=\"submit\"]:has-text(\"Continue\")"),
        )?;
        locators.define(
            "sign-in-button",
            Strategy::css("button[name=\"intent\"]:has-text(\"Sign in\")"),
        )?;
        locators.define("error-message", Strategy::css(".error, .form-error"))?;
        // Multi-org accounts get an organization picker after sign-in;
        // single-org accounts go straight to the dashboard.
        locators.define(
            "organization-picker",
            Strategy::css("button:has-text(\"QA_Automations\")"),
        )?;
        Ok(Self { config, locators })
    }

    fn q(&self, name: &str) -> Result<Query> {
        self.locators.query(name)
    }

    /// Navigate to the login page.
    pub fn goto(&self, actions: &Actions<'_>) -> Result<()> {
        info!(url = %self.config.login_url, "navigating to login page");
        actions.driver().goto(&self.config.login_url)
    }

    /// Log in with the configured credentials. The flow lands on the
    /// dashboard, picking an organization along the way when prompted.
    pub fn login(&self, actions: &Actions<'_>) -> Result<()> {
        let email_input = self.q("email-input")?;
        let password_input = self.q("password-input")?;
        let continue_button = self.q("continue-button")?;
        let sign_in_button = self.q("sign-in-button")?;
        let org_picker = self.q("organization-picker")?;
        let email = self.config.email.clone();
        let password = self.config.password.clone();
        let dashboard = self.config.dashboard_url.clone();

        Flow::new("login")
            .require(Check::element(email_input.clone(), Condition::Editable))
            .step("enter email", move |a| a.fill(&email_input, &email))
            .step("continue", move |a| a.click(&continue_button))
            .step("enter password", move |a| a.fill(&password_input, &password))
            .step("sign in", move |a| a.click(&sign_in_button))
            .step("pick organization when prompted", move |a| {
                let bound = WaitOptions::new().with_timeout(3_000).with_poll_interval(100);
                let outcome = click_if_present(a, &org_picker, &bound)?;
                if !outcome.was_found() {
                    info!("no organization picker shown, continuing");
                }
                Ok(())
            })
            .ensure(Check::url(UrlPattern::Prefix(dashboard)))
            .run(actions)
    }

    /// Log in and persist the authenticated session snapshot to `path`
    /// for dependent suites.
    pub fn login_and_save_session(
        &self,
        actions: &Actions<'_>,
        path: &Path,
    ) -> Result<SessionState> {
        self.goto(actions)?;
        self.login(actions)?;
        let state = SessionState::capture(actions.driver())?;
        state.save(path)?;
        Ok(state)
    }

    /// Open the dashboard directly, relying on a previously captured
    /// session. Fails when the app bounces back to the login screen.
    pub fn open_dashboard_with_session(&self, actions: &Actions<'_>) -> Result<()> {
        actions.driver().goto(&self.config.dashboard_url)?;
        let waiter = actions.waiter();
        let options = waiter.options().clone();
        let url = waiter.wait_for_url(
            &UrlPattern::Prefix(self.config.dashboard_url.clone()),
            &options,
        )?;
        info!(%url, "dashboard opened from saved session");
        Ok(())
    }

    /// Whether a login error message is currently shown.
    pub fn login_error(&self, actions: &Actions<'_>) -> Result<OptionalOutcome> {
        let count = actions.waiter().count(&self.q("error-message")?)?;
        Ok(if count > 0 {
            OptionalOutcome::Found
        } else {
            OptionalOutcome::NotPresent
        })
    }
}
