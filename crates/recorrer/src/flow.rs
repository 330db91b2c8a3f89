//! Composable page flows: named step sequences with explicit pre- and
//! postconditions.
//!
//! A flow either completes every step and verifies every postcondition, or
//! fails at a specific named step with the underlying cause attached
//! ([`crate::result::Error::FlowStep`]). Steps after a failure never run,
//! so a failed flow leaves no half-applied interactions behind it.

use tracing::{debug, info};

use crate::action::Actions;
use crate::registry::Query;
use crate::result::{Error, Result};
use crate::wait::{Condition, UrlPattern, WaitOptions};

/// Outcome of handling an optional UI element (dialogs, banners, residual
/// filters that may or may not be present).
///
/// Absence is a first-class outcome, not an error and not a bare `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalOutcome {
    /// The element was present and was handled
    Found,
    /// The element never appeared within the bound
    NotPresent,
}

impl OptionalOutcome {
    /// True when the element was present and handled
    #[must_use]
    pub const fn was_found(self) -> bool {
        matches!(self, Self::Found)
    }
}

/// Click `query` if it becomes visible within `bound`, report the typed
/// outcome either way.
pub fn click_if_present(
    actions: &Actions<'_>,
    query: &Query,
    bound: &WaitOptions,
) -> Result<OptionalOutcome> {
    match actions.waiter().first_matching(&[query.clone()], bound)? {
        Some(found) => {
            actions.click(&found)?;
            Ok(OptionalOutcome::Found)
        }
        None => Ok(OptionalOutcome::NotPresent),
    }
}

/// A declarative check used as a flow pre- or postcondition.
pub enum Check<'f> {
    /// An element condition must hold (waited for, not just sampled)
    Element {
        /// Target query
        query: Query,
        /// Condition that must hold
        condition: Condition,
    },
    /// The page URL must come to match a pattern
    Url(UrlPattern),
    /// An arbitrary named predicate over the page
    Predicate {
        /// What is being checked, for diagnostics
        description: String,
        /// Returns `Ok(true)` when the check passes
        check: Box<dyn Fn(&Actions<'_>) -> Result<bool> + 'f>,
    },
}

impl std::fmt::Debug for Check<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Check({})", self.description())
    }
}

impl<'f> Check<'f> {
    /// Element-condition check
    #[must_use]
    pub fn element(query: Query, condition: Condition) -> Self {
        Self::Element { query, condition }
    }

    /// URL-pattern check
    #[must_use]
    pub const fn url(pattern: UrlPattern) -> Self {
        Self::Url(pattern)
    }

    /// Named predicate check
    pub fn predicate(
        description: impl Into<String>,
        check: impl Fn(&Actions<'_>) -> Result<bool> + 'f,
    ) -> Self {
        Self::Predicate {
            description: description.into(),
            check: Box::new(check),
        }
    }

    /// Human-readable description for step diagnostics
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Element { query, condition } => format!("{query} is {condition}"),
            Self::Url(pattern) => format!("url {pattern}"),
            Self::Predicate { description, .. } => description.clone(),
        }
    }

    fn verify(&self, actions: &Actions<'_>) -> Result<()> {
        match self {
            Self::Element { query, condition } => {
                actions.waiter().wait_for(query, condition)?;
                Ok(())
            }
            Self::Url(pattern) => {
                let waiter = actions.waiter();
                let options = waiter.options().clone();
                waiter.wait_for_url(pattern, &options)?;
                Ok(())
            }
            Self::Predicate { description, check } => {
                if check(actions)? {
                    Ok(())
                } else {
                    Err(Error::AssertionFailed {
                        message: description.clone(),
                    })
                }
            }
        }
    }
}

type Step<'f> = Box<dyn Fn(&Actions<'_>) -> Result<()> + 'f>;

/// A named sequence of steps bracketed by pre- and postconditions.
pub struct Flow<'f> {
    name: String,
    preconditions: Vec<Check<'f>>,
    steps: Vec<(String, Step<'f>)>,
    postconditions: Vec<Check<'f>>,
}

impl std::fmt::Debug for Flow<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

impl<'f> Flow<'f> {
    /// Start building a named flow
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preconditions: Vec::new(),
            steps: Vec::new(),
            postconditions: Vec::new(),
        }
    }

    /// Flow name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Require a check to hold before any step runs
    #[must_use]
    pub fn require(mut self, check: Check<'f>) -> Self {
        self.preconditions.push(check);
        self
    }

    /// Append a named step
    #[must_use]
    pub fn step(
        mut self,
        name: impl Into<String>,
        run: impl Fn(&Actions<'_>) -> Result<()> + 'f,
    ) -> Self {
        self.steps.push((name.into(), Box::new(run)));
        self
    }

    /// Require a check to hold after the last step
    #[must_use]
    pub fn ensure(mut self, check: Check<'f>) -> Self {
        self.postconditions.push(check);
        self
    }

    /// Run the flow to completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlowStep`] naming the flow and the failing step
    /// (or the failing pre/postcondition), with the cause as source.
    pub fn run(&self, actions: &Actions<'_>) -> Result<()> {
        info!(flow = %self.name, steps = self.steps.len(), "running flow");

        for check in &self.preconditions {
            debug!(flow = %self.name, check = %check.description(), "precondition");
            check
                .verify(actions)
                .map_err(|e| self.at(format!("precondition: {}", check.description()), e))?;
        }

        for (step_name, run) in &self.steps {
            debug!(flow = %self.name, step = %step_name, "step");
            run(actions).map_err(|e| self.at(step_name.clone(), e))?;
        }

        for check in &self.postconditions {
            debug!(flow = %self.name, check = %check.description(), "postcondition");
            check
                .verify(actions)
                .map_err(|e| self.at(format!("postcondition: {}", check.description()), e))?;
        }

        info!(flow = %self.name, "flow complete");
        Ok(())
    }

    fn at(&self, step: String, source: Error) -> Error {
        Error::FlowStep {
            flow: self.name.clone(),
            step,
            source: Box::new(source),
        }
    }
}
