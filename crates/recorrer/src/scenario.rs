//! Scenario declarations and run planning.
//!
//! Scenarios declare the resources they produce and consume; the planner
//! orders them by that dependency graph. Ordering never depends on scenario
//! naming or file layout, and a consume with no producer or a dependency
//! cycle is rejected before anything runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use uuid::Uuid;

use crate::result::{Error, Result};

/// A declared scenario: a name plus its resource contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSpec {
    /// Scenario name (diagnostics and reporting)
    pub name: String,
    /// Resource keys this scenario creates for others
    pub produces: Vec<String>,
    /// Resource keys this scenario requires to exist
    pub consumes: Vec<String>,
}

impl ScenarioSpec {
    /// Declare a scenario with no dependencies
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            produces: Vec::new(),
            consumes: Vec::new(),
        }
    }

    /// Declare a resource this scenario creates
    #[must_use]
    pub fn produces(mut self, resource: impl Into<String>) -> Self {
        self.produces.push(resource.into());
        self
    }

    /// Declare a resource this scenario requires
    #[must_use]
    pub fn consumes(mut self, resource: impl Into<String>) -> Self {
        self.consumes.push(resource.into());
        self
    }
}

/// Order scenarios so that every producer runs before its consumers.
///
/// The order is deterministic: among scenarios whose dependencies are all
/// satisfied, declaration order wins.
///
/// # Errors
///
/// Returns [`Error::Handoff`] when a consumed resource has no producer,
/// when two scenarios claim to produce the same resource, or when the
/// dependency graph has a cycle.
pub fn plan(specs: &[ScenarioSpec]) -> Result<Vec<&ScenarioSpec>> {
    let mut producer_of: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, spec) in specs.iter().enumerate() {
        for resource in &spec.produces {
            if let Some(prev) = producer_of.insert(resource.as_str(), idx) {
                return Err(Error::Handoff {
                    message: format!(
                        "resource '{resource}' produced by both '{}' and '{}'",
                        specs[prev].name, spec.name
                    ),
                });
            }
        }
    }

    for spec in specs {
        for resource in &spec.consumes {
            if !producer_of.contains_key(resource.as_str()) {
                return Err(Error::Handoff {
                    message: format!(
                        "scenario '{}' consumes '{resource}' but nothing produces it",
                        spec.name
                    ),
                });
            }
        }
    }

    let mut ordered = Vec::with_capacity(specs.len());
    let mut available: BTreeSet<&str> = BTreeSet::new();
    let mut placed = vec![false; specs.len()];
    while ordered.len() < specs.len() {
        let mut progressed = false;
        for (idx, spec) in specs.iter().enumerate() {
            if placed[idx] {
                continue;
            }
            let ready = spec
                .consumes
                .iter()
                .all(|r| available.contains(r.as_str()));
            if ready {
                placed[idx] = true;
                for resource in &spec.produces {
                    let _ = available.insert(resource.as_str());
                }
                ordered.push(spec);
                progressed = true;
            }
        }
        if !progressed {
            let stuck: Vec<&str> = specs
                .iter()
                .enumerate()
                .filter(|(idx, _)| !placed[*idx])
                .map(|(_, s)| s.name.as_str())
                .collect();
            return Err(Error::Handoff {
                message: format!("dependency cycle among scenarios: {}", stuck.join(", ")),
            });
        }
    }
    Ok(ordered)
}

/// Generate a collision-free entity name: `PREFIX_YYYYMMDD_XXXXXX`.
///
/// The suffix comes from a v4 UUID, so names stay unique across parallel
/// runs against the same environment.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("{prefix}_{date}_{suffix}")
}
