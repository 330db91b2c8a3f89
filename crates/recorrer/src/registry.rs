//! Locator registry: a declarative catalog of how to find every
//! interactive element, keyed by a human-meaningful name.
//!
//! Selectors change with UI structure; centralizing them means a UI change
//! requires editing one descriptor instead of every call site. Parameterized
//! descriptors ("row containing text X") avoid a combinatorial explosion of
//! near-duplicate selectors.
//!
//! Descriptors are immutable once defined. Binding parameters produces a new
//! [`Query`]; it never mutates the registry entry, so resolution is
//! deterministic and safe to repeat.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::result::{Error, Result};

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap())
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\- ]+$").unwrap())
}

/// Selector strategy for a locator descriptor.
///
/// Templates may contain `{param}` placeholders that are substituted with
/// validated parameter values at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// CSS selector, optionally with a Playwright-style `:has-text("...")`
    /// text filter suffix (e.g. `button:has-text("Create Project")`)
    Css(String),
    /// Accessibility role plus accessible-name filter
    Role {
        /// ARIA role (e.g. "button", "option", "dialog")
        role: String,
        /// Accessible name to match (template)
        name: String,
    },
    /// Substring text-content match across all elements
    Text(String),
    /// XPath expression, evaluated relative to the current scope
    XPath(String),
}

impl Strategy {
    /// CSS strategy shorthand
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Role strategy shorthand
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    /// Text strategy shorthand
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// XPath strategy shorthand
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    fn templates(&self) -> Vec<&str> {
        match self {
            Self::Css(s) | Self::Text(s) | Self::XPath(s) => vec![s],
            Self::Role { role, name } => vec![role, name],
        }
    }

    fn substituted(&self, substitute: impl Fn(&str) -> String) -> Segment {
        match self {
            Self::Css(s) => Segment::Css(substitute(s)),
            Self::Text(s) => Segment::Text(substitute(s)),
            Self::XPath(s) => Segment::XPath(substitute(s)),
            Self::Role { role, name } => Segment::Role {
                role: substitute(role),
                name: substitute(name),
            },
        }
    }
}

/// Kind of a locator parameter, determining which values are accepted.
///
/// Free-text values are rejected (not escaped) when they contain characters
/// that would break the underlying strategy once interpolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Arbitrary text; rejects quotes, backslashes and newlines
    FreeText,
    /// Letters, digits, underscore, hyphen and spaces only
    Identifier,
    /// One of a fixed set of allowed values
    Choice(Vec<String>),
}

impl ParamKind {
    fn validate(&self, descriptor: &str, parameter: &str, value: &str) -> Result<()> {
        let reject = |message: String| {
            Err(Error::InvalidParameter {
                descriptor: descriptor.to_string(),
                parameter: parameter.to_string(),
                message,
            })
        };
        match self {
            Self::FreeText => {
                if value.contains('"') || value.contains('\\') || value.contains('\n') {
                    return reject(format!(
                        "free-text value {value:?} contains characters unsafe for selector interpolation"
                    ));
                }
                Ok(())
            }
            Self::Identifier => {
                if value.is_empty() || !identifier_re().is_match(value) {
                    return reject(format!("{value:?} is not a valid identifier"));
                }
                Ok(())
            }
            Self::Choice(allowed) => {
                if allowed.iter().any(|a| a == value) {
                    Ok(())
                } else {
                    reject(format!("{value:?} is not one of {allowed:?}"))
                }
            }
        }
    }
}

/// Declaration of a single typed placeholder in a descriptor template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Placeholder name as it appears in the template (`{name}`)
    pub name: String,
    /// Accepted value kind
    pub kind: ParamKind,
}

impl ParamSpec {
    /// Declare a free-text parameter
    pub fn free_text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::FreeText,
        }
    }

    /// Declare an identifier parameter
    pub fn identifier(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Identifier,
        }
    }

    /// Declare a fixed-choice parameter
    pub fn choice(name: impl Into<String>, allowed: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Choice(allowed.iter().map(ToString::to_string).collect()),
        }
    }
}

/// Parameter bindings supplied at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Empty parameter set
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Start building a parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind one parameter (builder style)
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.0.insert(name.into(), value.into());
        self
    }

    /// Single-parameter shorthand
    #[must_use]
    pub fn one(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().set(name, value)
    }

    /// Look up a bound value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// A named, possibly-parameterized rule for finding zero or more elements.
///
/// Created through [`Registry::define`] and friends; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorDescriptor {
    /// Unique name within the registry
    pub name: String,
    /// Selector strategy template
    pub strategy: Strategy,
    /// Ordered typed placeholders
    pub params: Vec<ParamSpec>,
    /// Parent descriptor name for composed (scoped) lookups
    pub parent: Option<String>,
}

/// One resolved selector segment of a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Concrete CSS selector (possibly with `:has-text(...)` suffix)
    Css(String),
    /// Concrete role + accessible name
    Role {
        /// ARIA role
        role: String,
        /// Accessible name
        name: String,
    },
    /// Concrete text substring
    Text(String),
    /// Concrete XPath
    XPath(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Role { role, name } => write!(f, "role={role}[name=\"{name}\"]"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::XPath(x) => write!(f, "xpath={x}"),
        }
    }
}

impl Segment {
    /// JS expression evaluating to an array of matches within `scope`
    /// (an expression evaluating to an element or `document`).
    fn to_js_all(&self, scope: &str) -> String {
        match self {
            Self::Css(s) => {
                if let Some(idx) = s.find(":has-text(") {
                    let base = &s[..idx];
                    // ':has-text("T")' suffix
                    let text = s[idx..]
                        .trim_start_matches(":has-text(")
                        .trim_end_matches(')')
                        .trim_matches('"');
                    format!(
                        "Array.from(({scope}).querySelectorAll({base:?})).filter(el => el.textContent.includes({text:?}))"
                    )
                } else {
                    format!("Array.from(({scope}).querySelectorAll({s:?}))")
                }
            }
            Self::Role { role, name } => format!(
                "Array.from(({scope}).querySelectorAll('[role=' + JSON.stringify({role:?}) + ']')).filter(el => ((el.getAttribute('aria-label') || '') + el.textContent).includes({name:?}))"
            ),
            Self::Text(t) => format!(
                "Array.from(({scope}).querySelectorAll('*')).filter(el => el.textContent.includes({t:?}))"
            ),
            Self::XPath(x) => format!(
                "(() => {{ const out = []; const it = document.evaluate({x:?}, ({scope}), null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); for (let i = 0; i < it.snapshotLength; i++) out.push(it.snapshotItem(i)); return out; }})()"
            ),
        }
    }
}

/// A concrete query object produced by resolving a descriptor with bound
/// parameters. Not yet executed against the DOM.
///
/// Composed descriptors resolve to multi-segment queries; each segment is
/// scoped to the matches of the previous one, so same-named elements outside
/// the parent never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    descriptor: String,
    segments: Vec<Segment>,
}

impl Query {
    /// Build a single-segment CSS query directly (bypassing a registry)
    pub fn css(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self {
            descriptor: selector.clone(),
            segments: vec![Segment::Css(selector)],
        }
    }

    /// Build a single-segment text query directly
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            descriptor: format!("text={text}"),
            segments: vec![Segment::Text(text)],
        }
    }

    /// Descriptor name this query was resolved from (for diagnostics)
    #[must_use]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Resolved segments, outermost scope first
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Canonical selector text; equal selector text means equal query.
    /// Scoped segments are joined with ` >> `.
    #[must_use]
    pub fn selector_text(&self) -> String {
        self.segments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" >> ")
    }

    /// Query for the enclosing scope (all segments but the last), if any
    #[must_use]
    pub fn parent_scope(&self) -> Option<Query> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Query {
            descriptor: format!("{} (scope)", self.descriptor),
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    fn to_js_all(&self) -> String {
        let mut expr = String::from("[document]");
        for segment in &self.segments {
            expr = format!("({expr}).flatMap((scope) => {})", segment.to_js_all("scope"));
        }
        expr
    }

    /// JS expression evaluating to the current match count
    #[must_use]
    pub fn to_js_count(&self) -> String {
        format!("({}).length", self.to_js_all())
    }

    /// JS expression evaluating to the first match or `null`
    #[must_use]
    pub fn to_js_first(&self) -> String {
        format!("(({})[0] || null)", self.to_js_all())
    }

    /// JS expression evaluating to the text content of every match
    #[must_use]
    pub fn to_js_texts(&self) -> String {
        format!(
            "({}).map((el) => el.textContent || \"\")",
            self.to_js_all()
        )
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.descriptor, self.selector_text())
    }
}

/// Central declarative catalog of locator descriptors for one screen or
/// component, decoupled from the page object that uses it.
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<String, LocatorDescriptor>,
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameterless descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if `name` is already registered in
    /// this registry, or [`Error::InvalidParameter`] if the template
    /// contains a placeholder with no declared spec.
    pub fn define(&mut self, name: &str, strategy: Strategy) -> Result<()> {
        self.define_full(name, strategy, Vec::new(), None)
    }

    /// Register a parameterized descriptor.
    pub fn define_with(
        &mut self,
        name: &str,
        strategy: Strategy,
        params: Vec<ParamSpec>,
    ) -> Result<()> {
        self.define_full(name, strategy, params, None)
    }

    /// Register a descriptor scoped to the matches of `parent`, used for
    /// modal/drawer-scoped lookups so that same-named elements elsewhere on
    /// the screen do not collide.
    ///
    /// # Errors
    ///
    /// In addition to the [`Registry::define`] errors, returns
    /// [`Error::InvalidParameter`] when `parent` has not been defined yet.
    pub fn define_child(&mut self, name: &str, parent: &str, strategy: Strategy) -> Result<()> {
        self.define_full(name, strategy, Vec::new(), Some(parent.to_string()))
    }

    /// Register a parameterized, parent-scoped descriptor.
    pub fn define_child_with(
        &mut self,
        name: &str,
        parent: &str,
        strategy: Strategy,
        params: Vec<ParamSpec>,
    ) -> Result<()> {
        self.define_full(name, strategy, params, Some(parent.to_string()))
    }

    fn define_full(
        &mut self,
        name: &str,
        strategy: Strategy,
        params: Vec<ParamSpec>,
        parent: Option<String>,
    ) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(Error::DuplicateName {
                name: name.to_string(),
            });
        }
        // Parents must already be defined. This keeps every parent chain a
        // tree rooted in a parentless descriptor, so resolution cannot
        // cycle.
        if let Some(parent) = &parent {
            if !self.entries.contains_key(parent) {
                return Err(Error::InvalidParameter {
                    descriptor: name.to_string(),
                    parameter: parent.clone(),
                    message: "parent descriptor is not defined; define parents before children"
                        .to_string(),
                });
            }
        }
        // Every placeholder in the template must have a declared spec,
        // otherwise resolution could silently produce a broken selector.
        for template in strategy.templates() {
            for cap in placeholder_re().captures_iter(template) {
                let placeholder = &cap[1];
                if !params.iter().any(|p| p.name == placeholder) {
                    return Err(Error::InvalidParameter {
                        descriptor: name.to_string(),
                        parameter: placeholder.to_string(),
                        message: "placeholder has no declared parameter spec".to_string(),
                    });
                }
            }
        }
        let _ = self.entries.insert(
            name.to_string(),
            LocatorDescriptor {
                name: name.to_string(),
                strategy,
                params,
                parent,
            },
        );
        Ok(())
    }

    /// Look up a descriptor by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LocatorDescriptor> {
        self.entries.get(name)
    }

    /// Number of registered descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no descriptors are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a descriptor with bound parameters into a concrete [`Query`].
    ///
    /// Resolution walks the parent chain (outermost scope first), validates
    /// every declared parameter against its [`ParamKind`], and substitutes
    /// placeholders. The registry itself is never mutated.
    ///
    /// # Errors
    ///
    /// [`Error::MissingParameter`] when a declared parameter is absent from
    /// `params`; [`Error::InvalidParameter`] when a value fails validation.
    pub fn resolve(&self, name: &str, params: &Params) -> Result<Query> {
        let mut chain = Vec::new();
        let mut current = Some(name.to_string());
        while let Some(n) = current {
            let descriptor = self.get(&n).ok_or_else(|| Error::MissingParameter {
                descriptor: n.clone(),
                parameter: "<descriptor not defined>".to_string(),
            })?;
            current = descriptor.parent.clone();
            chain.push(descriptor);
        }
        chain.reverse();

        let mut segments = Vec::with_capacity(chain.len());
        for descriptor in chain {
            segments.push(Self::resolve_one(descriptor, params)?);
        }
        Ok(Query {
            descriptor: name.to_string(),
            segments,
        })
    }

    /// Resolve a parameterless descriptor
    pub fn query(&self, name: &str) -> Result<Query> {
        self.resolve(name, &Params::none())
    }

    fn resolve_one(descriptor: &LocatorDescriptor, params: &Params) -> Result<Segment> {
        let mut bound: Vec<(String, String)> = Vec::with_capacity(descriptor.params.len());
        for spec in &descriptor.params {
            let value = params
                .get(&spec.name)
                .ok_or_else(|| Error::MissingParameter {
                    descriptor: descriptor.name.clone(),
                    parameter: spec.name.clone(),
                })?;
            spec.kind.validate(&descriptor.name, &spec.name, value)?;
            bound.push((spec.name.clone(), value.to_string()));
        }
        Ok(descriptor.strategy.substituted(|template| {
            let mut out = template.to_string();
            for (name, value) in &bound {
                out = out.replace(&format!("{{{name}}}"), value);
            }
            out
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod define_tests {
        use super::*;

        #[test]
        fn test_define_and_get() {
            let mut registry = Registry::new();
            registry
                .define("search-input", Strategy::css("input[placeholder=\"Search...\"]"))
                .unwrap();
            assert!(registry.get("search-input").is_some());
            assert_eq!(registry.len(), 1);
        }

        #[test]
        fn test_duplicate_name_rejected() {
            let mut registry = Registry::new();
            registry.define("cancel", Strategy::role("button", "Cancel")).unwrap();
            let err = registry
                .define("cancel", Strategy::css("button.cancel"))
                .unwrap_err();
            assert!(matches!(err, Error::DuplicateName { name } if name == "cancel"));
        }

        #[test]
        fn test_undeclared_placeholder_rejected() {
            let mut registry = Registry::new();
            let err = registry
                .define("row-by-text", Strategy::css("div[role=\"row\"]:has-text(\"{text}\")"))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { parameter, .. } if parameter == "text"));
        }
    }

    mod resolve_tests {
        use super::*;

        fn registry() -> Registry {
            let mut r = Registry::new();
            r.define_with(
                "row-by-text",
                Strategy::css("div[role=\"row\"]:has-text(\"{text}\")"),
                vec![ParamSpec::free_text("text")],
            )
            .unwrap();
            r.define_with(
                "option-by-name",
                Strategy::role("option", "{name}"),
                vec![ParamSpec::free_text("name")],
            )
            .unwrap();
            r.define_with(
                "filter-checkbox",
                Strategy::css("input[name=\"{kind}\"]"),
                vec![ParamSpec::identifier("kind")],
            )
            .unwrap();
            r
        }

        #[test]
        fn test_resolution_is_deterministic() {
            let r = registry();
            let params = Params::one("text", "Acme Lofts");
            let a = r.resolve("row-by-text", &params).unwrap();
            let b = r.resolve("row-by-text", &params).unwrap();
            assert_eq!(a.selector_text(), b.selector_text());
        }

        #[test]
        fn test_substitution() {
            let r = registry();
            let q = r
                .resolve("row-by-text", &Params::one("text", "Acme Lofts"))
                .unwrap();
            assert_eq!(
                q.selector_text(),
                "css=div[role=\"row\"]:has-text(\"Acme Lofts\")"
            );
        }

        #[test]
        fn test_missing_parameter() {
            let r = registry();
            let err = r.resolve("row-by-text", &Params::none()).unwrap_err();
            assert!(matches!(err, Error::MissingParameter { parameter, .. } if parameter == "text"));
        }

        #[test]
        fn test_free_text_rejects_quotes() {
            let r = registry();
            let err = r
                .resolve("row-by-text", &Params::one("text", "Acme\" , p"))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { .. }));
        }

        #[test]
        fn test_identifier_rejects_css_metacharacters() {
            let r = registry();
            let err = r
                .resolve("filter-checkbox", &Params::one("kind", "garden]:hover"))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { .. }));
        }

        #[test]
        fn test_identifier_accepts_normalized_type() {
            let r = registry();
            let q = r
                .resolve("filter-checkbox", &Params::one("kind", "garden_style"))
                .unwrap();
            assert_eq!(q.selector_text(), "css=input[name=\"garden_style\"]");
        }

        #[test]
        fn test_role_resolution() {
            let r = registry();
            let q = r
                .resolve("option-by-name", &Params::one("name", "Garden Style"))
                .unwrap();
            assert_eq!(q.selector_text(), "role=option[name=\"Garden Style\"]");
        }

        #[test]
        fn test_unknown_descriptor() {
            let r = registry();
            assert!(r.resolve("does-not-exist", &Params::none()).is_err());
        }
    }

    mod composed_tests {
        use super::*;

        #[test]
        fn test_child_query_is_scoped_to_parent() {
            let mut r = Registry::new();
            r.define("reset-modal", Strategy::css("section[role=\"dialog\"]"))
                .unwrap();
            r.define_child(
                "reset-confirm",
                "reset-modal",
                Strategy::css("button:has-text(\"Reset Table\")"),
            )
            .unwrap();
            let q = r.query("reset-confirm").unwrap();
            assert_eq!(q.segments().len(), 2);
            assert_eq!(
                q.selector_text(),
                "css=section[role=\"dialog\"] >> css=button:has-text(\"Reset Table\")"
            );
            let parent = q.parent_scope().unwrap();
            assert_eq!(parent.selector_text(), "css=section[role=\"dialog\"]");
        }

        #[test]
        fn test_single_segment_has_no_parent_scope() {
            let q = Query::css("button");
            assert!(q.parent_scope().is_none());
        }

        #[test]
        fn test_child_requires_defined_parent() {
            let mut r = Registry::new();
            let err = r
                .define_child("reset-confirm", "reset-modal", Strategy::css("button"))
                .unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidParameter { parameter, .. } if parameter == "reset-modal"
            ));
        }

        // A mutually scoped pair cannot be registered, so every resolvable
        // chain is finite.
        #[test]
        fn test_cyclic_parent_chain_cannot_be_defined() {
            let mut r = Registry::new();
            assert!(r.define_child("a", "b", Strategy::css(".a")).is_err());
            assert!(r.define_child("b", "a", Strategy::css(".b")).is_err());

            r.define("b", Strategy::css(".b")).unwrap();
            r.define_child("a", "b", Strategy::css(".a")).unwrap();
            let q = r.query("a").unwrap();
            assert_eq!(q.selector_text(), "css=.b >> css=.a");
        }

        #[test]
        fn test_descriptor_cannot_scope_to_itself() {
            let mut r = Registry::new();
            let err = r
                .define_child("row", "row", Strategy::css("div[role=\"row\"]"))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { .. }));
        }
    }

    mod js_rendering_tests {
        use super::*;

        #[test]
        fn test_css_count_query() {
            let q = Query::css("button.primary");
            let js = q.to_js_count();
            assert!(js.contains("querySelectorAll"));
            assert!(js.contains("button.primary"));
            assert!(js.ends_with(".length"));
        }

        #[test]
        fn test_has_text_filter_rendering() {
            let q = Query::css("div[role=\"row\"]:has-text(\"Total\")");
            let js = q.to_js_first();
            assert!(js.contains("filter"));
            assert!(js.contains("textContent.includes(\"Total\")"));
        }

        #[test]
        fn test_text_query_matches_by_content() {
            let q = Query::text("Current Contract");
            assert_eq!(q.selector_text(), "text=Current Contract");
            let js = q.to_js_count();
            assert!(js.contains("querySelectorAll('*')"));
            assert!(js.contains("textContent.includes(\"Current Contract\")"));
        }

        #[test]
        fn test_xpath_rendering_uses_document_evaluate() {
            let mut r = Registry::new();
            r.define_with(
                "stat-value",
                Strategy::xpath("//*[text()=\"{label}\"]/following-sibling::p"),
                vec![ParamSpec::free_text("label")],
            )
            .unwrap();
            let q = r
                .resolve("stat-value", &Params::one("label", "Contract Remaining"))
                .unwrap();
            assert_eq!(
                q.selector_text(),
                "xpath=//*[text()=\"Contract Remaining\"]/following-sibling::p"
            );
            assert!(q.to_js_first().contains("document.evaluate"));
        }

        #[test]
        fn test_scoped_query_nests_scopes() {
            let mut r = Registry::new();
            r.define("drawer", Strategy::css(".mantine-Drawer-body")).unwrap();
            r.define_child("drawer-search", "drawer", Strategy::css("input")).unwrap();
            let js = r.query("drawer-search").unwrap().to_js_count();
            assert!(js.contains("flatMap"));
            assert!(js.contains(".mantine-Drawer-body"));
        }
    }

    mod proptest_determinism {
        // proptest's prelude exports its own `Strategy` trait; import the
        // registry types by name to keep the two from colliding.
        use super::{ParamSpec, Params, Registry, Strategy};
        use proptest::prelude::*;

        proptest! {
            // Resolving the same descriptor with the same parameters always
            // yields identical selector text, for any safe free-text value.
            #[test]
            fn resolve_is_idempotent(text in "[A-Za-z0-9 _.-]{1,24}") {
                let mut r = Registry::new();
                r.define_with(
                    "row",
                    Strategy::css("div[role=\"row\"]:has-text(\"{text}\")"),
                    vec![ParamSpec::free_text("text")],
                ).unwrap();
                let params = Params::one("text", text);
                let a = r.resolve("row", &params).unwrap().selector_text();
                let b = r.resolve("row", &params).unwrap().selector_text();
                prop_assert_eq!(a, b);
            }
        }
    }
}
