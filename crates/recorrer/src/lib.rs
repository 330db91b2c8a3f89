//! Recorrer: locator-driven browser flow testing for web applications
//!
//! Recorrer (Spanish: "to walk through") drives end-to-end flows against a
//! web application through a small, explicit stack: declarative locators,
//! a bounded wait engine, actionability-gated primitives and composable
//! page flows.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    RECORRER Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenarios  │    │ Page       │    │ Flows +    │            │
//! │   │ + Handoffs │───►│ Objects    │───►│ Actions    │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             │                    │
//! │   ┌────────────┐    ┌────────────┐    ┌─────▼──────┐            │
//! │   │ Locator    │───►│ Wait /     │───►│ PageDriver │            │
//! │   │ Registry   │    │ Resolve    │    │ (cdp/sim)  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every layer takes its dependencies explicitly. There is no ambient
//! page or global session: a [`PageDriver`] is handed to [`Actions`],
//! which page objects borrow for the duration of a flow.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

pub mod action;
pub mod browser;
pub mod config;
pub mod driver;
pub mod export;
pub mod flow;
pub mod pages;
pub mod registry;
pub mod result;
pub mod scenario;
pub mod session;
pub mod sim;
pub mod wait;

pub use action::{Actions, SettlePolicy};
pub use browser::{Browser, BrowserConfig, BrowserPage};
pub use config::Config;
#[cfg(not(target_arch = "wasm32"))]
pub use config::init_tracing;
pub use driver::{ElementState, PageDriver, Probe};
pub use export::{CsvTable, Download};
pub use flow::{click_if_present, Check, Flow, OptionalOutcome};
pub use registry::{ParamKind, ParamSpec, Params, Query, Registry, Segment, Strategy};
pub use result::{Error, Result};
pub use scenario::{plan, unique_name, ScenarioSpec};
pub use session::{HandoffRecord, SessionState};
pub use sim::SimulatedPage;
pub use wait::{
    Condition, ResolvedHandle, UrlPattern, WaitOptions, Waiter, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};
