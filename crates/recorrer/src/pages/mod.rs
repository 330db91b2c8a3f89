//! Page objects: per-screen locator catalogs plus named business flows.
//!
//! Each page object builds its own [`crate::registry::Registry`] at
//! construction and exposes flows that take an explicit
//! [`crate::action::Actions`] handle. Nothing here touches ambient state,
//! so the same page object can drive parallel isolated sessions.

pub mod financials;
pub mod invoices;
pub mod login;
pub mod nav;
pub mod organization;
pub mod projects;
pub mod properties;

pub use financials::FinancialsCategoryPage;
pub use invoices::{InvoiceStats, InvoicesPage};
pub use login::LoginPage;
pub use nav::NavPanel;
pub use organization::OrganizationPage;
pub use projects::ProjectsPage;
pub use properties::PropertiesPage;
