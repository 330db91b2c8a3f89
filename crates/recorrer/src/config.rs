//! Environment-driven suite configuration.
//!
//! URLs default to a local dev server; credentials have no default and
//! must come from the environment, so secrets never live in the repo.

use tracing::debug;

use crate::result::{Error, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Resolved configuration for a suite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Application root URL
    pub base_url: String,
    /// Login page URL
    pub login_url: String,
    /// Post-login landing URL
    pub dashboard_url: String,
    /// Test-account email
    pub email: String,
    /// Test-account password
    pub password: String,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `BASE_URL`, `LOGIN_URL` and `DASHBOARD_URL` fall back to the local
    /// dev server; `TEST_EMAIL` and `TEST_PASSWORD` are required.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the missing credential variable.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let login_url =
            std::env::var("LOGIN_URL").unwrap_or_else(|_| format!("{base_url}/login"));
        let dashboard_url =
            std::env::var("DASHBOARD_URL").unwrap_or_else(|_| format!("{base_url}/dashboard"));
        let email = required("TEST_EMAIL")?;
        let password = required("TEST_PASSWORD")?;
        debug!(%base_url, %login_url, "configuration loaded");
        Ok(Self {
            base_url,
            login_url,
            dashboard_url,
            email,
            password,
        })
    }

    /// A configuration for driving the simulated page in tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            base_url: "https://app.example.com".to_string(),
            login_url: "https://app.example.com/login".to_string(),
            dashboard_url: "https://app.example.com/dashboard".to_string(),
            email: "qa@example.com".to_string(),
            password: "hunter2!".to_string(),
        }
    }
}

fn required(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| Error::Config {
        message: format!("environment variable {var} is not set"),
    })
}

/// Initialize tracing with `RUST_LOG`-style filtering. Safe to call more
/// than once; later calls are no-ops.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_testing_config_is_self_consistent() {
        let config = Config::for_testing();
        assert!(config.login_url.starts_with(&config.base_url));
        assert!(config.dashboard_url.starts_with(&config.base_url));
    }

    // from_env is exercised in one test to avoid env-var races between
    // parallel tests: set everything, read once, clean up.
    #[test]
    fn test_from_env_reads_and_defaults() {
        let vars = [
            ("BASE_URL", "https://staging.example.com"),
            ("TEST_EMAIL", "qa@example.com"),
            ("TEST_PASSWORD", "s3cret"),
        ];
        for (k, v) in vars {
            std::env::set_var(k, v);
        }
        std::env::remove_var("LOGIN_URL");
        std::env::remove_var("DASHBOARD_URL");

        let config = Config::from_env().unwrap();
        assert_eq!(config.base_url, "https://staging.example.com");
        assert_eq!(config.login_url, "https://staging.example.com/login");
        assert_eq!(
            config.dashboard_url,
            "https://staging.example.com/dashboard"
        );
        assert_eq!(config.email, "qa@example.com");

        for (k, _) in vars {
            std::env::remove_var(k);
        }
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("TEST_EMAIL"));
    }
}
