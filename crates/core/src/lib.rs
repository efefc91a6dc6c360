pub mod catalog;
pub mod domain;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod time;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub oracle_base_url: Option<String>,
        pub oracle_api_key: Option<String>,
        pub inventory_base_url: Option<String>,
        pub inventory_api_key: Option<String>,
        pub inventory_file: Option<String>,
        pub locations_file: Option<String>,
        pub trend_multipliers_file: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    fn var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                oracle_base_url: var("ORACLE_BASE_URL"),
                oracle_api_key: var("ORACLE_API_KEY"),
                inventory_base_url: var("INVENTORY_BASE_URL"),
                inventory_api_key: var("INVENTORY_API_KEY"),
                inventory_file: var("INVENTORY_FILE"),
                locations_file: var("LOCATIONS_FILE"),
                trend_multipliers_file: var("TREND_MULTIPLIERS_FILE"),
                sentry_dsn: var("SENTRY_DSN"),
            })
        }

        pub fn require_oracle_base_url(&self) -> anyhow::Result<&str> {
            self.oracle_base_url
                .as_deref()
                .context("ORACLE_BASE_URL is required")
        }

        pub fn require_inventory_base_url(&self) -> anyhow::Result<&str> {
            self.inventory_base_url
                .as_deref()
                .context("INVENTORY_BASE_URL is required")
        }
    }

}
