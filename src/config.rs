//! Server configuration.
//!
//! Resolved once at startup from the environment and then passed into the request handlers, so
//! no handler reads environment variables.

use anyhow::Context;
use scroll_uuid::SearchConfig;

const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_PAGE: usize = 100;

/// Configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    rest_addr: String,
    max_page: usize,
    search: SearchConfig,
}

impl ServerConfig {
    pub fn new(rest_addr: String, max_page: usize, search: SearchConfig) -> anyhow::Result<Self> {
        if max_page == 0 {
            anyhow::bail!("UUID_SCROLL_MAX_PAGE must be at least 1");
        }
        Ok(Self {
            rest_addr,
            max_page,
            search,
        })
    }

    /// Reads the configuration from the environment.
    ///
    /// # Environment Variables
    /// - `UUID_SCROLL_REST_ADDR`: listen address (default: "0.0.0.0:3000")
    /// - `UUID_SCROLL_MAX_PAGE`: largest page a client may request (default: 100)
    /// - `UUID_SCROLL_MAX_SCAN`: cap on indexes scanned for one and two character queries
    ///   (default: unbounded)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let rest_addr =
            lookup("UUID_SCROLL_REST_ADDR").unwrap_or_else(|| DEFAULT_REST_ADDR.into());

        let max_page = match lookup("UUID_SCROLL_MAX_PAGE") {
            Some(value) => value
                .parse()
                .with_context(|| format!("invalid UUID_SCROLL_MAX_PAGE: '{}'", value))?,
            None => DEFAULT_MAX_PAGE,
        };

        let max_scan = lookup("UUID_SCROLL_MAX_SCAN")
            .map(|value| {
                value
                    .parse::<u64>()
                    .with_context(|| format!("invalid UUID_SCROLL_MAX_SCAN: '{}'", value))
            })
            .transpose()?;

        Self::new(rest_addr, max_page, SearchConfig { max_scan })
    }

    pub fn rest_addr(&self) -> &str {
        &self.rest_addr
    }

    pub fn max_page(&self) -> usize {
        self.max_page
    }

    pub fn search(&self) -> &SearchConfig {
        &self.search
    }
}
