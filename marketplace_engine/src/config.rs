use std::env;

use log::*;
use mkt_common::parse_boolean_flag;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/marketplace.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ORDER_PROCESSED_NOTICE: &str =
    "Order has been processed successfully. You can now discuss delivery details.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketplaceConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// When true, cancelling or refunding a confirmed order gives its reserved unit back to the product, and buyers
    /// may cancel confirmed orders. When false, only pending orders can be cancelled.
    pub release_on_cancel: bool,
    /// Post "joined"/"left" system messages when the membership of a conversation changes.
    pub participant_notices: bool,
    /// The system message posted into the buyer/seller conversation when an order is processed.
    pub order_processed_notice: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            release_on_cancel: true,
            participant_notices: true,
            order_processed_notice: DEFAULT_ORDER_PROCESSED_NOTICE.to_string(),
        }
    }
}

impl MarketplaceConfig {
    /// Loads `.env` (if there is one) and then reads the configuration from the environment.
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => info!("🪛️ Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("🪛️ No .env file found"),
            Err(e) => warn!("🪛️ Could not read the .env file. {e}"),
        }
        Self::from_env_or_default()
    }

    pub fn from_env_or_default() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Missing or invalid values fall back to the defaults.
    pub fn from_vars<F>(var: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let database_url = var("MKT_DATABASE_URL").unwrap_or_else(|| {
            info!("🪛️ MKT_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = var("MKT_MAX_CONNECTIONS")
            .map(|s| match s.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    error!(
                        "🪛️ {s} is not a valid value for MKT_MAX_CONNECTIONS. Using the default, \
                         {DEFAULT_MAX_CONNECTIONS}, instead."
                    );
                    DEFAULT_MAX_CONNECTIONS
                },
            })
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let release_on_cancel = boolean_var(&var, "MKT_RELEASE_ON_CANCEL", true);
        let participant_notices = boolean_var(&var, "MKT_PARTICIPANT_NOTICES", true);
        let order_processed_notice = var("MKT_ORDER_PROCESSED_NOTICE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ORDER_PROCESSED_NOTICE.to_string());
        Self { database_url, max_connections, release_on_cancel, participant_notices, order_processed_notice }
    }
}

fn boolean_var<F>(var: &F, name: &str, default: bool) -> bool
where F: Fn(&str) -> Option<String> {
    let value = var(name);
    if let Some(s) = &value {
        let s = s.trim().to_ascii_lowercase();
        if !["1", "true", "yes", "on", "0", "false", "no", "off"].contains(&s.as_str()) {
            error!("🪛️ {s} is not a valid value for {name}. Using the default, {default}, instead.");
        }
    }
    parse_boolean_flag(value, default)
}
