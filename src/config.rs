//! Service configuration, read from environment variables with defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use bigdecimal::BigDecimal;

use crate::domain::discount::DiscountRules;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    pub host: String,

    pub port: u16,

    /// Redis connection string. When unset the database is the only cache tier.
    pub redis_url: Option<String>,

    /// With caching off every read goes straight to the store.
    pub cache_enabled: bool,

    /// Lifetime of cached reads, at least one second.
    pub cache_ttl_secs: u64,

    pub discount_category_min_items: i64,

    pub discount_category_rate_percent: u32,

    pub discount_total_min_amount: BigDecimal,

    pub discount_total_rate_percent: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. `lookup` returns `None`
    /// for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = AppConfig {
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| ConfigError::MissingRequired("DATABASE_URL".to_string()))?,

            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: parse_or(&lookup, "PORT", 8080)?,

            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),

            cache_enabled: parse_or(&lookup, "CACHE_ENABLED", true)?,

            cache_ttl_secs: parse_or(&lookup, "CACHE_TTL_SECS", 300)?, // 5 minutes

            discount_category_min_items: parse_or(&lookup, "DISCOUNT_CATEGORY_MIN_ITEMS", 6)?,

            discount_category_rate_percent: parse_or(&lookup, "DISCOUNT_CATEGORY_RATE_PERCENT", 10)?,

            discount_total_min_amount: parse_or(
                &lookup,
                "DISCOUNT_TOTAL_MIN_AMOUNT",
                BigDecimal::from(1000),
            )?,

            discount_total_rate_percent: parse_or(&lookup, "DISCOUNT_TOTAL_RATE_PERCENT", 10)?,
        };

        // A zero TTL would store entries that are already expired.
        if config.cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue("CACHE_TTL_SECS".to_string()));
        }
        if config.discount_category_rate_percent > 100 {
            return Err(ConfigError::InvalidValue(
                "DISCOUNT_CATEGORY_RATE_PERCENT".to_string(),
            ));
        }
        if config.discount_total_rate_percent > 100 {
            return Err(ConfigError::InvalidValue(
                "DISCOUNT_TOTAL_RATE_PERCENT".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn discount_rules(&self) -> DiscountRules {
        DiscountRules {
            category_min_items: self.discount_category_min_items,
            category_rate_percent: self.discount_category_rate_percent,
            total_min_amount: self.discount_total_min_amount.clone(),
            total_rate_percent: self.discount_total_rate_percent,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
