use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;

use crate::calculator::ScalarConfig;
use crate::calculator::types::{
    DEFAULT_DA_FACTOR, DEFAULT_MAX_SCALAR, DEFAULT_MIN_SCALAR, DEFAULT_SAFETY_MARGIN,
    DEFAULT_UPDATE_THRESHOLD_PERCENT,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Operator private key. Never printed.
#[derive(Clone)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

/// Where the fee token's USD price comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum TargetPriceConfig {
    /// Fixed price, for tokens without a market yet.
    Fixed { symbol: String, usd_price: f64 },
    /// Same ticker service as the reference asset.
    Ticker { symbol: String },
}

impl TargetPriceConfig {
    pub fn symbol(&self) -> &str {
        match self {
            TargetPriceConfig::Fixed { symbol, .. } | TargetPriceConfig::Ticker { symbol } => {
                symbol
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// L1 JSON-RPC endpoint.
    pub rpc_url: String,

    /// Key of the `SystemConfig` owner.
    pub operator_key: SecretKey,

    pub system_config_address: Address,

    /// Formula and gate parameters.
    pub scalar: ScalarConfig,

    /// Time between cycle starts. A long cycle delays the next one.
    pub check_interval: Duration,

    // =========================
    // Prices
    // =========================
    /// Base URL of the Binance-compatible ticker API.
    pub price_api_url: String,

    /// Trading pair quoting the L1 gas asset in USD.
    pub reference_symbol: String,

    pub target_price: TargetPriceConfig,

    // =========================
    // Chain
    // =========================
    /// When set, signing refuses any other chain id.
    pub chain_id: Option<u64>,

    /// Upper bound on the inclusion wait, enforced by the chain client.
    pub confirmation_timeout: Duration,

    /// `false` ends each attempt right after broadcast.
    pub wait_for_confirmation: bool,

    // =========================
    // Observability
    // =========================
    /// Metrics listener; `None` disables the endpoint.
    pub metrics_addr: Option<SocketAddr>,

    /// JSON log layout (production) instead of pretty output.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rpc_url = get("L1_RPC_URL").ok_or(ConfigError::Missing("L1_RPC_URL"))?;
        let operator_key = get("OPERATOR_PRIVATE_KEY")
            .map(SecretKey)
            .ok_or(ConfigError::Missing("OPERATOR_PRIVATE_KEY"))?;
        let system_config_address: Address = parse_required(&get, "SYSTEM_CONFIG_ADDRESS")?;

        let da_factor = match get("DA_FACTOR") {
            Some(v) if matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "none") => None,
            Some(v) => Some(parse_value("DA_FACTOR", &v)?),
            None => Some(DEFAULT_DA_FACTOR),
        };

        let scalar = ScalarConfig {
            da_factor,
            safety_margin: parse_or(&get, "SAFETY_MARGIN", DEFAULT_SAFETY_MARGIN)?,
            update_threshold_percent: parse_or(
                &get,
                "UPDATE_THRESHOLD",
                DEFAULT_UPDATE_THRESHOLD_PERCENT,
            )?,
            min_scalar: parse_or(&get, "MIN_SCALAR", DEFAULT_MIN_SCALAR)?,
            max_scalar: parse_or(&get, "MAX_SCALAR", DEFAULT_MAX_SCALAR)?,
        };
        validate_scalar(&scalar)?;

        let check_interval_secs: u64 = parse_or(&get, "CHECK_INTERVAL", 30)?;
        if check_interval_secs == 0 {
            return Err(invalid("CHECK_INTERVAL", "0", "must be at least 1 second"));
        }

        let target_price = match get("TOKEN_PRICE_SYMBOL") {
            Some(symbol) => TargetPriceConfig::Ticker { symbol },
            None => {
                let usd_price: f64 = parse_or(&get, "TOKEN_PRICE_USD", 0.5)?;
                if !(usd_price.is_finite() && usd_price > 0.0) {
                    return Err(invalid(
                        "TOKEN_PRICE_USD",
                        &usd_price.to_string(),
                        "must be a positive number",
                    ));
                }
                TargetPriceConfig::Fixed {
                    symbol: get("TOKEN_SYMBOL").unwrap_or_else(|| "TOKEN".to_string()),
                    usd_price,
                }
            }
        };

        let metrics_addr = match get("METRICS_ADDR") {
            Some(v) if v.trim().eq_ignore_ascii_case("off") => None,
            Some(v) => Some(parse_value("METRICS_ADDR", &v)?),
            None => Some(SocketAddr::from(([0, 0, 0, 0], 2112))),
        };

        Ok(Self {
            rpc_url,
            operator_key,
            system_config_address,
            scalar,
            check_interval: Duration::from_secs(check_interval_secs),
            price_api_url: get("PRICE_API_URL")
                .unwrap_or_else(|| "https://api.binance.com".to_string()),
            reference_symbol: get("REFERENCE_SYMBOL").unwrap_or_else(|| "ETHUSDT".to_string()),
            target_price,
            chain_id: get("CHAIN_ID")
                .map(|v| parse_value("CHAIN_ID", &v))
                .transpose()?,
            confirmation_timeout: Duration::from_secs(parse_or(&get, "CONFIRMATION_TIMEOUT", 120)?),
            wait_for_confirmation: parse_bool_or(&get, "WAIT_FOR_CONFIRMATION", true)?,
            metrics_addr,
            json_logs: get("APP_ENV").is_some_and(|v| v == "production"),
        })
    }
}

fn validate_scalar(c: &ScalarConfig) -> Result<(), ConfigError> {
    let positive = |v: f64| v.is_finite() && v > 0.0;

    if let Some(da) = c.da_factor {
        if !positive(da) {
            return Err(invalid("DA_FACTOR", &da.to_string(), "must be a positive number"));
        }
    }
    if !positive(c.safety_margin) {
        return Err(invalid(
            "SAFETY_MARGIN",
            &c.safety_margin.to_string(),
            "must be a positive number",
        ));
    }
    if !(c.update_threshold_percent.is_finite() && c.update_threshold_percent >= 0.0) {
        return Err(invalid(
            "UPDATE_THRESHOLD",
            &c.update_threshold_percent.to_string(),
            "must be a non-negative number",
        ));
    }
    if c.min_scalar == 0 {
        return Err(invalid("MIN_SCALAR", "0", "must be positive"));
    }
    if c.min_scalar > c.max_scalar {
        return Err(invalid(
            "MAX_SCALAR",
            &c.max_scalar.to_string(),
            &format!("must not be below MIN_SCALAR ({})", c.min_scalar),
        ));
    }
    Ok(())
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| invalid(key, raw, &e.to_string()))
}

fn parse_required<T, G>(get: &G, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key).ok_or(ConfigError::Missing(key))?;
    parse_value(key, &raw)
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_bool_or<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(key, &v, "expected a boolean")),
        },
    }
}
