//! Workflow configuration.
//!
//! Every knob has a default; `from_env` reads `TRADEFLOW_*` variables and
//! rejects values it cannot parse instead of silently falling back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradeflow_documents::QuotationStatus;
use tradeflow_documents::numbering::DEFAULT_SEQUENCE_MODULUS;

pub const ENV_CONVERTIBLE_QUOTATION_STATUSES: &str = "TRADEFLOW_CONVERTIBLE_QUOTATION_STATUSES";
pub const ENV_ACCEPT_QUOTATION_ON_CONVERSION: &str = "TRADEFLOW_ACCEPT_QUOTATION_ON_CONVERSION";
pub const ENV_KEEP_PURCHASE_PRICES: &str = "TRADEFLOW_KEEP_PURCHASE_PRICES";
pub const ENV_SEQUENCE_MODULUS: &str = "TRADEFLOW_SEQUENCE_MODULUS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Quotation statuses from which a sales order may be created.
    pub convertible_quotation_statuses: Vec<QuotationStatus>,
    /// Move the quotation to `accepted` when it is converted.
    pub accept_quotation_on_conversion: bool,
    /// Copy sales prices onto purchase orders instead of zeroing them.
    pub keep_purchase_prices: bool,
    /// Range of the sequence part of document numbers.
    pub sequence_modulus: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            convertible_quotation_statuses: vec![QuotationStatus::Draft, QuotationStatus::Sent],
            accept_quotation_on_conversion: true,
            keep_purchase_prices: false,
            sequence_modulus: DEFAULT_SEQUENCE_MODULUS,
        }
    }
}

impl WorkflowConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CONVERTIBLE_QUOTATION_STATUSES) {
            config.convertible_quotation_statuses = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<QuotationStatus>()
                        .map_err(|e| invalid(ENV_CONVERTIBLE_QUOTATION_STATUSES, &raw, e))
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(raw) = lookup(ENV_ACCEPT_QUOTATION_ON_CONVERSION) {
            config.accept_quotation_on_conversion = parse_bool(ENV_ACCEPT_QUOTATION_ON_CONVERSION, &raw)?;
        }
        if let Some(raw) = lookup(ENV_KEEP_PURCHASE_PRICES) {
            config.keep_purchase_prices = parse_bool(ENV_KEEP_PURCHASE_PRICES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SEQUENCE_MODULUS) {
            let modulus: u32 = raw
                .trim()
                .parse()
                .map_err(|e| invalid(ENV_SEQUENCE_MODULUS, &raw, e))?;
            if modulus == 0 {
                return Err(invalid(ENV_SEQUENCE_MODULUS, &raw, "must be positive"));
            }
            config.sequence_modulus = modulus;
        }

        Ok(config)
    }

    pub fn is_convertible(&self, status: QuotationStatus) -> bool {
        self.convertible_quotation_statuses.contains(&status)
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw, "expected a boolean")),
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
