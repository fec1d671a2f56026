use candid::CandidType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleError {
    pub denom: String,
    pub reason: String,
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exchange rate unavailable for {}: {}", self.denom, self.reason)
    }
}

/// Source of USD-per-base-unit prices.
pub trait PriceOracle {
    fn exchange_rate(&self, denom: &str) -> Result<Decimal, OracleError>;
}

/// Fixed price table, set by whoever drives the engine.
#[derive(Clone, Debug, Default)]
pub struct PriceTable {
    rates: BTreeMap<String, Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, denom: &str, rate: Decimal) -> Self {
        self.set_rate(denom, rate);
        self
    }

    pub fn set_rate(&mut self, denom: &str, rate: Decimal) {
        self.rates.insert(denom.to_string(), rate);
    }

    pub fn remove_rate(&mut self, denom: &str) -> Option<Decimal> {
        self.rates.remove(denom)
    }
}

impl PriceOracle for PriceTable {
    fn exchange_rate(&self, denom: &str) -> Result<Decimal, OracleError> {
        self.rates.get(denom).copied().ok_or_else(|| OracleError {
            denom: denom.to_string(),
            reason: "no exchange rate".to_string(),
        })
    }
}
