use candid::CandidType;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::LedgerError;
use crate::numeric::{Coin, SignedCoin};
use crate::oracle::OracleError;

pub mod backing;
pub mod backing_ops;
pub mod collateral;
pub mod collateral_ops;
pub mod event;
pub mod fees;
pub mod keeper;
pub mod ledger;
pub mod logs;
pub mod msgs;
pub mod numeric;
pub mod oracle;
pub mod query;
pub mod state;
pub mod storage;
pub mod types;

#[cfg(test)]
pub mod test_helpers;


pub use keeper::{BackingRatioAdjuster, BackingRatioInput, Keeper, KeeperConfig};

/// Base unit of the stable token.
pub const MICRO_USW_DENOM: &str = "uusw";
/// Base unit of the native token.
pub const ATTO_MAGE_DENOM: &str = "amage";
/// Peg of one `uusw` expressed in oracle price units.
pub const MICRO_USW_TARGET: Decimal = dec!(1);

pub const MODULE_ACCOUNT: &str = "maker";
pub const FEE_COLLECTOR: &str = "oracle";

pub const DEFAULT_BLOCKS_PER_YEAR: u64 = 6_311_520;

#[derive(CandidType, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MakerError {
    BackingCoinNotFound(String),
    BackingCoinDisabled(String),
    CollateralCoinNotFound(String),
    CollateralCoinDisabled(String),
    InvalidParams(String),
    InvalidDenom {
        expected: String,
        actual: String,
    },
    Oracle(OracleError),
    WarPriceTooLow {
        price: String,
        lower_bound: String,
    },
    WarPriceTooHigh {
        price: String,
        upper_bound: String,
    },
    OverSlippage {
        actual: Coin,
        limit: Coin,
    },
    WarCeiling {
        minted: SignedCoin,
        ceiling: u128,
    },
    BackingCeiling {
        backing: Coin,
        ceiling: u128,
    },
    CollateralCeiling {
        collateral: Coin,
        ceiling: u128,
    },
    BackingCoinInsufficient {
        requested: String,
        available: String,
    },
    MageCoinInsufficient {
        requested: String,
        available: String,
    },
    CollateralCoinInsufficient {
        requested: Coin,
        available: Coin,
    },
    AccountInsufficientCollateral {
        debt: String,
        max_debt: String,
    },
    AccountNoCollateral(String),
    AccountNoDebt(String),
    NotUndercollateralized {
        debt_value: String,
        liquidation_value: String,
    },
    Ledger(LedgerError),
    ArithmeticOverflow,
    NegativeAmount(String),
}

impl fmt::Display for MakerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackingCoinNotFound(denom) => {
                write!(f, "backing coin denomination not found: {}", denom)
            }
            Self::BackingCoinDisabled(denom) => write!(f, "backing coin disabled: {}", denom),
            Self::CollateralCoinNotFound(denom) => {
                write!(f, "collateral coin denomination not found: {}", denom)
            }
            Self::CollateralCoinDisabled(denom) => write!(f, "collateral coin disabled: {}", denom),
            Self::InvalidParams(reason) => write!(f, "invalid params: {}", reason),
            Self::InvalidDenom { expected, actual } => {
                write!(f, "invalid denomination: expected {}, got {}", expected, actual)
            }
            Self::Oracle(err) => write!(f, "{}", err),
            Self::WarPriceTooLow { price, lower_bound } => write!(
                f,
                "{} price too low: {} < {}",
                MICRO_USW_DENOM, price, lower_bound
            ),
            Self::WarPriceTooHigh { price, upper_bound } => write!(
                f,
                "{} price too high: {} > {}",
                MICRO_USW_DENOM, price, upper_bound
            ),
            Self::OverSlippage { actual, limit } => {
                write!(f, "over slippage: {} exceeds limit {}", actual, limit)
            }
            Self::WarCeiling { minted, ceiling } => {
                write!(f, "war ceiling exceeded: {} > {}", minted, ceiling)
            }
            Self::BackingCeiling { backing, ceiling } => {
                write!(f, "backing ceiling exceeded: {} > {}", backing, ceiling)
            }
            Self::CollateralCeiling {
                collateral,
                ceiling,
            } => write!(f, "collateral ceiling exceeded: {} > {}", collateral, ceiling),
            Self::BackingCoinInsufficient {
                requested,
                available,
            } => write!(
                f,
                "backing coin insufficient: requested {}, available {}",
                requested, available
            ),
            Self::MageCoinInsufficient {
                requested,
                available,
            } => write!(
                f,
                "mage coin insufficient: requested {}, available {}",
                requested, available
            ),
            Self::CollateralCoinInsufficient {
                requested,
                available,
            } => write!(
                f,
                "collateral coin insufficient: requested {}, available {}",
                requested, available
            ),
            Self::AccountInsufficientCollateral { debt, max_debt } => write!(
                f,
                "account has insufficient collateral: debt {} > max debt {}",
                debt, max_debt
            ),
            Self::AccountNoCollateral(denom) => write!(f, "account has no collateral: {}", denom),
            Self::AccountNoDebt(denom) => write!(f, "account has no debt: {}", denom),
            Self::NotUndercollateralized {
                debt_value,
                liquidation_value,
            } => write!(
                f,
                "account not undercollateralized: debt value {} < liquidation value {}",
                debt_value, liquidation_value
            ),
            Self::Ledger(err) => write!(f, "{}", err),
            Self::ArithmeticOverflow => write!(f, "arithmetic overflow"),
            Self::NegativeAmount(value) => write!(f, "negative amount: {}", value),
        }
    }
}

impl std::error::Error for MakerError {}

impl From<OracleError> for MakerError {
    fn from(err: OracleError) -> Self {
        Self::Oracle(err)
    }
}

impl From<LedgerError> for MakerError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}
