use crate::numeric::{Coin, Ratio, SignedCoin};
use crate::{MakerError, ATTO_MAGE_DENOM, DEFAULT_BLOCKS_PER_YEAR, MICRO_USW_DENOM};
use candid::{CandidType, Principal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKING_RATIO: Ratio = Ratio::new(dec!(1));
pub const DEFAULT_MINT_PRICE_BIAS: Ratio = Ratio::new(dec!(0.01));
pub const DEFAULT_BURN_PRICE_BIAS: Ratio = Ratio::new(dec!(0.01));
pub const DEFAULT_REBACK_BONUS: Ratio = Ratio::new(dec!(0.0075));
pub const DEFAULT_LIQUIDATION_COMMISSION_FEE: Ratio = Ratio::new(dec!(0.1));

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Share of newly minted value that must be covered by backing coins.
    /// Only the end-of-block adjustment changes it.
    pub backing_ratio: Ratio,
    pub mint_price_bias: Ratio,
    pub burn_price_bias: Ratio,
    pub reback_bonus: Ratio,
    pub liquidation_commission_fee: Ratio,
    pub blocks_per_year: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            backing_ratio: DEFAULT_BACKING_RATIO,
            mint_price_bias: DEFAULT_MINT_PRICE_BIAS,
            burn_price_bias: DEFAULT_BURN_PRICE_BIAS,
            reback_bonus: DEFAULT_REBACK_BONUS,
            liquidation_commission_fee: DEFAULT_LIQUIDATION_COMMISSION_FEE,
            blocks_per_year: DEFAULT_BLOCKS_PER_YEAR,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), MakerError> {
        check_non_negative("backing_ratio", self.backing_ratio)?;
        check_fraction("mint_price_bias", self.mint_price_bias)?;
        check_fraction("burn_price_bias", self.burn_price_bias)?;
        check_non_negative("reback_bonus", self.reback_bonus)?;
        check_fraction("liquidation_commission_fee", self.liquidation_commission_fee)?;
        if self.blocks_per_year == 0 {
            return Err(MakerError::InvalidParams(
                "blocks_per_year must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingRiskParams {
    pub backing_denom: String,
    pub enabled: bool,
    pub max_backing: Option<u128>,
    pub max_war_mint: Option<u128>,
    pub mint_fee: Option<Ratio>,
    pub burn_fee: Option<Ratio>,
    pub buyback_fee: Option<Ratio>,
    pub reback_fee: Option<Ratio>,
}

impl BackingRiskParams {
    /// Fee rates are fractions strictly below one: the burn and buyback
    /// formulas divide by `1 - rate`.
    pub fn validate(&self) -> Result<(), MakerError> {
        check_denom(&self.backing_denom)?;
        for (name, rate) in [
            ("mint_fee", self.mint_fee),
            ("burn_fee", self.burn_fee),
            ("buyback_fee", self.buyback_fee),
            ("reback_fee", self.reback_fee),
        ] {
            if let Some(rate) = rate {
                check_fraction(name, rate)?;
            }
        }
        Ok(())
    }
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralRiskParams {
    pub collateral_denom: String,
    pub enabled: bool,
    pub max_collateral: Option<u128>,
    pub max_war_mint: Option<u128>,
    pub liquidation_threshold: Ratio,
    /// Maximum loan-to-value, reached once the catalytic ratio is saturated.
    pub loan_to_value: Ratio,
    pub basic_loan_to_value: Ratio,
    pub catalytic_mage_ratio: Ratio,
    pub liquidation_fee: Ratio,
    pub mint_fee: Option<Ratio>,
    /// Annual rate charged on principal debt.
    pub interest_fee: Ratio,
}

impl CollateralRiskParams {
    pub fn validate(&self) -> Result<(), MakerError> {
        check_denom(&self.collateral_denom)?;
        check_fraction("liquidation_fee", self.liquidation_fee)?;
        check_non_negative("interest_fee", self.interest_fee)?;
        check_non_negative("catalytic_mage_ratio", self.catalytic_mage_ratio)?;
        if let Some(rate) = self.mint_fee {
            check_fraction("mint_fee", rate)?;
        }
        if self.basic_loan_to_value.0 < Decimal::ZERO
            || self.basic_loan_to_value > self.loan_to_value
            || self.loan_to_value > Ratio::ONE
        {
            return Err(MakerError::InvalidParams(format!(
                "loan to value must satisfy 0 <= basic ({}) <= max ({}) <= 1",
                self.basic_loan_to_value, self.loan_to_value
            )));
        }
        if self.liquidation_threshold.0 <= Decimal::ZERO || self.liquidation_threshold > Ratio::ONE {
            return Err(MakerError::InvalidParams(format!(
                "liquidation_threshold must be in (0, 1], got {}",
                self.liquidation_threshold
            )));
        }
        Ok(())
    }
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBacking {
    pub backing: Coin,
    pub war_minted: SignedCoin,
    pub mage_burned: SignedCoin,
}

impl PoolBacking {
    pub fn new(backing_denom: &str) -> Self {
        Self {
            backing: Coin::zero(backing_denom),
            war_minted: SignedCoin::zero(MICRO_USW_DENOM),
            mage_burned: SignedCoin::zero(ATTO_MAGE_DENOM),
        }
    }
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalBacking {
    /// Oracle value of all backing pools. Only filled in by queries.
    pub backing_value: u128,
    pub war_minted: SignedCoin,
    pub mage_burned: SignedCoin,
}

impl Default for TotalBacking {
    fn default() -> Self {
        Self {
            backing_value: 0,
            war_minted: SignedCoin::zero(MICRO_USW_DENOM),
            mage_burned: SignedCoin::zero(ATTO_MAGE_DENOM),
        }
    }
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCollateral {
    pub collateral: Coin,
    pub war_debt: Coin,
    pub mage_collateralized: Coin,
}

impl PoolCollateral {
    pub fn new(collateral_denom: &str) -> Self {
        Self {
            collateral: Coin::zero(collateral_denom),
            war_debt: Coin::zero(MICRO_USW_DENOM),
            mage_collateralized: Coin::zero(ATTO_MAGE_DENOM),
        }
    }
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCollateral {
    pub war_debt: Coin,
    pub mage_collateralized: Coin,
}

impl Default for TotalCollateral {
    fn default() -> Self {
        Self {
            war_debt: Coin::zero(MICRO_USW_DENOM),
            mage_collateralized: Coin::zero(ATTO_MAGE_DENOM),
        }
    }
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCollateral {
    pub account: Principal,
    pub collateral: Coin,
    /// Principal plus accrued interest.
    pub war_debt: Coin,
    pub mage_collateralized: Coin,
    /// Accrued interest not yet repaid; part of `war_debt`.
    pub last_interest: Coin,
    pub last_settlement_block: u64,
}

impl AccountCollateral {
    pub fn new(account: Principal, collateral_denom: &str, block_height: u64) -> Self {
        Self {
            account,
            collateral: Coin::zero(collateral_denom),
            war_debt: Coin::zero(MICRO_USW_DENOM),
            mage_collateralized: Coin::zero(ATTO_MAGE_DENOM),
            last_interest: Coin::zero(MICRO_USW_DENOM),
            last_settlement_block: block_height,
        }
    }
}

fn check_denom(denom: &str) -> Result<(), MakerError> {
    if denom.is_empty() || denom == MICRO_USW_DENOM || denom == ATTO_MAGE_DENOM {
        return Err(MakerError::InvalidParams(format!(
            "invalid risk asset denomination: '{}'",
            denom
        )));
    }
    Ok(())
}

fn check_non_negative(name: &str, rate: Ratio) -> Result<(), MakerError> {
    if rate.0.is_sign_negative() && !rate.is_zero() {
        return Err(MakerError::InvalidParams(format!(
            "{} must not be negative, got {}",
            name, rate
        )));
    }
    Ok(())
}

fn check_fraction(name: &str, rate: Ratio) -> Result<(), MakerError> {
    check_non_negative(name, rate)?;
    if rate >= Ratio::ONE {
        return Err(MakerError::InvalidParams(format!(
            "{} must be below 1, got {}",
            name, rate
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn usdc() -> BackingRiskParams {
        BackingRiskParams {
            backing_denom: "uusdc".to_string(),
            enabled: true,
            max_backing: None,
            max_war_mint: None,
            mint_fee: Some(Ratio::new(dec!(0.005))),
            burn_fee: Some(Ratio::new(dec!(0.005))),
            buyback_fee: None,
            reback_fee: None,
        }
    }

    #[test]
    fn should_reject_full_burn_fee() {
        let params = BackingRiskParams {
            burn_fee: Some(Ratio::ONE),
            ..usdc()
        };
        assert_matches!(params.validate(), Err(MakerError::InvalidParams(_)));
        assert_eq!(usdc().validate(), Ok(()));
    }

    #[test]
    fn should_reject_stable_denom_as_backing() {
        let params = BackingRiskParams {
            backing_denom: MICRO_USW_DENOM.to_string(),
            ..usdc()
        };
        assert_matches!(params.validate(), Err(MakerError::InvalidParams(_)));
    }

    #[test]
    fn should_order_loan_to_values() {
        let params = CollateralRiskParams {
            collateral_denom: "uatom".to_string(),
            enabled: true,
            max_collateral: None,
            max_war_mint: None,
            liquidation_threshold: Ratio::new(dec!(0.9)),
            loan_to_value: Ratio::new(dec!(0.5)),
            basic_loan_to_value: Ratio::new(dec!(0.8)),
            catalytic_mage_ratio: Ratio::new(dec!(0.05)),
            liquidation_fee: Ratio::new(dec!(0.1)),
            mint_fee: None,
            interest_fee: Ratio::new(dec!(0.04)),
        };
        assert_matches!(params.validate(), Err(MakerError::InvalidParams(_)));
    }

    #[test]
    fn default_params_are_valid() {
        assert_eq!(Params::default().validate(), Ok(()));
    }
}
