//! Collateralized debt positions: interest accrual, loan-to-value and the
//! state transitions of deposit, redeem, mint, repay and liquidation.
//!
//! Each `calculate_*` function loads owned copies of the position records,
//! settles interest, applies the operation and returns the updated copies.
//! Nothing is persisted here.

use crate::backing::ensure_denom;
use crate::fees::compute_fee;
use crate::keeper::CollateralRecords;
use crate::ledger::Ledger;
use crate::numeric::{div, mul, round_half_up, truncate, Coin, Ratio, SignedCoin};
use crate::oracle::PriceOracle;
use crate::state::ParamStore;
use crate::types::{AccountCollateral, CollateralRiskParams};
use crate::{Keeper, MakerError, ATTO_MAGE_DENOM, MICRO_USW_DENOM, MICRO_USW_TARGET};
use candid::{CandidType, Principal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRepayment {
    pub repay_in: Coin,
    /// Part of `repay_in` that settles accrued interest.
    pub repay_interest: Coin,
    pub repay_principal: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liquidation {
    /// Stable units the liquidator pays.
    pub repay_in: Coin,
    /// Part of `repay_in` that reduces the debtor's debt.
    pub repay_debt: Coin,
    /// Part of `repay_in` above the outstanding debt, returned to the debtor.
    pub refund: Coin,
    pub collateral_out: Coin,
    pub commission_fee: Coin,
}

/// Accrues interest on principal debt for the blocks elapsed since the last
/// settlement. Settling twice at the same height changes nothing.
pub fn settle_interest_fee(
    records: &mut CollateralRecords,
    apr: Ratio,
    block_height: u64,
    blocks_per_year: u64,
) -> Result<(), MakerError> {
    let period = block_height.saturating_sub(records.account.last_settlement_block);
    if period == 0 {
        return Ok(());
    }
    if blocks_per_year == 0 {
        return Err(MakerError::InvalidParams(
            "blocks_per_year must be positive".to_string(),
        ));
    }

    let principal_debt = records
        .account
        .war_debt
        .checked_sub(records.account.last_interest.amount)?;
    let accrued = mul(mul(principal_debt.to_decimal()?, apr.0)?, Decimal::from(period))?;
    let interest = round_half_up(div(accrued, Decimal::from(blocks_per_year))?)?;

    records.account.last_interest = records.account.last_interest.checked_add(interest)?;
    records.account.war_debt = records.account.war_debt.checked_add(interest)?;
    records.pool.war_debt = records.pool.war_debt.checked_add(interest)?;
    records.total.war_debt = records.total.war_debt.checked_add(interest)?;
    records.account.last_settlement_block = block_height;
    Ok(())
}

/// Loan-to-value usable by a position: co-deposited native token raises it
/// linearly from the basic LTV up to the maximum, saturating at the
/// catalytic ratio cap.
pub fn available_loan_to_value(
    params: &CollateralRiskParams,
    collateral_value: Decimal,
    mage_value: Decimal,
) -> Result<Decimal, MakerError> {
    let basic = params.basic_loan_to_value.0;
    let cap = params.catalytic_mage_ratio.0;
    if cap <= Decimal::ZERO || collateral_value <= Decimal::ZERO {
        return Ok(basic);
    }
    let catalytic_ratio = div(mage_value, collateral_value)?.min(cap);
    Ok(basic + div(mul(catalytic_ratio, params.loan_to_value.0 - basic)?, cap)?)
}

fn withdraw(balance: &Coin, amount: &Coin) -> Result<Coin, MakerError> {
    if balance.amount < amount.amount {
        return Err(MakerError::CollateralCoinInsufficient {
            requested: amount.clone(),
            available: balance.clone(),
        });
    }
    balance.checked_sub(amount.amount)
}

impl<S: ParamStore, O: PriceOracle, L: Ledger> Keeper<S, O, L> {
    fn settled_collateral(
        &self,
        account: &Principal,
        params: &CollateralRiskParams,
        allow_new_account: bool,
    ) -> Result<CollateralRecords, MakerError> {
        let mut records = self.collateral(account, &params.collateral_denom, allow_new_account)?;
        settle_interest_fee(
            &mut records,
            params.interest_fee,
            self.block_height(),
            self.params().blocks_per_year,
        )?;
        Ok(records)
    }

    /// Returns `(available_ltv, max_debt_value)`, both zero when the
    /// position holds no collateral value.
    pub fn max_loan_to_value_for_account(
        &self,
        account: &AccountCollateral,
        params: &CollateralRiskParams,
    ) -> Result<(Decimal, Decimal), MakerError> {
        let collateral_price = self.price(&account.collateral.denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let collateral_value = mul(account.collateral.to_decimal()?, collateral_price)?;
        let mage_value = mul(account.mage_collateralized.to_decimal()?, mage_price)?;
        if collateral_value <= Decimal::ZERO {
            return Ok((Decimal::ZERO, Decimal::ZERO));
        }

        let available_ltv = available_loan_to_value(params, collateral_value, mage_value)?;
        Ok((available_ltv, mul(collateral_value, available_ltv)?))
    }

    pub fn calculate_mint_by_collateral(
        &self,
        account: &Principal,
        collateral_denom: &str,
        mint_out: &Coin,
    ) -> Result<(Coin, CollateralRecords), MakerError> {
        ensure_denom(mint_out, MICRO_USW_DENOM)?;
        let params = self.available_collateral_params(collateral_denom)?;
        let collateral_price = self.price(collateral_denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let mut records = self.settled_collateral(account, &params, false)?;

        let mint_fee = compute_fee(mint_out, params.mint_fee)?;
        let mint_total = mint_out.checked_add(mint_fee.amount)?;

        records.account.war_debt = records.account.war_debt.checked_add(mint_total.amount)?;
        records.pool.war_debt = records.pool.war_debt.checked_add(mint_total.amount)?;
        records.total.war_debt = records.total.war_debt.checked_add(mint_total.amount)?;

        if let Some(ceiling) = params.max_war_mint {
            if records.pool.war_debt.amount > ceiling {
                return Err(MakerError::WarCeiling {
                    minted: SignedCoin::new(
                        MICRO_USW_DENOM,
                        i128::try_from(records.pool.war_debt.amount)
                            .map_err(|_| MakerError::ArithmeticOverflow)?,
                    ),
                    ceiling,
                });
            }
        }

        let collateral_value = mul(records.account.collateral.to_decimal()?, collateral_price)?;
        let mage_value = mul(records.account.mage_collateralized.to_decimal()?, mage_price)?;
        if collateral_value <= Decimal::ZERO {
            return Err(MakerError::AccountInsufficientCollateral {
                debt: records.account.war_debt.to_string(),
                max_debt: Coin::zero(MICRO_USW_DENOM).to_string(),
            });
        }

        let available_ltv = available_loan_to_value(&params, collateral_value, mage_value)?;
        let available_debt_max = truncate(div(mul(collateral_value, available_ltv)?, MICRO_USW_TARGET)?)?;
        if available_debt_max < records.account.war_debt.amount {
            return Err(MakerError::AccountInsufficientCollateral {
                debt: records.account.war_debt.to_string(),
                max_debt: Coin::new(MICRO_USW_DENOM, available_debt_max).to_string(),
            });
        }

        Ok((mint_fee, records))
    }

    /// Adds collateral and co-deposited native token to the receiver's
    /// position, opening it if needed.
    pub fn calculate_deposit_collateral(
        &self,
        receiver: &Principal,
        collateral_in: &Coin,
        mage_in: &Coin,
    ) -> Result<CollateralRecords, MakerError> {
        ensure_denom(mage_in, ATTO_MAGE_DENOM)?;
        let params = self.available_collateral_params(&collateral_in.denom)?;

        let mut records = self.settled_collateral(receiver, &params, true)?;

        records.account.collateral = records.account.collateral.checked_add(collateral_in.amount)?;
        records.pool.collateral = records.pool.collateral.checked_add(collateral_in.amount)?;
        records.account.mage_collateralized =
            records.account.mage_collateralized.checked_add(mage_in.amount)?;
        records.pool.mage_collateralized = records.pool.mage_collateralized.checked_add(mage_in.amount)?;
        records.total.mage_collateralized =
            records.total.mage_collateralized.checked_add(mage_in.amount)?;

        if let Some(ceiling) = params.max_collateral {
            if records.pool.collateral.amount > ceiling {
                return Err(MakerError::CollateralCeiling {
                    collateral: records.pool.collateral.clone(),
                    ceiling,
                });
            }
        }

        Ok(records)
    }

    /// Withdraws collateral and native token as long as the remaining
    /// position still covers its debt.
    pub fn calculate_redeem_collateral(
        &self,
        account: &Principal,
        collateral_out: &Coin,
        mage_out: &Coin,
    ) -> Result<CollateralRecords, MakerError> {
        ensure_denom(mage_out, ATTO_MAGE_DENOM)?;
        let params = self.available_collateral_params(&collateral_out.denom)?;

        let mut records = self.settled_collateral(account, &params, false)?;

        records.account.collateral = withdraw(&records.account.collateral, collateral_out)?;
        records.pool.collateral = withdraw(&records.pool.collateral, collateral_out)?;
        records.account.mage_collateralized = withdraw(&records.account.mage_collateralized, mage_out)?;
        records.pool.mage_collateralized = withdraw(&records.pool.mage_collateralized, mage_out)?;
        records.total.mage_collateralized = withdraw(&records.total.mage_collateralized, mage_out)?;

        let (_, max_debt_value) = self.max_loan_to_value_for_account(&records.account, &params)?;
        let debt_value = mul(records.account.war_debt.to_decimal()?, MICRO_USW_TARGET)?;
        if debt_value > max_debt_value {
            return Err(MakerError::AccountInsufficientCollateral {
                debt: debt_value.to_string(),
                max_debt: max_debt_value.to_string(),
            });
        }

        Ok(records)
    }

    /// Repays up to `repay_in_max` of debt, interest first.
    pub fn calculate_burn_by_collateral(
        &self,
        account: &Principal,
        collateral_denom: &str,
        repay_in_max: &Coin,
    ) -> Result<(DebtRepayment, CollateralRecords), MakerError> {
        ensure_denom(repay_in_max, MICRO_USW_DENOM)?;
        let params = self.available_collateral_params(collateral_denom)?;

        let mut records = self.settled_collateral(account, &params, false)?;
        if records.account.war_debt.is_zero() {
            return Err(MakerError::AccountNoDebt(collateral_denom.to_string()));
        }

        let repay_in = records.account.war_debt.amount.min(repay_in_max.amount);
        let repay_interest = records.account.last_interest.amount.min(repay_in);
        let repay_principal = repay_in - repay_interest;

        records.account.war_debt = records.account.war_debt.checked_sub(repay_in)?;
        records.account.last_interest = records.account.last_interest.checked_sub(repay_interest)?;
        records.pool.war_debt = records.pool.war_debt.checked_sub(repay_in)?;
        records.total.war_debt = records.total.war_debt.checked_sub(repay_in)?;

        Ok((
            DebtRepayment {
                repay_in: Coin::new(MICRO_USW_DENOM, repay_in),
                repay_interest: Coin::new(MICRO_USW_DENOM, repay_interest),
                repay_principal: Coin::new(MICRO_USW_DENOM, repay_principal),
            },
            records,
        ))
    }

    /// Seizes `collateral` from an undercollateralized debtor in exchange for
    /// stable units priced below market by the liquidation fee.
    pub fn calculate_liquidate_collateral(
        &self,
        debtor: &Principal,
        collateral: &Coin,
        repay_in_max: &Coin,
    ) -> Result<(Liquidation, CollateralRecords), MakerError> {
        ensure_denom(repay_in_max, MICRO_USW_DENOM)?;
        let collateral_denom = collateral.denom.as_str();
        let params = self.available_collateral_params(collateral_denom)?;
        let collateral_price = self.price(collateral_denom)?;

        let mut records = self.settled_collateral(debtor, &params, false)?;

        let liquidation_value = mul(
            mul(records.account.collateral.to_decimal()?, collateral_price)?,
            params.liquidation_threshold.0,
        )?;
        let debt_value = mul(records.account.war_debt.to_decimal()?, MICRO_USW_TARGET)?;
        if debt_value < liquidation_value {
            return Err(MakerError::NotUndercollateralized {
                debt_value: debt_value.to_string(),
                liquidation_value: liquidation_value.to_string(),
            });
        }

        if collateral.amount > records.account.collateral.amount {
            return Err(MakerError::CollateralCoinInsufficient {
                requested: collateral.clone(),
                available: records.account.collateral.clone(),
            });
        }

        let liquidation_fee_value = mul(collateral.to_decimal()?, params.liquidation_fee.0)?;
        let commission_fee = Coin::new(
            collateral_denom,
            truncate(mul(liquidation_fee_value, self.params().liquidation_commission_fee.0)?)?,
        );
        let collateral_out = collateral.checked_sub(commission_fee.amount)?;

        let repay_in = Coin::new(
            MICRO_USW_DENOM,
            truncate(div(
                mul(collateral.to_decimal()? - liquidation_fee_value, collateral_price)?,
                MICRO_USW_TARGET,
            )?)?,
        );
        if repay_in.amount > repay_in_max.amount {
            return Err(MakerError::OverSlippage {
                actual: repay_in,
                limit: repay_in_max.clone(),
            });
        }

        let repay_debt = records.account.war_debt.amount.min(repay_in.amount);
        let refund = repay_in.amount - repay_debt;
        let repay_interest = records.account.last_interest.amount.min(repay_debt);

        records.account.last_interest = records.account.last_interest.checked_sub(repay_interest)?;
        records.account.war_debt = records.account.war_debt.checked_sub(repay_debt)?;
        records.pool.war_debt = records.pool.war_debt.checked_sub(repay_debt)?;
        records.total.war_debt = records.total.war_debt.checked_sub(repay_debt)?;
        records.account.collateral = records.account.collateral.checked_sub(collateral.amount)?;
        records.pool.collateral = withdraw(&records.pool.collateral, collateral)?;

        Ok((
            Liquidation {
                repay_in,
                repay_debt: Coin::new(MICRO_USW_DENOM, repay_debt),
                refund: Coin::new(MICRO_USW_DENOM, refund),
                collateral_out,
                commission_fee,
            },
            records,
        ))
    }
}
