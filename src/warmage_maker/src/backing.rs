//! Pricing of swaps between the stable unit, backing coins and the native
//! token. Every function here is read-only: it loads copies of the records it
//! needs, applies provisional updates to check ceilings and returns amounts.

use crate::fees::compute_fee;
use crate::ledger::Ledger;
use crate::numeric::{
    add, div, mul, round_half_up, round_up, signed_to_decimal, truncate, truncate_signed, Coin, Ratio,
};
use crate::oracle::PriceOracle;
use crate::state::ParamStore;
use crate::types::{BackingRiskParams, PoolBacking};
use crate::{Keeper, MakerError, ATTO_MAGE_DENOM, MICRO_USW_DENOM, MICRO_USW_TARGET};
use candid::CandidType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintBySwapIn {
    pub backing_in: Coin,
    pub mage_in: Coin,
    pub mint_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintBySwapOut {
    pub backing_in: Coin,
    pub mage_in: Coin,
    pub mint_out: Coin,
    pub mint_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnBySwapIn {
    pub burn_in: Coin,
    pub backing_out: Coin,
    pub mage_out: Coin,
    pub burn_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnBySwapOut {
    pub backing_out: Coin,
    pub mage_out: Coin,
    pub burn_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBackingIn {
    pub mage_in: Coin,
    pub buyback_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBackingOut {
    pub backing_out: Coin,
    pub buyback_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellBackingIn {
    pub backing_in: Coin,
    pub reback_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellBackingOut {
    pub mage_out: Coin,
    pub reback_fee: Coin,
}

/// How minted or burned value splits between backing and native token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mix {
    FullBacking,
    Algorithmic,
    Fractional(Decimal),
}

impl Mix {
    pub(crate) fn of(backing_ratio: Ratio, full_backing: bool) -> Self {
        if full_backing || backing_ratio >= Ratio::ONE {
            Mix::FullBacking
        } else if backing_ratio.0 <= Decimal::ZERO {
            Mix::Algorithmic
        } else {
            Mix::Fractional(backing_ratio.0)
        }
    }
}

pub(crate) fn ensure_denom(coin: &Coin, expected: &str) -> Result<(), MakerError> {
    if coin.denom != expected {
        return Err(MakerError::InvalidDenom {
            expected: expected.to_string(),
            actual: coin.denom.clone(),
        });
    }
    Ok(())
}

fn check_war_ceiling(pool: &PoolBacking, params: &BackingRiskParams) -> Result<(), MakerError> {
    if let Some(ceiling) = params.max_war_mint {
        if pool.war_minted.exceeds(ceiling) {
            return Err(MakerError::WarCeiling {
                minted: pool.war_minted.clone(),
                ceiling,
            });
        }
    }
    Ok(())
}

fn check_backing_ceiling(pool: &PoolBacking, params: &BackingRiskParams) -> Result<(), MakerError> {
    if let Some(ceiling) = params.max_backing {
        if pool.backing.amount > ceiling {
            return Err(MakerError::BackingCeiling {
                backing: pool.backing.clone(),
                ceiling,
            });
        }
    }
    Ok(())
}

/// `1 - rate` for the formulas that gross an amount up by a fee.
fn fee_complement(name: &str, rate: Option<Ratio>) -> Result<Decimal, MakerError> {
    let rate = rate.unwrap_or(Ratio::ZERO).0;
    if rate >= Decimal::ONE {
        return Err(MakerError::InvalidParams(format!(
            "{} must be below 1, got {}",
            name, rate
        )));
    }
    Ok(Decimal::ONE - rate)
}

impl<S: ParamStore, O: PriceOracle, L: Ledger> Keeper<S, O, L> {
    /// Amounts needed to mint exactly `mint_out`.
    pub fn calculate_mint_by_swap_in(
        &self,
        mint_out: &Coin,
        backing_denom: &str,
        full_backing: bool,
    ) -> Result<MintBySwapIn, MakerError> {
        ensure_denom(mint_out, MICRO_USW_DENOM)?;
        self.check_mint_price_lower_bound()?;
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let mint_fee = compute_fee(mint_out, backing_params.mint_fee)?;
        let mint_total = mint_out.checked_add(mint_fee.amount)?;
        let mint_total_value = mul(mint_total.to_decimal()?, MICRO_USW_TARGET)?;

        let (_, mut pool) = self.backing(backing_denom)?;
        pool.war_minted.add_amount(mint_total.amount)?;
        check_war_ceiling(&pool, &backing_params)?;

        let (backing_in, mage_in) = match Mix::of(self.backing_ratio(), full_backing) {
            Mix::FullBacking => (round_up(div(mint_total_value, backing_price)?)?, 0),
            Mix::Algorithmic => (0, round_up(div(mint_total_value, mage_price)?)?),
            Mix::Fractional(ratio) => (
                round_up(div(mul(mint_total_value, ratio)?, backing_price)?)?,
                round_up(div(mul(mint_total_value, Decimal::ONE - ratio)?, mage_price)?)?,
            ),
        };

        pool.backing = pool.backing.checked_add(backing_in)?;
        check_backing_ceiling(&pool, &backing_params)?;

        Ok(MintBySwapIn {
            backing_in: Coin::new(backing_denom, backing_in),
            mage_in: Coin::new(ATTO_MAGE_DENOM, mage_in),
            mint_fee,
        })
    }

    /// Largest mint affordable within both caps. A zero cap on one leg of a
    /// fractional mint leaves that leg unconstrained.
    pub fn calculate_mint_by_swap_out(
        &self,
        backing_in_max: &Coin,
        mage_in_max: &Coin,
        full_backing: bool,
    ) -> Result<MintBySwapOut, MakerError> {
        ensure_denom(mage_in_max, ATTO_MAGE_DENOM)?;
        self.check_mint_price_lower_bound()?;
        let backing_denom = backing_in_max.denom.as_str();
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let backing_max_value = mul(backing_in_max.to_decimal()?, backing_price)?;
        let mage_max_value = mul(mage_in_max.to_decimal()?, mage_price)?;

        let (mint_total_value, backing_in, mage_in) = match Mix::of(self.backing_ratio(), full_backing) {
            Mix::FullBacking => (backing_max_value, backing_in_max.amount, 0),
            Mix::Algorithmic => (mage_max_value, 0, mage_in_max.amount),
            Mix::Fractional(ratio) => {
                let with_backing = div(backing_max_value, ratio)?;
                let with_mage = div(mage_max_value, Decimal::ONE - ratio)?;
                if backing_in_max.is_positive() && (mage_in_max.is_zero() || with_backing <= with_mage) {
                    let mut mage_in = round_up(div(mul(with_backing, Decimal::ONE - ratio)?, mage_price)?)?;
                    if mage_in_max.is_positive() && mage_in > mage_in_max.amount {
                        mage_in = mage_in_max.amount;
                    }
                    (with_backing, backing_in_max.amount, mage_in)
                } else {
                    let mut backing_in = round_up(div(mul(with_mage, ratio)?, backing_price)?)?;
                    if backing_in_max.is_positive() && backing_in > backing_in_max.amount {
                        backing_in = backing_in_max.amount;
                    }
                    (with_mage, backing_in, mage_in_max.amount)
                }
            }
        };

        let mint_total = Coin::new(MICRO_USW_DENOM, truncate(div(mint_total_value, MICRO_USW_TARGET)?)?);

        let (_, mut pool) = self.backing(backing_denom)?;
        pool.war_minted.add_amount(mint_total.amount)?;
        check_war_ceiling(&pool, &backing_params)?;
        pool.backing = pool.backing.checked_add(backing_in)?;
        check_backing_ceiling(&pool, &backing_params)?;

        let mint_fee = compute_fee(&mint_total, backing_params.mint_fee)?;
        let mint_out = mint_total.checked_sub(mint_fee.amount)?;

        Ok(MintBySwapOut {
            backing_in: Coin::new(backing_denom, backing_in),
            mage_in: Coin::new(ATTO_MAGE_DENOM, mage_in),
            mint_out,
            mint_fee,
        })
    }

    /// Stable units to burn for the most that both payout caps allow.
    pub fn calculate_burn_by_swap_in(
        &self,
        backing_out_max: &Coin,
        mage_out_max: &Coin,
    ) -> Result<BurnBySwapIn, MakerError> {
        ensure_denom(mage_out_max, ATTO_MAGE_DENOM)?;
        self.check_burn_price_upper_bound()?;
        let backing_denom = backing_out_max.denom.as_str();
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let backing_max_value = mul(backing_out_max.to_decimal()?, backing_price)?;
        let mage_max_value = mul(mage_out_max.to_decimal()?, mage_price)?;

        let (burn_actual_value, backing_out, mage_out) = match Mix::of(self.backing_ratio(), false) {
            Mix::FullBacking => (backing_max_value, backing_out_max.amount, 0),
            Mix::Algorithmic => (mage_max_value, 0, mage_out_max.amount),
            Mix::Fractional(ratio) => {
                let with_backing = div(backing_max_value, ratio)?;
                let with_mage = div(mage_max_value, Decimal::ONE - ratio)?;
                if mage_out_max.is_zero() || (backing_out_max.is_positive() && with_backing < with_mage) {
                    let mage_out = truncate(div(mul(with_backing, Decimal::ONE - ratio)?, mage_price)?)?;
                    (with_backing, backing_out_max.amount, mage_out)
                } else {
                    let backing_out = truncate(div(mul(with_mage, ratio)?, backing_price)?)?;
                    (with_mage, backing_out, mage_out_max.amount)
                }
            }
        };

        let module_backing = self.module_balance(backing_denom);
        if module_backing < backing_out {
            return Err(MakerError::BackingCoinInsufficient {
                requested: Coin::new(backing_denom, backing_out).to_string(),
                available: Coin::new(backing_denom, module_backing).to_string(),
            });
        }

        let fee_rate = backing_params.burn_fee.unwrap_or(Ratio::ZERO).0;
        let burn_in_value = div(
            div(burn_actual_value, MICRO_USW_TARGET)?,
            fee_complement("burn_fee", backing_params.burn_fee)?,
        )?;
        let burn_fee_value = mul(burn_in_value, fee_rate)?;

        Ok(BurnBySwapIn {
            burn_in: Coin::new(MICRO_USW_DENOM, round_up(burn_in_value)?),
            backing_out: Coin::new(backing_denom, backing_out),
            mage_out: Coin::new(ATTO_MAGE_DENOM, mage_out),
            burn_fee: Coin::new(MICRO_USW_DENOM, round_half_up(burn_fee_value)?),
        })
    }

    /// Payout for burning exactly `burn_in`.
    pub fn calculate_burn_by_swap_out(
        &self,
        burn_in: &Coin,
        backing_denom: &str,
    ) -> Result<BurnBySwapOut, MakerError> {
        ensure_denom(burn_in, MICRO_USW_DENOM)?;
        self.check_burn_price_upper_bound()?;
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let burn_fee = compute_fee(burn_in, backing_params.burn_fee)?;
        let burn_actual = burn_in.checked_sub(burn_fee.amount)?;
        let burn_actual_value = mul(burn_actual.to_decimal()?, MICRO_USW_TARGET)?;

        let (backing_out, mage_out) = match Mix::of(self.backing_ratio(), false) {
            Mix::FullBacking => (truncate(div(burn_actual_value, backing_price)?)?, 0),
            Mix::Algorithmic => (0, truncate(div(burn_actual_value, mage_price)?)?),
            Mix::Fractional(ratio) => (
                truncate(div(mul(burn_actual_value, ratio)?, backing_price)?)?,
                truncate(div(mul(burn_actual_value, Decimal::ONE - ratio)?, mage_price)?)?,
            ),
        };

        let (_, pool) = self.backing(backing_denom)?;
        let available = pool.backing.amount.min(self.module_balance(backing_denom));
        if available < backing_out {
            return Err(MakerError::BackingCoinInsufficient {
                requested: Coin::new(backing_denom, backing_out).to_string(),
                available: Coin::new(backing_denom, available).to_string(),
            });
        }

        Ok(BurnBySwapOut {
            backing_out: Coin::new(backing_denom, backing_out),
            mage_out: Coin::new(ATTO_MAGE_DENOM, mage_out),
            burn_fee,
        })
    }

    /// Native token needed to buy `backing_out` of surplus backing.
    pub fn calculate_buy_backing_in(&self, backing_out: &Coin) -> Result<BuyBackingIn, MakerError> {
        let backing_denom = backing_out.denom.as_str();
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let excess_value = self.excess_backing_value()?;

        let fee_rate = backing_params.buyback_fee.unwrap_or(Ratio::ZERO).0;
        let backing_out_total = Coin::new(
            backing_denom,
            truncate(div(
                backing_out.to_decimal()?,
                fee_complement("buyback_fee", backing_params.buyback_fee)?,
            )?)?,
        );
        let mage_in_value = mul(backing_out_total.to_decimal()?, backing_price)?;
        if mage_in_value > signed_to_decimal(excess_value)? {
            return Err(MakerError::BackingCoinInsufficient {
                requested: mage_in_value.to_string(),
                available: excess_value.to_string(),
            });
        }

        self.check_pool_backing_balance(&backing_out_total)?;

        Ok(BuyBackingIn {
            mage_in: Coin::new(ATTO_MAGE_DENOM, round_up(div(mage_in_value, mage_price)?)?),
            buyback_fee: Coin::new(
                backing_denom,
                round_half_up(mul(backing_out_total.to_decimal()?, fee_rate)?)?,
            ),
        })
    }

    /// Surplus backing paid out for `mage_in` of native token.
    pub fn calculate_buy_backing_out(
        &self,
        mage_in: &Coin,
        backing_denom: &str,
    ) -> Result<BuyBackingOut, MakerError> {
        ensure_denom(mage_in, ATTO_MAGE_DENOM)?;
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let excess_value = self.excess_backing_value()?;

        let mage_in_value = mul(mage_in.to_decimal()?, mage_price)?;
        if mage_in_value > signed_to_decimal(excess_value)? {
            return Err(MakerError::BackingCoinInsufficient {
                requested: mage_in_value.to_string(),
                available: excess_value.to_string(),
            });
        }

        let backing_out_total = Coin::new(backing_denom, truncate(div(mage_in_value, backing_price)?)?);
        self.check_pool_backing_balance(&backing_out_total)?;

        let buyback_fee = compute_fee(&backing_out_total, backing_params.buyback_fee)?;
        let backing_out = backing_out_total.checked_sub(buyback_fee.amount)?;
        Ok(BuyBackingOut {
            backing_out,
            buyback_fee,
        })
    }

    /// Backing to deposit for `mage_out` of newly minted native token.
    pub fn calculate_sell_backing_in(
        &self,
        mage_out: &Coin,
        backing_denom: &str,
    ) -> Result<SellBackingIn, MakerError> {
        ensure_denom(mage_out, ATTO_MAGE_DENOM)?;
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let (_, mut pool) = self.backing(backing_denom)?;
        let available_mage_mint = self.available_mage_mint(mage_price)?;

        let fee_rate = backing_params.reback_fee.unwrap_or(Ratio::ZERO).0;
        let mint_multiplier = Decimal::ONE + self.params().reback_bonus.0 - fee_rate;
        if mint_multiplier <= Decimal::ZERO {
            return Err(MakerError::InvalidParams(format!(
                "reback bonus minus reback fee must exceed -1, got {}",
                mint_multiplier - Decimal::ONE
            )));
        }
        let mage_mint = div(mage_out.to_decimal()?, mint_multiplier)?;

        let backing_in = Coin::new(
            backing_denom,
            round_up(div(mul(mage_mint, mage_price)?, backing_price)?)?,
        );
        let reback_fee = Coin::new(ATTO_MAGE_DENOM, round_half_up(mul(mage_mint, fee_rate)?)?);

        pool.backing = pool.backing.checked_add(backing_in.amount)?;
        check_backing_ceiling(&pool, &backing_params)?;
        if mage_mint > available_mage_mint {
            return Err(MakerError::MageCoinInsufficient {
                requested: mage_mint.to_string(),
                available: available_mage_mint.to_string(),
            });
        }

        Ok(SellBackingIn {
            backing_in,
            reback_fee,
        })
    }

    /// Native token minted for depositing `backing_in` while backing is short.
    pub fn calculate_sell_backing_out(&self, backing_in: &Coin) -> Result<SellBackingOut, MakerError> {
        let backing_denom = backing_in.denom.as_str();
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let mage_price = self.price(ATTO_MAGE_DENOM)?;

        let (_, mut pool) = self.backing(backing_denom)?;
        pool.backing = pool.backing.checked_add(backing_in.amount)?;
        check_backing_ceiling(&pool, &backing_params)?;

        let available_mage_mint = self.available_mage_mint(mage_price)?;

        let mage_mint = Coin::new(
            ATTO_MAGE_DENOM,
            truncate(div(mul(backing_in.to_decimal()?, backing_price)?, mage_price)?)?,
        );
        let bonus = compute_fee(&mage_mint, Some(self.params().reback_bonus))?;
        let reback_fee = compute_fee(&mage_mint, backing_params.reback_fee)?;

        if mage_mint.to_decimal()? > available_mage_mint {
            return Err(MakerError::MageCoinInsufficient {
                requested: mage_mint.to_string(),
                available: available_mage_mint.to_string(),
            });
        }

        let mage_out = mage_mint
            .checked_add(bonus.amount)?
            .checked_sub(reback_fee.amount)?;
        Ok(SellBackingOut {
            mage_out,
            reback_fee,
        })
    }

    /// Backing value above what the backing ratio requires for all stable
    /// units minted by swap. Negative when backing is short.
    pub fn excess_backing_value(&self) -> Result<i128, MakerError> {
        let total = self
            .store()
            .total_backing()
            .ok_or_else(|| MakerError::BackingCoinNotFound("total backing".to_string()))?;
        let required = mul(signed_to_decimal(total.war_minted.amount)?, self.backing_ratio().0)?;
        let required = truncate_signed(required.ceil())?.max(0);

        let total_value =
            i128::try_from(self.total_backing_in_usd()?).map_err(|_| MakerError::ArithmeticOverflow)?;
        total_value
            .checked_sub(required)
            .ok_or(MakerError::ArithmeticOverflow)
    }

    /// Oracle value of every backing pool, disabled ones included.
    pub fn total_backing_in_usd(&self) -> Result<u128, MakerError> {
        let mut total_value = Decimal::ZERO;
        for pool in self.store().all_pool_backing() {
            let price = self.price(&pool.backing.denom)?;
            total_value = add(total_value, mul(pool.backing.to_decimal()?, price)?)?;
        }
        truncate(total_value)
    }

    fn available_mage_mint(&self, mage_price: Decimal) -> Result<Decimal, MakerError> {
        let missing_value = self
            .excess_backing_value()?
            .checked_neg()
            .ok_or(MakerError::ArithmeticOverflow)?;
        div(signed_to_decimal(missing_value)?, mage_price)
    }

    /// Backing can only leave up to what both the pool record and the module
    /// account hold.
    fn check_pool_backing_balance(&self, backing_out: &Coin) -> Result<(), MakerError> {
        let (_, pool) = self.backing(&backing_out.denom)?;
        let available = pool.backing.amount.min(self.module_balance(&backing_out.denom));
        if available < backing_out.amount {
            return Err(MakerError::BackingCoinInsufficient {
                requested: backing_out.to_string(),
                available: Coin::new(backing_out.denom.clone(), available).to_string(),
            });
        }
        Ok(())
    }
}
