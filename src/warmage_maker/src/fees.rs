use crate::numeric::{add, mul, round_half_up, Coin, Ratio};
use crate::{MakerError, MICRO_USW_TARGET};
use rust_decimal::Decimal;

/// Proportional fee in the denomination of `coin`, zero when no rate is set.
pub fn compute_fee(coin: &Coin, rate: Option<Ratio>) -> Result<Coin, MakerError> {
    let amount = match rate {
        Some(rate) => round_half_up(mul(coin.to_decimal()?, rate.0)?)?,
        None => 0,
    };
    Ok(Coin::new(coin.denom.clone(), amount))
}

/// Minting is only allowed while the stable unit trades at or above
/// `target * (1 + bias)`.
pub fn check_mint_price_lower_bound(war_price: Decimal, mint_price_bias: Ratio) -> Result<(), MakerError> {
    let lower_bound = mul(MICRO_USW_TARGET, add(Decimal::ONE, mint_price_bias.0)?)?;
    if war_price < lower_bound {
        return Err(MakerError::WarPriceTooLow {
            price: war_price.to_string(),
            lower_bound: lower_bound.to_string(),
        });
    }
    Ok(())
}

/// Burning is only allowed while the stable unit trades at or below
/// `target * (1 - bias)`.
pub fn check_burn_price_upper_bound(war_price: Decimal, burn_price_bias: Ratio) -> Result<(), MakerError> {
    let upper_bound = mul(MICRO_USW_TARGET, Decimal::ONE - burn_price_bias.0)?;
    if war_price > upper_bound {
        return Err(MakerError::WarPriceTooHigh {
            price: war_price.to_string(),
            upper_bound: upper_bound.to_string(),
        });
    }
    Ok(())
}
