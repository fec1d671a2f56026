//! Token amounts, rates and the rounding rules applied when a decimal
//! value is turned back into an integer amount.
//!
//! Three directions are used throughout the engine:
//! * amounts a caller pays in are rounded up ([`round_up`]),
//! * amounts paid out are truncated ([`truncate`]),
//! * fees are rounded half away from zero ([`round_half_up`]).

use crate::MakerError;
use candid::types::{Serializer, Type, TypeInner};
use candid::CandidType;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(CandidType, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    pub fn checked_add(&self, amount: u128) -> Result<Self, MakerError> {
        let amount = self
            .amount
            .checked_add(amount)
            .ok_or(MakerError::ArithmeticOverflow)?;
        Ok(Self::new(self.denom.clone(), amount))
    }

    /// Fails with [`MakerError::NegativeAmount`] instead of wrapping below zero.
    pub fn checked_sub(&self, amount: u128) -> Result<Self, MakerError> {
        let amount = self.amount.checked_sub(amount).ok_or_else(|| {
            MakerError::NegativeAmount(format!("{} - {}{}", self, amount, self.denom))
        })?;
        Ok(Self::new(self.denom.clone(), amount))
    }

    pub fn to_decimal(&self) -> Result<Decimal, MakerError> {
        to_decimal(self.amount)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Net counter that may go below zero, e.g. stable units minted against a
/// pool minus those burned against it.
#[derive(CandidType, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedCoin {
    pub denom: String,
    pub amount: i128,
}

impl SignedCoin {
    pub fn new(denom: impl Into<String>, amount: i128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn add_amount(&mut self, amount: u128) -> Result<(), MakerError> {
        let delta = i128::try_from(amount).map_err(|_| MakerError::ArithmeticOverflow)?;
        self.amount = self
            .amount
            .checked_add(delta)
            .ok_or(MakerError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn sub_amount(&mut self, amount: u128) -> Result<(), MakerError> {
        let delta = i128::try_from(amount).map_err(|_| MakerError::ArithmeticOverflow)?;
        self.amount = self
            .amount
            .checked_sub(delta)
            .ok_or(MakerError::ArithmeticOverflow)?;
        Ok(())
    }

    /// True when the counter is above the given ceiling. A negative counter
    /// never exceeds a ceiling.
    pub fn exceeds(&self, ceiling: u128) -> bool {
        u128::try_from(self.amount).map_or(false, |amount| amount > ceiling)
    }
}

impl fmt::Display for SignedCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A fee, bias or ratio. Serialized as decimal text so that no precision is
/// lost over the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratio(pub Decimal);

impl Ratio {
    pub const ZERO: Ratio = Ratio(Decimal::ZERO);
    pub const ONE: Ratio = Ratio(Decimal::ONE);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn to_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl From<Decimal> for Ratio {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl CandidType for Ratio {
    fn _ty() -> Type {
        TypeInner::Text.into()
    }

    fn idl_serialize<S>(&self, serializer: S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_text(&self.0.to_string())
    }
}

pub fn to_decimal(amount: u128) -> Result<Decimal, MakerError> {
    Decimal::from_u128(amount).ok_or(MakerError::ArithmeticOverflow)
}

pub fn signed_to_decimal(amount: i128) -> Result<Decimal, MakerError> {
    Decimal::from_i128(amount).ok_or(MakerError::ArithmeticOverflow)
}

pub fn round_half_up(value: Decimal) -> Result<u128, MakerError> {
    to_amount(value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

pub fn round_up(value: Decimal) -> Result<u128, MakerError> {
    to_amount(value.ceil())
}

pub fn truncate(value: Decimal) -> Result<u128, MakerError> {
    to_amount(value.trunc())
}

pub fn truncate_signed(value: Decimal) -> Result<i128, MakerError> {
    value.trunc().to_i128().ok_or(MakerError::ArithmeticOverflow)
}

/// Product that fails instead of leaving the decimal range.
pub fn mul(lhs: Decimal, rhs: Decimal) -> Result<Decimal, MakerError> {
    lhs.checked_mul(rhs).ok_or(MakerError::ArithmeticOverflow)
}

/// Quotient that fails on overflow or a zero divisor.
pub fn div(lhs: Decimal, rhs: Decimal) -> Result<Decimal, MakerError> {
    lhs.checked_div(rhs).ok_or(MakerError::ArithmeticOverflow)
}

pub fn add(lhs: Decimal, rhs: Decimal) -> Result<Decimal, MakerError> {
    lhs.checked_add(rhs).ok_or(MakerError::ArithmeticOverflow)
}

fn to_amount(integral: Decimal) -> Result<u128, MakerError> {
    // Truncating or rounding small negatives yields -0, which is still zero.
    if integral.is_zero() {
        return Ok(0);
    }
    if integral.is_sign_negative() {
        return Err(MakerError::NegativeAmount(integral.to_string()));
    }
    integral.to_u128().ok_or(MakerError::ArithmeticOverflow)
}
