//! Requests accepted by the maker module and their responses. A request's
//! `to` defaults to the sender.

use crate::numeric::Coin;
use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMintBySwap {
    pub to: Option<Principal>,
    pub mint_out_min: Coin,
    pub backing_in_max: Coin,
    pub mage_in_max: Coin,
    pub full_backing: bool,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintBySwapResponse {
    pub backing_in: Coin,
    pub mage_in: Coin,
    pub mint_out: Coin,
    pub mint_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBurnBySwap {
    pub to: Option<Principal>,
    pub burn_in: Coin,
    pub backing_out_min: Coin,
    pub mage_out_min: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnBySwapResponse {
    pub backing_out: Coin,
    pub mage_out: Coin,
    pub burn_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBuyBacking {
    pub to: Option<Principal>,
    pub mage_in: Coin,
    pub backing_out_min: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBackingResponse {
    pub backing_out: Coin,
    pub buyback_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSellBacking {
    pub to: Option<Principal>,
    pub backing_in: Coin,
    pub mage_out_min: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellBackingResponse {
    pub mage_out: Coin,
    pub reback_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMintByCollateral {
    pub to: Option<Principal>,
    pub collateral_denom: String,
    pub mint_out: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintByCollateralResponse {
    pub mint_fee: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBurnByCollateral {
    pub collateral_denom: String,
    pub repay_in_max: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnByCollateralResponse {
    pub repay_in: Coin,
    pub repay_interest: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDepositCollateral {
    pub to: Option<Principal>,
    pub collateral_in: Coin,
    pub mage_in: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRedeemCollateral {
    pub to: Option<Principal>,
    pub collateral_out: Coin,
    pub mage_out: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLiquidateCollateral {
    pub to: Option<Principal>,
    pub debtor: Principal,
    pub collateral: Coin,
    pub repay_in_max: Coin,
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidateCollateralResponse {
    pub repay_in: Coin,
    pub collateral_out: Coin,
    pub commission_fee: Coin,
}
