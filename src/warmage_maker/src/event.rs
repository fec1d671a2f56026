use crate::logs::INFO;
use crate::numeric::{Coin, Ratio};
use crate::storage::EventLog;
use candid::{CandidType, Principal};
use ic_canister_log::log;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    #[serde(rename = "mint_by_swap")]
    MintBySwap {
        sender: Principal,
        receiver: Principal,
        coin_in: Vec<Coin>,
        coin_out: Coin,
        fee: Coin,
    },

    #[serde(rename = "burn_by_swap")]
    BurnBySwap {
        sender: Principal,
        receiver: Principal,
        coin_in: Coin,
        coin_out: Vec<Coin>,
        fee: Coin,
    },

    #[serde(rename = "buy_backing")]
    BuyBacking {
        sender: Principal,
        receiver: Principal,
        coin_in: Coin,
        coin_out: Coin,
        fee: Coin,
    },

    #[serde(rename = "sell_backing")]
    SellBacking {
        sender: Principal,
        receiver: Principal,
        coin_in: Coin,
        coin_out: Coin,
        fee: Coin,
    },

    #[serde(rename = "mint_by_collateral")]
    MintByCollateral {
        sender: Principal,
        receiver: Principal,
        coin_out: Coin,
        fee: Coin,
    },

    #[serde(rename = "burn_by_collateral")]
    BurnByCollateral {
        sender: Principal,
        collateral_denom: String,
        coin_in: Coin,
        fee: Coin,
    },

    #[serde(rename = "deposit_collateral")]
    DepositCollateral {
        sender: Principal,
        receiver: Principal,
        coin_in: Vec<Coin>,
    },

    #[serde(rename = "redeem_collateral")]
    RedeemCollateral {
        sender: Principal,
        receiver: Principal,
        coin_out: Vec<Coin>,
    },

    #[serde(rename = "liquidate_collateral")]
    LiquidateCollateral {
        sender: Principal,
        receiver: Principal,
        debtor: Principal,
        coin_in: Coin,
        coin_out: Coin,
        fee: Coin,
    },

    #[serde(rename = "register_backing")]
    RegisterBacking { backing_denom: String, enabled: bool },

    #[serde(rename = "register_collateral")]
    RegisterCollateral {
        collateral_denom: String,
        enabled: bool,
    },

    #[serde(rename = "set_params")]
    SetParams,

    #[serde(rename = "adjust_backing_ratio")]
    AdjustBackingRatio { backing_ratio: Ratio, block_height: u64 },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::MintBySwap { .. } => "mint_by_swap",
            Event::BurnBySwap { .. } => "burn_by_swap",
            Event::BuyBacking { .. } => "buy_backing",
            Event::SellBacking { .. } => "sell_backing",
            Event::MintByCollateral { .. } => "mint_by_collateral",
            Event::BurnByCollateral { .. } => "burn_by_collateral",
            Event::DepositCollateral { .. } => "deposit_collateral",
            Event::RedeemCollateral { .. } => "redeem_collateral",
            Event::LiquidateCollateral { .. } => "liquidate_collateral",
            Event::RegisterBacking { .. } => "register_backing",
            Event::RegisterCollateral { .. } => "register_collateral",
            Event::SetParams => "set_params",
            Event::AdjustBackingRatio { .. } => "adjust_backing_ratio",
        }
    }
}

pub fn record_event(log: &mut EventLog, event: Event) {
    log!(INFO, "[record_event] {}", event.name());
    log.record(&event);
}

pub fn record_adjust_backing_ratio(log: &mut EventLog, backing_ratio: Ratio, block_height: u64) {
    record_event(
        log,
        Event::AdjustBackingRatio {
            backing_ratio,
            block_height,
        },
    );
}
