use crate::ledger::{LedgerAccount, MemoryLedger};
use crate::msgs::MsgDepositCollateral;
use crate::numeric::{Coin, Ratio};
use crate::oracle::PriceTable;
use crate::state::{ParamStore, State};
use crate::types::{BackingRiskParams, CollateralRiskParams, Params};
use crate::{Keeper, KeeperConfig, ATTO_MAGE_DENOM, MICRO_USW_DENOM};
use candid::Principal;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const USDC: &str = "uusdc";
pub const ATOM: &str = "uatom";

pub type TestKeeper = Keeper<State, PriceTable, MemoryLedger>;

pub fn alice() -> Principal {
    Principal::from_slice(&[0xa1])
}

pub fn bob() -> Principal {
    Principal::from_slice(&[0xb0])
}

pub fn usdc_params() -> BackingRiskParams {
    BackingRiskParams {
        backing_denom: USDC.to_string(),
        enabled: true,
        max_backing: None,
        max_war_mint: None,
        mint_fee: None,
        burn_fee: None,
        buyback_fee: None,
        reback_fee: None,
    }
}

pub fn atom_params() -> CollateralRiskParams {
    CollateralRiskParams {
        collateral_denom: ATOM.to_string(),
        enabled: true,
        max_collateral: None,
        max_war_mint: None,
        liquidation_threshold: Ratio::new(dec!(0.9)),
        loan_to_value: Ratio::new(dec!(0.8)),
        basic_loan_to_value: Ratio::new(dec!(0.5)),
        catalytic_mage_ratio: Ratio::new(dec!(0.1)),
        liquidation_fee: Ratio::new(dec!(0.1)),
        mint_fee: None,
        interest_fee: Ratio::new(dec!(0.1)),
    }
}

/// Prices: stable unit and both risk assets at 1, native token at 2.
/// Price circuit breakers are disabled and the backing ratio is 1.
pub fn fixture() -> TestKeeper {
    let params = Params {
        backing_ratio: Ratio::ONE,
        mint_price_bias: Ratio::ZERO,
        burn_price_bias: Ratio::ZERO,
        ..Params::default()
    };
    let oracle = PriceTable::new()
        .with_rate(MICRO_USW_DENOM, dec!(1))
        .with_rate(ATTO_MAGE_DENOM, dec!(2))
        .with_rate(USDC, dec!(1))
        .with_rate(ATOM, dec!(1));
    let mut keeper = Keeper::new(
        State::new(params),
        oracle,
        MemoryLedger::new(),
        KeeperConfig::default(),
    );
    keeper.register_backing(usdc_params()).unwrap();
    keeper.register_collateral(atom_params()).unwrap();
    keeper
}

pub fn set_backing_ratio(keeper: &mut TestKeeper, ratio: Decimal) {
    let mut params = keeper.params();
    params.backing_ratio = Ratio::new(ratio);
    keeper.set_params(params).unwrap();
}

pub fn update_usdc(keeper: &mut TestKeeper, update: impl FnOnce(&mut BackingRiskParams)) {
    let mut params = keeper.store().backing_risk_params(USDC).unwrap();
    update(&mut params);
    keeper.register_backing(params).unwrap();
}

pub fn update_atom(keeper: &mut TestKeeper, update: impl FnOnce(&mut CollateralRiskParams)) {
    let mut params = keeper.store().collateral_risk_params(ATOM).unwrap();
    update(&mut params);
    keeper.register_collateral(params).unwrap();
}

pub fn fund(keeper: &mut TestKeeper, owner: Principal, coin: Coin) {
    keeper
        .ledger_mut()
        .fund(LedgerAccount::User(owner), coin)
        .unwrap();
}

pub fn open_position(keeper: &mut TestKeeper, owner: Principal, collateral: u128, mage: u128) {
    fund(keeper, owner, Coin::new(ATOM, collateral));
    fund(keeper, owner, Coin::new(ATTO_MAGE_DENOM, mage));
    keeper
        .deposit_collateral(
            owner,
            MsgDepositCollateral {
                to: None,
                collateral_in: Coin::new(ATOM, collateral),
                mage_in: Coin::new(ATTO_MAGE_DENOM, mage),
            },
        )
        .unwrap();
}
