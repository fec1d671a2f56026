use assert_matches::assert_matches;
use candid::Principal;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use warmage_maker::event::Event;
use warmage_maker::ledger::{Ledger, LedgerAccount, MemoryLedger};
use warmage_maker::msgs::{
    MsgBurnByCollateral, MsgBuyBacking, MsgDepositCollateral, MsgLiquidateCollateral, MsgMintByCollateral,
    MsgMintBySwap,
};
use warmage_maker::numeric::{Coin, Ratio};
use warmage_maker::oracle::PriceTable;
use warmage_maker::state::{ParamStore, State};
use warmage_maker::types::{BackingRiskParams, CollateralRiskParams, Params};
use warmage_maker::{
    BackingRatioAdjuster, BackingRatioInput, Keeper, KeeperConfig, MakerError, ATTO_MAGE_DENOM, MICRO_USW_DENOM,
    MODULE_ACCOUNT,
};

const USDC: &str = "uusdc";
const ATOM: &str = "uatom";

type MakerKeeper = Keeper<State, PriceTable, MemoryLedger>;

fn user(id: u8) -> Principal {
    Principal::from_slice(&[id])
}

struct MakerSetup {
    keeper: MakerKeeper,
}

impl MakerSetup {
    fn new(backing_ratio: Decimal) -> Self {
        let params = Params {
            backing_ratio: Ratio::new(backing_ratio),
            mint_price_bias: Ratio::ZERO,
            burn_price_bias: Ratio::ZERO,
            ..Params::default()
        };
        let oracle = PriceTable::new()
            .with_rate(MICRO_USW_DENOM, dec!(1))
            .with_rate(ATTO_MAGE_DENOM, dec!(2))
            .with_rate(USDC, dec!(1))
            .with_rate(ATOM, dec!(1));
        let mut keeper = Keeper::new(State::new(params), oracle, MemoryLedger::new(), KeeperConfig::default());
        keeper
            .register_backing(BackingRiskParams {
                backing_denom: USDC.to_string(),
                enabled: true,
                max_backing: None,
                max_war_mint: None,
                mint_fee: None,
                burn_fee: None,
                buyback_fee: None,
                reback_fee: None,
            })
            .unwrap();
        keeper
            .register_collateral(CollateralRiskParams {
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
            })
            .unwrap();
        Self { keeper }
    }

    fn fund(&mut self, owner: Principal, denom: &str, amount: u128) {
        self.keeper
            .ledger_mut()
            .fund(LedgerAccount::User(owner), Coin::new(denom, amount))
            .unwrap();
    }

    fn balance(&self, owner: Principal, denom: &str) -> u128 {
        self.keeper.ledger().balance(&LedgerAccount::User(owner), denom)
    }

    fn mint_by_swap(&mut self, owner: Principal, backing: u128, mage: u128) -> Result<Coin, MakerError> {
        self.keeper
            .mint_by_swap(
                owner,
                MsgMintBySwap {
                    to: None,
                    mint_out_min: Coin::zero(MICRO_USW_DENOM),
                    backing_in_max: Coin::new(USDC, backing),
                    mage_in_max: Coin::new(ATTO_MAGE_DENOM, mage),
                    full_backing: false,
                },
            )
            .map(|response| response.mint_out)
    }

    fn deposit(&mut self, owner: Principal, collateral: u128) {
        self.fund(owner, ATOM, collateral);
        self.keeper
            .deposit_collateral(
                owner,
                MsgDepositCollateral {
                    to: None,
                    collateral_in: Coin::new(ATOM, collateral),
                    mage_in: Coin::zero(ATTO_MAGE_DENOM),
                },
            )
            .unwrap();
    }

    fn borrow(&mut self, owner: Principal, amount: u128) -> Result<Coin, MakerError> {
        self.keeper
            .mint_by_collateral(
                owner,
                MsgMintByCollateral {
                    to: None,
                    collateral_denom: ATOM.to_string(),
                    mint_out: Coin::new(MICRO_USW_DENOM, amount),
                },
            )
            .map(|response| response.mint_fee)
    }

    fn set_backing_ratio(&mut self, ratio: Decimal) {
        let mut params = self.keeper.params();
        params.backing_ratio = Ratio::new(ratio);
        self.keeper.set_params(params).unwrap();
    }
}

#[test]
fn should_split_fractional_mint_between_backing_and_native_token() {
    let mut setup = MakerSetup::new(dec!(0.5));
    let alice = user(1);
    setup.fund(alice, USDC, 50);
    setup.fund(alice, ATTO_MAGE_DENOM, 25);

    let quote = setup
        .keeper
        .estimate_mint_by_swap_in(&Coin::new(MICRO_USW_DENOM, 100), USDC, false)
        .unwrap();
    assert_eq!(quote.backing_in, Coin::new(USDC, 50));
    assert_eq!(quote.mage_in, Coin::new(ATTO_MAGE_DENOM, 25));

    let minted = setup.mint_by_swap(alice, 50, 25).unwrap();
    assert_eq!(minted, Coin::new(MICRO_USW_DENOM, 100));

    assert_eq!(setup.balance(alice, MICRO_USW_DENOM), 100);
    assert_eq!(setup.balance(alice, USDC), 0);
    assert_eq!(setup.keeper.ledger().supply(ATTO_MAGE_DENOM), 0);

    let pool = setup.keeper.query_pool_backing(USDC).unwrap();
    assert_eq!(pool.backing.amount, 50);
    assert_eq!(pool.war_minted.amount, 100);
    assert_eq!(pool.mage_burned.amount, 25);
}

#[test]
fn should_stop_minting_below_the_price_band() {
    let mut setup = MakerSetup::new(dec!(1));
    let alice = user(1);
    setup.fund(alice, USDC, 100);
    let mut params = setup.keeper.params();
    params.mint_price_bias = Ratio::new(dec!(0.01));
    setup.keeper.set_params(params).unwrap();

    assert_matches!(
        setup.mint_by_swap(alice, 100, 0),
        Err(MakerError::WarPriceTooLow { .. })
    );
    setup.keeper.oracle_mut().set_rate(MICRO_USW_DENOM, dec!(1.01));
    assert_eq!(setup.mint_by_swap(alice, 100, 0), Ok(Coin::new(MICRO_USW_DENOM, 100)));
}

#[test]
fn should_cap_debt_at_basic_loan_to_value() {
    let mut setup = MakerSetup::new(dec!(1));
    let alice = user(1);
    setup.deposit(alice, 1_000);

    let state = setup.keeper.store().clone();
    assert_matches!(
        setup.borrow(alice, 501),
        Err(MakerError::AccountInsufficientCollateral { .. })
    );
    assert_eq!(setup.keeper.store(), &state);

    setup.borrow(alice, 500).unwrap();
    assert_eq!(setup.balance(alice, MICRO_USW_DENOM), 500);
    let account = setup.keeper.query_collateral_of_account(&alice, ATOM).unwrap();
    assert_eq!(account.war_debt.amount, 500);
    assert_eq!(setup.keeper.query_total_collateral().war_debt.amount, 500);
}

#[test]
fn should_only_sell_surplus_backing() {
    let mut setup = MakerSetup::new(dec!(1));
    let alice = user(1);
    setup.fund(alice, USDC, 1_000);
    setup.mint_by_swap(alice, 1_000, 0).unwrap();

    // 1000 of backing against 900 required leaves 100 of surplus value.
    setup.set_backing_ratio(dec!(0.9));
    assert_eq!(setup.keeper.excess_backing_value(), Ok(100));

    let bob = user(2);
    setup.fund(bob, ATTO_MAGE_DENOM, 60);
    let ledger = setup.keeper.ledger().clone();
    let state = setup.keeper.store().clone();

    let over = MsgBuyBacking {
        to: None,
        mage_in: Coin::new(ATTO_MAGE_DENOM, 60),
        backing_out_min: Coin::zero(USDC),
    };
    assert_matches!(
        setup.keeper.buy_backing(bob, over),
        Err(MakerError::BackingCoinInsufficient { .. })
    );
    assert_eq!(setup.keeper.ledger(), &ledger);
    assert_eq!(setup.keeper.store(), &state);

    let response = setup
        .keeper
        .buy_backing(
            bob,
            MsgBuyBacking {
                to: None,
                mage_in: Coin::new(ATTO_MAGE_DENOM, 50),
                backing_out_min: Coin::new(USDC, 100),
            },
        )
        .unwrap();
    assert_eq!(response.backing_out, Coin::new(USDC, 100));
    assert_eq!(setup.balance(bob, USDC), 100);
    assert_eq!(setup.balance(bob, ATTO_MAGE_DENOM), 10);
    assert_eq!(setup.keeper.excess_backing_value(), Ok(0));
}

#[test]
fn should_reject_borrow_over_pool_ceiling_without_changes() {
    let mut setup = MakerSetup::new(dec!(1));
    let mut params = setup.keeper.store().collateral_risk_params(ATOM).unwrap();
    params.max_war_mint = Some(300);
    setup.keeper.register_collateral(params).unwrap();

    let alice = user(1);
    setup.deposit(alice, 1_000);
    let state = setup.keeper.store().clone();
    let events = setup.keeper.event_log().len();

    assert_matches!(
        setup.borrow(alice, 301),
        Err(MakerError::WarCeiling { ceiling: 300, .. })
    );
    assert_eq!(setup.keeper.store(), &state);
    assert_eq!(setup.keeper.event_log().len(), events);
    assert_eq!(setup.keeper.query_pool_collateral(ATOM).unwrap().collateral.amount, 1_000);
}

#[test]
fn should_accrue_interest_once_per_block() {
    let mut setup = MakerSetup::new(dec!(1));
    let alice = user(1);
    setup.deposit(alice, 10_000_000);
    setup.borrow(alice, 1_000_000).unwrap();

    // A tenth of a year at 10% APR.
    let blocks = setup.keeper.params().blocks_per_year / 10;
    setup.keeper.begin_block(blocks);
    setup.borrow(alice, 1).unwrap();
    setup.borrow(alice, 1).unwrap();

    let account = setup.keeper.query_collateral_of_account(&alice, ATOM).unwrap();
    assert_eq!(account.last_interest.amount, 10_000);
    assert_eq!(account.war_debt.amount, 1_010_002);
    assert_eq!(account.last_settlement_block, blocks);

    setup.fund(alice, MICRO_USW_DENOM, 10_000);
    let repaid = setup
        .keeper
        .burn_by_collateral(
            alice,
            MsgBurnByCollateral {
                collateral_denom: ATOM.to_string(),
                repay_in_max: Coin::new(MICRO_USW_DENOM, 2_000_000),
            },
        )
        .unwrap();
    assert_eq!(repaid.repay_in.amount, 1_010_002);
    assert_eq!(repaid.repay_interest.amount, 10_000);
    assert!(setup
        .keeper
        .query_collateral_of_account(&alice, ATOM)
        .unwrap()
        .war_debt
        .is_zero());
}

#[test]
fn should_only_liquidate_undercollateralized_positions() {
    let mut setup = MakerSetup::new(dec!(1));
    let alice = user(1);
    let bob = user(2);
    setup.deposit(alice, 1_000);
    setup.borrow(alice, 500).unwrap();
    setup.fund(bob, MICRO_USW_DENOM, 1_000);

    let liquidate = |repay_in_max| MsgLiquidateCollateral {
        to: None,
        debtor: alice,
        collateral: Coin::new(ATOM, 1_000),
        repay_in_max: Coin::new(MICRO_USW_DENOM, repay_in_max),
    };

    let state = setup.keeper.store().clone();
    assert_matches!(
        setup.keeper.liquidate_collateral(bob, liquidate(1_000)),
        Err(MakerError::NotUndercollateralized { .. })
    );
    assert_eq!(setup.keeper.store(), &state);

    // 1000 * 0.55 * 0.9 = 495 < 500
    setup.keeper.oracle_mut().set_rate(ATOM, dec!(0.55));
    assert_matches!(
        setup.keeper.liquidate_collateral(bob, liquidate(100)),
        Err(MakerError::OverSlippage { .. })
    );

    let response = setup.keeper.liquidate_collateral(bob, liquidate(1_000)).unwrap();
    // (1000 - 100) * 0.55
    assert_eq!(response.repay_in.amount, 495);
    assert_eq!(response.collateral_out.amount, 990);
    assert_eq!(response.commission_fee.amount, 10);
    assert_eq!(setup.balance(bob, ATOM), 990);
    assert_eq!(setup.balance(alice, MICRO_USW_DENOM), 500);

    let account = setup.keeper.query_collateral_of_account(&alice, ATOM).unwrap();
    assert!(account.collateral.is_zero());
    assert_eq!(account.war_debt.amount, 5);
    assert_eq!(
        setup
            .keeper
            .ledger()
            .balance(&LedgerAccount::Module(MODULE_ACCOUNT.to_string()), ATOM),
        0
    );
}

struct StepDown {
    step: Decimal,
}

impl BackingRatioAdjuster for StepDown {
    fn adjust_backing_ratio(&mut self, input: &BackingRatioInput) -> Option<Ratio> {
        match input.war_price {
            Some(price) if price >= dec!(1) => Some(Ratio::new(input.backing_ratio.0 - self.step)),
            _ => None,
        }
    }
}

#[test]
fn should_apply_backing_ratio_adjustment_at_end_block() {
    let mut setup = MakerSetup::new(dec!(1));
    let mut adjuster = StepDown { step: dec!(0.0025) };

    setup.keeper.begin_block(10);
    setup.keeper.end_block(&mut adjuster);
    let ratio = setup.keeper.query_backing_ratio();
    assert_eq!(ratio.backing_ratio, Ratio::new(dec!(0.9975)));
    assert_eq!(ratio.last_update_block, 10);

    // Below peg the adjuster holds the ratio.
    setup.keeper.oracle_mut().set_rate(MICRO_USW_DENOM, dec!(0.99));
    setup.keeper.begin_block(11);
    setup.keeper.end_block(&mut adjuster);
    let ratio = setup.keeper.query_backing_ratio();
    assert_eq!(ratio.backing_ratio, Ratio::new(dec!(0.9975)));
    assert_eq!(ratio.last_update_block, 10);

    assert_eq!(
        setup.keeper.events().last(),
        Some(&Event::AdjustBackingRatio {
            backing_ratio: Ratio::new(dec!(0.9975)),
            block_height: 10,
        })
    );
}

#[test]
fn should_record_committed_operations_in_order() {
    let mut setup = MakerSetup::new(dec!(1));
    let alice = user(1);
    setup.fund(alice, USDC, 100);
    setup.mint_by_swap(alice, 100, 0).unwrap();
    assert!(setup.mint_by_swap(alice, 100, 0).is_err());
    setup.deposit(alice, 1_000);

    let names: Vec<&str> = setup.keeper.events().iter().map(Event::name).collect();
    assert_eq!(
        names,
        vec!["register_backing", "register_collateral", "mint_by_swap", "deposit_collateral"]
    );
    assert_eq!(setup.keeper.event_log().events(2, 1).len(), 1);
}
