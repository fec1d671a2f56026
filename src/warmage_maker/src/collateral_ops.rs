use crate::backing_ops::log_rejection;
use crate::event::Event;
use crate::ledger::{Ledger, LedgerBatch};
use crate::logs::INFO;
use crate::msgs::{
    BurnByCollateralResponse, LiquidateCollateralResponse, MintByCollateralResponse,
    MsgBurnByCollateral, MsgDepositCollateral, MsgLiquidateCollateral, MsgMintByCollateral,
    MsgRedeemCollateral,
};
use crate::oracle::PriceOracle;
use crate::state::ParamStore;
use crate::{Keeper, MakerError};
use candid::Principal;
use ic_canister_log::log;

impl<S: ParamStore, O: PriceOracle, L: Ledger> Keeper<S, O, L> {
    pub fn deposit_collateral(&mut self, sender: Principal, msg: MsgDepositCollateral) -> Result<(), MakerError> {
        log_rejection("deposit_collateral", self.apply_deposit_collateral(sender, msg))
    }

    pub fn redeem_collateral(&mut self, sender: Principal, msg: MsgRedeemCollateral) -> Result<(), MakerError> {
        log_rejection("redeem_collateral", self.apply_redeem_collateral(sender, msg))
    }

    /// Borrows stable units against the sender's position.
    pub fn mint_by_collateral(
        &mut self,
        sender: Principal,
        msg: MsgMintByCollateral,
    ) -> Result<MintByCollateralResponse, MakerError> {
        log_rejection("mint_by_collateral", self.apply_mint_by_collateral(sender, msg))
    }

    /// Repays debt of the sender's position, accrued interest first.
    pub fn burn_by_collateral(
        &mut self,
        sender: Principal,
        msg: MsgBurnByCollateral,
    ) -> Result<BurnByCollateralResponse, MakerError> {
        log_rejection("burn_by_collateral", self.apply_burn_by_collateral(sender, msg))
    }

    pub fn liquidate_collateral(
        &mut self,
        sender: Principal,
        msg: MsgLiquidateCollateral,
    ) -> Result<LiquidateCollateralResponse, MakerError> {
        log_rejection("liquidate_collateral", self.apply_liquidate_collateral(sender, msg))
    }

    fn apply_deposit_collateral(&mut self, sender: Principal, msg: MsgDepositCollateral) -> Result<(), MakerError> {
        let receiver = msg.to.unwrap_or(sender);
        let records = self.calculate_deposit_collateral(&receiver, &msg.collateral_in, &msg.mage_in)?;

        let module = self.config().module_account.clone();
        let mut batch = LedgerBatch::new();
        batch.send_to_module(sender, &module, &[msg.collateral_in.clone(), msg.mage_in.clone()]);

        self.commit(
            &batch,
            |store| Self::write_collateral(store, records),
            Event::DepositCollateral {
                sender,
                receiver,
                coin_in: vec![msg.collateral_in.clone(), msg.mage_in.clone()],
            },
        )?;
        log!(
            INFO,
            "[deposit_collateral] {} deposited {} and {} for {}",
            sender,
            msg.collateral_in,
            msg.mage_in,
            receiver
        );
        Ok(())
    }

    fn apply_redeem_collateral(&mut self, sender: Principal, msg: MsgRedeemCollateral) -> Result<(), MakerError> {
        let receiver = msg.to.unwrap_or(sender);
        let records = self.calculate_redeem_collateral(&sender, &msg.collateral_out, &msg.mage_out)?;

        let module = self.config().module_account.clone();
        let mut batch = LedgerBatch::new();
        batch.send_to_account(&module, receiver, &[msg.collateral_out.clone(), msg.mage_out.clone()]);

        self.commit(
            &batch,
            |store| Self::write_collateral(store, records),
            Event::RedeemCollateral {
                sender,
                receiver,
                coin_out: vec![msg.collateral_out.clone(), msg.mage_out.clone()],
            },
        )?;
        log!(
            INFO,
            "[redeem_collateral] {} redeemed {} and {}",
            sender,
            msg.collateral_out,
            msg.mage_out
        );
        Ok(())
    }

    fn apply_mint_by_collateral(
        &mut self,
        sender: Principal,
        msg: MsgMintByCollateral,
    ) -> Result<MintByCollateralResponse, MakerError> {
        let receiver = msg.to.unwrap_or(sender);
        let (mint_fee, records) = self.calculate_mint_by_collateral(&sender, &msg.collateral_denom, &msg.mint_out)?;
        let mint_total = msg.mint_out.checked_add(mint_fee.amount)?;

        let module = self.config().module_account.clone();
        let fee_collector = self.config().fee_collector.clone();
        let mut batch = LedgerBatch::new();
        batch
            .mint(&module, &[mint_total])
            .send_to_account(&module, receiver, &[msg.mint_out.clone()])
            .send_between_modules(&module, &fee_collector, &[mint_fee.clone()]);

        self.commit(
            &batch,
            |store| Self::write_collateral(store, records),
            Event::MintByCollateral {
                sender,
                receiver,
                coin_out: msg.mint_out.clone(),
                fee: mint_fee.clone(),
            },
        )?;
        log!(
            INFO,
            "[mint_by_collateral] {} borrowed {} against {} (fee {})",
            sender,
            msg.mint_out,
            msg.collateral_denom,
            mint_fee
        );

        Ok(MintByCollateralResponse { mint_fee })
    }

    fn apply_burn_by_collateral(
        &mut self,
        sender: Principal,
        msg: MsgBurnByCollateral,
    ) -> Result<BurnByCollateralResponse, MakerError> {
        let (repayment, records) =
            self.calculate_burn_by_collateral(&sender, &msg.collateral_denom, &msg.repay_in_max)?;

        let module = self.config().module_account.clone();
        let fee_collector = self.config().fee_collector.clone();
        let mut batch = LedgerBatch::new();
        batch
            .send_to_module(sender, &module, &[repayment.repay_in.clone()])
            .burn(&module, &[repayment.repay_principal.clone()])
            .send_between_modules(&module, &fee_collector, &[repayment.repay_interest.clone()]);

        self.commit(
            &batch,
            |store| Self::write_collateral(store, records),
            Event::BurnByCollateral {
                sender,
                collateral_denom: msg.collateral_denom.clone(),
                coin_in: repayment.repay_in.clone(),
                fee: repayment.repay_interest.clone(),
            },
        )?;
        log!(
            INFO,
            "[burn_by_collateral] {} repaid {} of {} debt ({} interest)",
            sender,
            repayment.repay_in,
            msg.collateral_denom,
            repayment.repay_interest
        );

        Ok(BurnByCollateralResponse {
            repay_in: repayment.repay_in,
            repay_interest: repayment.repay_interest,
        })
    }

    fn apply_liquidate_collateral(
        &mut self,
        sender: Principal,
        msg: MsgLiquidateCollateral,
    ) -> Result<LiquidateCollateralResponse, MakerError> {
        let receiver = msg.to.unwrap_or(sender);
        let (liquidation, records) =
            self.calculate_liquidate_collateral(&msg.debtor, &msg.collateral, &msg.repay_in_max)?;

        let module = self.config().module_account.clone();
        let fee_collector = self.config().fee_collector.clone();
        let mut batch = LedgerBatch::new();
        batch
            .send_to_module(sender, &module, &[liquidation.repay_in.clone()])
            .burn(&module, &[liquidation.repay_debt.clone()])
            .send_to_account(&module, msg.debtor, &[liquidation.refund.clone()])
            .send_to_account(&module, receiver, &[liquidation.collateral_out.clone()])
            .send_between_modules(&module, &fee_collector, &[liquidation.commission_fee.clone()]);

        self.commit(
            &batch,
            |store| Self::write_collateral(store, records),
            Event::LiquidateCollateral {
                sender,
                receiver,
                debtor: msg.debtor,
                coin_in: liquidation.repay_in.clone(),
                coin_out: liquidation.collateral_out.clone(),
                fee: liquidation.commission_fee.clone(),
            },
        )?;
        log!(
            INFO,
            "[liquidate_collateral] {} liquidated {} of {} for {} (commission {})",
            sender,
            msg.collateral,
            msg.debtor,
            liquidation.repay_in,
            liquidation.commission_fee
        );

        Ok(LiquidateCollateralResponse {
            repay_in: liquidation.repay_in,
            collateral_out: liquidation.collateral_out,
            commission_fee: liquidation.commission_fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerAccount;
    use crate::numeric::{Coin, Ratio};
    use crate::test_helpers::{alice, bob, fixture, fund, open_position, update_atom, ATOM};
    use crate::{ATTO_MAGE_DENOM, FEE_COLLECTOR, MICRO_USW_DENOM};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn borrow(keeper: &mut crate::test_helpers::TestKeeper, amount: u128) {
        keeper
            .mint_by_collateral(
                alice(),
                MsgMintByCollateral {
                    to: None,
                    collateral_denom: ATOM.to_string(),
                    mint_out: Coin::new(MICRO_USW_DENOM, amount),
                },
            )
            .unwrap();
    }

    #[test]
    fn should_open_position_on_deposit() {
        let mut keeper = fixture();
        open_position(&mut keeper, alice(), 1_000, 50);

        let account = keeper.store().account_collateral(&alice(), ATOM).unwrap();
        assert_eq!(account.collateral.amount, 1_000);
        assert_eq!(account.mage_collateralized.amount, 50);
        let pool = keeper.store().pool_collateral(ATOM).unwrap();
        assert_eq!(pool.collateral.amount, 1_000);
        assert_eq!(
            keeper
                .ledger()
                .balance(&LedgerAccount::Module(crate::MODULE_ACCOUNT.to_string()), ATOM),
            1_000
        );
    }

    #[test]
    fn should_reject_deposit_over_collateral_ceiling() {
        let mut keeper = fixture();
        update_atom(&mut keeper, |params| params.max_collateral = Some(999));
        fund(&mut keeper, alice(), Coin::new(ATOM, 1_000));
        let state = keeper.store().clone();

        assert_matches!(
            keeper.deposit_collateral(
                alice(),
                MsgDepositCollateral {
                    to: None,
                    collateral_in: Coin::new(ATOM, 1_000),
                    mage_in: Coin::zero(ATTO_MAGE_DENOM),
                },
            ),
            Err(MakerError::CollateralCeiling { ceiling: 999, .. })
        );
        assert_eq!(keeper.store(), &state);
    }

    #[test]
    fn should_repay_interest_first() {
        let mut keeper = fixture();
        open_position(&mut keeper, alice(), 1_000_000, 0);
        update_atom(&mut keeper, |params| params.interest_fee = Ratio::new(dec!(1)));
        borrow(&mut keeper, 100_000);

        // One full year of blocks at 100% APR doubles the debt.
        let blocks_per_year = keeper.params().blocks_per_year;
        keeper.begin_block(blocks_per_year);

        let response = keeper
            .burn_by_collateral(
                alice(),
                MsgBurnByCollateral {
                    collateral_denom: ATOM.to_string(),
                    repay_in_max: Coin::new(MICRO_USW_DENOM, 100_000),
                },
            )
            .unwrap();
        assert_eq!(response.repay_in.amount, 100_000);
        assert_eq!(response.repay_interest.amount, 100_000);

        let account = keeper.store().account_collateral(&alice(), ATOM).unwrap();
        assert_eq!(account.war_debt.amount, 100_000);
        assert!(account.last_interest.is_zero());
        assert_eq!(
            keeper
                .ledger()
                .balance(&LedgerAccount::Module(FEE_COLLECTOR.to_string()), MICRO_USW_DENOM),
            100_000
        );
    }

    #[test]
    fn should_fail_repay_without_debt() {
        let mut keeper = fixture();
        open_position(&mut keeper, alice(), 1_000, 0);
        assert_matches!(
            keeper.burn_by_collateral(
                alice(),
                MsgBurnByCollateral {
                    collateral_denom: ATOM.to_string(),
                    repay_in_max: Coin::new(MICRO_USW_DENOM, 1),
                },
            ),
            Err(MakerError::AccountNoDebt(_))
        );
    }

    #[test]
    fn should_keep_redeemed_position_solvent() {
        let mut keeper = fixture();
        open_position(&mut keeper, alice(), 1_000, 0);
        borrow(&mut keeper, 400);

        let redeem = |amount| MsgRedeemCollateral {
            to: Some(bob()),
            collateral_out: Coin::new(ATOM, amount),
            mage_out: Coin::zero(ATTO_MAGE_DENOM),
        };
        // 800 left at 0.5 LTV supports 400 of debt, 799 does not.
        assert_matches!(
            keeper.redeem_collateral(alice(), redeem(201)),
            Err(MakerError::AccountInsufficientCollateral { .. })
        );
        keeper.redeem_collateral(alice(), redeem(200)).unwrap();
        assert_eq!(keeper.ledger().balance(&LedgerAccount::User(bob()), ATOM), 200);
        assert_eq!(
            keeper.store().account_collateral(&alice(), ATOM).unwrap().collateral.amount,
            800
        );
    }

    #[test]
    fn should_liquidate_with_refund_and_commission() {
        let mut keeper = fixture();
        open_position(&mut keeper, alice(), 1_000, 0);
        borrow(&mut keeper, 500);
        // Collateral halves: 1000 * 0.5 * 0.9 = 450 < 500 of debt.
        keeper.oracle_mut().set_rate(ATOM, dec!(0.5));
        fund(&mut keeper, bob(), Coin::new(MICRO_USW_DENOM, 1_000));

        let response = keeper
            .liquidate_collateral(
                bob(),
                MsgLiquidateCollateral {
                    to: None,
                    debtor: alice(),
                    collateral: Coin::new(ATOM, 1_000),
                    repay_in_max: Coin::new(MICRO_USW_DENOM, 450),
                },
            )
            .unwrap();
        // fee 100, commission 10, repay (1000 - 100) * 0.5 = 450
        assert_eq!(response.repay_in, Coin::new(MICRO_USW_DENOM, 450));
        assert_eq!(response.collateral_out, Coin::new(ATOM, 990));
        assert_eq!(response.commission_fee, Coin::new(ATOM, 10));

        let account = keeper.store().account_collateral(&alice(), ATOM).unwrap();
        assert_eq!(account.war_debt.amount, 50);
        assert!(account.collateral.is_zero());
        let ledger = keeper.ledger();
        assert_eq!(ledger.balance(&LedgerAccount::User(bob()), ATOM), 990);
        assert_eq!(ledger.balance(&LedgerAccount::User(bob()), MICRO_USW_DENOM), 550);
        assert_eq!(
            ledger.balance(&LedgerAccount::Module(FEE_COLLECTOR.to_string()), ATOM),
            10
        );
    }

    #[test]
    fn should_refund_debtor_when_repayment_exceeds_debt() {
        let mut keeper = fixture();
        update_atom(&mut keeper, |params| {
            params.liquidation_threshold = Ratio::new(dec!(0.6));
            params.liquidation_fee = Ratio::new(dec!(0.05));
        });
        open_position(&mut keeper, alice(), 1_000, 0);
        borrow(&mut keeper, 500);
        // 1000 * 0.8 * 0.6 = 480 <= 500 of debt.
        keeper.oracle_mut().set_rate(ATOM, dec!(0.8));
        fund(&mut keeper, bob(), Coin::new(MICRO_USW_DENOM, 1_000));

        let response = keeper
            .liquidate_collateral(
                bob(),
                MsgLiquidateCollateral {
                    to: None,
                    debtor: alice(),
                    collateral: Coin::new(ATOM, 1_000),
                    repay_in_max: Coin::new(MICRO_USW_DENOM, 1_000),
                },
            )
            .unwrap();
        // fee 50, commission 5, repay (1000 - 50) * 0.8 = 760 against 500 of debt
        assert_eq!(response.repay_in, Coin::new(MICRO_USW_DENOM, 760));
        assert_eq!(response.collateral_out, Coin::new(ATOM, 995));
        assert_eq!(response.commission_fee, Coin::new(ATOM, 5));

        let account = keeper.store().account_collateral(&alice(), ATOM).unwrap();
        assert!(account.war_debt.is_zero());
        assert!(account.collateral.is_zero());
        assert!(keeper.store().pool_collateral(ATOM).unwrap().war_debt.is_zero());

        let ledger = keeper.ledger();
        // Borrowed 500 plus the 260 refund.
        assert_eq!(ledger.balance(&LedgerAccount::User(alice()), MICRO_USW_DENOM), 760);
        assert_eq!(ledger.balance(&LedgerAccount::User(bob()), MICRO_USW_DENOM), 240);
        assert_eq!(ledger.balance(&LedgerAccount::User(bob()), ATOM), 995);
        // The repaid debt is burned, none of it reaches the fee collector.
        assert_eq!(
            ledger.balance(&LedgerAccount::Module(FEE_COLLECTOR.to_string()), MICRO_USW_DENOM),
            0
        );
        assert_eq!(
            ledger.balance(&LedgerAccount::Module(crate::MODULE_ACCOUNT.to_string()), MICRO_USW_DENOM),
            0
        );
    }
}
