use crate::backing::ensure_denom;
use crate::event::Event;
use crate::ledger::{Ledger, LedgerBatch};
use crate::logs::{DEBUG, INFO};
use crate::msgs::{
    BurnBySwapResponse, BuyBackingResponse, MintBySwapResponse, MsgBurnBySwap, MsgBuyBacking,
    MsgMintBySwap, MsgSellBacking, SellBackingResponse,
};
use crate::numeric::Coin;
use crate::oracle::PriceOracle;
use crate::state::ParamStore;
use crate::{Keeper, MakerError, ATTO_MAGE_DENOM, MICRO_USW_DENOM};
use candid::Principal;
use ic_canister_log::log;

pub(crate) fn check_min_out(actual: &Coin, min: &Coin) -> Result<(), MakerError> {
    if actual.amount < min.amount {
        return Err(MakerError::OverSlippage {
            actual: actual.clone(),
            limit: min.clone(),
        });
    }
    Ok(())
}

pub(crate) fn log_rejection<T>(operation: &str, result: Result<T, MakerError>) -> Result<T, MakerError> {
    if let Err(err) = &result {
        log!(DEBUG, "[{}] rejected: {}", operation, err);
    }
    result
}

impl<S: ParamStore, O: PriceOracle, L: Ledger> Keeper<S, O, L> {
    /// Mints stable units by paying in backing and burning native token.
    pub fn mint_by_swap(&mut self, sender: Principal, msg: MsgMintBySwap) -> Result<MintBySwapResponse, MakerError> {
        log_rejection("mint_by_swap", self.apply_mint_by_swap(sender, msg))
    }

    /// Burns stable units for backing and newly minted native token.
    pub fn burn_by_swap(&mut self, sender: Principal, msg: MsgBurnBySwap) -> Result<BurnBySwapResponse, MakerError> {
        log_rejection("burn_by_swap", self.apply_burn_by_swap(sender, msg))
    }

    /// Buys surplus backing with native token, which is burned.
    pub fn buy_backing(&mut self, sender: Principal, msg: MsgBuyBacking) -> Result<BuyBackingResponse, MakerError> {
        log_rejection("buy_backing", self.apply_buy_backing(sender, msg))
    }

    /// Sells backing to the pool while it is short, for newly minted native
    /// token plus the reback bonus.
    pub fn sell_backing(&mut self, sender: Principal, msg: MsgSellBacking) -> Result<SellBackingResponse, MakerError> {
        log_rejection("sell_backing", self.apply_sell_backing(sender, msg))
    }

    fn apply_mint_by_swap(&mut self, sender: Principal, msg: MsgMintBySwap) -> Result<MintBySwapResponse, MakerError> {
        let receiver = msg.to.unwrap_or(sender);
        ensure_denom(&msg.mint_out_min, MICRO_USW_DENOM)?;

        let quote = self.calculate_mint_by_swap_out(&msg.backing_in_max, &msg.mage_in_max, msg.full_backing)?;
        check_min_out(&quote.mint_out, &msg.mint_out_min)?;

        let mint_total = quote.mint_out.checked_add(quote.mint_fee.amount)?;
        let (mut total, mut pool) = self.backing(&quote.backing_in.denom)?;
        pool.backing = pool.backing.checked_add(quote.backing_in.amount)?;
        pool.war_minted.add_amount(mint_total.amount)?;
        pool.mage_burned.add_amount(quote.mage_in.amount)?;
        total.war_minted.add_amount(mint_total.amount)?;
        total.mage_burned.add_amount(quote.mage_in.amount)?;

        let module = self.config().module_account.clone();
        let fee_collector = self.config().fee_collector.clone();
        let mut batch = LedgerBatch::new();
        batch
            .send_to_module(sender, &module, &[quote.backing_in.clone(), quote.mage_in.clone()])
            .burn(&module, &[quote.mage_in.clone()])
            .mint(&module, &[mint_total])
            .send_to_account(&module, receiver, &[quote.mint_out.clone()])
            .send_between_modules(&module, &fee_collector, &[quote.mint_fee.clone()]);

        self.commit(
            &batch,
            |store| {
                store.set_pool_backing(pool);
                store.set_total_backing(total);
            },
            Event::MintBySwap {
                sender,
                receiver,
                coin_in: vec![quote.backing_in.clone(), quote.mage_in.clone()],
                coin_out: quote.mint_out.clone(),
                fee: quote.mint_fee.clone(),
            },
        )?;
        log!(
            INFO,
            "[mint_by_swap] {} paid {} and {} for {} (fee {})",
            sender,
            quote.backing_in,
            quote.mage_in,
            quote.mint_out,
            quote.mint_fee
        );

        Ok(MintBySwapResponse {
            backing_in: quote.backing_in,
            mage_in: quote.mage_in,
            mint_out: quote.mint_out,
            mint_fee: quote.mint_fee,
        })
    }

    fn apply_burn_by_swap(&mut self, sender: Principal, msg: MsgBurnBySwap) -> Result<BurnBySwapResponse, MakerError> {
        let receiver = msg.to.unwrap_or(sender);
        ensure_denom(&msg.mage_out_min, ATTO_MAGE_DENOM)?;

        let backing_denom = msg.backing_out_min.denom.clone();
        let quote = self.calculate_burn_by_swap_out(&msg.burn_in, &backing_denom)?;
        check_min_out(&quote.backing_out, &msg.backing_out_min)?;
        check_min_out(&quote.mage_out, &msg.mage_out_min)?;

        let burn_actual = msg.burn_in.checked_sub(quote.burn_fee.amount)?;
        let (mut total, mut pool) = self.backing(&backing_denom)?;
        pool.backing = pool.backing.checked_sub(quote.backing_out.amount)?;
        pool.war_minted.sub_amount(burn_actual.amount)?;
        pool.mage_burned.sub_amount(quote.mage_out.amount)?;
        total.war_minted.sub_amount(burn_actual.amount)?;
        total.mage_burned.sub_amount(quote.mage_out.amount)?;

        let module = self.config().module_account.clone();
        let fee_collector = self.config().fee_collector.clone();
        let mut batch = LedgerBatch::new();
        batch
            .send_to_module(sender, &module, &[msg.burn_in.clone()])
            .burn(&module, &[burn_actual])
            .send_between_modules(&module, &fee_collector, &[quote.burn_fee.clone()])
            .mint(&module, &[quote.mage_out.clone()])
            .send_to_account(&module, receiver, &[quote.backing_out.clone(), quote.mage_out.clone()]);

        self.commit(
            &batch,
            |store| {
                store.set_pool_backing(pool);
                store.set_total_backing(total);
            },
            Event::BurnBySwap {
                sender,
                receiver,
                coin_in: msg.burn_in.clone(),
                coin_out: vec![quote.backing_out.clone(), quote.mage_out.clone()],
                fee: quote.burn_fee.clone(),
            },
        )?;
        log!(
            INFO,
            "[burn_by_swap] {} burned {} for {} and {} (fee {})",
            sender,
            msg.burn_in,
            quote.backing_out,
            quote.mage_out,
            quote.burn_fee
        );

        Ok(BurnBySwapResponse {
            backing_out: quote.backing_out,
            mage_out: quote.mage_out,
            burn_fee: quote.burn_fee,
        })
    }

    fn apply_buy_backing(&mut self, sender: Principal, msg: MsgBuyBacking) -> Result<BuyBackingResponse, MakerError> {
        let receiver = msg.to.unwrap_or(sender);
        let backing_denom = msg.backing_out_min.denom.clone();

        let quote = self.calculate_buy_backing_out(&msg.mage_in, &backing_denom)?;
        check_min_out(&quote.backing_out, &msg.backing_out_min)?;

        let (mut total, mut pool) = self.backing(&backing_denom)?;
        pool.backing = pool
            .backing
            .checked_sub(quote.backing_out.amount)?
            .checked_sub(quote.buyback_fee.amount)?;
        pool.mage_burned.add_amount(msg.mage_in.amount)?;
        total.mage_burned.add_amount(msg.mage_in.amount)?;

        let module = self.config().module_account.clone();
        let fee_collector = self.config().fee_collector.clone();
        let mut batch = LedgerBatch::new();
        batch
            .send_to_module(sender, &module, &[msg.mage_in.clone()])
            .burn(&module, &[msg.mage_in.clone()])
            .send_to_account(&module, receiver, &[quote.backing_out.clone()])
            .send_between_modules(&module, &fee_collector, &[quote.buyback_fee.clone()]);

        self.commit(
            &batch,
            |store| {
                store.set_pool_backing(pool);
                store.set_total_backing(total);
            },
            Event::BuyBacking {
                sender,
                receiver,
                coin_in: msg.mage_in.clone(),
                coin_out: quote.backing_out.clone(),
                fee: quote.buyback_fee.clone(),
            },
        )?;
        log!(
            INFO,
            "[buy_backing] {} bought {} with {} (fee {})",
            sender,
            quote.backing_out,
            msg.mage_in,
            quote.buyback_fee
        );

        Ok(BuyBackingResponse {
            backing_out: quote.backing_out,
            buyback_fee: quote.buyback_fee,
        })
    }

    fn apply_sell_backing(&mut self, sender: Principal, msg: MsgSellBacking) -> Result<SellBackingResponse, MakerError> {
        let receiver = msg.to.unwrap_or(sender);
        ensure_denom(&msg.mage_out_min, ATTO_MAGE_DENOM)?;

        let quote = self.calculate_sell_backing_out(&msg.backing_in)?;
        check_min_out(&quote.mage_out, &msg.mage_out_min)?;

        // Minted amount covers the payout and the fee.
        let mage_mint = quote.mage_out.checked_add(quote.reback_fee.amount)?;
        let (mut total, mut pool) = self.backing(&msg.backing_in.denom)?;
        pool.backing = pool.backing.checked_add(msg.backing_in.amount)?;
        pool.mage_burned.sub_amount(mage_mint.amount)?;
        total.mage_burned.sub_amount(mage_mint.amount)?;

        let module = self.config().module_account.clone();
        let fee_collector = self.config().fee_collector.clone();
        let mut batch = LedgerBatch::new();
        batch
            .send_to_module(sender, &module, &[msg.backing_in.clone()])
            .mint(&module, &[mage_mint])
            .send_to_account(&module, receiver, &[quote.mage_out.clone()])
            .send_between_modules(&module, &fee_collector, &[quote.reback_fee.clone()]);

        self.commit(
            &batch,
            |store| {
                store.set_pool_backing(pool);
                store.set_total_backing(total);
            },
            Event::SellBacking {
                sender,
                receiver,
                coin_in: msg.backing_in.clone(),
                coin_out: quote.mage_out.clone(),
                fee: quote.reback_fee.clone(),
            },
        )?;
        log!(
            INFO,
            "[sell_backing] {} sold {} for {} (fee {})",
            sender,
            msg.backing_in,
            quote.mage_out,
            quote.reback_fee
        );

        Ok(SellBackingResponse {
            mage_out: quote.mage_out,
            reback_fee: quote.reback_fee,
        })
    }
}
