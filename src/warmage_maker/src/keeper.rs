use crate::event::{record_adjust_backing_ratio, record_event, Event};
use crate::fees::{check_burn_price_upper_bound, check_mint_price_lower_bound};
use crate::ledger::{Ledger, LedgerAccount, LedgerBatch};
use crate::logs::{DEBUG, INFO};
use crate::numeric::Ratio;
use crate::oracle::{OracleError, PriceOracle};
use crate::state::ParamStore;
use crate::storage::EventLog;
use crate::types::{
    AccountCollateral, BackingRiskParams, CollateralRiskParams, Params, PoolBacking,
    PoolCollateral, TotalBacking, TotalCollateral,
};
use crate::{MakerError, FEE_COLLECTOR, MICRO_USW_DENOM, MODULE_ACCOUNT};
use candid::{CandidType, Principal};
use ic_canister_log::log;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Module account holding backing, collateral and in-flight tokens.
    pub module_account: String,
    /// Module account receiving every fee.
    pub fee_collector: String,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            module_account: MODULE_ACCOUNT.to_string(),
            fee_collector: FEE_COLLECTOR.to_string(),
        }
    }
}

/// What the end-of-block adjustment sees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackingRatioInput {
    pub block_height: u64,
    pub backing_ratio: Ratio,
    pub last_update_block: u64,
    pub war_price: Option<Decimal>,
}

/// Periodic process that moves the backing ratio. Returning `None` keeps the
/// current ratio.
pub trait BackingRatioAdjuster {
    fn adjust_backing_ratio(&mut self, input: &BackingRatioInput) -> Option<Ratio>;
}

/// Records of one account position together with the pool and total
/// aggregates it belongs to. Calculations work on owned copies; nothing is
/// written until an operation commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollateralRecords {
    pub total: TotalCollateral,
    pub pool: PoolCollateral,
    pub account: AccountCollateral,
}

pub struct Keeper<S, O, L> {
    store: S,
    oracle: O,
    ledger: L,
    config: KeeperConfig,
    block_height: u64,
    events: EventLog,
}

impl<S: ParamStore, O: PriceOracle, L: Ledger> Keeper<S, O, L> {
    pub fn new(store: S, oracle: O, ledger: L, config: KeeperConfig) -> Self {
        Self {
            store,
            oracle,
            ledger,
            config,
            block_height: 0,
            events: EventLog::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.all_events()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    pub fn begin_block(&mut self, block_height: u64) {
        self.block_height = block_height;
    }

    pub fn end_block<A: BackingRatioAdjuster>(&mut self, adjuster: &mut A) {
        let mut params = self.store.params();
        let input = BackingRatioInput {
            block_height: self.block_height,
            backing_ratio: params.backing_ratio,
            last_update_block: self.store.backing_ratio_last_block(),
            war_price: self.oracle.exchange_rate(MICRO_USW_DENOM).ok(),
        };
        let Some(backing_ratio) = adjuster.adjust_backing_ratio(&input) else {
            return;
        };
        if backing_ratio.0.is_sign_negative() && !backing_ratio.is_zero() {
            log!(
                INFO,
                "[end_block] ignoring negative backing ratio {} at block {}",
                backing_ratio,
                self.block_height
            );
            return;
        }
        log!(
            INFO,
            "[end_block] backing ratio {} -> {} at block {}",
            params.backing_ratio,
            backing_ratio,
            self.block_height
        );
        params.backing_ratio = backing_ratio;
        self.store.set_params(params);
        self.store.set_backing_ratio_last_block(self.block_height);
        record_adjust_backing_ratio(&mut self.events, backing_ratio, self.block_height);
    }

    pub fn params(&self) -> Params {
        self.store.params()
    }

    pub fn backing_ratio(&self) -> Ratio {
        self.store.params().backing_ratio
    }

    pub fn set_params(&mut self, params: Params) -> Result<(), MakerError> {
        params.validate()?;
        self.store.set_params(params);
        record_event(&mut self.events, Event::SetParams);
        Ok(())
    }

    /// Adds or updates a backing asset. Its pool, and the total record on
    /// first use, start out empty; existing pools are left untouched.
    pub fn register_backing(&mut self, params: BackingRiskParams) -> Result<(), MakerError> {
        params.validate()?;
        let denom = params.backing_denom.clone();
        let enabled = params.enabled;
        if self.store.pool_backing(&denom).is_none() {
            self.store.set_pool_backing(PoolBacking::new(&denom));
        }
        if self.store.total_backing().is_none() {
            self.store.set_total_backing(TotalBacking::default());
        }
        self.store.set_backing_risk_params(params);
        log!(INFO, "[register_backing] {} enabled: {}", denom, enabled);
        record_event(
            &mut self.events,
            Event::RegisterBacking {
                backing_denom: denom,
                enabled,
            },
        );
        Ok(())
    }

    pub fn register_collateral(&mut self, params: CollateralRiskParams) -> Result<(), MakerError> {
        params.validate()?;
        let denom = params.collateral_denom.clone();
        let enabled = params.enabled;
        if self.store.pool_collateral(&denom).is_none() {
            self.store.set_pool_collateral(PoolCollateral::new(&denom));
        }
        if self.store.total_collateral().is_none() {
            self.store.set_total_collateral(TotalCollateral::default());
        }
        self.store.set_collateral_risk_params(params);
        log!(INFO, "[register_collateral] {} enabled: {}", denom, enabled);
        record_event(
            &mut self.events,
            Event::RegisterCollateral {
                collateral_denom: denom,
                enabled,
            },
        );
        Ok(())
    }

    /// Oracle price, rejected unless strictly positive.
    pub(crate) fn price(&self, denom: &str) -> Result<Decimal, MakerError> {
        let price = self.oracle.exchange_rate(denom)?;
        if price <= Decimal::ZERO {
            return Err(MakerError::Oracle(OracleError {
                denom: denom.to_string(),
                reason: format!("non-positive exchange rate {}", price),
            }));
        }
        Ok(price)
    }

    pub(crate) fn check_mint_price_lower_bound(&self) -> Result<(), MakerError> {
        let war_price = self.oracle.exchange_rate(MICRO_USW_DENOM)?;
        check_mint_price_lower_bound(war_price, self.store.params().mint_price_bias)
    }

    pub(crate) fn check_burn_price_upper_bound(&self) -> Result<(), MakerError> {
        let war_price = self.oracle.exchange_rate(MICRO_USW_DENOM)?;
        check_burn_price_upper_bound(war_price, self.store.params().burn_price_bias)
    }

    pub(crate) fn available_backing_params(&self, denom: &str) -> Result<BackingRiskParams, MakerError> {
        let params = self
            .store
            .backing_risk_params(denom)
            .ok_or_else(|| MakerError::BackingCoinNotFound(denom.to_string()))?;
        if !params.enabled {
            return Err(MakerError::BackingCoinDisabled(denom.to_string()));
        }
        Ok(params)
    }

    pub(crate) fn available_collateral_params(&self, denom: &str) -> Result<CollateralRiskParams, MakerError> {
        let params = self
            .store
            .collateral_risk_params(denom)
            .ok_or_else(|| MakerError::CollateralCoinNotFound(denom.to_string()))?;
        if !params.enabled {
            return Err(MakerError::CollateralCoinDisabled(denom.to_string()));
        }
        Ok(params)
    }

    pub(crate) fn backing(&self, denom: &str) -> Result<(TotalBacking, PoolBacking), MakerError> {
        let total = self
            .store
            .total_backing()
            .ok_or_else(|| MakerError::BackingCoinNotFound(denom.to_string()))?;
        let pool = self
            .store
            .pool_backing(denom)
            .ok_or_else(|| MakerError::BackingCoinNotFound(denom.to_string()))?;
        Ok((total, pool))
    }

    /// Loads a position. A missing account record is created empty when
    /// `allow_new_account` is set and is an error otherwise.
    pub(crate) fn collateral(
        &self,
        account: &Principal,
        denom: &str,
        allow_new_account: bool,
    ) -> Result<CollateralRecords, MakerError> {
        let total = self
            .store
            .total_collateral()
            .ok_or_else(|| MakerError::CollateralCoinNotFound(denom.to_string()))?;
        let pool = self
            .store
            .pool_collateral(denom)
            .ok_or_else(|| MakerError::CollateralCoinNotFound(denom.to_string()))?;
        let account = match self.store.account_collateral(account, denom) {
            Some(record) => record,
            None if allow_new_account => AccountCollateral::new(*account, denom, self.block_height),
            None => return Err(MakerError::AccountNoCollateral(denom.to_string())),
        };
        Ok(CollateralRecords {
            total,
            pool,
            account,
        })
    }

    pub(crate) fn module_balance(&self, denom: &str) -> u128 {
        self.ledger.balance(
            &LedgerAccount::Module(self.config.module_account.clone()),
            denom,
        )
    }

    /// Applies the ledger batch, then the record writes, then the event.
    /// A ledger failure leaves records and events untouched.
    pub(crate) fn commit(
        &mut self,
        batch: &LedgerBatch,
        write: impl FnOnce(&mut S),
        event: Event,
    ) -> Result<(), MakerError> {
        if let Err(err) = self.ledger.apply(batch.ops()) {
            log!(DEBUG, "[commit] {} rolled back: {}", event.name(), err);
            return Err(err.into());
        }
        write(&mut self.store);
        record_event(&mut self.events, event);
        Ok(())
    }

    pub(crate) fn write_collateral(store: &mut S, records: CollateralRecords) {
        store.set_total_collateral(records.total);
        store.set_pool_collateral(records.pool);
        store.set_account_collateral(records.account);
    }
}
