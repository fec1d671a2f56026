use crate::types::{
    AccountCollateral, BackingRiskParams, CollateralRiskParams, Params, PoolBacking,
    PoolCollateral, TotalBacking, TotalCollateral,
};
use candid::Principal;
use std::collections::BTreeMap;

/// Persistent records of the maker module.
pub trait ParamStore {
    fn params(&self) -> Params;
    fn set_params(&mut self, params: Params);

    fn backing_ratio_last_block(&self) -> u64;
    fn set_backing_ratio_last_block(&mut self, block_height: u64);

    fn backing_risk_params(&self, denom: &str) -> Option<BackingRiskParams>;
    fn set_backing_risk_params(&mut self, params: BackingRiskParams);
    fn all_backing_risk_params(&self) -> Vec<BackingRiskParams>;

    fn collateral_risk_params(&self, denom: &str) -> Option<CollateralRiskParams>;
    fn set_collateral_risk_params(&mut self, params: CollateralRiskParams);
    fn all_collateral_risk_params(&self) -> Vec<CollateralRiskParams>;

    fn pool_backing(&self, denom: &str) -> Option<PoolBacking>;
    fn set_pool_backing(&mut self, pool: PoolBacking);
    fn all_pool_backing(&self) -> Vec<PoolBacking>;

    fn total_backing(&self) -> Option<TotalBacking>;
    fn set_total_backing(&mut self, total: TotalBacking);

    fn pool_collateral(&self, denom: &str) -> Option<PoolCollateral>;
    fn set_pool_collateral(&mut self, pool: PoolCollateral);
    fn all_pool_collateral(&self) -> Vec<PoolCollateral>;

    fn total_collateral(&self) -> Option<TotalCollateral>;
    fn set_total_collateral(&mut self, total: TotalCollateral);

    fn account_collateral(&self, account: &Principal, denom: &str) -> Option<AccountCollateral>;
    fn set_account_collateral(&mut self, account: AccountCollateral);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    pub params: Params,
    pub backing_ratio_last_block: u64,
    pub backing_risk_params: BTreeMap<String, BackingRiskParams>,
    pub collateral_risk_params: BTreeMap<String, CollateralRiskParams>,
    pub pool_backing: BTreeMap<String, PoolBacking>,
    pub total_backing: Option<TotalBacking>,
    pub pool_collateral: BTreeMap<String, PoolCollateral>,
    pub total_collateral: Option<TotalCollateral>,
    pub account_collateral: BTreeMap<(Principal, String), AccountCollateral>,
}

impl State {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }
}

impl ParamStore for State {
    fn params(&self) -> Params {
        self.params.clone()
    }

    fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    fn backing_ratio_last_block(&self) -> u64 {
        self.backing_ratio_last_block
    }

    fn set_backing_ratio_last_block(&mut self, block_height: u64) {
        self.backing_ratio_last_block = block_height;
    }

    fn backing_risk_params(&self, denom: &str) -> Option<BackingRiskParams> {
        self.backing_risk_params.get(denom).cloned()
    }

    fn set_backing_risk_params(&mut self, params: BackingRiskParams) {
        self.backing_risk_params
            .insert(params.backing_denom.clone(), params);
    }

    fn all_backing_risk_params(&self) -> Vec<BackingRiskParams> {
        self.backing_risk_params.values().cloned().collect()
    }

    fn collateral_risk_params(&self, denom: &str) -> Option<CollateralRiskParams> {
        self.collateral_risk_params.get(denom).cloned()
    }

    fn set_collateral_risk_params(&mut self, params: CollateralRiskParams) {
        self.collateral_risk_params
            .insert(params.collateral_denom.clone(), params);
    }

    fn all_collateral_risk_params(&self) -> Vec<CollateralRiskParams> {
        self.collateral_risk_params.values().cloned().collect()
    }

    fn pool_backing(&self, denom: &str) -> Option<PoolBacking> {
        self.pool_backing.get(denom).cloned()
    }

    fn set_pool_backing(&mut self, pool: PoolBacking) {
        self.pool_backing.insert(pool.backing.denom.clone(), pool);
    }

    fn all_pool_backing(&self) -> Vec<PoolBacking> {
        self.pool_backing.values().cloned().collect()
    }

    fn total_backing(&self) -> Option<TotalBacking> {
        self.total_backing.clone()
    }

    fn set_total_backing(&mut self, total: TotalBacking) {
        self.total_backing = Some(total);
    }

    fn pool_collateral(&self, denom: &str) -> Option<PoolCollateral> {
        self.pool_collateral.get(denom).cloned()
    }

    fn set_pool_collateral(&mut self, pool: PoolCollateral) {
        self.pool_collateral
            .insert(pool.collateral.denom.clone(), pool);
    }

    fn all_pool_collateral(&self) -> Vec<PoolCollateral> {
        self.pool_collateral.values().cloned().collect()
    }

    fn total_collateral(&self) -> Option<TotalCollateral> {
        self.total_collateral.clone()
    }

    fn set_total_collateral(&mut self, total: TotalCollateral) {
        self.total_collateral = Some(total);
    }

    fn account_collateral(&self, account: &Principal, denom: &str) -> Option<AccountCollateral> {
        self.account_collateral
            .get(&(*account, denom.to_string()))
            .cloned()
    }

    fn set_account_collateral(&mut self, account: AccountCollateral) {
        self.account_collateral.insert(
            (account.account, account.collateral.denom.clone()),
            account,
        );
    }
}
