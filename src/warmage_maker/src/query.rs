//! Read-only views over the maker records. Estimates run the same
//! calculations as the operations without touching records or balances.

use crate::backing::{
    BurnBySwapIn, BurnBySwapOut, BuyBackingIn, BuyBackingOut, MintBySwapIn, MintBySwapOut, SellBackingIn,
    SellBackingOut,
};
use crate::ledger::Ledger;
use crate::msgs::{
    MintByCollateralResponse, MsgBurnBySwap, MsgBuyBacking, MsgMintByCollateral, MsgMintBySwap, MsgSellBacking,
};
use crate::numeric::{Coin, Ratio};
use crate::oracle::PriceOracle;
use crate::state::ParamStore;
use crate::types::{
    AccountCollateral, BackingRiskParams, CollateralRiskParams, Params, PoolBacking, PoolCollateral,
    TotalBacking, TotalCollateral,
};
use crate::{Keeper, MakerError};
use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingRatioResponse {
    pub backing_ratio: Ratio,
    pub last_update_block: u64,
}

impl<S: ParamStore, O: PriceOracle, L: Ledger> Keeper<S, O, L> {
    pub fn query_params(&self) -> Params {
        self.params()
    }

    pub fn query_backing_ratio(&self) -> BackingRatioResponse {
        BackingRatioResponse {
            backing_ratio: self.backing_ratio(),
            last_update_block: self.store().backing_ratio_last_block(),
        }
    }

    pub fn query_all_backing_risk_params(&self) -> Vec<BackingRiskParams> {
        self.store().all_backing_risk_params()
    }

    pub fn query_all_collateral_risk_params(&self) -> Vec<CollateralRiskParams> {
        self.store().all_collateral_risk_params()
    }

    pub fn query_pool_backing(&self, backing_denom: &str) -> Result<PoolBacking, MakerError> {
        self.store()
            .pool_backing(backing_denom)
            .ok_or_else(|| MakerError::BackingCoinNotFound(backing_denom.to_string()))
    }

    pub fn query_all_pool_backing(&self) -> Vec<PoolBacking> {
        self.store().all_pool_backing()
    }

    pub fn query_pool_collateral(&self, collateral_denom: &str) -> Result<PoolCollateral, MakerError> {
        self.store()
            .pool_collateral(collateral_denom)
            .ok_or_else(|| MakerError::CollateralCoinNotFound(collateral_denom.to_string()))
    }

    pub fn query_all_pool_collateral(&self) -> Vec<PoolCollateral> {
        self.store().all_pool_collateral()
    }

    /// Stored position of `account`, or an empty one when the denomination
    /// is registered but the account never deposited.
    pub fn query_collateral_of_account(
        &self,
        account: &Principal,
        collateral_denom: &str,
    ) -> Result<AccountCollateral, MakerError> {
        if self.store().collateral_risk_params(collateral_denom).is_none() {
            return Err(MakerError::CollateralCoinNotFound(collateral_denom.to_string()));
        }
        Ok(self
            .store()
            .account_collateral(account, collateral_denom)
            .unwrap_or_else(|| AccountCollateral::new(*account, collateral_denom, self.block_height())))
    }

    /// Total backing with `backing_value` priced at current oracle rates.
    pub fn query_total_backing(&self) -> Result<TotalBacking, MakerError> {
        let mut total = self.store().total_backing().unwrap_or_default();
        total.backing_value = self.total_backing_in_usd()?;
        Ok(total)
    }

    pub fn query_total_collateral(&self) -> TotalCollateral {
        self.store().total_collateral().unwrap_or_default()
    }

    pub fn estimate_mint_by_swap_in(
        &self,
        mint_out: &Coin,
        backing_denom: &str,
        full_backing: bool,
    ) -> Result<MintBySwapIn, MakerError> {
        self.calculate_mint_by_swap_in(mint_out, backing_denom, full_backing)
    }

    pub fn estimate_mint_by_swap_out(&self, msg: &MsgMintBySwap) -> Result<MintBySwapOut, MakerError> {
        self.calculate_mint_by_swap_out(&msg.backing_in_max, &msg.mage_in_max, msg.full_backing)
    }

    pub fn estimate_burn_by_swap_in(
        &self,
        backing_out_max: &Coin,
        mage_out_max: &Coin,
    ) -> Result<BurnBySwapIn, MakerError> {
        self.calculate_burn_by_swap_in(backing_out_max, mage_out_max)
    }

    pub fn estimate_burn_by_swap_out(&self, msg: &MsgBurnBySwap) -> Result<BurnBySwapOut, MakerError> {
        self.calculate_burn_by_swap_out(&msg.burn_in, &msg.backing_out_min.denom)
    }

    pub fn estimate_buy_backing_in(&self, backing_out: &Coin) -> Result<BuyBackingIn, MakerError> {
        self.calculate_buy_backing_in(backing_out)
    }

    pub fn estimate_buy_backing_out(&self, msg: &MsgBuyBacking) -> Result<BuyBackingOut, MakerError> {
        self.calculate_buy_backing_out(&msg.mage_in, &msg.backing_out_min.denom)
    }

    pub fn estimate_sell_backing_in(&self, mage_out: &Coin, backing_denom: &str) -> Result<SellBackingIn, MakerError> {
        self.calculate_sell_backing_in(mage_out, backing_denom)
    }

    pub fn estimate_sell_backing_out(&self, msg: &MsgSellBacking) -> Result<SellBackingOut, MakerError> {
        self.calculate_sell_backing_out(&msg.backing_in)
    }

    /// Fee that minting `mint_out` against the sender's position would charge.
    pub fn estimate_mint_by_collateral(
        &self,
        sender: &Principal,
        msg: &MsgMintByCollateral,
    ) -> Result<MintByCollateralResponse, MakerError> {
        let (mint_fee, _) = self.calculate_mint_by_collateral(sender, &msg.collateral_denom, &msg.mint_out)?;
        Ok(MintByCollateralResponse { mint_fee })
    }
}
