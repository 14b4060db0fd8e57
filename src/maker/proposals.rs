//! Governance proposals.
//!
//! Proposals register new backing and collateral denominations, update
//! their risk parameters and replace the module params. Every proposal is
//! validated in full before any write, and all writes of one proposal go
//! through a single batch.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::backing::{BackingRiskParams, PoolBacking, TotalBacking};
use crate::core::collateral::{CollateralRiskParams, PoolCollateral, TotalCollateral};
use crate::core::config::MakerParams;
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::maker::Maker;
use crate::oracle::PriceOracle;
use crate::storage::StorageBackend;

/// A governance change to the maker module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MakerProposal {
    /// Accept a new backing denomination
    RegisterBacking(BackingRiskParams),
    /// Accept a new collateral denomination
    RegisterCollateral(CollateralRiskParams),
    /// Replace the params of a registered backing
    SetBackingRiskParams(BackingRiskParams),
    /// Replace the params of a registered collateral
    SetCollateralRiskParams(CollateralRiskParams),
    /// Replace the params of several registered backings at once
    BatchSetBackingRiskParams(Vec<BackingRiskParams>),
    /// Replace the params of several registered collaterals at once
    BatchSetCollateralRiskParams(Vec<CollateralRiskParams>),
    /// Replace the module params
    SetParams(MakerParams),
}

impl MakerProposal {
    /// Proposal name
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterBacking(_) => "Register Backing",
            Self::RegisterCollateral(_) => "Register Collateral",
            Self::SetBackingRiskParams(_) => "Set Backing Risk Params",
            Self::SetCollateralRiskParams(_) => "Set Collateral Risk Params",
            Self::BatchSetBackingRiskParams(_) => "Batch Set Backing Risk Params",
            Self::BatchSetCollateralRiskParams(_) => "Batch Set Collateral Risk Params",
            Self::SetParams(_) => "Set Params",
        }
    }

    /// Human readable summary
    pub fn describe(&self) -> String {
        match self {
            Self::RegisterBacking(p) => format!("Register backing {}", p.backing_denom),
            Self::RegisterCollateral(p) => format!("Register collateral {}", p.collateral_denom),
            Self::SetBackingRiskParams(p) => format!("Update backing {}", p.backing_denom),
            Self::SetCollateralRiskParams(p) => format!("Update collateral {}", p.collateral_denom),
            Self::BatchSetBackingRiskParams(list) => format!("Update {} backings", list.len()),
            Self::BatchSetCollateralRiskParams(list) => format!("Update {} collaterals", list.len()),
            Self::SetParams(_) => "Update maker params".into(),
        }
    }
}

impl<B: StorageBackend, O: PriceOracle, L: Ledger> Maker<B, O, L> {
    /// Apply a passed proposal
    pub fn apply_proposal(&mut self, proposal: &MakerProposal) -> Result<()> {
        match proposal {
            MakerProposal::RegisterBacking(params) => self.register_backing(params),
            MakerProposal::RegisterCollateral(params) => self.register_collateral(params),
            MakerProposal::SetBackingRiskParams(params) => self.set_backing_risk_params(params),
            MakerProposal::SetCollateralRiskParams(params) => self.set_collateral_risk_params(params),
            MakerProposal::BatchSetBackingRiskParams(list) => self.batch_set_backing_risk_params(list),
            MakerProposal::BatchSetCollateralRiskParams(list) => self.batch_set_collateral_risk_params(list),
            MakerProposal::SetParams(params) => self.set_params(params),
        }
    }

    /// Register a backing denomination with an empty pool.
    ///
    /// The denomination must not be registered yet and must have supply on
    /// the ledger.
    pub fn register_backing(&mut self, params: &BackingRiskParams) -> Result<()> {
        let denom = params.backing_denom.as_str();
        if self.store.backing_risk_params(denom)?.is_some() {
            return Err(Error::ExistingBacking(denom.to_string()));
        }
        if !self.ledger.has_supply(denom)? {
            return Err(Error::InvalidCoin(format!("no supply of {}", denom)));
        }
        params.validate(self.params()?.reback_bonus)?;

        let mut batch = self.store.batch();
        batch.set_backing_risk_params(params)?;
        batch.set_pool_backing(&PoolBacking::new(denom))?;
        if self.store.total_backing()?.is_none() {
            batch.set_total_backing(&TotalBacking::default())?;
        }
        batch.commit()?;

        info!(denom, enabled = params.enabled, "backing registered");
        Ok(())
    }

    /// Register a collateral denomination with an empty pool
    pub fn register_collateral(&mut self, params: &CollateralRiskParams) -> Result<()> {
        let denom = params.collateral_denom.as_str();
        if self.store.collateral_risk_params(denom)?.is_some() {
            return Err(Error::ExistingCollateral(denom.to_string()));
        }
        if !self.ledger.has_supply(denom)? {
            return Err(Error::InvalidCoin(format!("no supply of {}", denom)));
        }
        params.validate()?;

        let mut batch = self.store.batch();
        batch.set_collateral_risk_params(params)?;
        batch.set_pool_collateral(&PoolCollateral::new(denom))?;
        if self.store.total_collateral()?.is_none() {
            batch.set_total_collateral(&TotalCollateral::default())?;
        }
        batch.commit()?;

        info!(denom, enabled = params.enabled, "collateral registered");
        Ok(())
    }

    /// Update a registered backing
    pub fn set_backing_risk_params(&mut self, params: &BackingRiskParams) -> Result<()> {
        self.batch_set_backing_risk_params(std::slice::from_ref(params))
    }

    /// Update a registered collateral
    pub fn set_collateral_risk_params(&mut self, params: &CollateralRiskParams) -> Result<()> {
        self.batch_set_collateral_risk_params(std::slice::from_ref(params))
    }

    /// Update several registered backings; nothing is written if any entry is invalid
    pub fn batch_set_backing_risk_params(&mut self, list: &[BackingRiskParams]) -> Result<()> {
        let reback_bonus = self.params()?.reback_bonus;
        for params in list {
            if self.store.backing_risk_params(&params.backing_denom)?.is_none() {
                return Err(Error::BackingCoinNotFound(params.backing_denom.clone()));
            }
            params.validate(reback_bonus)?;
        }

        let mut batch = self.store.batch();
        for params in list {
            batch.set_backing_risk_params(params)?;
        }
        batch.commit()?;

        for params in list {
            info!(denom = %params.backing_denom, enabled = params.enabled, "backing risk params updated");
        }
        Ok(())
    }

    /// Update several registered collaterals; nothing is written if any entry is invalid
    pub fn batch_set_collateral_risk_params(&mut self, list: &[CollateralRiskParams]) -> Result<()> {
        for params in list {
            if self.store.collateral_risk_params(&params.collateral_denom)?.is_none() {
                return Err(Error::CollateralCoinNotFound(params.collateral_denom.clone()));
            }
            params.validate()?;
        }

        let mut batch = self.store.batch();
        for params in list {
            batch.set_collateral_risk_params(params)?;
        }
        batch.commit()?;

        for params in list {
            info!(denom = %params.collateral_denom, enabled = params.enabled, "collateral risk params updated");
        }
        Ok(())
    }

    /// Replace the module params.
    ///
    /// A new reback bonus must keep every registered backing's reback fee
    /// plus the bonus below one.
    pub fn set_params(&mut self, params: &MakerParams) -> Result<()> {
        params.validate()?;
        for backing in self.store.all_backing_risk_params()? {
            backing.validate(params.reback_bonus)?;
        }

        let mut batch = self.store.batch();
        batch.set_params(params)?;
        batch.commit()?;

        info!(
            step = %params.backing_ratio_step,
            cooldown = params.backing_ratio_cooldown_period,
            "maker params updated"
        );
        Ok(())
    }
}
