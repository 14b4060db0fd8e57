//! Engine configuration and module parameters.
//!
//! Parameters are divided into:
//! - Constructor-time: [`MakerConfig`], fixed for the lifetime of a [`crate::Maker`]
//! - Governable: [`MakerParams`], persisted in the store and updated by proposal

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::*;

// ═══════════════════════════════════════════════════════════════════════════════
// MODULE PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Governable maker parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerParams {
    /// Backing ratio change per controller adjustment
    pub backing_ratio_step: Decimal,

    /// Fraction of the target price defining the no-adjustment band
    pub backing_ratio_price_band: Decimal,

    /// Minimum blocks between two controller adjustments
    pub backing_ratio_cooldown_period: i64,

    /// Grid must trade at least `target * (1 + bias)` to mint by swap
    pub mint_price_bias: Decimal,

    /// Grid must trade at most `target * (1 - bias)` to burn by swap
    pub burn_price_bias: Decimal,

    /// Extra Iron paid on top of the minted amount when selling backing
    pub reback_bonus: Decimal,

    /// Share of the liquidation fee routed to the reward module
    pub liquidation_commission_fee: Decimal,
}

impl Default for MakerParams {
    fn default() -> Self {
        Self {
            backing_ratio_step: DEFAULT_BACKING_RATIO_STEP,
            backing_ratio_price_band: DEFAULT_BACKING_RATIO_PRICE_BAND,
            backing_ratio_cooldown_period: DEFAULT_BACKING_RATIO_COOLDOWN_PERIOD,
            mint_price_bias: DEFAULT_MINT_PRICE_BIAS,
            burn_price_bias: DEFAULT_BURN_PRICE_BIAS,
            reback_bonus: DEFAULT_REBACK_BONUS,
            liquidation_commission_fee: DEFAULT_LIQUIDATION_COMMISSION_FEE,
        }
    }
}

impl MakerParams {
    /// Set the controller step (for testing)
    pub fn with_backing_ratio_step(mut self, step: Decimal) -> Self {
        self.backing_ratio_step = step;
        self
    }

    /// Set the controller cooldown (for testing)
    pub fn with_cooldown(mut self, blocks: i64) -> Self {
        self.backing_ratio_cooldown_period = blocks;
        self
    }

    /// Set the mint and burn price biases
    pub fn with_price_bias(mut self, mint: Decimal, burn: Decimal) -> Self {
        self.mint_price_bias = mint;
        self.burn_price_bias = burn;
        self
    }

    /// Validate every parameter lies in its allowed range
    pub fn validate(&self) -> Result<()> {
        check_fraction("backing_ratio_step", self.backing_ratio_step)?;
        check_fraction("backing_ratio_price_band", self.backing_ratio_price_band)?;
        check_fraction("mint_price_bias", self.mint_price_bias)?;
        check_fraction("burn_price_bias", self.burn_price_bias)?;
        check_fraction("reback_bonus", self.reback_bonus)?;
        check_fraction("liquidation_commission_fee", self.liquidation_commission_fee)?;
        if self.backing_ratio_cooldown_period < 0 {
            return Err(Error::invalid_param(
                "backing_ratio_cooldown_period",
                "cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Check `value` lies in `[0, 1)`
pub(crate) fn check_fraction(name: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() || value >= Decimal::ONE {
        return Err(Error::invalid_param(
            name,
            format!("must be in [0, 1), got {}", value),
        ));
    }
    Ok(())
}

/// Check `value` lies in `[0, 1]`
pub(crate) fn check_unit_interval(name: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() || value > Decimal::ONE {
        return Err(Error::invalid_param(
            name,
            format!("must be in [0, 1], got {}", value),
        ));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration handed to [`crate::Maker::new`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerConfig {
    /// Stablecoin denomination
    pub grid_denom: String,

    /// Auxiliary token denomination
    pub iron_denom: String,

    /// USD peg used for every Grid conversion
    pub grid_target: Decimal,

    /// Blocks per year, the interest accrual period
    pub blocks_per_year: u64,

    /// Module account holding backing and collateral
    pub maker_module: String,

    /// Module account receiving fees, interest and commission
    pub reward_module: String,

    /// Parameters written to the store when none are persisted yet
    pub params: MakerParams,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            grid_denom: GRID_DENOM.to_string(),
            iron_denom: IRON_DENOM.to_string(),
            grid_target: GRID_TARGET_PRICE,
            blocks_per_year: BLOCKS_PER_YEAR,
            maker_module: MAKER_MODULE.to_string(),
            reward_module: ORACLE_MODULE.to_string(),
            params: MakerParams::default(),
        }
    }
}

impl MakerConfig {
    /// Override the initial module params
    pub fn with_params(mut self, params: MakerParams) -> Self {
        self.params = params;
        self
    }

    /// Override the Grid target peg
    pub fn with_grid_target(mut self, target: Decimal) -> Self {
        self.grid_target = target;
        self
    }

    /// Override the interest accrual period
    pub fn with_blocks_per_year(mut self, blocks: u64) -> Self {
        self.blocks_per_year = blocks;
        self
    }

    /// Validate the configuration is consistent
    pub fn validate(&self) -> Result<()> {
        if self.grid_denom.is_empty() || self.iron_denom.is_empty() {
            return Err(Error::Config("denominations cannot be empty".into()));
        }
        if self.grid_denom == self.iron_denom {
            return Err(Error::Config(format!(
                "grid and iron share denomination {}",
                self.grid_denom
            )));
        }
        if self.grid_target <= Decimal::ZERO {
            return Err(Error::Config(format!(
                "grid target must be positive, got {}",
                self.grid_target
            )));
        }
        if self.blocks_per_year == 0 {
            return Err(Error::Config("blocks per year cannot be zero".into()));
        }
        if self.maker_module.is_empty() || self.reward_module.is_empty() {
            return Err(Error::Config("module names cannot be empty".into()));
        }
        if self.maker_module == self.reward_module {
            return Err(Error::Config("maker and reward module must differ".into()));
        }
        self.params.validate()
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(e.to_string()))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Deserialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Config(e.to_string()))?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_maker_params_default() {
        let params = MakerParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.backing_ratio_step, dec!(0.0025));
        assert_eq!(params.backing_ratio_cooldown_period, 600);
    }

    #[test]
    fn test_params_out_of_range() {
        let params = MakerParams::default().with_backing_ratio_step(dec!(1));
        assert!(params.validate().is_err());

        let params = MakerParams::default().with_cooldown(-1);
        assert!(params.validate().is_err());

        let mut params = MakerParams::default();
        params.reback_bonus = dec!(-0.1);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(MakerConfig::default().validate().is_ok());
        assert!(MakerConfig::default().with_grid_target(Decimal::ZERO).validate().is_err());
        assert!(MakerConfig::default().with_blocks_per_year(0).validate().is_err());

        let mut config = MakerConfig::default();
        config.iron_denom = config.grid_denom.clone();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("maker.json");

        let config = MakerConfig::default()
            .with_grid_target(dec!(1.01))
            .with_params(MakerParams::default().with_cooldown(10));
        config.save(&path).unwrap();

        let loaded = MakerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MakerConfig::load(dir.path().join("absent.json")).is_err());
    }
}
