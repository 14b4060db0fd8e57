//! Backing ratio controller.
//!
//! Runs once per block after every message of the block. When Grid trades
//! above the target band the ratio steps down toward algorithmic backing;
//! below the band it steps up toward full backing. The ratio always stays
//! within `[0, 1]` and moves at most one step per adjustment.

use rust_decimal::Decimal;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::ledger::Ledger;
use crate::maker::events::{BackingRatioAdjustedEvent, MakerEvent};
use crate::maker::{BlockContext, Maker};
use crate::oracle::PriceOracle;
use crate::storage::StorageBackend;

/// Next ratio for an observed Grid price
pub fn next_backing_ratio(
    ratio: Decimal,
    grid_price: Decimal,
    target: Decimal,
    price_band: Decimal,
    step: Decimal,
) -> Decimal {
    let band = target * price_band;
    if grid_price > target + band {
        (ratio - step).max(Decimal::ZERO)
    } else if grid_price < target - band {
        (ratio + step).min(Decimal::ONE)
    } else {
        ratio
    }
}

impl<B: StorageBackend, O: PriceOracle, L: Ledger> Maker<B, O, L> {
    /// Adjust the backing ratio for the block at `ctx`.
    ///
    /// Returns the new ratio, or `None` while the cooldown has not elapsed
    /// or the step is zero. The ratio and the adjustment height are
    /// persisted even when the price sits inside the band.
    pub fn try_adjust_backing_ratio(&mut self, ctx: &BlockContext) -> Result<Option<Decimal>> {
        let params = self.params()?;
        let last_block = self.store.backing_ratio_last_block()?;

        if ctx.height - last_block < params.backing_ratio_cooldown_period {
            debug!(height = ctx.height, last_block, "backing ratio in cooldown");
            return Ok(None);
        }
        if params.backing_ratio_step.is_zero() {
            debug!(height = ctx.height, "backing ratio step is zero");
            return Ok(None);
        }

        let previous = self.store.backing_ratio()?;
        let grid_price = self.price(self.grid_denom())?;
        let ratio = next_backing_ratio(
            previous,
            grid_price,
            self.target(),
            params.backing_ratio_price_band,
            params.backing_ratio_step,
        );

        let mut batch = self.store.batch();
        batch.set_backing_ratio(ratio, ctx.height)?;
        batch.commit()?;

        if ratio != previous {
            info!(height = ctx.height, %previous, %ratio, %grid_price, "backing ratio adjusted");
        } else {
            debug!(height = ctx.height, %ratio, %grid_price, "backing ratio unchanged");
        }

        self.emit(MakerEvent::BackingRatioAdjusted(BackingRatioAdjustedEvent {
            previous_ratio: previous,
            new_ratio: ratio,
            grid_price,
            block_height: ctx.height,
        }));

        Ok(Some(ratio))
    }

    /// End-of-block hook.
    ///
    /// # Panics
    ///
    /// Panics when the adjustment fails. A missing Grid price at this point
    /// means the chain is misconfigured and the block cannot be finalized.
    pub fn end_block(&mut self, ctx: &BlockContext) {
        if let Err(e) = self.try_adjust_backing_ratio(ctx) {
            error!(height = ctx.height, error = %e, "backing ratio adjustment failed");
            panic!("backing ratio adjustment failed at height {}: {}", ctx.height, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{MakerConfig, MakerParams};
    use crate::error::Error;
    use crate::ledger::InMemoryLedger;
    use crate::oracle::InMemoryOracle;
    use crate::storage::InMemoryStore;
    use rust_decimal_macros::dec;

    fn maker(price: Decimal) -> Maker<InMemoryStore, InMemoryOracle, InMemoryLedger> {
        let oracle = InMemoryOracle::new().with_price("ugrid", price).unwrap();
        Maker::new(InMemoryStore::new(), oracle, InMemoryLedger::new(), MakerConfig::default()).unwrap()
    }

    #[test]
    fn test_next_ratio_band() {
        let step = dec!(0.0025);
        let band = dec!(0.001);
        assert_eq!(next_backing_ratio(dec!(0.5), dec!(1.01), dec!(1), band, step), dec!(0.4975));
        assert_eq!(next_backing_ratio(dec!(0.5), dec!(0.99), dec!(1), band, step), dec!(0.5025));
        assert_eq!(next_backing_ratio(dec!(0.5), dec!(1.001), dec!(1), band, step), dec!(0.5));
        assert_eq!(next_backing_ratio(dec!(0.001), dec!(2), dec!(1), band, step), dec!(0));
        assert_eq!(next_backing_ratio(dec!(0.999), dec!(0.5), dec!(1), band, step), dec!(1));
    }

    #[test]
    fn test_adjust_respects_cooldown() {
        let mut maker = maker(dec!(1.05));

        assert_eq!(maker.try_adjust_backing_ratio(&BlockContext::new(599)).unwrap(), None);
        assert_eq!(
            maker.try_adjust_backing_ratio(&BlockContext::new(600)).unwrap(),
            Some(dec!(0.9975))
        );
        assert_eq!(maker.try_adjust_backing_ratio(&BlockContext::new(1199)).unwrap(), None);
        assert_eq!(
            maker.try_adjust_backing_ratio(&BlockContext::new(1200)).unwrap(),
            Some(dec!(0.995))
        );
        assert_eq!(maker.store().backing_ratio_last_block().unwrap(), 1200);
        assert_eq!(maker.drain_events().len(), 2);
    }

    #[test]
    fn test_in_band_still_records_block() {
        let mut maker = maker(dec!(1));
        maker.end_block(&BlockContext::new(700));
        assert_eq!(maker.store().backing_ratio().unwrap(), dec!(1));
        assert_eq!(maker.store().backing_ratio_last_block().unwrap(), 700);
    }

    #[test]
    fn test_zero_step_is_noop() {
        let oracle = InMemoryOracle::new().with_price("ugrid", dec!(2)).unwrap();
        let config = MakerConfig::default().with_params(MakerParams::default().with_backing_ratio_step(dec!(0)));
        let mut maker = Maker::new(InMemoryStore::new(), oracle, InMemoryLedger::new(), config).unwrap();

        assert_eq!(maker.try_adjust_backing_ratio(&BlockContext::new(1000)).unwrap(), None);
        assert!(maker.events().is_empty());
    }

    #[test]
    fn test_missing_price_is_error() {
        let mut maker = Maker::new(
            InMemoryStore::new(),
            InMemoryOracle::new(),
            InMemoryLedger::new(),
            MakerConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            maker.try_adjust_backing_ratio(&BlockContext::new(600)),
            Err(Error::PriceUnavailable(_))
        ));
    }

    #[test]
    #[should_panic(expected = "backing ratio adjustment failed")]
    fn test_end_block_panics_without_price() {
        let mut maker = Maker::new(
            InMemoryStore::new(),
            InMemoryOracle::new(),
            InMemoryLedger::new(),
            MakerConfig::default(),
        )
        .unwrap();
        maker.end_block(&BlockContext::new(600));
    }
}
