//! Pre-trade safeguards: slippage, rolling price deviation and fee rate

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use tracing::{debug, error, warn};
use crate::{
    network::FeeRateSource,
    utils::wei_to_gwei,
};

pub const MIN_HISTORY_SAMPLES: usize = 5;
pub const HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SafeguardConfig {
    pub max_slippage_percent: Decimal,
    pub max_price_deviation_percent: Decimal,
    pub max_gas_price_gwei: Decimal,
    pub min_history_samples: usize,
    pub history_capacity: usize,
}

impl Default for SafeguardConfig {
    fn default() -> Self {
        Self {
            max_slippage_percent: dec!(2.0),
            max_price_deviation_percent: dec!(5.0),
            max_gas_price_gwei: dec!(100),
            min_history_samples: MIN_HISTORY_SAMPLES,
            history_capacity: HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

pub struct SafeguardEngine {
    config: SafeguardConfig,
    price_history: VecDeque<PriceSample>,
}

impl SafeguardEngine {
    pub fn new(config: SafeguardConfig) -> Self {
        Self {
            price_history: VecDeque::with_capacity(config.history_capacity),
            config,
        }
    }

    pub fn config(&self) -> &SafeguardConfig {
        &self.config
    }

    pub fn price_history(&self) -> &VecDeque<PriceSample> {
        &self.price_history
    }

    pub fn check_slippage(&self, expected_price: Decimal, actual_price: Decimal) -> bool {
        if expected_price.is_zero() {
            warn!(%actual_price, "Slippage check without a reference price");
            return false;
        }

        let Some(slippage) = percent_change(expected_price, actual_price) else {
            warn!(%expected_price, %actual_price, "Slippage out of range, rejecting");
            return false;
        };
        if slippage > self.config.max_slippage_percent {
            warn!(
                %expected_price,
                %actual_price,
                %slippage,
                max_slippage = %self.config.max_slippage_percent,
                "Slippage warning"
            );
            return false;
        }
        true
    }

    /// Accepts `current_price` and records it unless it strays too far from the
    /// recent mean. Rejected prices are never recorded.
    pub fn check_price_deviation(&mut self, current_price: Decimal) -> bool {
        let Some(average_price) = self.calculate_average_price() else {
            if self.price_history.len() >= self.config.min_history_samples.max(1) {
                warn!(%current_price, "Recent average price overflowed, rejecting");
                return false;
            }
            debug!(%current_price, samples = self.price_history.len(), "Bootstrapping price history");
            self.update_price_history(current_price);
            return true;
        };

        if average_price.is_zero() {
            warn!(%current_price, "Recent average price is zero, rejecting");
            return false;
        }

        let Some(deviation) = percent_change(average_price, current_price) else {
            warn!(%current_price, %average_price, "Price deviation out of range, rejecting");
            return false;
        };
        if deviation <= self.config.max_price_deviation_percent {
            self.update_price_history(current_price);
            return true;
        }

        warn!(
            %current_price,
            %average_price,
            %deviation,
            max_deviation = %self.config.max_price_deviation_percent,
            "Price deviation warning"
        );
        false
    }

    /// Fails closed: a fee rate that cannot be fetched rejects the trade.
    pub async fn check_gas_price<S>(&self, fee_source: &S) -> bool
    where
        S: FeeRateSource + ?Sized,
    {
        let fee_rate = match fee_source.fee_rate().await {
            Ok(rate) => rate,
            Err(e) => {
                error!(error = %e, "Error checking gas price");
                return false;
            }
        };

        let gas_price_gwei = wei_to_gwei(fee_rate);
        if gas_price_gwei > self.config.max_gas_price_gwei {
            warn!(
                current_gas_price = %gas_price_gwei,
                max_gas_price = %self.config.max_gas_price_gwei,
                "Gas price too high"
            );
            return false;
        }
        true
    }

    pub fn update_price_history(&mut self, price: Decimal) {
        self.price_history.push_back(PriceSample {
            price,
            observed_at: Utc::now(),
        });
        while self.price_history.len() > self.config.history_capacity {
            self.price_history.pop_front();
        }
    }

    /// Mean of the most recent `min_history_samples` prices.
    pub fn calculate_average_price(&self) -> Option<Decimal> {
        let window = self.config.min_history_samples.max(1);
        if self.price_history.len() < window {
            return None;
        }

        let sum = self
            .price_history
            .iter()
            .rev()
            .take(window)
            .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.price))?;
        sum.checked_div(Decimal::from(window))
    }
}

/// Absolute change from `reference` to `observed` in percent. `None` on overflow.
fn percent_change(reference: Decimal, observed: Decimal) -> Option<Decimal> {
    observed
        .checked_sub(reference)?
        .checked_div(reference)?
        .checked_mul(dec!(100))
        .map(|p| p.abs())
}
