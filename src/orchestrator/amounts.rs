//! Trade sizing and fee arithmetic

use alloy::primitives::U256;
use rand::Rng;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use crate::{
    config::{MAX_BALANCE_SHARE_FOR_GAS_PCT, MIN_FEE_RATE_WEI},
    utils::percent_of,
};

/// Random factor in `[1 - jitter, 1 + jitter)`.
pub fn random_perturbation(jitter: Decimal) -> Decimal {
    let r = Decimal::from_f64(rand::rng().random::<f64>()).unwrap_or(dec!(0.5));
    dec!(1) + (r - dec!(0.5)) * dec!(2) * jitter
}

/// Wei held back so the swap can always pay for gas.
pub fn gas_reserve(fee_rate: u128, gas_limit: u64, multiplier: u64) -> U256 {
    U256::from(fee_rate) * U256::from(gas_limit) * U256::from(multiplier)
}

pub fn max_spendable(balance: U256, reserve: U256) -> U256 {
    balance.saturating_sub(reserve)
}

/// Clamps a tranche into `[min_amount, max_spendable]`; `None` when even the
/// minimum cannot be afforded.
pub fn size_buy_tranche(target: Decimal, min_amount: Decimal, max_spendable: Decimal) -> Option<Decimal> {
    if max_spendable < min_amount {
        return None;
    }
    let amount = target.abs().min(max_spendable).max(min_amount);
    (amount > Decimal::ZERO).then_some(amount)
}

pub fn size_sell(
    last_buy_total: Decimal,
    multiplier: Decimal,
    perturbation: Decimal,
    token_balance: Decimal,
    balance_cap: Decimal,
) -> Decimal {
    (last_buy_total * multiplier * perturbation).min(token_balance * balance_cap)
}

/// Network rate, capped so one swap never burns more than 30% of the balance
/// on gas, and floored at 1 gwei.
pub fn optimal_fee_rate(network_rate: u128, balance: U256, gas_limit: u64) -> u128 {
    let denominator = U256::from(gas_limit.max(1)) * U256::from(100u64);
    let affordable = balance * U256::from(MAX_BALANCE_SHARE_FOR_GAS_PCT) / denominator;
    let affordable: u128 = affordable.try_into().unwrap_or(u128::MAX);
    network_rate.min(affordable).max(MIN_FEE_RATE_WEI)
}

pub fn min_amount_out(quoted: U256, slippage_percent: u64) -> U256 {
    percent_of(quoted, 100u64.saturating_sub(slippage_percent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perturbation_stays_within_band() {
        for _ in 0..500 {
            let factor = random_perturbation(dec!(0.05));
            assert!(factor >= dec!(0.95) && factor <= dec!(1.05));
        }
        assert_eq!(random_perturbation(Decimal::ZERO), dec!(1));
    }

    #[test]
    fn reserve_is_three_times_gas_cost() {
        let reserve = gas_reserve(5_000_000_000, 500_000, 3);
        assert_eq!(reserve, U256::from(7_500_000_000_000_000u64));
        assert_eq!(max_spendable(U256::from(1u64), reserve), U256::ZERO);
    }

    #[test]
    fn tranche_is_clamped() {
        assert_eq!(size_buy_tranche(dec!(0.5), dec!(0.0001), dec!(0.2)), Some(dec!(0.2)));
        assert_eq!(size_buy_tranche(dec!(0.00001), dec!(0.0001), dec!(0.2)), Some(dec!(0.0001)));
        assert_eq!(size_buy_tranche(dec!(0.01), dec!(0.0001), dec!(0.2)), Some(dec!(0.01)));
    }

    #[test]
    fn tranche_skipped_when_minimum_unaffordable() {
        assert_eq!(size_buy_tranche(dec!(0.01), dec!(0.0001), dec!(0.00005)), None);
        assert_eq!(size_buy_tranche(dec!(0.01), dec!(0), dec!(0)), None);
    }

    #[test]
    fn sell_capped_by_balance() {
        assert_eq!(size_sell(dec!(10), dec!(1), dec!(1), dec!(100), dec!(0.95)), dec!(10));
        assert_eq!(size_sell(dec!(10), dec!(1), dec!(1), dec!(5), dec!(0.95)), dec!(4.75));
    }

    #[test]
    fn fee_rate_respects_budget_and_floor() {
        let ten_gwei = 10_000_000_000u128;
        let rich = U256::from(10u8).pow(U256::from(20u8));
        assert_eq!(optimal_fee_rate(ten_gwei, rich, 500_000), ten_gwei);

        // 0.01 native: 30% / 500k gas = 6 gwei
        let modest = U256::from(10_000_000_000_000_000u64);
        assert_eq!(optimal_fee_rate(ten_gwei, modest, 500_000), 6_000_000_000);

        assert_eq!(optimal_fee_rate(ten_gwei, U256::ZERO, 500_000), MIN_FEE_RATE_WEI);
    }

    #[test]
    fn min_out_applies_slippage() {
        assert_eq!(min_amount_out(U256::from(1000u64), 40), U256::from(600u64));
        assert_eq!(min_amount_out(U256::from(1000u64), 150), U256::ZERO);
    }
}
