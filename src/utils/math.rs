//! Fixed-point conversions between human amounts and base units

use alloy::primitives::U256;
use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use rust_decimal_macros::dec;
use crate::errors::{BotError, BotResult};

pub const NATIVE_DECIMALS: u8 = 18;
pub const WEI_PER_GWEI: u128 = 1_000_000_000;

pub fn pow10(n: i32) -> Decimal {
    match n {
        0 => dec!(1),
        9 => dec!(1_000_000_000),
        18 => dec!(1_000_000_000_000_000_000),
        _ => {
            let mut result = dec!(1);
            if n > 0 {
                for _ in 0..n {
                    result *= dec!(10);
                }
            } else {
                for _ in 0..(-n) {
                    result /= dec!(10);
                }
            }
            result
        }
    }
}

/// Truncates `amount` to `decimals` places and returns it in base units.
pub fn to_base_units(amount: Decimal, decimals: u8) -> BotResult<U256> {
    if amount.is_sign_negative() {
        return Err(BotError::DataParsing {
            context: format!("negative amount {}", amount),
            source: None,
        });
    }

    let whole = amount.trunc();
    let frac = (amount - whole).round_dp_with_strategy(decimals as u32, RoundingStrategy::ToZero);
    let unit = U256::from(10u8).pow(U256::from(decimals));

    let whole_units = whole.to_u128().ok_or_else(|| BotError::DataParsing {
        context: format!("amount {} too large", amount),
        source: None,
    })?;
    let frac_units = (frac * pow10(decimals as i32))
        .trunc()
        .to_u128()
        .unwrap_or(0);

    Ok(U256::from(whole_units) * unit + U256::from(frac_units))
}

pub fn from_base_units(value: U256, decimals: u8) -> BotResult<Decimal> {
    let unit = U256::from(10u8).pow(U256::from(decimals));
    let whole = value / unit;
    let frac = value % unit;

    let whole: u128 = whole.try_into().map_err(|_| BotError::AmountOverflow {
        amount: value,
        context: "decimal",
    })?;
    let whole = Decimal::from_u128(whole).ok_or(BotError::AmountOverflow {
        amount: value,
        context: "decimal",
    })?;
    let frac: u128 = frac.try_into().map_err(|_| BotError::AmountOverflow {
        amount: value,
        context: "decimal",
    })?;
    let whole_digits = whole.to_string().len() as u32;
    let frac = Decimal::from_i128_with_scale(frac as i128, decimals as u32)
        .round_dp_with_strategy(28u32.saturating_sub(whole_digits), RoundingStrategy::ToZero)
        .normalize();

    whole.checked_add(frac).ok_or(BotError::AmountOverflow {
        amount: value,
        context: "decimal",
    })
}

pub fn parse_ether(amount: Decimal) -> BotResult<U256> {
    to_base_units(amount, NATIVE_DECIMALS)
}

pub fn format_ether(value: U256) -> BotResult<Decimal> {
    from_base_units(value, NATIVE_DECIMALS)
}

pub fn wei_to_gwei(wei: u128) -> Decimal {
    let whole = Decimal::from_u128(wei / WEI_PER_GWEI).unwrap_or(Decimal::MAX);
    whole
        .checked_add(Decimal::from_i128_with_scale((wei % WEI_PER_GWEI) as i128, 9))
        .unwrap_or(Decimal::MAX)
}

/// `amount * percent / 100` in base units, rounding down.
pub fn percent_of(amount: U256, percent: u64) -> U256 {
    amount * U256::from(percent) / U256::from(100u64)
}
