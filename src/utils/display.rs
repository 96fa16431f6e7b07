//! Display and printing utilities

use rust_decimal::Decimal;
use tracing::{error, info, warn};
use crate::{
    config::Config,
    types::TradeReport,
};

pub fn print_configuration(config: &Config) {
    info!("📋 Configuration:");
    info!("   RPC: {}", config.rpc_url);
    info!("   Wallet: {}", config.wallet_address);
    info!("   Token: {}", config.token);
    info!("   Router: {}", config.router);
    info!("   Buy Amount Mean: {} native", config.buy_amount_mean);
    info!("   Min Amount: {}", config.min_amount);
    info!(
        "   Buy Splits: {} ({}-{} min apart)",
        config.plan.buy_splits, config.plan.buy_delay.min_minutes, config.plan.buy_delay.max_minutes
    );
    info!(
        "   Sell Delay: {}-{} min",
        config.plan.sell_delay.min_minutes, config.plan.sell_delay.max_minutes
    );
    info!("   Max Gas Price: {} gwei", config.safeguards.max_gas_price_gwei);
    info!("   Max Price Deviation: {}%", config.safeguards.max_price_deviation_percent);
    if config.enforce_price_impact {
        info!("   Max Slippage: {}%", config.safeguards.max_slippage_percent);
    }
    info!("   Schedule File: {}", config.schedule_file.display());
    info!(
        "   Reports: file={} telegram={} email={}",
        config.send_file_report,
        config.telegram.is_some(),
        config.email.is_some()
    );
    if config.private_key.is_none() {
        warn!("   ⚠️  No private key configured, read-only commands only");
    }
}

pub fn print_balances(native: Decimal, token: Decimal, symbol: &str) {
    info!("💰 Balances:");
    info!("   Native: {}", native.round_dp(6));
    info!("   {}: {}", symbol, token.round_dp(6));
}

pub fn print_trade_report(report: &TradeReport) {
    if report.success {
        info!("\n✅ {} SEQUENCE #{}", report.action.to_string().to_uppercase(), report.trade_count);
        info!("   Amount In: {}", report.amount_in);
        for tx_hash in &report.tx_hashes {
            info!("   Tx Hash: {}", tx_hash);
        }
        if let Some(balance) = report.native_balance {
            info!("   Native Balance: {}", balance.round_dp(6));
        }
    } else {
        error!("\n❌ {} SEQUENCE FAILED", report.action.to_string().to_uppercase());
        error!("   Error: {}", report.error_message.as_deref().unwrap_or("Unknown"));
    }
    info!("   Next Trade: {}", report.next_trade.to_rfc3339());
}
