//! AMM Volume Bot - Main Entry Point

use alloy::primitives::U256;
use amm_volume_bot::*;
use amm_volume_bot::network::{AlloyLedgerClient, LedgerClient};
use amm_volume_bot::notify::{ConsoleNotifier, EmailNotifier, FileReportNotifier, Notifier, TelegramNotifier};
use amm_volume_bot::storage::{JsonScheduleStore, ScheduleStore};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scheduled buy/sell volume bot for Uniswap-V2 style routers")]
struct Cli {
    /// Write the log file as JSON lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the trading scheduler (default)
    Run,
    /// Print native and token balances of the configured wallet
    Balance,
    /// Print the traded token's metadata
    TokenInfo,
    /// Grant the router an unlimited token allowance
    Approve,
    /// Print the persisted trade schedule
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load()?;
    let _logging_guard = utils::setup_logging(cli.json_logs)?;
    utils::setup_output_directories(Path::new(utils::LOG_DIR), &config.report_dir, &config.schedule_file)?;

    info!("🤖 AMM Volume Bot v{}", env!("CARGO_PKG_VERSION"));
    utils::print_configuration(&config);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Balance => balance(&config).await,
        Command::TokenInfo => token_info(&config).await,
        Command::Approve => approve(&config).await,
        Command::Status => status(&config),
    }
}

async fn run(config: Config) -> Result<()> {
    let ledger = AlloyLedgerClient::with_wallet(&config)?;
    let block = ledger.check_connection().await?;
    info!("✅ Connected to RPC at block {}", block);

    let store: Arc<dyn ScheduleStore> = Arc::new(JsonScheduleStore::new(&config.schedule_file));

    let mut notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(ConsoleNotifier)];
    if config.send_file_report {
        notifiers.push(Arc::new(FileReportNotifier::new(&config.report_dir)));
    }
    if let Some(telegram) = config.telegram.clone() {
        match TelegramNotifier::new(telegram) {
            Ok(notifier) => notifiers.push(Arc::new(notifier)),
            Err(e) => warn!("Telegram reports disabled: {}", e),
        }
    }
    if let Some(email) = config.email.clone() {
        match EmailNotifier::new(email) {
            Ok(notifier) => notifiers.push(Arc::new(notifier)),
            Err(e) => warn!("Email reports disabled: {}", e),
        }
    }

    let orchestrator = TradeOrchestrator::new(
        Arc::new(ledger),
        store,
        config.safeguards.clone(),
        config.trading(),
    )
    .with_notifiers(notifiers);

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("\n📛 Received shutdown signal (Ctrl+C)..."),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    info!("\n🚀 Starting trade scheduler...\n");
    orchestrator.run(shutdown).await;
    info!("👋 Bot stopped");
    Ok(())
}

async fn balance(config: &Config) -> Result<()> {
    let ledger = AlloyLedgerClient::read_only(config);
    let native = utils::format_ether(ledger.native_balance(config.wallet_address).await?)?;
    let token = ledger.token_balance(config.wallet_address).await?;
    let info = ledger.token_info().await;
    let decimals = info.decimals.unwrap_or(utils::NATIVE_DECIMALS);
    let token = utils::from_base_units(token, decimals)?;
    utils::print_balances(native, token, info.symbol.as_deref().unwrap_or("TOKEN"));
    Ok(())
}

async fn token_info(config: &Config) -> Result<()> {
    let ledger = AlloyLedgerClient::read_only(config);
    let info = ledger.token_info().await;
    info!("🪙 Token {}", config.token);
    info!("   Name: {}", info.name.as_deref().unwrap_or("unknown"));
    info!("   Symbol: {}", info.symbol.as_deref().unwrap_or("unknown"));
    match info.decimals {
        Some(decimals) => info!("   Decimals: {}", decimals),
        None => info!("   Decimals: unknown"),
    }
    let balance = ledger.token_balance(config.wallet_address).await?;
    let balance = utils::from_base_units(balance, info.decimals.unwrap_or(utils::NATIVE_DECIMALS))?;
    info!("   Wallet Balance: {}", balance);
    Ok(())
}

async fn approve(config: &Config) -> Result<()> {
    let ledger = AlloyLedgerClient::with_wallet(config)?;
    let receipt = ledger.approve_allowance(config.router, U256::MAX).await?;
    if !receipt.success {
        return Err(BotError::TransactionReverted {
            tx_hash: receipt.tx_hash,
            block: receipt.confirmed_block,
        }
        .into());
    }
    info!("✅ Router approved, tx {}", receipt.tx_hash);
    Ok(())
}

fn status(config: &Config) -> Result<()> {
    let store = JsonScheduleStore::new(&config.schedule_file);
    match store.load()? {
        Some(record) => {
            info!("📅 Next trade: {}", record.next_trade_at.to_rfc3339());
            info!("   Last action: {}", record.last_action);
            info!("   Trade count: {}", record.trade_count);
            if let Some(total) = record.last_buy_total {
                info!("   Unsold buy total: {}", total);
            }
        }
        None => info!("No schedule saved yet at {}", config.schedule_file.display()),
    }
    Ok(())
}
