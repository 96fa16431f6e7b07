//! Buy/sell alternation driven by a persisted wake-up schedule

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::{
    config::TradingConfig,
    errors::{BotError, BotResult},
    network::{LedgerClient, RetryExecutor},
    notify::{dispatch, Notifier},
    orchestrator::{amounts, WakeTimer},
    safeguards::{SafeguardConfig, SafeguardEngine},
    storage::ScheduleStore,
    types::{
        OrchestratorPhase, SequenceOutcome, SwapKind, SwapReceipt, SwapRequest, TradeAction,
        TradeReport, TradeState,
    },
    utils::{format_ether, parse_ether},
};

pub struct TradeOrchestrator {
    ledger: Arc<dyn LedgerClient>,
    store: Arc<dyn ScheduleStore>,
    notifiers: Vec<Arc<dyn Notifier>>,
    safeguards: SafeguardEngine,
    retry: RetryExecutor,
    config: TradingConfig,
    state: TradeState,
    phase: OrchestratorPhase,
}

impl TradeOrchestrator {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        store: Arc<dyn ScheduleStore>,
        safeguards: SafeguardConfig,
        config: TradingConfig,
    ) -> Self {
        let retry = RetryExecutor::new(config.retry.clone()).with_context("swap");
        Self {
            ledger,
            store,
            notifiers: Vec::new(),
            safeguards: SafeguardEngine::new(safeguards),
            retry,
            config,
            state: TradeState::default(),
            phase: OrchestratorPhase::Idle,
        }
    }

    pub fn with_notifiers(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers = notifiers;
        self
    }

    pub fn state(&self) -> &TradeState {
        &self.state
    }

    pub fn phase(&self) -> OrchestratorPhase {
        self.phase
    }

    pub fn safeguards(&self) -> &SafeguardEngine {
        &self.safeguards
    }

    /// Loads the persisted schedule and returns the instant of the first wake-up.
    /// A future `nextTrade` is honoured as-is without evaluating any sequence.
    pub fn restore(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let record = match self.store.load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("No saved schedule, starting fresh");
                return now;
            }
            Err(e) => {
                error!(error = %e, "Failed to load schedule, starting fresh");
                return now;
            }
        };

        self.state = TradeState::from_schedule(&record);
        if self.state.last_action == TradeAction::Buy && self.state.last_buy_time.is_none() {
            warn!("Saved schedule holds a buy without its time, resetting to none");
            self.state.last_action = TradeAction::None;
            self.state.last_buy_total = Decimal::ZERO;
        }
        self.settle_phase();

        info!(
            last_action = %self.state.last_action,
            trade_count = self.state.trade_count,
            next_trade = %record.next_trade_at,
            "Restored trade schedule"
        );

        record.next_trade_at.max(now)
    }

    /// Sleeps until each scheduled instant and runs a wake-up, until `shutdown`
    /// resolves. A wake-up already in flight is finished first.
    pub async fn run<S>(mut self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut next_wake = self.restore();

        loop {
            let mut timer = WakeTimer::arm(next_wake);
            info!(next_trade = %timer.deadline(), "Next trade scheduled");

            tokio::select! {
                fired = timer.fired() => {
                    if !fired {
                        warn!("Wake-up timer cancelled, stopping");
                        break;
                    }
                }
                _ = &mut shutdown => {
                    timer.cancel();
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
            }

            next_wake = self.wake().await;
        }
    }

    /// One scheduled wake-up: tops up the token inventory if needed, runs the
    /// due sequence, persists the schedule and returns the next wake-up instant.
    pub async fn wake(&mut self) -> DateTime<Utc> {
        let previous_action = self.state.last_action;

        if let Err(e) = self.ensure_token_inventory().await {
            error!(error = %e, "Initial token purchase failed");
            let next = self.cooldown();
            self.persist(next);
            return next;
        }

        let (action, outcome) = if self.state.should_buy() {
            (TradeAction::Buy, self.buy_sequence().await)
        } else {
            (TradeAction::Sell, self.sell_sequence().await)
        };

        let outcome = outcome.unwrap_or_else(|e| {
            error!(%action, error = %e, kind = ?e.kind(), "Sequence aborted");
            SequenceOutcome::Failed { reason: e.to_string() }
        });

        let next = match &outcome {
            SequenceOutcome::Completed { .. } => {
                let range = match action {
                    TradeAction::Buy => self.config.plan.buy_delay,
                    _ => self.config.plan.sell_delay,
                };
                Utc::now() + chrono::Duration::minutes(range.sample_minutes() as i64)
            }
            SequenceOutcome::NotReady { ready_at: Some(ready_at) } => *ready_at,
            SequenceOutcome::NotReady { ready_at: None } | SequenceOutcome::Failed { .. } => {
                self.cooldown()
            }
        };

        self.persist(next);
        if !matches!(outcome, SequenceOutcome::NotReady { .. }) {
            self.report(action, previous_action, &outcome, next).await;
        }
        next
    }

    /// Buys `buy_amount_mean × bootstrap_multiplier` when the wallet holds less
    /// than the minimum token amount. Trade state is left untouched.
    async fn ensure_token_inventory(&self) -> BotResult<()> {
        let wallet = self.config.wallet_address;
        let balance = self
            .retry
            .execute(|| self.ledger.token_balance(wallet))
            .await?;
        let balance = format_ether(balance)?;
        if balance >= self.config.min_amount {
            debug!(%balance, "Token inventory sufficient");
            return Ok(());
        }

        let amount = self.config.buy_amount_mean * self.config.plan.bootstrap_multiplier;
        info!(%balance, %amount, "Not enough tokens, performing initial buy");
        let receipt = self.execute_buy(amount).await?;
        info!(tx_hash = %receipt.tx_hash, "Initial buy completed");
        Ok(())
    }

    async fn buy_sequence(&mut self) -> BotResult<SequenceOutcome> {
        self.phase = OrchestratorPhase::BuySequence;
        let splits = self.config.plan.buy_splits;
        info!(splits, "Initiating buy sequence");

        let mut trades = 0u32;
        let mut total = Decimal::ZERO;
        let mut tx_hashes = Vec::new();

        for tranche in 1..=splits {
            if !self.safeguards.check_gas_price(self.ledger.as_ref()).await {
                warn!(tranche, "Buy cancelled due to high gas price");
                continue;
            }

            let price = match self.spot_price().await {
                Ok(price) => price,
                Err(e) => {
                    warn!(tranche, error = %e, "Failed to quote token price, skipping tranche");
                    continue;
                }
            };
            if !self.safeguards.check_price_deviation(price) {
                warn!(tranche, %price, "Buy cancelled due to price deviation");
                continue;
            }

            let plan = &self.config.plan;
            let target = self.config.buy_amount_mean
                * plan.buy_base_percentage
                * amounts::random_perturbation(plan.amount_jitter);

            let spendable = match self.spendable_native().await {
                Ok(spendable) => spendable,
                Err(e) => {
                    warn!(tranche, error = %e, "Failed to read native balance, skipping tranche");
                    continue;
                }
            };
            let Some(amount) = amounts::size_buy_tranche(target, self.config.min_amount, spendable) else {
                info!(tranche, %spendable, min_amount = %self.config.min_amount, "Insufficient balance for swap + gas");
                continue;
            };

            if self.config.enforce_price_impact && !self.price_impact_ok(price, amount, TradeAction::Buy).await {
                warn!(tranche, %amount, "Buy cancelled due to price impact");
                continue;
            }

            info!(tranche, splits, %amount, "Executing buy");
            match self.execute_buy(amount).await {
                Ok(receipt) => {
                    self.state.record_buy(amount, Utc::now());
                    trades += 1;
                    total += amount;
                    info!(tranche, %amount, tx_hash = %receipt.tx_hash, "Buy completed");
                    tx_hashes.push(receipt.tx_hash);
                }
                Err(e) if e.is_fatal_funds() => {
                    self.settle_phase();
                    return Err(e);
                }
                Err(e) => {
                    warn!(tranche, error = %e, "Buy tranche failed, skipping");
                    continue;
                }
            }

            if tranche < splits {
                let delay = self.config.plan.buy_delay.sample_duration();
                info!(delay_secs = delay.as_secs(), "Waiting before next buy");
                tokio::time::sleep(delay).await;
            }
        }

        self.settle_phase();
        info!(trades, attempted = splits, %total, "Buy sequence finished");

        if trades == 0 {
            return Ok(SequenceOutcome::Failed {
                reason: "no buy tranche completed".to_string(),
            });
        }
        Ok(SequenceOutcome::Completed { trades, amount: total, tx_hashes })
    }

    async fn sell_sequence(&mut self) -> BotResult<SequenceOutcome> {
        let Some(last_buy_time) = self.state.last_buy_time else {
            error!("No previous buy found, cannot sell");
            return Ok(SequenceOutcome::Failed {
                reason: "no previous buy".to_string(),
            });
        };

        let min_delay = chrono::Duration::from_std(self.config.plan.sell_delay.min())
            .unwrap_or_else(|_| chrono::Duration::zero());
        let ready_at = last_buy_time + min_delay;
        if Utc::now() < ready_at {
            info!(%ready_at, "Waiting for minimum delay before selling");
            return Ok(SequenceOutcome::NotReady { ready_at: Some(ready_at) });
        }

        self.phase = OrchestratorPhase::SellSequence;
        info!(last_buy_total = %self.state.last_buy_total, "Initiating sell sequence");

        let outcome = self.sell_once().await;
        self.settle_phase();
        outcome
    }

    async fn sell_once(&mut self) -> BotResult<SequenceOutcome> {
        if !self.safeguards.check_gas_price(self.ledger.as_ref()).await {
            warn!("Sell cancelled due to high gas price");
            return Ok(SequenceOutcome::Failed { reason: "gas price too high".to_string() });
        }

        let price = match self.spot_price().await {
            Ok(price) => price,
            Err(e) => {
                warn!(error = %e, "Failed to quote token price");
                return Ok(SequenceOutcome::Failed { reason: e.to_string() });
            }
        };
        if !self.safeguards.check_price_deviation(price) {
            warn!(%price, "Sell cancelled due to price deviation");
            return Ok(SequenceOutcome::Failed { reason: "price deviation".to_string() });
        }

        let wallet = self.config.wallet_address;
        let token_balance = self
            .retry
            .execute(|| self.ledger.token_balance(wallet))
            .await?;
        let token_balance = format_ether(token_balance)?;

        let plan = &self.config.plan;
        let amount = amounts::size_sell(
            self.state.last_buy_total,
            plan.sell_size_multiplier,
            amounts::random_perturbation(plan.amount_jitter),
            token_balance,
            plan.sell_balance_cap,
        );
        if amount <= Decimal::ZERO {
            warn!(%token_balance, "Nothing to sell");
            return Ok(SequenceOutcome::Failed { reason: "sell amount is zero".to_string() });
        }

        if self.config.enforce_price_impact && !self.price_impact_ok(price, amount, TradeAction::Sell).await {
            warn!(%amount, "Sell cancelled due to price impact");
            return Ok(SequenceOutcome::Failed { reason: "price impact".to_string() });
        }

        info!(%amount, %token_balance, "Executing sell");
        match self.execute_sell(amount).await {
            Ok(receipt) => {
                self.state.record_sell();
                info!(%amount, tx_hash = %receipt.tx_hash, "Sell completed");
                Ok(SequenceOutcome::Completed {
                    trades: 1,
                    amount,
                    tx_hashes: vec![receipt.tx_hash],
                })
            }
            Err(e) if e.is_fatal_funds() => Err(e),
            Err(e) => {
                warn!(error = %e, "Sell failed");
                Ok(SequenceOutcome::Failed { reason: e.to_string() })
            }
        }
    }

    async fn execute_buy(&self, amount: Decimal) -> BotResult<SwapReceipt> {
        let amount_in = parse_ether(amount)?;
        self.retry.execute(|| self.submit_buy(amount_in)).await
    }

    async fn execute_sell(&self, amount: Decimal) -> BotResult<SwapReceipt> {
        let amount_in = parse_ether(amount)?;
        self.retry.execute(|| self.submit_sell(amount_in)).await
    }

    async fn submit_buy(&self, amount_in: U256) -> BotResult<SwapReceipt> {
        let wallet = self.config.wallet_address;
        let fee_rate = self.submission_fee_rate().await?;
        let gas_cost = U256::from(fee_rate) * U256::from(self.config.plan.gas_limit);

        let balance = self.ledger.native_balance(wallet).await?;
        if balance < amount_in.saturating_add(gas_cost) {
            return Err(BotError::InsufficientFunds {
                details: format!(
                    "native balance {} wei below swap amount {} wei plus gas {} wei",
                    balance, amount_in, gas_cost
                ),
            });
        }

        let path = vec![self.config.weth, self.config.token];
        let request = self.swap_request(SwapKind::ExactNativeForTokens, amount_in, path, fee_rate).await?;
        self.confirm(self.ledger.submit_swap(&request).await?)
    }

    async fn submit_sell(&self, amount_in: U256) -> BotResult<SwapReceipt> {
        let wallet = self.config.wallet_address;
        let router = self.config.router;

        let allowance = self.ledger.allowance(wallet, router).await?;
        if allowance < amount_in {
            info!(%allowance, %amount_in, "Approving router to spend tokens");
            self.confirm(self.ledger.approve_allowance(router, U256::MAX).await?)?;
        }

        let fee_rate = self.submission_fee_rate().await?;
        let path = vec![self.config.token, self.config.weth];
        let request = self.swap_request(SwapKind::ExactTokensForNative, amount_in, path, fee_rate).await?;
        self.confirm(self.ledger.submit_swap(&request).await?)
    }

    async fn swap_request(
        &self,
        kind: SwapKind,
        amount_in: U256,
        path: Vec<Address>,
        fee_rate: u128,
    ) -> BotResult<SwapRequest> {
        let amounts_out = self.ledger.quote_swap(amount_in, &path).await?;
        let quoted = amounts_out.last().copied().ok_or_else(|| BotError::DataParsing {
            context: "router returned an empty quote".to_string(),
            source: None,
        })?;

        let plan = &self.config.plan;
        let deadline = (Utc::now() + chrono::Duration::from_std(plan.deadline).unwrap_or_else(|_| chrono::Duration::zero()))
            .timestamp()
            .max(0) as u64;

        Ok(SwapRequest {
            kind,
            amount_in,
            amount_out_min: amounts::min_amount_out(quoted, plan.swap_slippage_percent),
            path,
            recipient: self.config.wallet_address,
            deadline,
            fee_rate,
            gas_limit: plan.gas_limit,
        })
    }

    fn confirm(&self, receipt: SwapReceipt) -> BotResult<SwapReceipt> {
        if receipt.success {
            return Ok(receipt);
        }
        Err(BotError::TransactionReverted {
            tx_hash: receipt.tx_hash,
            block: receipt.confirmed_block,
        })
    }

    async fn submission_fee_rate(&self) -> BotResult<u128> {
        let network_rate = self.ledger.fee_rate().await?;
        let balance = self.ledger.native_balance(self.config.wallet_address).await?;
        Ok(amounts::optimal_fee_rate(network_rate, balance, self.config.plan.gas_limit))
    }

    /// Native balance left after reserving gas for several swaps.
    async fn spendable_native(&self) -> BotResult<Decimal> {
        let balance = self.ledger.native_balance(self.config.wallet_address).await?;
        let fee_rate = self.ledger.fee_rate().await?;
        let plan = &self.config.plan;
        let reserve = amounts::gas_reserve(fee_rate, plan.gas_limit, plan.gas_reserve_multiplier);
        format_ether(amounts::max_spendable(balance, reserve))
    }

    /// Native value of one whole token.
    async fn spot_price(&self) -> BotResult<Decimal> {
        let one_token = U256::from(10u64).pow(U256::from(18u64));
        let path = [self.config.token, self.config.weth];
        let amounts_out = self.ledger.quote_swap(one_token, &path).await?;
        let native = amounts_out.get(1).copied().ok_or_else(|| BotError::DataParsing {
            context: "price quote missing output amount".to_string(),
            source: None,
        })?;
        format_ether(native)
    }

    /// Compares the execution price of `amount` against the spot price.
    async fn price_impact_ok(&self, spot_price: Decimal, amount: Decimal, action: TradeAction) -> bool {
        let path = match action {
            TradeAction::Buy => [self.config.weth, self.config.token],
            _ => [self.config.token, self.config.weth],
        };

        let execution_price = async {
            let amount_in = parse_ether(amount)?;
            let amounts_out = self.ledger.quote_swap(amount_in, &path).await?;
            let out = format_ether(amounts_out.last().copied().unwrap_or_default())?;
            Ok::<_, BotError>(match action {
                TradeAction::Buy if !out.is_zero() => Some(amount / out),
                TradeAction::Buy => None,
                _ if !amount.is_zero() => Some(out / amount),
                _ => None,
            })
        }
        .await;

        match execution_price {
            Ok(Some(price)) => self.safeguards.check_slippage(spot_price, price),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Failed to quote execution price");
                false
            }
        }
    }

    fn settle_phase(&mut self) {
        self.phase = match self.state.last_action {
            TradeAction::Buy => OrchestratorPhase::AwaitingSellWindow,
            _ => OrchestratorPhase::Idle,
        };
    }

    fn cooldown(&self) -> DateTime<Utc> {
        let cooldown = chrono::Duration::from_std(self.config.plan.retry_cooldown)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        info!(retry_in_secs = cooldown.num_seconds(), "Scheduling retry");
        Utc::now() + cooldown
    }

    fn persist(&self, next_trade_at: DateTime<Utc>) {
        let record = self.state.to_schedule(next_trade_at);
        if let Err(e) = self.store.save(&record) {
            error!(error = %e, "Failed to persist trade schedule");
        }
    }

    async fn report(
        &self,
        action: TradeAction,
        previous_action: TradeAction,
        outcome: &SequenceOutcome,
        next_trade: DateTime<Utc>,
    ) {
        if self.notifiers.is_empty() {
            return;
        }

        let native_balance = match self.ledger.native_balance(self.config.wallet_address).await {
            Ok(balance) => format_ether(balance).ok(),
            Err(e) => {
                debug!(error = %e, "Balance unavailable for report");
                None
            }
        };

        let (success, amount_in, tx_hashes, error_message) = match outcome {
            SequenceOutcome::Completed { amount, tx_hashes, .. } => (true, *amount, tx_hashes.clone(), None),
            SequenceOutcome::Failed { reason } => (false, Decimal::ZERO, Vec::new(), Some(reason.clone())),
            SequenceOutcome::NotReady { .. } => return,
        };

        let report = TradeReport {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            success,
            amount_in,
            tx_hashes,
            native_balance,
            trade_count: self.state.trade_count,
            previous_action,
            next_trade,
            error_message,
        };
        dispatch(&self.notifiers, &report);
    }
}
