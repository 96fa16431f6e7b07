//! Alloy-backed ledger client for a Uniswap-V2 style router

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use crate::{
    config::Config,
    errors::{BotError, BotResult},
    network::{
        ledger::{FeeRateSource, LedgerClient},
        retry::{RetryConfig, with_retry},
    },
    types::{SwapKind, SwapReceipt, SwapRequest},
};

pub type HttpTransport = Http<Client>;
pub type SharedProvider = Arc<dyn Provider<HttpTransport>>;

pub const APPROVE_GAS_LIMIT: u64 = 100_000;

sol! {
    #[sol(rpc)]
    contract IUniswapV2Router02 {
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
        function swapExactETHForTokensSupportingFeeOnTransferTokens(uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external payable;
        function swapExactTokensForETHSupportingFeeOnTransferTokens(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external;
    }

    #[sol(rpc)]
    contract IERC20 {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
}

pub struct AlloyLedgerClient {
    provider: SharedProvider,
    token: Address,
    router: Address,
}

impl AlloyLedgerClient {
    pub fn new(provider: SharedProvider, token: Address, router: Address) -> Self {
        Self { provider, token, router }
    }

    /// Provider that can sign and send transactions.
    pub fn with_wallet(config: &Config) -> BotResult<Self> {
        let private_key = config.private_key.as_deref()
            .ok_or_else(|| BotError::Config("USER_PRIVATE_KEY is required to trade".to_string()))?;
        let signer = PrivateKeySigner::from_str(private_key)
            .map_err(|e| BotError::Config(format!("Failed to parse private key: {}", e)))?;
        if signer.address() != config.wallet_address {
            warn!(
                signer = %signer.address(),
                configured = %config.wallet_address,
                "USER_ADDRESS does not match the signing key"
            );
        }

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(signer))
            .on_http(config.rpc_url.clone());

        Ok(Self::new(Arc::new(provider), config.token, config.router))
    }

    pub fn read_only(config: &Config) -> Self {
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .on_http(config.rpc_url.clone());
        Self::new(Arc::new(provider), config.token, config.router)
    }

    pub async fn check_connection(&self) -> BotResult<u64> {
        info!("🔗 Testing connection to RPC node...");
        let block = with_retry(
            || async {
                self.provider.get_block_number().await
                    .map_err(|e| BotError::from_rpc("get block number", e))
            },
            RetryConfig {
                max_attempts: 5,
                initial_delay: Duration::from_millis(500),
                max_delay: Duration::from_millis(10000),
                ..Default::default()
            },
        ).await?;
        info!("✅ Connected at block {}", block);
        Ok(block)
    }

    /// Metadata lookups are best-effort; non-standard tokens may omit any of them.
    pub async fn token_info(&self) -> TokenInfo {
        let token = IERC20::new(self.token, self.provider.clone());
        TokenInfo {
            name: token.name().call().await.ok().map(|r| r._0),
            symbol: token.symbol().call().await.ok().map(|r| r._0),
            decimals: token.decimals().call().await.ok().map(|r| r._0),
        }
    }

    async fn wait_for_receipt(
        &self,
        pending: alloy::providers::PendingTransactionBuilder<HttpTransport, alloy::network::Ethereum>,
        context: &str,
    ) -> BotResult<SwapReceipt> {
        let tx_hash = format!("{:?}", pending.tx_hash());
        info!("📡 Transaction sent: {}", tx_hash);

        let receipt = pending.get_receipt().await
            .map_err(|e| BotError::from_rpc(context, e))?;

        if !receipt.status() {
            return Err(BotError::TransactionReverted {
                tx_hash,
                block: receipt.block_number,
            });
        }

        info!("✅ Transaction confirmed in block {:?}", receipt.block_number);
        Ok(SwapReceipt {
            success: true,
            confirmed_block: receipt.block_number,
            tx_hash,
        })
    }
}

#[async_trait]
impl FeeRateSource for AlloyLedgerClient {
    async fn fee_rate(&self) -> BotResult<u128> {
        self.provider.get_gas_price().await
            .map_err(|e| BotError::from_rpc("get gas price", e))
    }
}

#[async_trait]
impl LedgerClient for AlloyLedgerClient {
    async fn native_balance(&self, owner: Address) -> BotResult<U256> {
        self.provider.get_balance(owner).await
            .map_err(|e| BotError::from_rpc("get native balance", e))
    }

    async fn token_balance(&self, owner: Address) -> BotResult<U256> {
        let token = IERC20::new(self.token, self.provider.clone());
        token.balanceOf(owner).call().await
            .map(|r| r._0)
            .map_err(|e| BotError::from_rpc("get token balance", e))
    }

    async fn quote_swap(&self, amount_in: U256, path: &[Address]) -> BotResult<Vec<U256>> {
        let router = IUniswapV2Router02::new(self.router, self.provider.clone());
        router.getAmountsOut(amount_in, path.to_vec()).call().await
            .map(|r| r.amounts)
            .map_err(|e| BotError::from_rpc("getAmountsOut", e))
    }

    async fn submit_swap(&self, request: &SwapRequest) -> BotResult<SwapReceipt> {
        let router = IUniswapV2Router02::new(self.router, self.provider.clone());
        let deadline = U256::from(request.deadline);

        let pending = match request.kind {
            SwapKind::ExactNativeForTokens => router
                .swapExactETHForTokensSupportingFeeOnTransferTokens(
                    request.amount_out_min,
                    request.path.clone(),
                    request.recipient,
                    deadline,
                )
                .value(request.amount_in)
                .gas(request.gas_limit)
                .gas_price(request.fee_rate)
                .send()
                .await,
            SwapKind::ExactTokensForNative => router
                .swapExactTokensForETHSupportingFeeOnTransferTokens(
                    request.amount_in,
                    request.amount_out_min,
                    request.path.clone(),
                    request.recipient,
                    deadline,
                )
                .gas(request.gas_limit)
                .gas_price(request.fee_rate)
                .send()
                .await,
        }
        .map_err(|e| BotError::from_rpc("send swap", e))?;

        self.wait_for_receipt(pending, "swap receipt").await
    }

    async fn approve_allowance(&self, spender: Address, amount: U256) -> BotResult<SwapReceipt> {
        let fee_rate = self.fee_rate().await?;
        let token = IERC20::new(self.token, self.provider.clone());
        let pending = token.approve(spender, amount)
            .gas(APPROVE_GAS_LIMIT)
            .gas_price(fee_rate)
            .send()
            .await
            .map_err(|e| BotError::from_rpc("send approve", e))?;

        self.wait_for_receipt(pending, "approve receipt").await
    }

    async fn allowance(&self, owner: Address, spender: Address) -> BotResult<U256> {
        let token = IERC20::new(self.token, self.provider.clone());
        token.allowance(owner, spender).call().await
            .map(|r| r._0)
            .map_err(|e| BotError::from_rpc("get allowance", e))
    }
}
