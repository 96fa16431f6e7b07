//! Custom error types for the bot

use alloy::primitives::U256;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used by the retry executor and the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TransientNetwork,
    InsufficientFunds,
    TransactionReverted,
    Persistence,
    Config,
    DataParsing,
}

impl ErrorKind {
    /// Whether another attempt of the same operation can succeed.
    pub fn retryable(self) -> bool {
        matches!(self, ErrorKind::TransientNetwork)
    }
}

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Insufficient funds: {details}")]
    InsufficientFunds {
        details: String,
    },

    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted {
        tx_hash: String,
        block: Option<u64>,
    },

    #[error("Schedule store error at {path}: {message}")]
    Persistence {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data parsing error: {context}")]
    DataParsing {
        context: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Amount {amount} wei does not fit the {context} range")]
    AmountOverflow {
        amount: U256,
        context: &'static str,
    },
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Network { .. } => ErrorKind::TransientNetwork,
            BotError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            BotError::TransactionReverted { .. } => ErrorKind::TransactionReverted,
            BotError::Persistence { .. } => ErrorKind::Persistence,
            BotError::Config(_) => ErrorKind::Config,
            BotError::DataParsing { .. } | BotError::AmountOverflow { .. } => ErrorKind::DataParsing,
        }
    }

    pub fn retryable(&self) -> bool {
        self.kind().retryable()
    }

    pub fn is_fatal_funds(&self) -> bool {
        self.kind() == ErrorKind::InsufficientFunds
    }

    pub fn network(message: impl Into<String>) -> Self {
        BotError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Maps a node/transport failure onto the taxonomy. Nodes only report
    /// missing balance as free text, so this is the one place that inspects it.
    pub fn from_rpc(context: &str, err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if message.to_lowercase().contains("insufficient funds") {
            BotError::InsufficientFunds {
                details: format!("{}: {}", context, message),
            }
        } else {
            BotError::Network {
                message: format!("{}: {}", context, message),
                source: Some(anyhow::anyhow!(message)),
            }
        }
    }
}

pub type BotResult<T> = Result<T, BotError>;
