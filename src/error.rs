use thiserror::Error;

use crate::models::Network;

/// Main error type for the withdrawal orchestration engine
#[derive(Error, Debug)]
pub enum WithdrawerError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Progress store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Chain RPC errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i32, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Balance query on {network} failed after {attempts} attempts: {cause}")]
    Exhausted {
        network: Network,
        attempts: u32,
        #[source]
        cause: Box<RpcError>,
    },
}

impl RpcError {
    /// A single-attempt error that the balance client retries automatically.
    /// Exhausted is the terminal form and is never retried by callers.
    pub fn is_transient(&self) -> bool {
        !matches!(self, RpcError::Exhausted { .. })
    }
}

/// Exchange withdrawal errors
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Exchange API error: code={code}, message={message}")]
    Api { code: i32, message: String },

    #[error("Exchange credentials not configured")]
    MissingCredentials,

    #[error("Withdrawal rejected: {0}")]
    Rejected(String),

    #[error("Request signing failed")]
    Signature,
}

/// Progress store errors (write path only; reads degrade to an empty set)
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Progress file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Wallet file not found: {0}")]
    WalletFileNotFound(String),
}

/// Notification delivery errors (always logged, never fatal)
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WithdrawerError>;

/// Error severity levels for logging and monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical errors that require immediate attention
    Critical,
    /// High priority errors that affect a wallet's outcome
    High,
    /// Medium priority errors that are retried or degraded around
    Medium,
    /// Low priority errors that are mostly informational
    Low,
}

impl WithdrawerError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            WithdrawerError::Config(_) => ErrorSeverity::Critical,
            WithdrawerError::Exchange(ExchangeError::MissingCredentials) => ErrorSeverity::Critical,

            WithdrawerError::Rpc(RpcError::Exhausted { .. }) => ErrorSeverity::High,
            WithdrawerError::Exchange(_) => ErrorSeverity::High,
            WithdrawerError::Store(_) => ErrorSeverity::High,

            WithdrawerError::Rpc(_) => ErrorSeverity::Medium,

            WithdrawerError::Notify(_) => ErrorSeverity::Low,
        }
    }

    /// Check if the error is recoverable within the current run.
    /// Recoverable here means the run continues with the next wallet;
    /// non-recoverable errors abort startup.
    pub fn is_recoverable(&self) -> bool {
        match self {
            WithdrawerError::Config(_) => false,

            WithdrawerError::Rpc(_) => true,
            WithdrawerError::Exchange(_) => true,
            WithdrawerError::Store(_) => true,
            WithdrawerError::Notify(_) => true,
        }
    }
}
