use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub withdrawal: WithdrawalConfig,
    pub confirmation: ConfirmationConfig,
    pub schedule: ScheduleConfig,
    pub exchange: ExchangeConfig,
    pub telegram: TelegramConfig,
    pub files: FileConfig,
}

/// Chain RPC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Optimism RPC endpoint URL
    pub optimism_url: String,
    /// Arbitrum RPC endpoint URL
    pub arbitrum_url: String,
    /// Per-call request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum number of attempts per balance query
    pub max_retries: u32,
    /// Minimum randomized delay between attempts in seconds
    pub retry_delay_min_seconds: f64,
    /// Maximum randomized delay between attempts in seconds
    pub retry_delay_max_seconds: f64,
}

/// Withdrawal amount and eligibility configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalConfig {
    /// Currency symbol sent to the exchange
    pub currency: String,
    /// Minimum withdrawal amount in ETH
    pub min_amount_eth: f64,
    /// Maximum withdrawal amount in ETH
    pub max_amount_eth: f64,
    /// Skip the wallet when its combined balance reaches this, in ETH
    pub dest_balance_threshold_eth: f64,
    /// Maximum acceptable network fee per network; a network without a cap
    /// is never eligible for withdrawal
    pub fee_cap_optimism_eth: Option<f64>,
    pub fee_cap_arbitrum_eth: Option<f64>,
    /// Best-effort fee estimates used for the eligibility gate and the
    /// amount floor; default to the caps
    pub fee_estimate_optimism_eth: f64,
    pub fee_estimate_arbitrum_eth: f64,
}

/// On-chain arrival confirmation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Maximum wall-clock window to observe the balance increase, in minutes
    pub timeout_minutes: u64,
    /// Balance poll interval in seconds
    pub poll_interval_seconds: u64,
}

/// Inter-wallet pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minimum randomized delay between wallets, in hours
    pub min_delay_hours: f64,
    /// Maximum randomized delay between wallets, in hours
    pub max_delay_hours: f64,
}

/// Exchange API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// MEXC API key (usually from MEXC_API_KEY)
    pub api_key: String,
    /// MEXC API secret (usually from MEXC_API_SECRET)
    pub api_secret: String,
    /// When true, withdrawals are simulated and never reach the exchange
    pub dry_run: bool,
    /// Exchange REST base URL
    pub base_url: String,
}

/// Telegram notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token (usually from TELEGRAM_BOT_TOKEN); empty disables delivery
    pub bot_token: String,
    /// Chat id (usually from TELEGRAM_CHAT_ID); empty disables delivery
    pub chat_id: String,
    /// Telegram API base URL
    pub api_base: String,
    /// Delivery request timeout in seconds
    pub timeout_seconds: u64,
}

/// Input and progress file paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Newline-delimited wallet address list
    pub wallet_file: String,
    /// Append-only progress file of finalized addresses
    pub processed_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            withdrawal: WithdrawalConfig::default(),
            confirmation: ConfirmationConfig::default(),
            schedule: ScheduleConfig::default(),
            exchange: ExchangeConfig::default(),
            telegram: TelegramConfig::default(),
            files: FileConfig::default(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            optimism_url: "https://optimism.drpc.org".to_string(),
            arbitrum_url: "https://arbitrum.drpc.org".to_string(),
            timeout_seconds: 30,
            max_retries: 5,
            retry_delay_min_seconds: 3.0,
            retry_delay_max_seconds: 8.0,
        }
    }
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self {
            currency: "ETH".to_string(),
            min_amount_eth: 0.001,
            max_amount_eth: 0.01,
            dest_balance_threshold_eth: 0.005,
            fee_cap_optimism_eth: Some(0.00001),
            fee_cap_arbitrum_eth: Some(0.00008),
            fee_estimate_optimism_eth: 0.00001,
            fee_estimate_arbitrum_eth: 0.00008,
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: 20,
            poll_interval_seconds: 10,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_delay_hours: 3.0,
            max_delay_hours: 5.0,
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            dry_run: true,
            base_url: "https://api.mexc.com".to_string(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            wallet_file: "data/evm.txt".to_string(),
            processed_file: "data/evm_processed.txt".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables take precedence over file values.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        let config: AppConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // RPC configuration
        if let Ok(url) = env::var("OPTIMISM_RPC_URL") {
            self.rpc.optimism_url = url;
        }
        if let Ok(url) = env::var("ARBITRUM_RPC_URL") {
            self.rpc.arbitrum_url = url;
        }
        if let Ok(timeout) = env::var("RPC_TIMEOUT_SECONDS") {
            self.rpc.timeout_seconds = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RPC_TIMEOUT_SECONDS".to_string(),
                value: timeout,
            })?;
        }
        if let Ok(retries) = env::var("RPC_MAX_RETRIES") {
            self.rpc.max_retries = retries.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RPC_MAX_RETRIES".to_string(),
                value: retries,
            })?;
        }

        // Exchange configuration
        if let Ok(key) = env::var("MEXC_API_KEY") {
            self.exchange.api_key = key;
        }
        if let Ok(secret) = env::var("MEXC_API_SECRET") {
            self.exchange.api_secret = secret;
        }
        if let Ok(dry_run) = env::var("MEXC_DRY_RUN") {
            self.exchange.dry_run = dry_run.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MEXC_DRY_RUN".to_string(),
                value: dry_run,
            })?;
        }

        // Telegram configuration
        if let Ok(token) = env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Ok(chat_id) = env::var("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }

        // File paths
        if let Ok(path) = env::var("WALLET_FILE") {
            self.files.wallet_file = path;
        }
        if let Ok(path) = env::var("PROCESSED_FILE") {
            self.files.processed_file = path;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate RPC endpoint URLs
        for url in [&self.rpc.optimism_url, &self.rpc.arbitrum_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }

        // Validate timeout values
        if self.rpc.timeout_seconds == 0 || self.rpc.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.timeout_seconds".to_string(),
                value: self.rpc.timeout_seconds.to_string(),
            });
        }

        // Validate retry configuration
        if self.rpc.max_retries == 0 || self.rpc.max_retries > 20 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.max_retries".to_string(),
                value: self.rpc.max_retries.to_string(),
            });
        }
        if self.rpc.retry_delay_min_seconds < 0.0
            || self.rpc.retry_delay_min_seconds > self.rpc.retry_delay_max_seconds
        {
            return Err(ConfigError::InvalidValue {
                key: "rpc.retry_delay_min_seconds".to_string(),
                value: self.rpc.retry_delay_min_seconds.to_string(),
            });
        }

        // Validate withdrawal amounts
        if self.withdrawal.min_amount_eth <= 0.0
            || self.withdrawal.min_amount_eth > self.withdrawal.max_amount_eth
        {
            return Err(ConfigError::InvalidValue {
                key: "withdrawal.min_amount_eth".to_string(),
                value: self.withdrawal.min_amount_eth.to_string(),
            });
        }
        if self.withdrawal.dest_balance_threshold_eth <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "withdrawal.dest_balance_threshold_eth".to_string(),
                value: self.withdrawal.dest_balance_threshold_eth.to_string(),
            });
        }
        for (key, cap) in [
            ("withdrawal.fee_cap_optimism_eth", self.withdrawal.fee_cap_optimism_eth),
            ("withdrawal.fee_cap_arbitrum_eth", self.withdrawal.fee_cap_arbitrum_eth),
        ] {
            if let Some(cap) = cap {
                if cap <= 0.0 {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: cap.to_string(),
                    });
                }
            }
        }

        // Validate confirmation polling
        if self.confirmation.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "confirmation.poll_interval_seconds".to_string(),
                value: self.confirmation.poll_interval_seconds.to_string(),
            });
        }

        // Validate scheduling window
        if self.schedule.min_delay_hours < 0.0
            || self.schedule.min_delay_hours > self.schedule.max_delay_hours
        {
            return Err(ConfigError::InvalidValue {
                key: "schedule.min_delay_hours".to_string(),
                value: self.schedule.min_delay_hours.to_string(),
            });
        }

        // Validate file paths are not empty
        if self.files.wallet_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "files.wallet_file".to_string(),
                value: self.files.wallet_file.clone(),
            });
        }
        if self.files.processed_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "files.processed_file".to_string(),
                value: self.files.processed_file.clone(),
            });
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        let config = Self::default();
        toml::to_string_pretty(&config).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parsing(e.to_string()))?;
        fs::write(path, content).map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        Ok(())
    }

    /// Configuration summary for startup logging (secrets masked)
    pub fn masked_display(&self) -> String {
        format!(
            "delay {}-{}h, confirmation timeout {}min, amounts {}-{} ETH, threshold {} ETH, dry_run {}, exchange key {}, telegram {}",
            self.schedule.min_delay_hours,
            self.schedule.max_delay_hours,
            self.confirmation.timeout_minutes,
            self.withdrawal.min_amount_eth,
            self.withdrawal.max_amount_eth,
            self.withdrawal.dest_balance_threshold_eth,
            self.exchange.dry_run,
            if self.exchange.api_key.is_empty() { "(not set)" } else { "***" },
            if self.telegram.bot_token.is_empty() { "(not set)" } else { "***" },
        )
    }
}
