pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod exchange;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod progress;
pub mod scheduler;
pub mod wallets;

pub use chain::{BalanceSource, ChainBalanceClient, ConfirmationWaiter, RpcClient};
pub use config::AppConfig;
pub use error::{Result, WithdrawerError};
pub use exchange::{MexcClient, WithdrawalApi};
pub use notify::{Notifier, TelegramNotifier};
pub use orchestrator::{RandomStrategy, SelectionStrategy, WalletOutcome, WithdrawalOrchestrator};
pub use progress::ProgressStore;
pub use scheduler::{RunError, RunScheduler};
