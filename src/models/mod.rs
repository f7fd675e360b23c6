pub mod wallet;

pub use wallet::{
    normalize_address, short_address, validate_address, BalanceSnapshot, Network, WalletTask,
    WithdrawalReceipt, WithdrawalRequest,
};
