pub mod balance;
pub mod confirmation;
pub mod rpc_client;

pub use balance::{fetch_both_balances, BalanceSource, ChainBalanceClient};
pub use confirmation::ConfirmationWaiter;
pub use rpc_client::RpcClient;
