pub mod mexc;

use std::future::Future;

use crate::error::ExchangeError;
use crate::models::{WithdrawalReceipt, WithdrawalRequest};

pub use mexc::MexcClient;

/// Exchange-side withdrawal submission. The production implementation is
/// [`MexcClient`]; the orchestrator only sees this boundary.
pub trait WithdrawalApi {
    fn withdraw(
        &self,
        request: &WithdrawalRequest,
    ) -> impl Future<Output = Result<WithdrawalReceipt, ExchangeError>> + Send;
}
