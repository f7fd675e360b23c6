use std::time::Duration;

use log::{info, warn};
use tokio::time::{sleep, Instant};

use crate::chain::balance::BalanceSource;
use crate::config::ConfirmationConfig;
use crate::error::RpcError;
use crate::models::Network;

/// Fraction of the expected amount that must arrive for the wait to count as
/// confirmed. The gap absorbs the network fee deducted in transit; exact
/// equality would fail on every fee-adjusted transfer.
const ARRIVAL_TOLERANCE: f64 = 0.90;

/// Waits for an on-chain balance increase after a withdrawal was submitted.
///
/// The baseline read happens before the clock starts and its failure
/// propagates: without a baseline there is nothing meaningful to wait for.
/// After that, the deadline is the only hard stop; per-poll RPC errors are
/// logged and polling continues.
pub struct ConfirmationWaiter {
    poll_interval: Duration,
    deadline: Duration,
}

impl ConfirmationWaiter {
    pub fn new(config: &ConfirmationConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
            deadline: Duration::from_secs(config.timeout_minutes * 60),
        }
    }

    pub fn deadline_minutes(&self) -> u64 {
        self.deadline.as_secs() / 60
    }

    /// Poll until the balance of `address` on `network` has grown by at
    /// least 90% of `expected_eth`, or the deadline elapses.
    ///
    /// Returns Ok(true) on a qualifying increase, Ok(false) on deadline.
    pub async fn await_increase<B: BalanceSource>(
        &self,
        source: &B,
        address: &str,
        network: Network,
        expected_eth: f64,
    ) -> Result<bool, RpcError> {
        let initial_balance = source.balance(address, network).await?;
        let min_acceptable = expected_eth * ARRIVAL_TOLERANCE;
        let start = Instant::now();

        info!(
            "Waiting for balance increase at {} on {} (expected {} ETH, accepting >= {:.8})",
            address, network, expected_eth, min_acceptable
        );

        while start.elapsed() < self.deadline {
            sleep(self.poll_interval).await;

            match source.balance(address, network).await {
                Ok(current_balance) => {
                    let delta = current_balance - initial_balance;
                    if delta >= min_acceptable {
                        info!("Balance increased by {:.8} ETH on {}", delta, network);
                        return Ok(true);
                    }
                }
                Err(e) => {
                    // The deadline keeps running; a flaky poll is not a verdict.
                    warn!("Balance poll failed on {}, continuing: {}", network, e);
                }
            }
        }

        info!(
            "Balance did not increase within {} minutes at {}",
            self.deadline_minutes(),
            address
        );
        Ok(false)
    }
}
