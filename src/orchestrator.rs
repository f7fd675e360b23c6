use log::{error, info, warn};
use rand::Rng;

use crate::chain::balance::{fetch_both_balances, BalanceSource};
use crate::chain::confirmation::ConfirmationWaiter;
use crate::config::WithdrawalConfig;
use crate::error::WithdrawerError;
use crate::exchange::WithdrawalApi;
use crate::models::{Network, WalletTask, WithdrawalRequest};
use crate::notify::{
    format_critical_message, format_success_message, format_timeout_message, notify_best_effort,
    Notifier,
};
use crate::progress::ProgressStore;

/// Safety margin over the network fee for the smallest withdrawal; amounts
/// below `fee * 1.05` would not clear minimum-withdrawal-after-fee checks.
const MIN_AMOUNT_FEE_FACTOR: f64 = 1.05;

/// Network and amount selection for a withdrawal.
///
/// The production implementation draws from a random source; tests inject
/// fixed selections to pin down each branch of the state machine.
pub trait SelectionStrategy {
    /// Network to withdraw over. Selected independently at withdrawal time,
    /// not taken from the task's load-time hint.
    fn withdrawal_network(&mut self) -> Network;

    /// Withdrawal amount in ETH, before the fee floor is applied.
    fn amount_eth(&mut self, min: f64, max: f64) -> f64;
}

/// Unweighted random selection: fair coin for the network, uniform draw for
/// the amount.
pub struct RandomStrategy<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomStrategy<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> SelectionStrategy for RandomStrategy<R> {
    fn withdrawal_network(&mut self) -> Network {
        if self.rng.gen_bool(0.5) {
            Network::Optimism
        } else {
            Network::Arbitrum
        }
    }

    fn amount_eth(&mut self, min: f64, max: f64) -> f64 {
        self.rng.gen_range(min..=max)
    }
}

/// Raise an amount below the post-fee minimum to exactly that minimum.
pub fn ensure_min_amount(amount: f64, network_fee: f64) -> f64 {
    let min_with_fee = network_fee * MIN_AMOUNT_FEE_FACTOR;
    if amount < min_with_fee {
        info!(
            "Amount {:.8} is less than min with fee {:.8}, lifting",
            amount, min_with_fee
        );
        min_with_fee
    } else {
        amount
    }
}

/// A network qualifies when it has a configured fee cap and the estimated
/// fee does not exceed it (a fee exactly at the cap passes).
pub fn is_network_eligible(fee_estimate: f64, fee_cap: Option<f64>) -> bool {
    match fee_cap {
        Some(cap) => fee_estimate <= cap,
        None => false,
    }
}

/// Terminal outcome of one wallet's evaluation. Every variant is recorded in
/// the progress store.
#[derive(Debug)]
pub enum WalletOutcome {
    /// Combined balance already met the threshold; no withdrawal.
    SkippedThreshold { total: f64 },
    /// Both networks already hold a nonzero balance; no withdrawal.
    SkippedBothFunded,
    /// The selected network failed the fee eligibility gate.
    SkippedIneligible { network: Network },
    /// Withdrawal submitted and the balance increase was observed on-chain.
    Confirmed { network: Network, amount: String },
    /// Withdrawal submitted but no balance increase within the deadline.
    TimedOut { network: Network, amount: String },
    /// An RPC, exchange, or store error ended the evaluation.
    Failed { error: WithdrawerError },
}

/// Drives the per-wallet workflow: balance check, skip conditions, network
/// and amount selection, eligibility gate, withdrawal, confirmation wait,
/// recording and notification.
///
/// Holds no state across wallets beyond its collaborators; a crash mid-wallet
/// loses nothing but unrecorded work, which the next run re-evaluates from
/// scratch.
pub struct WithdrawalOrchestrator<'a, B, W, N, S> {
    balances: &'a B,
    exchange: &'a W,
    notifier: &'a N,
    store: &'a ProgressStore,
    waiter: ConfirmationWaiter,
    strategy: S,
    config: WithdrawalConfig,
}

impl<'a, B, W, N, S> WithdrawalOrchestrator<'a, B, W, N, S>
where
    B: BalanceSource + Sync,
    W: WithdrawalApi + Sync,
    N: Notifier + Sync,
    S: SelectionStrategy,
{
    pub fn new(
        balances: &'a B,
        exchange: &'a W,
        notifier: &'a N,
        store: &'a ProgressStore,
        waiter: ConfirmationWaiter,
        strategy: S,
        config: WithdrawalConfig,
    ) -> Self {
        Self {
            balances,
            exchange,
            notifier,
            store,
            waiter,
            strategy,
            config,
        }
    }

    fn fee_estimate(&self, network: Network) -> f64 {
        match network {
            Network::Optimism => self.config.fee_estimate_optimism_eth,
            Network::Arbitrum => self.config.fee_estimate_arbitrum_eth,
        }
    }

    fn fee_cap(&self, network: Network) -> Option<f64> {
        match network {
            Network::Optimism => self.config.fee_cap_optimism_eth,
            Network::Arbitrum => self.config.fee_cap_arbitrum_eth,
        }
    }

    /// Process one wallet to a terminal, recorded state. Never returns an
    /// error: failures become a critical notification plus the Failed
    /// outcome, and the wallet is marked processed either way so the run
    /// keeps moving.
    pub async fn process(&mut self, task: &WalletTask) -> WalletOutcome {
        let outcome = match self.evaluate(task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error processing wallet {}: {}", task.address, e);
                let message = format_critical_message(&task.address, &e.to_string());
                notify_best_effort(self.notifier, &message).await;
                WalletOutcome::Failed { error: e }
            }
        };

        if let Err(e) = self.store.mark_processed(&task.address) {
            // The run continues; the address may be re-evaluated next run
            error!(
                "Failed to record {} as processed: {}",
                task.address, e
            );
        }

        outcome
    }

    async fn evaluate(&mut self, task: &WalletTask) -> Result<WalletOutcome, WithdrawerError> {
        let balances = fetch_both_balances(self.balances, &task.address).await?;
        info!(
            "{}: OP={:.6} ARB={:.6} Total={:.6} ETH",
            task.address,
            balances.optimism,
            balances.arbitrum,
            balances.total()
        );

        if balances.total() >= self.config.dest_balance_threshold_eth {
            info!(
                "Total balance >= threshold ({}), skipping {}",
                self.config.dest_balance_threshold_eth, task.address
            );
            return Ok(WalletOutcome::SkippedThreshold {
                total: balances.total(),
            });
        }

        if balances.optimism > 0.0 && balances.arbitrum > 0.0 {
            info!("Balance > 0 in both networks, no withdrawal needed");
            return Ok(WalletOutcome::SkippedBothFunded);
        }

        // Selected independently of the task's load-time hint
        let network = self.strategy.withdrawal_network();
        let fee = self.fee_estimate(network);

        let drawn = self
            .strategy
            .amount_eth(self.config.min_amount_eth, self.config.max_amount_eth);
        let amount = ensure_min_amount(drawn, fee);

        if !is_network_eligible(fee, self.fee_cap(network)) {
            warn!(
                "Network {} not eligible for withdrawal (fee {:.8}, cap {:?})",
                network,
                fee,
                self.fee_cap(network)
            );
            return Ok(WalletOutcome::SkippedIneligible { network });
        }

        let request =
            WithdrawalRequest::new(&self.config.currency, amount, &task.address, network);
        let receipt = self.exchange.withdraw(&request).await?;
        info!(
            "Withdrawal submitted for {}: id={}",
            task.address, receipt.id
        );

        let confirmed = self
            .waiter
            .await_increase(self.balances, &task.address, network, amount)
            .await?;

        if confirmed {
            let final_balance = self.balances.balance(&task.address, network).await?;
            let message =
                format_success_message(&task.address, network, &request.amount, final_balance);
            notify_best_effort(self.notifier, &message).await;
            Ok(WalletOutcome::Confirmed {
                network,
                amount: request.amount,
            })
        } else {
            let message = format_timeout_message(
                &task.address,
                network,
                &request.amount,
                self.waiter.deadline_minutes(),
            );
            notify_best_effort(self.notifier, &message).await;
            Ok(WalletOutcome::TimedOut {
                network,
                amount: request.amount,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_amount_floor_lifts_to_exact_minimum() {
        let fee = 0.00001;
        let floor = fee * 1.05;

        // Below the floor is lifted to exactly the floor
        assert_eq!(ensure_min_amount(0.0, fee), floor);
        assert_eq!(ensure_min_amount(floor - 1e-12, fee), floor);
    }

    #[test]
    fn test_amount_floor_passes_through_at_or_above() {
        let fee = 0.00001;
        let floor = fee * 1.05;

        assert_eq!(ensure_min_amount(floor, fee), floor);
        assert_eq!(ensure_min_amount(0.005, fee), 0.005);
    }

    #[test]
    fn test_eligibility_at_cap_and_above() {
        let cap = 0.00001;

        // Fee exactly at the cap passes
        assert!(is_network_eligible(cap, Some(cap)));
        // One representable step above the cap fails
        assert!(!is_network_eligible(cap + 1e-12, Some(cap)));
        // No configured cap is never eligible
        assert!(!is_network_eligible(0.0, None));
    }

    #[test]
    fn test_random_strategy_amount_within_window() {
        let mut strategy = RandomStrategy::new(StdRng::seed_from_u64(7));
        for _ in 0..200 {
            let amount = strategy.amount_eth(0.001, 0.01);
            assert!((0.001..=0.01).contains(&amount));
        }
    }

    #[test]
    fn test_random_strategy_hits_both_networks() {
        let mut strategy = RandomStrategy::new(StdRng::seed_from_u64(7));
        let mut optimism = 0;
        let mut arbitrum = 0;
        for _ in 0..200 {
            match strategy.withdrawal_network() {
                Network::Optimism => optimism += 1,
                Network::Arbitrum => arbitrum += 1,
            }
        }
        assert!(optimism > 0);
        assert!(arbitrum > 0);
    }
}
