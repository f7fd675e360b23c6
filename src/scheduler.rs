use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use thiserror::Error;
use tokio::signal;
use tokio::time::sleep;

use crate::chain::balance::BalanceSource;
use crate::config::ScheduleConfig;
use crate::exchange::WithdrawalApi;
use crate::models::WalletTask;
use crate::notify::Notifier;
use crate::orchestrator::{SelectionStrategy, WithdrawalOrchestrator};

#[derive(Error, Debug)]
pub enum RunError {
    #[error("No wallets to process")]
    EmptyQueue,
}

/// Drives the wallet queue sequentially: one wallet reaches a terminal,
/// recorded state before the next begins. Between wallets (never after the
/// last) the loop sleeps a randomized delay so the externally visible
/// withdrawal cadence is paced. The only concurrency in the whole run is the
/// dual-network balance check inside a single wallet's evaluation.
pub struct RunScheduler {
    config: ScheduleConfig,
    shutdown_signal: Arc<AtomicBool>,
}

impl RunScheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_signal)
    }

    /// Install a ctrl-c listener that requests a stop after the current
    /// wallet finishes.
    pub fn listen_for_shutdown(&self) {
        let shutdown_signal = Arc::clone(&self.shutdown_signal);
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received shutdown signal");
                    shutdown_signal.store(true, Ordering::Relaxed);
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });
    }

    fn random_delay(&self) -> Duration {
        let span = self.config.max_delay_hours - self.config.min_delay_hours;
        let hours = self.config.min_delay_hours + span * rand::random::<f64>();
        Duration::from_secs_f64(hours * 3600.0)
    }

    /// Run the queue to completion. Returns the number of wallets processed.
    pub async fn run<B, W, N, S>(
        &self,
        tasks: &[WalletTask],
        orchestrator: &mut WithdrawalOrchestrator<'_, B, W, N, S>,
    ) -> Result<usize, RunError>
    where
        B: BalanceSource + Sync,
        W: WithdrawalApi + Sync,
        N: Notifier + Sync,
        S: SelectionStrategy,
    {
        if tasks.is_empty() {
            return Err(RunError::EmptyQueue);
        }

        info!("Loaded {} wallets to process", tasks.len());

        let mut processed = 0;
        for (index, task) in tasks.iter().enumerate() {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                info!("Shutdown requested, stopping after {} wallets", processed);
                break;
            }

            info!("[{}/{}] Processing wallet {}", index + 1, tasks.len(), task.address);
            let outcome = orchestrator.process(task).await;
            info!("[{}/{}] Outcome: {:?}", index + 1, tasks.len(), outcome);
            processed += 1;

            if index < tasks.len() - 1 {
                let delay = self.random_delay();
                info!(
                    "Waiting {:.2} hour(s) before next withdrawal",
                    delay.as_secs_f64() / 3600.0
                );
                sleep(delay).await;
            }
        }

        info!("Run complete: {} wallets processed", processed);
        Ok(processed)
    }
}
