use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use crate::chain::rpc_client::RpcClient;
use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::models::{BalanceSnapshot, Network};

/// Source of on-chain balance reads. The production implementation is
/// [`ChainBalanceClient`]; tests substitute scripted doubles.
pub trait BalanceSource {
    fn balance(
        &self,
        address: &str,
        network: Network,
    ) -> impl Future<Output = Result<f64, RpcError>> + Send;
}

/// Balance client with bounded retries per query.
///
/// Each query makes up to `max_retries` attempts, each bounded by the
/// transport timeout, sleeping a randomized delay between attempts so
/// repeated failures against a rate-limited provider do not land in
/// lock-step. Queries to different networks share nothing: each network has
/// its own endpoint and each call its own retry budget.
pub struct ChainBalanceClient {
    optimism: RpcClient,
    arbitrum: RpcClient,
    max_retries: u32,
    retry_delay_min_seconds: f64,
    retry_delay_max_seconds: f64,
}

impl ChainBalanceClient {
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            optimism: RpcClient::new(config.optimism_url.clone(), config.timeout_seconds),
            arbitrum: RpcClient::new(config.arbitrum_url.clone(), config.timeout_seconds),
            max_retries: config.max_retries,
            retry_delay_min_seconds: config.retry_delay_min_seconds,
            retry_delay_max_seconds: config.retry_delay_max_seconds,
        }
    }

    fn client_for(&self, network: Network) -> &RpcClient {
        match network {
            Network::Optimism => &self.optimism,
            Network::Arbitrum => &self.arbitrum,
        }
    }

    /// Uniform random delay in the configured [min, max] window.
    fn random_retry_delay(&self) -> Duration {
        let span = self.retry_delay_max_seconds - self.retry_delay_min_seconds;
        let seconds = self.retry_delay_min_seconds + span * rand::random::<f64>();
        Duration::from_secs_f64(seconds.max(0.0))
    }

    /// Fetch the balance of `address` on `network`, in ETH.
    ///
    /// Retries transient failures up to the attempt cap; the terminal error
    /// is `RpcError::Exhausted` carrying the last observed cause, and is not
    /// retried further by callers.
    pub async fn get_balance(&self, address: &str, network: Network) -> Result<f64, RpcError> {
        let client = self.client_for(network);
        let mut last_error: Option<RpcError> = None;

        for attempt in 1..=self.max_retries {
            match client.get_balance(address).await {
                Ok(balance) => {
                    if attempt > 1 {
                        debug!(
                            "Balance query on {} succeeded after {} attempts",
                            network, attempt
                        );
                    }
                    return Ok(balance);
                }
                Err(e) => {
                    if attempt == self.max_retries {
                        last_error = Some(e);
                        break;
                    }
                    let delay = self.random_retry_delay();
                    warn!(
                        "RPC error on {} (attempt {}/{}), retrying in {:.1}s: {}",
                        network,
                        attempt,
                        self.max_retries,
                        delay.as_secs_f64(),
                        e
                    );
                    last_error = Some(e);
                    sleep(delay).await;
                }
            }
        }

        Err(RpcError::Exhausted {
            network,
            attempts: self.max_retries,
            cause: Box::new(last_error.unwrap_or_else(|| {
                RpcError::InvalidResponse("no attempt was made".to_string())
            })),
        })
    }
}

impl BalanceSource for ChainBalanceClient {
    async fn balance(&self, address: &str, network: Network) -> Result<f64, RpcError> {
        self.get_balance(address, network).await
    }
}

/// Query both networks concurrently for the same address.
///
/// The two in-flight queries have independent retry budgets; a failure on
/// either propagates after both complete.
pub async fn fetch_both_balances<B: BalanceSource + Sync>(
    source: &B,
    address: &str,
) -> Result<BalanceSnapshot, RpcError> {
    let (optimism, arbitrum) = tokio::join!(
        source.balance(address, Network::Optimism),
        source.balance(address, Network::Arbitrum),
    );

    Ok(BalanceSnapshot {
        optimism: optimism?,
        arbitrum: arbitrum?,
    })
}
