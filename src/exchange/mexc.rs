use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use log::{error, info};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;

use crate::config::ExchangeConfig;
use crate::error::ExchangeError;
use crate::exchange::WithdrawalApi;
use crate::models::{WithdrawalReceipt, WithdrawalRequest};

const WITHDRAW_PATH: &str = "/api/v3/capital/withdraw";

/// Raw withdrawal response from the exchange.
#[derive(Debug, Deserialize)]
struct WithdrawResponse {
    id: Option<String>,
    #[serde(rename = "txId")]
    tx_id: Option<String>,
}

/// Error envelope returned by the exchange on rejected requests.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: i32,
    msg: String,
}

/// MEXC withdrawal client with signed request support.
///
/// In dry-run mode (the default) no request leaves the process and a
/// synthetic receipt is returned; the toggle comes from configuration, never
/// from runtime state.
pub struct MexcClient {
    api_key: String,
    api_secret: String,
    dry_run: bool,
    base_url: String,
    client: Client,
}

impl MexcClient {
    pub fn new(config: &ExchangeConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            dry_run: config.dry_run,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Generate the hex HMAC-SHA256 signature over the query string.
    fn sign(&self, query: &str) -> Result<String, ExchangeError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .map_err(|_| ExchangeError::Signature)?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn timestamp_millis() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }

    async fn submit(&self, request: &WithdrawalRequest) -> Result<WithdrawalReceipt, ExchangeError> {
        let query = format!(
            "coin={}&address={}&amount={}&netWork={}&timestamp={}",
            request.currency,
            request.address,
            request.amount,
            request.network.exchange_name(),
            Self::timestamp_millis(),
        );
        let signature = self.sign(&query)?;
        let url = format!("{}{}?{}&signature={}", self.base_url, WITHDRAW_PATH, query, signature);

        let response = self
            .client
            .post(&url)
            .header("X-MEXC-APIKEY", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(ExchangeError::Api {
                    code: api_error.code,
                    message: api_error.msg,
                });
            }
            return Err(ExchangeError::Rejected(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: WithdrawResponse = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::Rejected(format!("unparseable response: {}", e)))?;

        match parsed.id {
            Some(id) => Ok(WithdrawalReceipt {
                id,
                transaction_id: parsed.tx_id,
                dry_run: false,
            }),
            None => Err(ExchangeError::Rejected(
                "no withdrawal id in response".to_string(),
            )),
        }
    }
}

impl WithdrawalApi for MexcClient {
    async fn withdraw(&self, request: &WithdrawalRequest) -> Result<WithdrawalReceipt, ExchangeError> {
        if self.dry_run {
            info!(
                "DRY_RUN mode - not executing real withdrawal of {} {} to {} ({})",
                request.amount,
                request.currency,
                request.address,
                request.network.exchange_name()
            );
            return Ok(WithdrawalReceipt {
                id: "dry-run".to_string(),
                transaction_id: None,
                dry_run: true,
            });
        }

        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(ExchangeError::MissingCredentials);
        }

        info!(
            "Withdrawal: {} {} to {} ({})",
            request.amount,
            request.currency,
            request.address,
            request.network.exchange_name()
        );

        match self.submit(request).await {
            Ok(receipt) => {
                info!("Withdrawal submitted: {}", receipt.id);
                Ok(receipt)
            }
            Err(e) => {
                error!("Withdrawal failed: {}", e);
                Err(e)
            }
        }
    }
}
