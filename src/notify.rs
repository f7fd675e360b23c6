use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::TelegramConfig;
use crate::error::NotifyError;
use crate::models::{short_address, Network};

/// Outbound notification sink. Takes one preformatted text blob per event;
/// delivery is best-effort and callers never treat failures as fatal.
pub trait Notifier {
    fn notify(&self, message: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API notification sink.
///
/// Missing credentials disable delivery rather than failing the run; every
/// message is HTML-sanitized before sending.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    api_base: String,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        if !self.is_configured() {
            debug!("Telegram credentials not set, skipping notification");
            return Ok(());
        }

        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let sanitized = sanitize_html(message);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: &sanitized,
            parse_mode: "HTML",
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let parsed: SendMessageResponse = response.json().await?;

        if !parsed.ok {
            return Err(NotifyError::Api(
                parsed
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        info!("Telegram notification sent");
        Ok(())
    }
}

/// Deliver a notification and log the failure instead of surfacing it.
pub async fn notify_best_effort<N: Notifier>(notifier: &N, message: &str) {
    if let Err(e) = notifier.notify(message).await {
        warn!("Notification delivery failed: {}", e);
    }
}

/// Escape characters that Telegram HTML parse mode would misread.
pub fn sanitize_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn format_success_message(
    address: &str,
    network: Network,
    amount: &str,
    final_balance: f64,
) -> String {
    format!(
        "WITHDRAWAL CONFIRMED\n\n\
         Address: {}\n\
         Network: {}\n\
         Amount: {} ETH\n\
         Current balance: {:.6} ETH",
        short_address(address),
        network.display_name(),
        amount,
        final_balance
    )
}

pub fn format_timeout_message(
    address: &str,
    network: Network,
    amount: &str,
    timeout_minutes: u64,
) -> String {
    format!(
        "CONFIRMATION TIMEOUT\n\n\
         Address: {}\n\
         Network: {}\n\
         Amount: {} ETH\n\
         Balance did not change within {} minutes.\n\
         The withdrawal was submitted; only arrival is unconfirmed.",
        short_address(address),
        network.display_name(),
        amount,
        timeout_minutes
    )
}

pub fn format_critical_message(address: &str, error: &str) -> String {
    // First line only, truncated; full detail goes to the log
    let first_line: String = error.lines().next().unwrap_or("").chars().take(100).collect();
    format!(
        "CRITICAL ERROR\n\n\
         Address: {}\n\
         Error: {}\n\n\
         Attention required.",
        short_address(address),
        first_line
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xf977814e90da44bfa03b6295a0616a897441acec";

    #[test]
    fn test_sanitize_html() {
        assert_eq!(
            sanitize_html(r#"a & b < c > d "e""#),
            "a &amp; b &lt; c &gt; d &quot;e&quot;"
        );
        assert_eq!(sanitize_html("plain"), "plain");
    }

    #[test]
    fn test_success_message_contents() {
        let message = format_success_message(ADDR, Network::Optimism, "0.00500000", 0.0051);
        assert!(message.contains("0xf97781...41acec"));
        assert!(message.contains("Optimism"));
        assert!(message.contains("0.00500000 ETH"));
        assert!(message.contains("0.005100"));
    }

    #[test]
    fn test_timeout_message_contents() {
        let message = format_timeout_message(ADDR, Network::Arbitrum, "0.00500000", 20);
        assert!(message.contains("Arbitrum"));
        assert!(message.contains("20 minutes"));
        assert!(message.contains("submitted"));
    }

    #[test]
    fn test_critical_message_truncates_error() {
        let long_error = format!("{}\nsecond line never shown", "x".repeat(300));
        let message = format_critical_message(ADDR, &long_error);
        assert!(message.contains(&"x".repeat(100)));
        assert!(!message.contains(&"x".repeat(101)));
        assert!(!message.contains("second line"));
    }

    #[tokio::test]
    async fn test_unconfigured_notifier_skips_silently() {
        let notifier = TelegramNotifier::new(&TelegramConfig::default());
        assert!(!notifier.is_configured());
        // No credentials: no request is made and no error is raised
        notifier.notify("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_delivery_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bottest-token/sendMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let config = TelegramConfig {
            bot_token: "test-token".to_string(),
            chat_id: "42".to_string(),
            api_base: server.url(),
            timeout_seconds: 5,
        };
        let notifier = TelegramNotifier::new(&config);
        notifier.notify("hello <world>").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_failure_is_surfaced_to_best_effort_wrapper() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/bottest-token/sendMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":false,"description":"chat not found"}"#)
            .create_async()
            .await;

        let config = TelegramConfig {
            bot_token: "test-token".to_string(),
            chat_id: "42".to_string(),
            api_base: server.url(),
            timeout_seconds: 5,
        };
        let notifier = TelegramNotifier::new(&config);

        let result = notifier.notify("hello").await;
        assert!(matches!(result, Err(NotifyError::Api(_))));

        // The wrapper swallows it
        notify_best_effort(&notifier, "hello").await;
    }
}
