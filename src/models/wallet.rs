use serde::{Deserialize, Serialize};

/// The two EVM networks a destination wallet can be funded on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Network {
    Optimism,
    Arbitrum,
}

impl Network {
    /// Short chain code used by the exchange withdrawal API ("OP" / "ARB").
    pub fn chain_code(&self) -> &'static str {
        match self {
            Network::Optimism => "OP",
            Network::Arbitrum => "ARB",
        }
    }

    /// Network name as the exchange expects it in withdrawal parameters.
    pub fn exchange_name(&self) -> &'static str {
        match self {
            Network::Optimism => "OPTIMISM",
            Network::Arbitrum => "ARBITRUM",
        }
    }

    /// Human-readable name for notifications and logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            Network::Optimism => "Optimism",
            Network::Arbitrum => "Arbitrum",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One wallet from the input list, queued for processing.
///
/// The assigned network is a load-time hint only; the network actually used
/// for the withdrawal is re-selected independently when the wallet is
/// processed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletTask {
    pub address: String,
    pub assigned_network: Network,
}

/// Balances observed on both networks for a single address, in ETH.
/// Produced fresh on every check, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceSnapshot {
    pub optimism: f64,
    pub arbitrum: f64,
}

impl BalanceSnapshot {
    pub fn total(&self) -> f64 {
        self.optimism + self.arbitrum
    }

    pub fn on(&self, network: Network) -> f64 {
        match network {
            Network::Optimism => self.optimism,
            Network::Arbitrum => self.arbitrum,
        }
    }
}

/// Parameters for a single exchange withdrawal. Constructed once per wallet
/// and passed by value to the exchange client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WithdrawalRequest {
    pub currency: String,
    /// Decimal string with fixed 8-digit precision.
    pub amount: String,
    pub address: String,
    pub network: Network,
}

impl WithdrawalRequest {
    pub fn new(currency: &str, amount_eth: f64, address: &str, network: Network) -> Self {
        Self {
            currency: currency.to_string(),
            amount: format!("{:.8}", amount_eth),
            address: address.to_string(),
            network,
        }
    }
}

/// Result of a submitted withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WithdrawalReceipt {
    /// Exchange-side withdrawal identifier.
    pub id: String,
    /// On-chain transaction id, if the exchange reported one.
    pub transaction_id: Option<String>,
    /// True when the receipt was produced by dry-run mode.
    pub dry_run: bool,
}

/// Normalize an address for comparisons: trimmed, lowercased, `0x` prefix
/// kept. The progress file stores addresses as given; all membership checks
/// go through this.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Validate that an address is a `0x`-prefixed 20-byte hex string.
pub fn validate_address(address: &str) -> bool {
    let addr = address.trim();
    if !addr.starts_with("0x") && !addr.starts_with("0X") {
        return false;
    }
    let hex_part = &addr[2..];
    hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Short display form for notifications: first 8 and last 6 characters.
pub fn short_address(address: &str) -> String {
    if address.len() <= 14 {
        return address.to_string();
    }
    format!(
        "{}...{}",
        &address[..8],
        &address[address.len() - 6..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_codes() {
        assert_eq!(Network::Optimism.chain_code(), "OP");
        assert_eq!(Network::Arbitrum.chain_code(), "ARB");
        assert_eq!(Network::Optimism.exchange_name(), "OPTIMISM");
        assert_eq!(Network::Arbitrum.exchange_name(), "ARBITRUM");
    }

    #[test]
    fn test_balance_snapshot_total_and_lookup() {
        let snapshot = BalanceSnapshot {
            optimism: 0.0,
            arbitrum: 0.02,
        };
        assert_eq!(snapshot.total(), 0.02);
        assert_eq!(snapshot.on(Network::Optimism), 0.0);
        assert_eq!(snapshot.on(Network::Arbitrum), 0.02);
    }

    #[test]
    fn test_withdrawal_request_fixed_precision() {
        let request = WithdrawalRequest::new(
            "ETH",
            0.00123456789,
            "0xf977814e90da44bfa03b6295a0616a897441acec",
            Network::Optimism,
        );
        assert_eq!(request.amount, "0.00123457");
        assert_eq!(request.currency, "ETH");
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("  0xF977814E90dA44bFA03b6295A0616a897441aceC "),
            "0xf977814e90da44bfa03b6295a0616a897441acec"
        );
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0xf977814e90da44bfa03b6295a0616a897441acec"));
        assert!(validate_address("0XF977814E90DA44BFA03B6295A0616A897441ACEC"));
        // Too short
        assert!(!validate_address("0xf977814e90da44bf"));
        // Missing prefix
        assert!(!validate_address("f977814e90da44bfa03b6295a0616a897441acec"));
        // Non-hex characters
        assert!(!validate_address("0xz977814e90da44bfa03b6295a0616a897441ace"));
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("0xf977814e90da44bfa03b6295a0616a897441acec"),
            "0xf97781...41acec"
        );
        assert_eq!(short_address("0xabc"), "0xabc");
    }

    #[test]
    fn test_wallet_task_serialization() {
        let task = WalletTask {
            address: "0xf977814e90da44bfa03b6295a0616a897441acec".to_string(),
            assigned_network: Network::Optimism,
        };
        let json = serde_json::to_string(&task).expect("Failed to serialize");
        assert!(json.contains("\"assigned_network\":\"Optimism\""));
        let deserialized: WalletTask = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(task, deserialized);
    }
}
