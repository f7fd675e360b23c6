use std::fs;
use std::path::Path;

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::ConfigError;
use crate::models::{normalize_address, Network, WalletTask};
use crate::progress::ProgressStore;

/// Load the wallet queue for a run.
///
/// Candidate addresses are the non-blank `0x`-prefixed lines of the input
/// file; anything else is ignored. Addresses already in the progress store
/// are subtracted, and the remainder is shuffled so partial runs do not
/// always retry the same prefix first. Each task gets a load-time network
/// hint; the withdrawal-time network is selected independently later.
pub fn load_wallet_tasks<P: AsRef<Path>, R: Rng>(
    path: P,
    store: &ProgressStore,
    rng: &mut R,
) -> Result<Vec<WalletTask>, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|_| ConfigError::WalletFileNotFound(path.display().to_string()))?;

    let all_addresses: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.starts_with("0x"))
        .map(str::to_string)
        .collect();

    let processed = store.processed_addresses();
    let mut unprocessed: Vec<String> = all_addresses
        .iter()
        .filter(|addr| !processed.contains(&normalize_address(addr)))
        .cloned()
        .collect();

    info!("Total addresses: {}", all_addresses.len());
    info!("Already processed: {}", processed.len());
    info!("To process: {}", unprocessed.len());

    unprocessed.shuffle(rng);

    Ok(unprocessed
        .into_iter()
        .map(|address| WalletTask {
            address,
            assigned_network: random_network_hint(rng),
        })
        .collect())
}

/// Fair 50/50 network hint assigned at load time.
fn random_network_hint<R: Rng>(rng: &mut R) -> Network {
    if rng.gen_bool(0.5) {
        Network::Optimism
    } else {
        Network::Arbitrum
    }
}
