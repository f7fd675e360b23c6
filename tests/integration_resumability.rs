use std::fs;
use std::io::Write;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use mexc_eth_withdrawer::chain::{ChainBalanceClient, ConfirmationWaiter};
use mexc_eth_withdrawer::config::{
    ConfirmationConfig, ExchangeConfig, RpcConfig, ScheduleConfig, TelegramConfig,
    WithdrawalConfig,
};
use mexc_eth_withdrawer::exchange::MexcClient;
use mexc_eth_withdrawer::notify::TelegramNotifier;
use mexc_eth_withdrawer::orchestrator::{RandomStrategy, WithdrawalOrchestrator};
use mexc_eth_withdrawer::progress::ProgressStore;
use mexc_eth_withdrawer::scheduler::{RunError, RunScheduler};
use mexc_eth_withdrawer::wallets::load_wallet_tasks;

const ADDR_1: &str = "0x1111111111111111111111111111111111111111";
const ADDR_2: &str = "0x2222222222222222222222222222222222222222";
const ADDR_3: &str = "0x3333333333333333333333333333333333333333";

/// RPC double answering every balance query with zero.
async fn zero_balance_server() -> mockito::ServerGuard {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","result":"0x0","id":1}"#)
        .create_async()
        .await;
    server
}

fn fast_rpc_config(url: &str) -> RpcConfig {
    RpcConfig {
        optimism_url: url.to_string(),
        arbitrum_url: url.to_string(),
        timeout_seconds: 5,
        max_retries: 2,
        retry_delay_min_seconds: 0.0,
        retry_delay_max_seconds: 0.0,
    }
}

#[tokio::test]
async fn test_resumed_run_skips_processed_and_finalizes_all() {
    let server = zero_balance_server().await;
    let dir = TempDir::new().unwrap();

    // 3-address input file; address #2 is already in the progress file
    let wallet_path = dir.path().join("wallets.txt");
    let mut wallet_file = fs::File::create(&wallet_path).unwrap();
    writeln!(wallet_file, "{}", ADDR_1).unwrap();
    writeln!(wallet_file, "{}", ADDR_2).unwrap();
    writeln!(wallet_file, "{}", ADDR_3).unwrap();

    let progress_path = dir.path().join("processed.txt");
    let store = ProgressStore::new(&progress_path);
    store.mark_processed(ADDR_2).unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let tasks = load_wallet_tasks(&wallet_path, &store, &mut rng).unwrap();

    // Only the two unprocessed addresses are queued
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.address != ADDR_2));

    let balances = ChainBalanceClient::new(&fast_rpc_config(&server.url()));
    let exchange = MexcClient::new(&ExchangeConfig::default());
    let notifier = TelegramNotifier::new(&TelegramConfig::default());
    // Zero confirmation deadline: the wait resolves immediately as a timeout
    let waiter = ConfirmationWaiter::new(&ConfirmationConfig {
        timeout_minutes: 0,
        poll_interval_seconds: 1,
    });

    let mut orchestrator = WithdrawalOrchestrator::new(
        &balances,
        &exchange,
        &notifier,
        &store,
        waiter,
        RandomStrategy::new(StdRng::seed_from_u64(12)),
        WithdrawalConfig::default(),
    );

    let scheduler = RunScheduler::new(ScheduleConfig {
        min_delay_hours: 0.0,
        max_delay_hours: 0.0,
    });

    let processed = scheduler.run(&tasks, &mut orchestrator).await.unwrap();
    assert_eq!(processed, 2);

    // After completion the progress file holds all three addresses exactly once
    let content = fs::read_to_string(&progress_path).unwrap();
    for addr in [ADDR_1, ADDR_2, ADDR_3] {
        assert_eq!(content.matches(addr).count(), 1, "{} not exactly once", addr);
    }
    assert_eq!(store.count(), 3);
}

#[tokio::test]
async fn test_second_run_has_nothing_to_do() {
    let dir = TempDir::new().unwrap();

    let wallet_path = dir.path().join("wallets.txt");
    let mut wallet_file = fs::File::create(&wallet_path).unwrap();
    writeln!(wallet_file, "{}", ADDR_1).unwrap();

    let store = ProgressStore::new(dir.path().join("processed.txt"));
    store.mark_processed(ADDR_1).unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let tasks = load_wallet_tasks(&wallet_path, &store, &mut rng).unwrap();
    assert!(tasks.is_empty());

    // An empty queue aborts before any wallet is touched
    let server = zero_balance_server().await;
    let balances = ChainBalanceClient::new(&fast_rpc_config(&server.url()));
    let exchange = MexcClient::new(&ExchangeConfig::default());
    let notifier = TelegramNotifier::new(&TelegramConfig::default());
    let waiter = ConfirmationWaiter::new(&ConfirmationConfig {
        timeout_minutes: 0,
        poll_interval_seconds: 1,
    });

    let mut orchestrator = WithdrawalOrchestrator::new(
        &balances,
        &exchange,
        &notifier,
        &store,
        waiter,
        RandomStrategy::new(StdRng::seed_from_u64(12)),
        WithdrawalConfig::default(),
    );

    let scheduler = RunScheduler::new(ScheduleConfig {
        min_delay_hours: 0.0,
        max_delay_hours: 0.0,
    });

    let result = scheduler.run(&tasks, &mut orchestrator).await;
    assert!(matches!(result, Err(RunError::EmptyQueue)));
    assert_eq!(store.count(), 1);
}
