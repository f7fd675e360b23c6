use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use mexc_eth_withdrawer::chain::{ChainBalanceClient, ConfirmationWaiter};
use mexc_eth_withdrawer::config::AppConfig;
use mexc_eth_withdrawer::exchange::MexcClient;
use mexc_eth_withdrawer::notify::TelegramNotifier;
use mexc_eth_withdrawer::orchestrator::{RandomStrategy, WithdrawalOrchestrator};
use mexc_eth_withdrawer::progress::ProgressStore;
use mexc_eth_withdrawer::scheduler::RunScheduler;
use mexc_eth_withdrawer::wallets::load_wallet_tasks;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    info!("MEXC to wallet withdrawal run starting");
    info!("Configuration: {}", config.masked_display());

    let store = ProgressStore::new(&config.files.processed_file);
    info!("Already processed: {} wallets", store.count());

    let tasks = load_wallet_tasks(&config.files.wallet_file, &store, &mut rand::thread_rng())?;

    let balances = ChainBalanceClient::new(&config.rpc);
    let exchange = MexcClient::new(&config.exchange);
    let notifier = TelegramNotifier::new(&config.telegram);
    let waiter = ConfirmationWaiter::new(&config.confirmation);
    let strategy = RandomStrategy::new(StdRng::from_entropy());

    let mut orchestrator = WithdrawalOrchestrator::new(
        &balances,
        &exchange,
        &notifier,
        &store,
        waiter,
        strategy,
        config.withdrawal.clone(),
    );

    let scheduler = RunScheduler::new(config.schedule.clone());
    scheduler.listen_for_shutdown();
    scheduler.run(&tasks, &mut orchestrator).await?;

    info!("Total processed: {}", store.count());
    Ok(())
}
