use clap::Parser;

use mexc_eth_withdrawer::cli::{Cli, CliHandler};
use mexc_eth_withdrawer::config::AppConfig;
use mexc_eth_withdrawer::progress::ProgressStore;

fn main() {
    // Less verbose than the main withdrawer binary
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = AppConfig::load().unwrap_or_default();
    let processed_file = cli
        .processed_file
        .clone()
        .unwrap_or(config.files.processed_file);
    let wallet_file = cli.wallet_file.clone().unwrap_or(config.files.wallet_file);

    let handler = CliHandler::new(ProgressStore::new(&processed_file), wallet_file);

    if let Err(e) = handler.execute_command(&cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
