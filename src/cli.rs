use clap::{Parser, Subcommand};
use std::fs;

use crate::error::WithdrawerError;
use crate::models::normalize_address;
use crate::progress::ProgressStore;

#[derive(Parser)]
#[command(
    name = "withdrawer-cli",
    about = "Inspect and manage withdrawal run progress"
)]
pub struct Cli {
    /// Progress file path (overrides configuration)
    #[arg(long)]
    pub processed_file: Option<String>,

    /// Wallet list path (overrides configuration)
    #[arg(long)]
    pub wallet_file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show run progress against the wallet list
    Status,
    /// Print the number of processed addresses
    Count,
    /// List processed addresses
    List,
    /// Clear all progress records
    Reset {
        /// Confirm the reset; without this flag nothing is deleted
        #[arg(long)]
        yes: bool,
    },
}

pub struct CliHandler {
    store: ProgressStore,
    wallet_file: String,
}

impl CliHandler {
    pub fn new(store: ProgressStore, wallet_file: String) -> Self {
        Self { store, wallet_file }
    }

    pub fn execute_command(&self, command: &Command) -> Result<(), WithdrawerError> {
        match command {
            Command::Status => self.show_status(),
            Command::Count => {
                println!("{}", self.store.count());
                Ok(())
            }
            Command::List => {
                let mut addresses: Vec<String> =
                    self.store.processed_addresses().into_iter().collect();
                addresses.sort();
                for address in addresses {
                    println!("{}", address);
                }
                Ok(())
            }
            Command::Reset { yes } => {
                if !*yes {
                    println!("Refusing to reset without --yes");
                    return Ok(());
                }
                self.store.reset()?;
                println!("Progress cleared");
                Ok(())
            }
        }
    }

    fn show_status(&self) -> Result<(), WithdrawerError> {
        let processed = self.store.processed_addresses();

        let candidates: Vec<String> = match fs::read_to_string(&self.wallet_file) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && line.starts_with("0x"))
                .map(str::to_string)
                .collect(),
            Err(_) => {
                println!("Wallet file not readable: {}", self.wallet_file);
                println!("Processed: {}", processed.len());
                return Ok(());
            }
        };

        let pending = candidates
            .iter()
            .filter(|addr| !processed.contains(&normalize_address(addr)))
            .count();

        println!("Wallet file:  {}", self.wallet_file);
        println!("Progress:     {}", self.store.path().display());
        println!("Total:        {}", candidates.len());
        println!("Processed:    {}", processed.len());
        println!("Pending:      {}", pending);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const ADDR_1: &str = "0x1111111111111111111111111111111111111111";
    const ADDR_2: &str = "0x2222222222222222222222222222222222222222";

    fn handler_with(processed: &[&str]) -> (TempDir, NamedTempFile, CliHandler) {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path().join("processed.txt"));
        for addr in processed {
            store.mark_processed(addr).unwrap();
        }

        let mut wallet_file = NamedTempFile::new().unwrap();
        writeln!(wallet_file, "{}", ADDR_1).unwrap();
        writeln!(wallet_file, "{}", ADDR_2).unwrap();

        let path = wallet_file.path().to_str().unwrap().to_string();
        (dir, wallet_file, CliHandler::new(store, path))
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let (_dir, _wallet, handler) = handler_with(&[ADDR_1]);

        handler
            .execute_command(&Command::Reset { yes: false })
            .unwrap();
        assert_eq!(handler.store.count(), 1);

        handler
            .execute_command(&Command::Reset { yes: true })
            .unwrap();
        assert_eq!(handler.store.count(), 0);
    }

    #[test]
    fn test_status_and_count_commands_run() {
        let (_dir, _wallet, handler) = handler_with(&[ADDR_1]);

        handler.execute_command(&Command::Status).unwrap();
        handler.execute_command(&Command::Count).unwrap();
        handler.execute_command(&Command::List).unwrap();
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["withdrawer-cli", "count"]);
        assert!(matches!(cli.command, Command::Count));

        let cli = Cli::parse_from([
            "withdrawer-cli",
            "--processed-file",
            "/tmp/p.txt",
            "reset",
            "--yes",
        ]);
        assert_eq!(cli.processed_file.as_deref(), Some("/tmp/p.txt"));
        assert!(matches!(cli.command, Command::Reset { yes: true }));
    }
}
