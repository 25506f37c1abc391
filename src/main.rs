mod cmd;
mod core;
mod inventory;
mod ledger;
mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "acctc",
    version,
    about = "Inventory costing, trial balances and account ledgers from journal exports"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Value stock issues with a costing method
    Cost(cmd::cost::CostCommand),
    /// Trial balance with parent accounts rolled up
    TrialBalance(cmd::trial_balance::TrialBalanceCommand),
    /// Account books with running balances
    Ledger(cmd::ledger::LedgerCommand),
    /// Stock movement summary per item
    Stock(cmd::stock::StockCommand),
    /// Check input data for problems
    Validate(cmd::validate::ValidateCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Cost(cmd) => cmd.exec(),
        Command::TrialBalance(cmd) => cmd.exec(),
        Command::Ledger(cmd) => cmd.exec(),
        Command::Stock(cmd) => cmd.exec(),
        Command::Validate(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
