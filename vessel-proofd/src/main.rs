use clap::{Parser, Subcommand};
use rst_common::with_logging::log::info;
use rst_common::with_tokio::tokio;

use prople_vessel_proofd::errors::ProofdError;
use prople_vessel_proofd::svc::exchange::Exchange;

#[derive(Parser)]
#[command(name = "prople-vessel-proofd")]
#[command(version = "0.1.0")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "exchange")]
    #[command(about = "Running a full proof exchange against the in-memory engine")]
    Exchange {
        #[arg(short, long, value_name = "FILE")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), ProofdError> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Exchange { config } => {
            let exchange = Exchange::new(config.to_owned());
            let runner = exchange.svc()?;
            let report = runner.run().await?;

            info!(
                "[exchange] finished: proof: {} | verification: {:?} | state: {:?}",
                report.proof_handle, report.verification, report.final_state
            );
        }
    }

    Ok(())
}
