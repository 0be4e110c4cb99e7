use std::process::ExitCode;

use clap::Parser as _;
use ingest::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) => {
            log::error!("{}", why);
            ExitCode::FAILURE
        }
    }
}
