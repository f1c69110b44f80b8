mod actions;
mod options;

use crate::actions::batch_allowance::batch_allowance;
use crate::actions::check_allowance::check_allowance;
use crate::actions::check_rpc::check_rpc;
use crate::options::{AllowanceCommands, AllowanceOptions};
use allowance_lib::config::Config;
use allowance_lib::error::ResolverError;
use std::env;
use structopt::StructOpt;

const DEFAULT_CONFIG_PATH: &str = "config-allowance.toml";

async fn main_internal() -> Result<(), ResolverError> {
    dotenv::dotenv().ok();
    env::set_var(
        "RUST_LOG",
        env::var("RUST_LOG").unwrap_or("info,web3=warn".to_string()),
    );

    env_logger::init();
    let cli: AllowanceOptions = AllowanceOptions::from_args();

    let config_path = cli
        .config
        .or_else(|| env::var("ALLOWANCE_CONFIG").ok())
        .unwrap_or(DEFAULT_CONFIG_PATH.to_string());
    log::debug!("Loading config from {}", config_path);
    let config = Config::load(&config_path).await?;

    match cli.commands {
        AllowanceCommands::CheckAllowance {
            check_allowance_options,
        } => {
            check_allowance(check_allowance_options, &config).await?;
        }
        AllowanceCommands::BatchAllowance {
            batch_allowance_options,
        } => {
            batch_allowance(batch_allowance_options, &config).await?;
        }
        AllowanceCommands::CheckRpc { check_rpc_options } => {
            check_rpc(check_rpc_options, &config).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ResolverError> {
    match main_internal().await {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e}");
            Err(e)
        }
    }
}
