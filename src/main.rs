use aurora_player::cli::Cli;
use aurora_player::cli_handlers::{self, Environment};
use aurora_player::config::{self, AppConfig};
use aurora_player::logging;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = config::config_dir()?;
    let config = AppConfig::load(&config_dir)?;
    let paths = config.paths(&config_dir);
    logging::init(&paths.log_file, config.log_filter.as_deref())?;

    let env = Environment::new(config, paths);
    cli_handlers::from_cli(cli.command).execute(&env)
}
