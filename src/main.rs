use brutos::cli::{run_cli, Cli};
use brutos::logging::{init_logging, LogConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = LogConfig::from_env();
    if cli.verbose {
        config = config.with_level("debug");
    }
    init_logging(&config)?;
    run_cli(cli)
}
