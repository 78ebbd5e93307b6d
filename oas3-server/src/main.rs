use std::path::PathBuf;

use clap::Parser;
use oas3_core::Config;

mod logging;

#[derive(Parser, Debug)]
#[command(name = "oas3-server", about = "Spec-driven HTTP server kernel for OpenAPI 3 documents")]
struct Cli {
    /// Path to a YAML (or JSON) config file.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Overrides `address` from the config file.
    #[arg(long)]
    address: Option<String>,

    /// Print the effective, normalized config as YAML and exit.
    #[arg(long)]
    print_config: bool,

    /// Increase log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref());
    if let Some(address) = cli.address {
        config.address = Some(address);
    }

    logging::init(cli.verbose);

    if cli.print_config {
        println!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let server = oas3_core::Server::new(config)?;
    server.bind_builtins();
    server.run().await?;
    Ok(())
}
