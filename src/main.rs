//! pagedash CLI binary entry point.

use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use pagedash::cli::{auth, Cli, Commands};
use pagedash::config::ClientConfig;
use pagedash::error::PagedashError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli).await;

    if let Err(e) = result {
        match e.downcast_ref::<PagedashError>() {
            Some(api_err) => eprintln!("Error: {}", api_err.user_message()),
            None => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let client = auth::build_client(config)?;
    match cli.command {
        Commands::Auth(args) => auth::handle_auth(client, args.command).await,
        Commands::Request(args) => auth::handle_request(client, args).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pagedash=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
