use std::env;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bb_cli::cli::{api, auth, pr, repo, Cli, Commands};
use bb_cli::core::config::DEBUG_ENV;
use bb_cli::error::BbError;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        handle_error(e);
    }
}

async fn run(cli: Cli) -> bb_cli::Result<()> {
    let verbose = cli.verbose;
    match cli.command {
        Commands::Auth(args) => auth::handle_auth_command(args.command, verbose).await,
        Commands::Repo(args) => repo::handle_repo_command(args.command, verbose).await,
        Commands::Pr(args) => pr::handle_pr_command(args.command, verbose).await,
        Commands::Api(args) => api::handle_api_command(args, verbose).await,
    }
}

fn init_tracing() {
    let default = if env::var(DEBUG_ENV).is_ok_and(|v| !v.is_empty()) {
        "bb_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_error(e: BbError) -> ! {
    eprintln!("Error: {e}");
    if e.is_unauthorized() {
        eprintln!("\n  → Run 'bb auth login' to refresh your credentials.");
    }
    process::exit(1);
}
