//! CLI command definitions using clap
//!
//! Defines the command structure for the `bb` CLI tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// bb - Bitbucket Cloud from the command line
///
/// Works against bitbucket.org by default; self-hosted deployments are
/// selected with --hostname or the BB_HOST environment variable.
#[derive(Parser, Debug)]
#[command(name = "bb", version, about, long_about = None)]
pub struct Cli {
    /// Log HTTP requests and responses, including headers (credentials
    /// are redacted)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with a host
    Auth(AuthArgs),

    /// Work with repositories
    Repo(RepoArgs),

    /// Work with pull requests
    Pr(PrArgs),

    /// Make a raw API request
    Api(ApiArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication commands
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Login with a username and app password
    Login {
        /// Host to authenticate with (defaults to bitbucket.org)
        #[arg(long)]
        host: Option<String>,
    },
    /// Remove the stored credential for a host
    Logout {
        /// Host to log out from (defaults to bitbucket.org)
        #[arg(long)]
        host: Option<String>,
    },
    /// Show authentication status for all known hosts
    Status,
}

// ─────────────────────────────────────────────────────────────────────────────
// Repo Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Repository commands
#[derive(Parser, Debug)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoCommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// View a repository
    View {
        /// Repository to target instead of resolving git remotes
        /// (workspace/slug, host/workspace/slug, or a URL)
        #[arg(long, env = "BB_REPO")]
        repo: Option<String>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// PR Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Pull request commands
#[derive(Parser, Debug)]
pub struct PrArgs {
    #[command(subcommand)]
    pub command: PrCommand,
}

#[derive(Subcommand, Debug)]
pub enum PrCommand {
    /// List pull requests
    List {
        /// Filter by state
        #[arg(long, default_value = "open")]
        state: PrStateFilter,

        /// Maximum number of PRs to show
        #[arg(short = 'n', long, default_value = "30")]
        limit: usize,

        /// Repository to target instead of resolving git remotes
        #[arg(long, env = "BB_REPO")]
        repo: Option<String>,
    },
}

/// Pull request state filter
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum PrStateFilter {
    #[default]
    Open,
    Merged,
    Declined,
    Superseded,
}

impl PrStateFilter {
    pub fn query(&self) -> &'static str {
        match self {
            PrStateFilter::Open => "OPEN",
            PrStateFilter::Merged => "MERGED",
            PrStateFilter::Declined => "DECLINED",
            PrStateFilter::Superseded => "SUPERSEDED",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Api Command
// ─────────────────────────────────────────────────────────────────────────────

/// Raw API request
#[derive(Parser, Debug)]
pub struct ApiArgs {
    /// Path relative to the API root, e.g. "user" or
    /// "repositories/ws/slug"
    pub path: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// JSON request body read from a file, or from stdin with "-"
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Host to send the request to (defaults to the default host)
    #[arg(long, env = "BB_HOST")]
    pub hostname: Option<String>,
}
