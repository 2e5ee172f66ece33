//! Repository command handlers

use std::io::IsTerminal;

use reqwest::Method;

use crate::api::models::{Page, PullRequest, Repository};
use crate::api::Client;
use crate::cli::commands::RepoCommand;
use crate::cli::format_relative_time;
use crate::core::config::AuthConfig;
use crate::core::resolver::resolve_base_repo;
use crate::error::Result;

pub async fn handle_repo_command(command: RepoCommand, verbose: bool) -> Result<()> {
    match command {
        RepoCommand::View { repo } => view(repo.as_deref(), verbose).await,
    }
}

async fn view(repo_spec: Option<&str>, verbose: bool) -> Result<()> {
    let auth = AuthConfig::global()?.clone();
    let interactive = std::io::stdin().is_terminal();
    let target = resolve_base_repo(repo_spec, &auth, interactive)?;
    let client = Client::new(auth, verbose)?;

    let repo_path = format!("repositories/{}", target.full_name());
    let pr_path = format!(
        "repositories/{}/pullrequests?state=OPEN&pagelen=1",
        target.full_name()
    );

    let (repo, open_prs) = tokio::try_join!(
        client.get::<Repository>(target.host(), &repo_path),
        client.rest::<Page<PullRequest>>(target.host(), Method::GET, &pr_path, None),
    )?;

    let visibility = if repo.is_private { "private" } else { "public" };
    println!("{} ({visibility})", repo.full_name);
    if !repo.description.is_empty() {
        println!("{}", repo.description);
    }
    println!();
    if let Some(branch) = &repo.mainbranch {
        println!("Main branch:  {}", branch.name);
    }
    if !repo.language.is_empty() {
        println!("Language:     {}", repo.language);
    }
    if let Some(count) = open_prs.and_then(|page| page.size) {
        println!("Open PRs:     {count}");
    }
    if let Some(updated) = repo.updated_on {
        println!("Last updated: {}", format_relative_time(updated));
    }
    println!();
    println!("View on the web: {}", target.url());
    Ok(())
}
