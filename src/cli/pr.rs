//! Pull request command handlers

use std::io::IsTerminal;

use reqwest::{Method, Url};

use crate::api::models::{Page, PullRequest};
use crate::api::Client;
use crate::cli::commands::{PrCommand, PrStateFilter};
use crate::cli::format_relative_time;
use crate::core::config::AuthConfig;
use crate::core::resolver::resolve_base_repo;
use crate::error::{BbError, Result};

pub async fn handle_pr_command(command: PrCommand, verbose: bool) -> Result<()> {
    match command {
        PrCommand::List { state, limit, repo } => list(state, limit, repo.as_deref(), verbose).await,
    }
}

async fn list(
    state: PrStateFilter,
    limit: usize,
    repo_spec: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let auth = AuthConfig::global()?.clone();
    let interactive = std::io::stdin().is_terminal();
    let target = resolve_base_repo(repo_spec, &auth, interactive)?;
    let client = Client::new(auth, verbose)?;

    let path = format!(
        "repositories/{}/pullrequests?state={}",
        target.full_name(),
        state.query()
    );

    let mut prs: Vec<PullRequest> = Vec::new();
    let (page, mut next) = client
        .rest_with_next::<Page<PullRequest>>(target.host(), Method::GET, &path, None)
        .await?;
    if let Some(page) = page {
        prs.extend(page.values);
    }

    // Follow the pagination cursor until the limit is reached.
    while prs.len() < limit {
        let Some(cursor) = next.take() else { break };
        let url = Url::parse(&cursor)
            .map_err(|_| BbError::InvalidInput(format!("invalid pagination URL: {cursor}")))?;
        let (page, further) = client
            .rest_url_with_next::<Page<PullRequest>>(url, Method::GET, None)
            .await?;
        if let Some(page) = page {
            prs.extend(page.values);
        }
        next = further;
    }
    prs.truncate(limit);

    if prs.is_empty() {
        println!(
            "No {} pull requests found in {}.",
            state.query().to_lowercase(),
            target.full_name()
        );
        return Ok(());
    }

    println!(
        "Showing {} pull request(s) in {}",
        prs.len(),
        target.full_name()
    );
    println!();
    for pr in &prs {
        let author = pr
            .author
            .as_ref()
            .map(|a| {
                if a.nickname.is_empty() {
                    a.display_name.clone()
                } else {
                    a.nickname.clone()
                }
            })
            .unwrap_or_else(|| "unknown".to_string());
        let branches = match (&pr.source, &pr.destination) {
            (Some(src), Some(dst)) => format!("{} → {}", src.branch_name(), dst.branch_name()),
            (Some(src), None) => src.branch_name().to_string(),
            _ => String::new(),
        };
        let age = pr
            .updated_on
            .map(format_relative_time)
            .unwrap_or_default();
        println!("#{:<5} {} [{}]", pr.id, pr.title, pr.state);
        println!("       @{author}  {branches}  {age}");
    }
    Ok(())
}
