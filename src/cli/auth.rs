//! Authentication command handlers

use std::io::{self, BufRead, Write};

use crate::api::models::User;
use crate::api::Client;
use crate::cli::commands::AuthCommand;
use crate::core::config::{AuthConfig, Credential, CredentialSource, HostEntry};
use crate::core::hosts::normalize_hostname;
use crate::error::{BbError, Result};

pub async fn handle_auth_command(command: AuthCommand, verbose: bool) -> Result<()> {
    match command {
        AuthCommand::Login { host } => login(host.as_deref(), verbose).await,
        AuthCommand::Logout { host } => logout(host.as_deref()),
        AuthCommand::Status => status(verbose).await,
    }
}

async fn login(host: Option<&str>, verbose: bool) -> Result<()> {
    let auth = AuthConfig::global()?;
    let host = host
        .map(normalize_hostname)
        .unwrap_or_else(|| auth.default_host().0.to_string());

    println!("Logging in to {host}");
    println!("Tip: create an app password under Personal settings → App passwords.");
    println!();

    let username = prompt("Username: ")?;
    if username.is_empty() {
        return Err(BbError::InvalidInput("username cannot be empty".into()));
    }
    let app_password = prompt("App password: ")?;
    if app_password.is_empty() {
        return Err(BbError::InvalidInput("app password cannot be empty".into()));
    }

    // Verify against /user before persisting anything.
    let candidate = AuthConfig::from_parts(
        auth.instance().clone(),
        vec![(
            host.clone(),
            HostEntry {
                username: username.clone(),
                users: vec![username.clone()],
                credential: Some((
                    Credential::new(&username, &app_password),
                    CredentialSource::ConfigFile,
                )),
            },
        )],
        None,
        false,
    );
    let client = Client::new(candidate, verbose)?;
    let user: User = match client.get(&host, "user").await {
        Ok(user) => user,
        Err(e) if e.is_unauthorized() => {
            return Err(BbError::AuthenticationFailed(format!(
                "{host} rejected the app password"
            )))
        }
        Err(e) => return Err(e),
    };

    AuthConfig::store_credential(&host, &user.username, &app_password)?;
    println!("✓ Logged in as @{}", user.username);
    Ok(())
}

fn logout(host: Option<&str>) -> Result<()> {
    let auth = AuthConfig::global()?;
    let host = host
        .map(normalize_hostname)
        .unwrap_or_else(|| auth.default_host().0.to_string());

    if auth.active_credential(&host).is_none() {
        return Err(BbError::NotLoggedIn(host));
    }
    AuthConfig::delete_credential(&host)?;
    println!("✓ Logged out of {host}");
    Ok(())
}

async fn status(verbose: bool) -> Result<()> {
    let auth = AuthConfig::global()?.clone();
    let hosts = auth.hosts();
    if hosts.is_empty() {
        println!("Not logged in to any host. Run 'bb auth login' to authenticate.");
        return Ok(());
    }

    let client = Client::new(auth.clone(), verbose)?;
    for host in hosts {
        println!("{host}");
        let Some((credential, source)) = auth.active_credential(&host) else {
            continue;
        };

        match client.get::<User>(&host, "user").await {
            Ok(user) => {
                println!("  ✓ Logged in as @{} ({})", user.username, source);
            }
            Err(e) if e.is_unauthorized() => {
                println!("  ✗ Credential for @{} rejected ({})", credential.username, source);
                println!("    → Run 'bb auth login --host {host}' to refresh it.");
            }
            Err(e) => {
                println!("  ? Could not verify @{}: {e}", credential.username);
            }
        }
        println!("  App password: {}", credential.masked());

        let users = auth.users_for_host(&host);
        if users.len() > 1 {
            println!("  Known accounts: {}", users.join(", "));
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
