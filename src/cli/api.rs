//! Raw API passthrough handler
//!
//! `bb api <path>` sends an arbitrary request through the same transport
//! chain the other commands use and pretty-prints the JSON response.

use std::fs;
use std::io::Read;

use reqwest::Method;
use serde_json::Value;

use crate::api::Client;
use crate::cli::commands::ApiArgs;
use crate::core::config::AuthConfig;
use crate::error::{BbError, Result};

pub async fn handle_api_command(args: ApiArgs, verbose: bool) -> Result<()> {
    let auth = AuthConfig::global()?.clone();
    let host = args
        .hostname
        .clone()
        .unwrap_or_else(|| auth.default_host().0.to_string());

    let method: Method = args
        .method
        .to_uppercase()
        .parse()
        .map_err(|_| BbError::InvalidInput(format!("invalid HTTP method: {}", args.method)))?;

    let body = match &args.input {
        Some(path) if path.as_os_str() == "-" => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            Some(parse_body(&raw)?)
        }
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            Some(parse_body(&raw)?)
        }
        None => None,
    };

    let client = Client::new(auth, verbose)?;
    let response: Option<Value> = client.rest(&host, method, &args.path, body).await?;

    match response {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("(no content)"),
    }
    Ok(())
}

fn parse_body(raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| BbError::InvalidInput(format!("request body is not valid JSON: {e}")))
}
