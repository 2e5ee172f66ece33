//! Wire types for the REST API
//!
//! Only the fields the commands render are modeled; everything else in
//! the response is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The authenticated user (`GET /user`).
#[derive(Debug, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

/// A repository resource.
#[derive(Debug, Deserialize)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub mainbranch: Option<Branch>,
    #[serde(default)]
    pub updated_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct Branch {
    pub name: String,
}

/// A pull request in a list response.
#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub source: Option<PrEndpoint>,
    #[serde(default)]
    pub destination: Option<PrEndpoint>,
    #[serde(default)]
    pub updated_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
pub struct PrEndpoint {
    #[serde(default)]
    pub branch: Option<Branch>,
}

impl PrEndpoint {
    pub fn branch_name(&self) -> &str {
        self.branch.as_ref().map(|b| b.name.as_str()).unwrap_or("?")
    }
}

/// Paginated list envelope; `next` is consumed separately by the
/// cursor-following helper.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default)]
    pub size: Option<u64>,
}
