//! Command-line interface

pub mod api;
pub mod auth;
pub mod commands;
pub mod pr;
pub mod repo;

use chrono::{DateTime, Utc};

pub use commands::{Cli, Commands};

/// Human-readable relative timestamp ("3 days ago").
pub fn format_relative_time(time: DateTime<Utc>) -> String {
    let delta = Utc::now().signed_duration_since(time);
    if delta.num_seconds() < 60 {
        "just now".to_string()
    } else if delta.num_minutes() < 60 {
        format!("{} minute(s) ago", delta.num_minutes())
    } else if delta.num_hours() < 24 {
        format!("{} hour(s) ago", delta.num_hours())
    } else if delta.num_days() < 30 {
        format!("{} day(s) ago", delta.num_days())
    } else if delta.num_days() < 365 {
        format!("{} month(s) ago", delta.num_days() / 30)
    } else {
        format!("{} year(s) ago", delta.num_days() / 365)
    }
}
