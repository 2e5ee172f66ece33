//! REST API integration
//!
//! - Transport interceptor chain (headers, logging, credential injection)
//! - Generic REST execution with pagination-cursor support
//! - Wire types for the handful of resources the commands render

pub mod client;
pub mod models;
pub mod transport;

pub use client::Client;
