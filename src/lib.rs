//! pagedash: client SDK for the page dashboard API.
//!
//! The core is an authenticated request pipeline: every call to the API gets
//! the current bearer token, and when tokens expire the pipeline refreshes
//! them once for all concurrent callers before replaying their requests.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pagedash::prelude::*;
//!
//! # async fn example() -> pagedash::error::Result<()> {
//! let client = Arc::new(ApiClient::from_config(ClientConfig::from_env()?)?);
//! let auth = AuthService::new(client.clone());
//! auth.login(&LoginRequest::new("ana@example.com", "s3cret!")).await?;
//! let pages: serde_json::Value = client.get_json("/api/Facebook/pages").await?;
//! println!("{pages}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod http;
pub mod models;
pub mod navigation;
pub mod pipeline;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
