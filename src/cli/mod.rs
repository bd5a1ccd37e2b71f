//! CLI entry point for pagedash.

pub mod auth;

use clap::{Parser, Subcommand};

/// pagedash CLI
#[derive(Parser, Debug)]
#[command(name = "pagedash", version, about = "Page dashboard API client")]
pub struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management
    Auth(AuthArgs),
    /// Send an authenticated request to the API
    Request(RequestArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in with email and password
    Login(LoginArgs),
    /// Create an account
    Register(RegisterArgs),
    /// Show the stored session
    Status,
    /// Renew the access token
    Refresh,
    /// Forget the stored session
    Logout,
}

/// Arguments for `pagedash auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,
    /// Read from PAGEDASH_PASSWORD when omitted
    #[arg(short, long, env = "PAGEDASH_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for `pagedash auth register`.
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "PAGEDASH_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub telephone: String,
    #[arg(long, default_value = "User")]
    pub role: String,
}

/// Arguments for `pagedash request`.
#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, DELETE, ...)
    pub method: String,
    /// API path, e.g. /api/Facebook/pages
    pub path: String,
    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,
}
