//! CLI command handlers.

use std::sync::Arc;

use reqwest::Method;

use super::{AuthCommands, LoginArgs, RegisterArgs, RequestArgs};
use crate::auth::{AuthService, CredentialStore, FileStorage};
use crate::config::ClientConfig;
use crate::http::{ApiRequest, ReqwestTransport};
use crate::models::{LoginRequest, RegisterRequest};
use crate::navigation::{LoginRedirect, Navigator};
use crate::pipeline::ApiClient;

/// A terminal has no login view; tell the user how to sign in instead.
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn current_url(&self) -> String {
        "/".to_string()
    }

    fn redirect_to_login(&self, _redirect: LoginRedirect) {
        eprintln!("Session expired or missing. Run `pagedash auth login --email <EMAIL>`.");
    }
}

/// Client wired for CLI use: file-backed session, terminal navigator.
pub fn build_client(config: ClientConfig) -> Result<Arc<ApiClient>, Box<dyn std::error::Error>> {
    let transport = Arc::new(ReqwestTransport::new(config.clone())?);
    let store = Arc::new(CredentialStore::new(Arc::new(FileStorage::new(
        config.storage_dir.clone(),
    ))));
    Ok(Arc::new(ApiClient::new(
        config,
        transport,
        store,
        Arc::new(TerminalNavigator),
    )))
}

/// Handle `pagedash auth <command>`.
pub async fn handle_auth(
    client: Arc<ApiClient>,
    command: AuthCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let auth = AuthService::new(client);
    match command {
        AuthCommands::Login(args) => handle_login(&auth, args).await,
        AuthCommands::Register(args) => handle_register(&auth, args).await,
        AuthCommands::Status => {
            handle_status(&auth);
            Ok(())
        }
        AuthCommands::Refresh => {
            let identity = auth.refresh().await?;
            println!("Token refreshed for {}", identity.email);
            Ok(())
        }
        AuthCommands::Logout => {
            auth.logout();
            println!("Signed out");
            Ok(())
        }
    }
}

async fn handle_login(auth: &AuthService, args: LoginArgs) -> Result<(), Box<dyn std::error::Error>> {
    let identity = auth
        .login(&LoginRequest::new(args.email, args.password))
        .await?;
    println!("Signed in as {} <{}> ({})", identity.full_name, identity.email, identity.role);
    Ok(())
}

async fn handle_register(auth: &AuthService, args: RegisterArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = RegisterRequest::builder()
        .first_name(args.first_name)
        .last_name(args.last_name)
        .email(args.email)
        .password(args.password)
        .telephone(args.telephone)
        .role(args.role)
        .build();
    let user = auth.register(&request).await?;
    println!("Registered {} <{}> (id {})", user.full_name, user.email, user.user_id);
    Ok(())
}

fn handle_status(auth: &AuthService) {
    match auth.client().store().credential() {
        Some(credential) => {
            let identity = &credential.identity;
            println!("Signed in as {} <{}>", identity.full_name, identity.email);
            println!("  role: {}", identity.role);
            match credential.expires_at() {
                Some(exp) => println!("  token expires: {}", exp.to_rfc3339()),
                None => println!("  token expires: unknown"),
            }
        }
        None => println!("Not signed in"),
    }
}

/// Handle `pagedash request <METHOD> <PATH>`.
pub async fn handle_request(
    client: Arc<ApiClient>,
    args: RequestArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())?;
    let mut request = ApiRequest::new(method, args.path);
    if let Some(data) = args.data {
        let body: serde_json::Value = serde_json::from_str(&data)?;
        request = request.with_body(body);
    }
    let response = client.execute(request).await?;
    match response.json::<serde_json::Value>() {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", response.text()),
    }
    Ok(())
}
