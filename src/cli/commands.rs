//! CLI command implementations

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ApiClient, AuthorizedClient};
use crate::auth::{inspect_token, FileStore, LoginRequest, Role, SessionManager, User};
use crate::cli::{error, info, print_navigation_table, print_session, success, warn, OutputFormat};
use crate::config::{self, Config};
use crate::navigation::{profile_for, RoleNavigationProfile};

/// Everything a command needs to talk to the backend
struct Context {
    sessions: SessionManager,
    api: ApiClient,
}

/// Build the session stack and restore any cached session
async fn connect(config: &Config) -> Result<Context> {
    let store = FileStore::new(config.storage.session_path());
    let api = ApiClient::new(&config.api)?;
    let sessions = SessionManager::new(Arc::new(store), Arc::new(api.clone()));
    sessions.restore().await;
    Ok(Context { sessions, api })
}

/// Load config and apply command-line overrides
pub fn resolve_config(api_url: Option<String>, store: Option<PathBuf>) -> Result<Config> {
    let mut config = config::load_config_or_default()?;
    if let Some(url) = api_url {
        config.api.base_url = url;
    }
    if let Some(path) = store {
        config.storage.path = Some(path);
    }
    Ok(config)
}

/// Initialize a new farmtwin.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn("farmtwin.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created farmtwin.toml");
    info("Set the backend URL, then run 'farmtwin login --email <email>'");

    Ok(())
}

/// Log in and persist the session
pub async fn login(config: &Config, email: &str, password: &str) -> Result<()> {
    if let Err(e) = LoginRequest::new(email, password).validate() {
        error(&e.to_string());
        return Err(e.into());
    }

    let ctx = connect(config).await?;
    if let Some(user) = ctx.sessions.current().user() {
        info(&format!("Replacing cached session for {}", user.email));
        ctx.sessions.logout().await;
    }

    match ctx.sessions.login(email, password).await {
        Ok(session) => {
            if let Some(user) = session.user() {
                success(&format!("Logged in as {} ({})", user.name, user.role));
            }
            Ok(())
        }
        Err(e) => {
            error(&format!("Login failed: {}", e));
            Err(e.into())
        }
    }
}

/// Clear the cached session
pub async fn logout(config: &Config) -> Result<()> {
    let ctx = connect(config).await?;
    let was_logged_in = ctx.sessions.current().is_logged_in();
    ctx.sessions.logout().await;

    if was_logged_in {
        success("Logged out");
    } else {
        info("Not logged in");
    }
    Ok(())
}

#[derive(Serialize)]
struct SessionView {
    logged_in: bool,
    user: Option<User>,
    token_expires_at: Option<DateTime<Utc>>,
}

/// Show the current session
pub async fn status(config: &Config, format: OutputFormat) -> Result<()> {
    let ctx = connect(config).await?;
    let session = ctx.sessions.current();

    match format {
        OutputFormat::Table => {
            print_session(&session);
            if let Some(expires) = session
                .token()
                .and_then(inspect_token)
                .and_then(|claims| claims.expires_at())
            {
                println!("  Token expires: {}", expires.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let view = SessionView {
                logged_in: session.is_logged_in(),
                user: session.user().cloned(),
                token_expires_at: session
                    .token()
                    .and_then(inspect_token)
                    .and_then(|claims| claims.expires_at()),
            };
            print_structured(&view, format)?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct NavigationView<'a> {
    role: Role,
    #[serde(flatten)]
    profile: &'a RoleNavigationProfile,
}

/// Show reachable tabs and screens for a role
pub async fn nav(config: &Config, role: Option<String>, format: OutputFormat) -> Result<()> {
    let role = match role {
        Some(raw) => Role::parse(&raw),
        None => {
            let ctx = connect(config).await?;
            match ctx.sessions.current().role() {
                Some(role) => role,
                None => {
                    warn("Not logged in; pass --role to inspect a role");
                    return Ok(());
                }
            }
        }
    };

    let profile = profile_for(role);
    match format {
        OutputFormat::Table => print_navigation_table(role, &profile),
        OutputFormat::Json | OutputFormat::Yaml => {
            print_structured(&NavigationView { role, profile: &profile }, format)?
        }
    }
    Ok(())
}

/// Fetch the user's profile from the backend
pub async fn profile(config: &Config) -> Result<()> {
    let ctx = connect(config).await?;
    if !ctx.sessions.current().is_logged_in() {
        warn("Not logged in");
        return Ok(());
    }

    let client = AuthorizedClient::new(ctx.api, ctx.sessions.clone());
    match client.profile().await {
        Ok(user) => {
            print_structured(&user, OutputFormat::Yaml)?;
            Ok(())
        }
        Err(e) => report_request_error(&ctx.sessions, e),
    }
}

/// Authenticated GET of an arbitrary API path
pub async fn get(config: &Config, path: &str) -> Result<()> {
    let ctx = connect(config).await?;
    let client = AuthorizedClient::new(ctx.api, ctx.sessions.clone());

    match client.get_json::<serde_json::Value>(path).await {
        Ok(value) => {
            print_structured(&value, OutputFormat::Json)?;
            Ok(())
        }
        Err(e) => report_request_error(&ctx.sessions, e),
    }
}

fn report_request_error(sessions: &SessionManager, e: crate::Error) -> Result<()> {
    error(&e.to_string());
    if !sessions.current().is_logged_in() {
        info("Session ended. Run 'farmtwin login' to sign in again");
    }
    Err(e.into())
}

fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
