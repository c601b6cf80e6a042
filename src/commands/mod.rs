//! Command handlers for the CLI
//!
//! Each handler takes a built [`SessionController`] and prints a short
//! human-readable result. [`dispatch`] builds the controller from the loaded
//! configuration and routes a parsed [`Commands`] value to its handler.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::cli::Commands;
use crate::config::SessionConfig;
use crate::error::{Result, SessionwardError};
use crate::session::SessionController;

/// Builds a controller for `config` and runs `command` against it.
pub async fn dispatch(config: SessionConfig, command: Commands) -> Result<()> {
    let session = SessionController::builder(config).build().await?;

    match command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password().await?,
            };
            login(&session, &username, &password).await
        }
        Commands::Logout => logout(&session).await,
        Commands::Status => status(&session),
        Commands::Whoami => whoami(&session).await,
        Commands::Refresh => refresh(&session).await,
    }
}

/// Logs in with `username` and `password`.
///
/// # Errors
///
/// Fails when the server rejects the credentials or is unreachable, or when
/// the response carries no token at the configured path.
pub async fn login(session: &Arc<SessionController>, username: &str, password: &str) -> Result<()> {
    tracing::info!("Logging in as {}", username);
    session
        .login(&json!({"username": username, "password": password}))
        .await?;

    if !session.is_authenticated() {
        return Err(SessionwardError::NotAuthenticated.into());
    }
    println!("Logged in as {}", username);
    Ok(())
}

/// Drops the stored session.
pub async fn logout(session: &Arc<SessionController>) -> Result<()> {
    session.logout().await;
    println!("Logged out");
    Ok(())
}

/// Prints the current session status.
pub fn status(session: &Arc<SessionController>) -> Result<()> {
    println!("{}", session.status());
    if session.tokens().refresh_token().is_some() {
        println!("refresh token: present");
    }
    Ok(())
}

/// Prints the profile of the logged-in user as JSON.
///
/// # Errors
///
/// Returns [`SessionwardError::NotAuthenticated`] when no session is active
/// or the profile cannot be fetched.
pub async fn whoami(session: &Arc<SessionController>) -> Result<()> {
    let profile = session
        .user()
        .await
        .ok_or(SessionwardError::NotAuthenticated)?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

/// Refreshes the access token.
///
/// # Errors
///
/// Returns [`SessionwardError::NotAuthenticated`] when the refresh did not
/// produce a new token.
pub async fn refresh(session: &Arc<SessionController>) -> Result<()> {
    if !session.try_refresh_token().await {
        return Err(SessionwardError::NotAuthenticated.into());
    }
    println!("Token refreshed");
    Ok(())
}

async fn read_password() -> Result<String> {
    eprint!("Password: ");
    read_password_from(BufReader::new(tokio::io::stdin())).await
}

async fn read_password_from<R: AsyncBufRead + Unpin>(mut reader: R) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .await
        .map_err(SessionwardError::Io)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
