//! Command handlers.
//!
//! Each handler hydrates an [`AuthStore`] from the default file storage,
//! drives it, and prints a small human-readable report. Tokens are never
//! printed in full.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use authkeep_core::{AuthStore, FileStorage, STORAGE_KEY, UserId, token};

fn open_store() -> AuthStore<FileStorage> {
    AuthStore::load(FileStorage::default_location())
}

fn slot_path() -> std::path::PathBuf {
    FileStorage::default_location().slot_path(STORAGE_KEY)
}

/// Servers hand out numeric and string ids alike; keep whichever shape the
/// flag value parses as.
fn parse_user_id(raw: &str) -> UserId {
    raw.parse::<i64>()
        .map_or_else(|_| UserId::from(raw), UserId::from)
}

pub fn login(user_id: &str, token_flag: Option<&str>, user_json: Option<&str>) -> Result<()> {
    let token_value = match token_flag {
        Some(t) => t.trim().to_string(),
        None => {
            print!("Paste bearer token: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;
            input.trim().to_string()
        }
    };
    if token_value.is_empty() {
        anyhow::bail!("Token cannot be empty");
    }

    let user = user_json
        .map(|raw| serde_json::from_str(raw).context("parse --user payload as JSON"))
        .transpose()?;

    let mut store = open_store();
    store.set_auth(token_value.clone(), parse_user_id(user_id), user);

    println!(
        "✓ Logged in as {} (token: {})",
        user_id,
        token::mask(&token_value)
    );
    println!("  State saved to: {}", slot_path().display());

    Ok(())
}

pub fn logout() -> Result<()> {
    let mut store = open_store();
    let had_credentials = store.state().token.is_some() || store.state().is_authenticated;

    store.logout();

    if had_credentials {
        println!("✓ Logged out");
        println!("  State cleared in: {}", slot_path().display());
    } else {
        println!("Not logged in (no credentials stored).");
    }

    Ok(())
}

pub fn status() -> Result<()> {
    let store = open_store();
    let state = store.state();

    println!(
        "Authenticated: {}",
        if state.is_authenticated { "yes" } else { "no" }
    );
    println!(
        "User id:       {}",
        state
            .user_id
            .as_ref()
            .map_or_else(|| "(none)".to_string(), ToString::to_string)
    );
    if let Some(user) = &state.user {
        println!("Profile:       {user}");
    }

    match state.token.as_deref() {
        None => println!("Token:         (none)"),
        Some(tok) => {
            println!("Token:         {}", token::mask(tok));
            println!("Validity:      {}", describe_validity(tok));
        }
    }

    println!("Storage:       {}", slot_path().display());

    Ok(())
}

pub fn headers() -> Result<()> {
    let store = open_store();
    for (name, value) in store.auth_headers() {
        println!("{name}: {value}");
    }
    Ok(())
}

fn describe_validity(tok: &str) -> String {
    match token::evaluate(tok) {
        token::TokenStatus::Valid => format!("valid{}", expiry_suffix(tok, "expires")),
        token::TokenStatus::Expired => format!("expired{}", expiry_suffix(tok, "expired")),
        token::TokenStatus::Malformed => "malformed (cannot decode payload)".to_string(),
    }
}

/// Renders the decoded `exp` as a human timestamp, e.g. ", expires 2026-01-01 00:00:00 UTC".
fn expiry_suffix(tok: &str, verb: &str) -> String {
    token::expiry(tok)
        .and_then(|exp| chrono::DateTime::from_timestamp(exp as i64, 0))
        .map(|ts| format!(", {verb} {}", ts.format("%Y-%m-%d %H:%M:%S UTC")))
        .unwrap_or_default()
}
