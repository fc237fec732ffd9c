use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use clap::Subcommand;
use rei_core::token::TokenSigner;
use serde_json::json;
use std::path::Path;

use super::{load_config, load_users};
use crate::output::print_json;

#[derive(Subcommand, Debug)]
pub enum TokenSubcommand {
    /// Issue a bearer token for a user (by id or email)
    Issue {
        user: String,
        /// Lifetime in hours (default: auth.token_ttl_hours)
        #[arg(long)]
        hours: Option<i64>,
    },
}

pub fn run(root: &Path, subcommand: TokenSubcommand, json: bool) -> Result<()> {
    match subcommand {
        TokenSubcommand::Issue { user, hours } => issue(root, &user, hours, json),
    }
}

fn issue(root: &Path, key: &str, hours: Option<i64>, json: bool) -> Result<()> {
    let config = load_config(root)?;
    if config.auth.token_secret.is_empty() {
        bail!("auth.token_secret is empty; set it in rei.yaml or REI_TOKEN_SECRET");
    }
    let hours = hours.unwrap_or(config.auth.token_ttl_hours);
    if hours <= 0 {
        bail!("token lifetime must be positive, got {hours}h");
    }

    let users = load_users(root)?;
    let user = users
        .lookup(key)
        .ok_or_else(|| rei_core::ReiError::UserNotFound(key.to_string()))?;
    if !user.active {
        eprintln!("warning: {} is disabled; requests with this token will be refused", user.id);
    }

    let now = Utc::now();
    let ttl = Duration::hours(hours);
    let token = TokenSigner::new(&config.auth.token_secret).issue(user, ttl, now)?;

    if json {
        print_json(&json!({
            "token": token,
            "user_id": user.id,
            "role": user.role,
            "expires_at": now + ttl,
        }))
    } else {
        println!("{token}");
        Ok(())
    }
}
