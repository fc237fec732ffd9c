use crate::output::{print_json, print_table};
use anyhow::Result;
use clap::Subcommand;
use rei_core::types::Role;
use rei_core::users::{UserDirectory, UserRecord};
use std::path::Path;

use super::load_users;

// ---------------------------------------------------------------------------
// Subcommand definition
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug)]
pub enum UserSubcommand {
    /// Add a user
    Add {
        /// Display name
        name: String,
        /// admin, manager, acquisitions, dispositions, or member
        #[arg(long, default_value = "member")]
        role: String,
        #[arg(long)]
        email: Option<String>,
        /// Slack member id (U...)
        #[arg(long)]
        slack: Option<String>,
    },
    /// List all users
    List,
    /// Re-enable a disabled user
    Enable { user: String },
    /// Disable a user; their requests are refused and recorded
    Disable { user: String },
    /// Change a user's role
    SetRole { user: String, role: String },
    /// Attach a Slack member id to a user
    LinkSlack { user: String, slack_user_id: String },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcommand: UserSubcommand, json: bool) -> Result<()> {
    match subcommand {
        UserSubcommand::Add {
            name,
            role,
            email,
            slack,
        } => add(root, &name, &role, email, slack, json),
        UserSubcommand::List => list(root, json),
        UserSubcommand::Enable { user } => set_active(root, &user, true, json),
        UserSubcommand::Disable { user } => set_active(root, &user, false, json),
        UserSubcommand::SetRole { user, role } => set_role(root, &user, &role, json),
        UserSubcommand::LinkSlack {
            user,
            slack_user_id,
        } => link_slack(root, &user, &slack_user_id, json),
    }
}

fn add(
    root: &Path,
    name: &str,
    role: &str,
    email: Option<String>,
    slack: Option<String>,
    json: bool,
) -> Result<()> {
    let role: Role = role.parse()?;
    let mut users = load_users(root)?;

    let mut record = UserRecord::new(name, role);
    record.email = email;
    record.slack_user_id = slack;
    let id = record.id.clone();
    users.add(record)?;
    users.save(root)?;

    report(&users, &id, "added", json)
}

fn list(root: &Path, json: bool) -> Result<()> {
    let users = load_users(root)?;
    if json {
        return print_json(&users.users);
    }
    if users.users.is_empty() {
        println!("No users. Add one with: rei user add <name> --role <role>");
        return Ok(());
    }
    let rows = users
        .users
        .iter()
        .map(|u| {
            vec![
                u.id.clone(),
                u.name.clone(),
                u.role.to_string(),
                u.email.clone().unwrap_or_else(|| "-".into()),
                u.slack_user_id.clone().unwrap_or_else(|| "-".into()),
                (if u.active { "yes" } else { "no" }).to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "ROLE", "EMAIL", "SLACK", "ACTIVE"], rows);
    Ok(())
}

fn set_active(root: &Path, key: &str, active: bool, json: bool) -> Result<()> {
    let mut users = load_users(root)?;
    users.set_active(key, active)?;
    users.save(root)?;
    report(&users, key, if active { "enabled" } else { "disabled" }, json)
}

fn set_role(root: &Path, key: &str, role: &str, json: bool) -> Result<()> {
    let role: Role = role.parse()?;
    let mut users = load_users(root)?;
    users.set_role(key, role)?;
    users.save(root)?;
    report(&users, key, "updated", json)
}

fn link_slack(root: &Path, key: &str, slack_user_id: &str, json: bool) -> Result<()> {
    let mut users = load_users(root)?;
    users.link_slack(key, slack_user_id)?;
    users.save(root)?;
    report(&users, key, "linked", json)
}

/// Print the stored record after a change.
fn report(users: &UserDirectory, key: &str, verb: &str, json: bool) -> Result<()> {
    let Some(user) = users.lookup(key) else {
        return Ok(());
    };
    if json {
        return print_json(user);
    }
    let state = if user.active { "active" } else { "disabled" };
    println!("{verb}: {} ({}) role={} {state}", user.name, user.id, user.role);
    Ok(())
}
