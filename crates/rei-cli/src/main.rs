mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{token::TokenSubcommand, user::UserSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rei",
    about = "REI command gateway: users, tokens, policy, activity, and the HTTP server",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data directory holding rei.yaml, users.yaml and the activity log
    #[arg(long, global = true, env = "REI_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory with a fresh token secret
    Init,

    /// Run the gateway HTTP server (Slack and REST adapters)
    Serve {
        /// Port to listen on (overrides rei.yaml)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (overrides rei.yaml)
        #[arg(long)]
        bind: Option<String>,

        /// Keep the activity log in memory instead of activity.redb
        #[arg(long)]
        memory_log: bool,
    },

    /// Manage the user directory
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },

    /// Issue API bearer tokens
    Token {
        #[command(subcommand)]
        subcommand: TokenSubcommand,
    },

    /// Query the activity log
    Activity {
        /// Only entries for this actor id
        #[arg(long)]
        actor: Option<String>,

        /// Entries at or after this time (RFC 3339 or an age like 24h, 7d)
        #[arg(long)]
        since: Option<String>,

        /// Entries at or before this time (RFC 3339 or an age like 1h)
        #[arg(long)]
        until: Option<String>,

        /// Maximum number of entries
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the role/tool permission table
    Policy,

    /// Check whether a role may invoke a tool
    Check { role: String, tool: String },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_data_dir(cli.data_dir.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Serve {
            port,
            bind,
            memory_log,
        } => cmd::serve::run(&root, port, bind, memory_log),
        Commands::User { subcommand } => cmd::user::run(&root, subcommand, cli.json),
        Commands::Token { subcommand } => cmd::token::run(&root, subcommand, cli.json),
        Commands::Activity {
            actor,
            since,
            until,
            limit,
        } => cmd::activity::run(
            &root,
            cmd::activity::Filters {
                actor,
                since,
                until,
                limit,
            },
            cli.json,
        ),
        Commands::Policy => cmd::policy::run(cli.json),
        Commands::Check { role, tool } => cmd::policy::check(&role, &tool, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
