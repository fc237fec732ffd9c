use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rei_core::activity::{ActivityDb, ActivityQueryHandler, ActivitySink, MemoryActivityLog};
use rei_core::config::Config;
use rei_core::dispatch::{Dispatcher, ToolRegistry};
use rei_core::paths;
use rei_core::policy::Policy;
use rei_core::token::TokenSigner;
use rei_core::types::Tool;
use rei_core::users::UserDirectory;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::slack::client::SlackClient;
use crate::upstream::UpstreamHandler;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
    pub users: Arc<RwLock<UserDirectory>>,
    pub signer: Arc<TokenSigner>,
    pub slack: SlackClient,
}

impl AppState {
    pub fn new(config: Config, users: UserDirectory, dispatcher: Dispatcher) -> Self {
        let slack = SlackClient::new(
            reqwest::Client::new(),
            &config.slack.api_base,
            config.slack.bot_token.clone(),
        );
        Self {
            signer: Arc::new(TokenSigner::new(&config.auth.token_secret)),
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            users: Arc::new(RwLock::new(users)),
            slack,
        }
    }

    /// Load everything the server needs from the data directory.
    ///
    /// With `memory_log` the activity log lives only for the life of the
    /// process; otherwise it is the redb file next to the config.
    pub fn open(root: PathBuf, memory_log: bool) -> anyhow::Result<Self> {
        let mut config = Config::load(&root)?;
        config.apply_env();
        for w in config.validate() {
            warn!(level = ?w.level, "{}", w.message);
        }

        let users = UserDirectory::load(&root)?;
        let log: Arc<dyn ActivitySink> = if memory_log {
            Arc::new(MemoryActivityLog::new())
        } else {
            Arc::new(ActivityDb::open(&paths::activity_db_path(&root))?)
        };

        let http = reqwest::Client::builder().build()?;
        let registry = build_registry(&config, log.clone(), &http);
        for tool in Tool::all().iter().filter(|t| **t != Tool::Help) {
            if !registry.contains(*tool) {
                warn!(tool = %tool, "no handler configured; calls will fail with handler_missing");
            }
        }
        let dispatcher = Dispatcher::new(Arc::new(Policy::standard()), registry, log)
            .with_timeouts(config.tools.tool_timeouts());

        let state = Self::new(config, users, dispatcher);
        state.watch_users(root);
        Ok(state)
    }

    /// Reload `users.yaml` whenever its mtime changes, so CLI edits (disable,
    /// role change) apply to a running server.
    fn watch_users(&self, root: PathBuf) {
        // Skipped outside a runtime (sync unit tests).
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        let users = self.users.clone();
        let users_file = paths::users_path(&root);
        tokio::spawn(async move {
            let mut last_mtime = None::<std::time::SystemTime>;
            loop {
                tokio::time::sleep(Duration::from_millis(800)).await;
                let Ok(meta) = tokio::fs::metadata(&users_file).await else {
                    continue;
                };
                let Ok(mtime) = meta.modified() else {
                    continue;
                };
                if last_mtime.is_some() && last_mtime != Some(mtime) {
                    match UserDirectory::load(&root) {
                        Ok(fresh) => {
                            info!(users = fresh.users.len(), "reloaded users.yaml");
                            *users.write().await = fresh;
                        }
                        Err(e) => warn!(error = %e, "users.yaml changed but could not be loaded"),
                    }
                }
                last_mtime = Some(mtime);
            }
        });
    }
}

/// Register the built-in activity query and one upstream bridge per
/// configured tool.
pub fn build_registry(
    config: &Config,
    log: Arc<dyn ActivitySink>,
    http: &reqwest::Client,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Tool::ActivityLog, Arc::new(ActivityQueryHandler::new(log)));
    for (tool, url) in config.tools.upstreams() {
        if matches!(tool, Tool::Help | Tool::ActivityLog) {
            continue;
        }
        registry.register(tool, Arc::new(UpstreamHandler::new(tool, url, http.clone())));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_activity_and_configured_upstreams() {
        let mut config = Config::default();
        config
            .tools
            .upstreams
            .insert("lookup".into(), "http://localhost:1/lookup".into());
        config
            .tools
            .upstreams
            .insert("activity".into(), "http://localhost:1/nope".into());
        let registry = build_registry(
            &config,
            Arc::new(MemoryActivityLog::new()),
            &reqwest::Client::new(),
        );
        assert_eq!(registry.tools(), vec![Tool::Lookup, Tool::ActivityLog]);
    }

    #[test]
    fn open_requires_init() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(AppState::open(dir.path().to_path_buf(), true).is_err());
    }
}
