pub mod activity;
pub mod init;
pub mod policy;
pub mod serve;
pub mod token;
pub mod user;

use anyhow::Context;
use rei_core::config::Config;
use rei_core::users::UserDirectory;
use std::path::Path;

/// Config with environment overrides applied. Fails before `rei init`.
pub(crate) fn load_config(root: &Path) -> anyhow::Result<Config> {
    let mut config = Config::load(root).with_context(|| format!("data dir {}", root.display()))?;
    config.apply_env();
    Ok(config)
}

/// The user directory of an initialized data dir.
pub(crate) fn load_users(root: &Path) -> anyhow::Result<UserDirectory> {
    Config::load(root).with_context(|| format!("data dir {}", root.display()))?;
    Ok(UserDirectory::load(root)?)
}
