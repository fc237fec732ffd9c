use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File layout inside the data directory
// ---------------------------------------------------------------------------

pub const DEFAULT_DATA_DIR: &str = ".rei";

pub const CONFIG_FILE: &str = "rei.yaml";
pub const USERS_FILE: &str = "users.yaml";
pub const ACTIVITY_DB: &str = "activity.redb";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn users_path(root: &Path) -> PathBuf {
    root.join(USERS_FILE)
}

pub fn activity_db_path(root: &Path) -> PathBuf {
    root.join(ACTIVITY_DB)
}
