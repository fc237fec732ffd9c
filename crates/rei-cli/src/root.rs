use rei_core::paths::DEFAULT_DATA_DIR;
use std::path::{Path, PathBuf};

/// Resolve the data directory.
///
/// Priority:
/// 1. `--data-dir` flag / `REI_DATA_DIR` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for an existing `.rei/`
/// 3. `.rei/` under `cwd`, which `rei init` will create
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd).unwrap_or_else(|| cwd.join(DEFAULT_DATA_DIR))
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DEFAULT_DATA_DIR))
        .find(|candidate| candidate.is_dir())
}
