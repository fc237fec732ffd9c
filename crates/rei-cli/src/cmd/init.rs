use anyhow::Context;
use rei_core::config::{Config, WarnLevel};
use rei_core::paths;
use rei_core::users::UserDirectory;
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing REI gateway in: {}", root.display());
    std::fs::create_dir_all(root)
        .with_context(|| format!("failed to create {}", root.display()))?;

    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        let mut cfg = Config::default();
        cfg.auth.token_secret = generate_secret();
        cfg.save(root).context("failed to write rei.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    if paths::users_path(root).exists() {
        println!("  exists:  {}", paths::USERS_FILE);
    } else {
        UserDirectory::default()
            .save(root)
            .context("failed to write users.yaml")?;
        println!("  created: {}", paths::USERS_FILE);
    }

    let mut cfg = Config::load(root)?;
    cfg.apply_env();
    let warnings = cfg.validate();
    if !warnings.is_empty() {
        println!();
        for w in &warnings {
            let tag = match w.level {
                WarnLevel::Error => "error",
                WarnLevel::Warning => "warning",
            };
            println!("  {tag}: {}", w.message);
        }
    }

    println!("\nNext: rei user add <name> --role admin");
    Ok(())
}

/// 256-bit hex secret for signing API tokens.
fn generate_secret() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}
