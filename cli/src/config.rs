use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolve the database path: `db_override` when given, otherwise
    /// `cookbook.db` in the platform data directory. Parent directories are
    /// created on demand.
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_override {
            Some(path) => path,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "cookbook")
                    .context("Could not determine home directory")?;
                proj_dirs.data_dir().join("cookbook.db")
            }
        };

        if let Some(dir) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        }

        Ok(Config { db_path })
    }
}
