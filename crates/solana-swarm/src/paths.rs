use directories::ProjectDirs;
use eyre::ContextCompat as _;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SwarmPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub db_file: PathBuf,
    pub log_file: PathBuf,
}

impl SwarmPaths {
    pub fn discover() -> eyre::Result<Self> {
        // Test/CI override knobs.
        if let (Ok(data_dir), Ok(config_dir)) = (
            std::env::var("SOLANA_SWARM_DATA_DIR"),
            std::env::var("SOLANA_SWARM_CONFIG_DIR"),
        ) {
            return Ok(Self::from_dirs(
                PathBuf::from(config_dir),
                PathBuf::from(data_dir),
            ));
        }

        // macOS: ~/Library/Application Support/solana-swarm
        // Linux: ~/.config/solana-swarm
        // Windows: %APPDATA%\\solana-swarm
        let proj = ProjectDirs::from("", "", "solana-swarm")
            .context("failed to resolve project dirs")?;
        Ok(Self::from_dirs(
            proj.config_dir().to_path_buf(),
            proj.data_dir().to_path_buf(),
        ))
    }

    pub fn from_dirs(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        let db_file = data_dir.join("swarm.db");
        let log_file = data_dir.join("solana-swarm.log.jsonl");
        Self {
            config_dir,
            data_dir,
            db_file,
            log_file,
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn ensure_private_dirs(&self) -> eyre::Result<()> {
        crate::fsutil::ensure_private_dir(&self.config_dir)?;
        crate::fsutil::ensure_private_dir(&self.data_dir)?;
        Ok(())
    }
}
