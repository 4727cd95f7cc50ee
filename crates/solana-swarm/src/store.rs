use crate::{
    config::{Network, SwarmConfig},
    paths::SwarmPaths,
};
use eyre::Context as _;
use std::{fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

/// Apply environment variable overrides (network, endpoints, API keys).
fn apply_env_overrides(cfg: &mut SwarmConfig) {
    /// Helper: if an env var is set and non-empty, apply `setter` with the trimmed value.
    fn apply_env(var: &str, setter: impl FnOnce(&str)) {
        if let Ok(u) = std::env::var(var) {
            let t = u.trim();
            if !t.is_empty() {
                setter(t);
            }
        }
    }

    apply_env("SOLANA_SWARM_NETWORK", |v| {
        if let Some(n) = Network::parse(v) {
            cfg.network = n;
        } else {
            tracing::warn!(value = v, "ignoring unknown SOLANA_SWARM_NETWORK");
        }
    });
    apply_env("SOLANA_SWARM_RPC_URL", |v| {
        cfg.rpc.solana_rpc_url = Some(v.to_owned());
    });
    apply_env("SOLANA_SWARM_TOKEN_LIST_URL", |v| {
        v.clone_into(&mut cfg.http.token_list_url);
    });
    apply_env("SOLANA_SWARM_MARKET_BASE_URL", |v| {
        v.clone_into(&mut cfg.http.market_data_base_url);
    });
    apply_env("BIRDEYE_API_KEY", |v| {
        cfg.http.market_data_api_key = Some(v.to_owned());
    });
    // The crate-specific name wins over the provider name when both are set.
    apply_env("SOLANA_SWARM_MARKET_API_KEY", |v| {
        cfg.http.market_data_api_key = Some(v.to_owned());
    });
}

impl ConfigStore {
    pub fn new(paths: &SwarmPaths) -> Self {
        Self {
            path: paths.config_file(),
        }
    }

    pub fn load_or_init_default(&self) -> eyre::Result<SwarmConfig> {
        let mut cfg = if self.path.exists() {
            let s = fs::read_to_string(&self.path).context("read config.toml")?;
            toml::from_str(&s).context("parse config.toml")?
        } else {
            let cfg = SwarmConfig::default();
            self.save(&cfg)?;
            cfg
        };
        // Env overrides are session-only and never written back (keeps API keys off disk).
        apply_env_overrides(&mut cfg);
        Ok(cfg)
    }

    pub fn save(&self, cfg: &SwarmConfig) -> eyre::Result<()> {
        let s = toml::to_string_pretty(cfg).context("serialize config.toml")?;
        crate::fsutil::write_string_atomic_restrictive(
            &self.path,
            &s,
            crate::fsutil::MODE_FILE_PRIVATE,
        )
        .context("write config.toml")?;
        Ok(())
    }
}
