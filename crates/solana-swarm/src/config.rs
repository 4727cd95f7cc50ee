use serde::{Deserialize, Serialize};

pub const SOLANA_MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const SOLANA_DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Devnet,
    Mainnet,
}

impl Network {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Mainnet => "mainnet",
        }
    }

    pub const fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Devnet => SOLANA_DEVNET_RPC_URL,
            Self::Mainnet => SOLANA_MAINNET_RPC_URL,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "mainnet-beta" | "main" => Some(Self::Mainnet),
            "devnet" | "dev" => Some(Self::Devnet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Custom Solana RPC endpoint. When unset, the network's public endpoint is used.
    pub solana_rpc_url: Option<String>,
    /// Additional mainnet endpoints tried for read-only calls when the primary fails.
    pub solana_fallback_rpc_urls_mainnet: Vec<String>,
    /// Additional devnet endpoints tried for read-only calls when the primary fails.
    pub solana_fallback_rpc_urls_devnet: Vec<String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            solana_rpc_url: None,
            solana_fallback_rpc_urls_mainnet: vec![
                "https://solana-rpc.publicnode.com".into(),
                "https://solana.drpc.org".into(),
            ],
            solana_fallback_rpc_urls_devnet: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Verified token catalog. Must return a JSON array of token documents.
    pub token_list_url: String,
    /// Birdeye-compatible market data API base URL.
    pub market_data_base_url: String,
    /// API key sent as `X-API-KEY`. Market data tools report an error when unset.
    pub market_data_api_key: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            token_list_url: "https://tokens.jup.ag/tokens?tags=verified".into(),
            market_data_base_url: "https://public-api.birdeye.so".into(),
            market_data_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SwarmConfig {
    pub network: Network,
    pub rpc: RpcConfig,
    pub http: HttpConfig,
}

impl SwarmConfig {
    pub fn effective_rpc_url(&self) -> String {
        self.rpc
            .solana_rpc_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.network.default_rpc_url())
            .to_owned()
    }

    /// Fallbacks only apply to the public endpoints; a custom RPC is used on its own.
    pub fn fallback_rpc_urls(&self) -> &[String] {
        if self
            .rpc
            .solana_rpc_url
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
        {
            return &[];
        }
        match self.network {
            Network::Mainnet => &self.rpc.solana_fallback_rpc_urls_mainnet,
            Network::Devnet => &self.rpc.solana_fallback_rpc_urls_devnet,
        }
    }

    pub fn market_data_key_missing(&self) -> bool {
        self.http
            .market_data_api_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
    }
}
