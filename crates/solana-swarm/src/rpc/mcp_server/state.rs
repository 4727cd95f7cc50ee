use crate::{
    chains::solana::SolanaChain,
    config::SwarmConfig,
    db::Db,
    gateway::Gateway,
    market::MarketDataClient,
    paths::SwarmPaths,
    tokens::TokenDirectory,
    wallet::KeypairStore,
};
use eyre::Context as _;
use tracing::{info, warn};

/// Everything a tool call can touch. Owned by the server loop and lent to one call at a time.
#[derive(Debug)]
pub struct SharedState<L, M> {
    pub db: Db,
    pub wallets: KeypairStore,
    pub tokens: TokenDirectory,
    pub gateway: Gateway<L, M>,
}

pub type LiveState = SharedState<SolanaChain, MarketDataClient>;

impl<L, M> SharedState<L, M> {
    /// Load wallets and cached tokens from `db`.
    pub async fn with_gateway(db: Db, gateway: Gateway<L, M>) -> eyre::Result<Self> {
        let wallets = KeypairStore::load_all(&db).await?;
        let tokens = TokenDirectory::load(&db)
            .await
            .context("load token directory")?;
        Ok(Self {
            db,
            wallets,
            tokens,
            gateway,
        })
    }
}

impl LiveState {
    pub async fn open(
        paths: &SwarmPaths,
        cfg: &SwarmConfig,
        refresh_tokens: bool,
    ) -> eyre::Result<Self> {
        let db = Db::open(paths).await?;
        let gateway = Gateway::new(
            SolanaChain::from_config(cfg),
            MarketDataClient::new(&cfg.http)?,
        );
        let mut state = Self::with_gateway(db, gateway).await?;

        if refresh_tokens {
            if let Err(e) = state
                .tokens
                .refresh(&state.db, &cfg.http.token_list_url)
                .await
            {
                warn!(
                    error = %format!("{e:#}"),
                    cached = state.tokens.len(),
                    "token directory refresh failed; using cached records"
                );
            }
        }
        if state.tokens.is_empty() {
            warn!("token directory is empty; token tools will report no matches until a refresh succeeds");
        }
        info!(
            network = cfg.network.as_str(),
            rpc = %cfg.effective_rpc_url(),
            wallets = state.wallets.len(),
            tokens = state.tokens.len(),
            "state ready"
        );
        Ok(state)
    }
}
