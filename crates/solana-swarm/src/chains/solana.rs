use eyre::Context as _;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::time::Duration;
use tracing::debug;

use crate::{
    config::SwarmConfig,
    gateway::Ledger,
    retry::{try_endpoints, BackoffConfig},
};

pub const RPC_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct SolanaChain {
    pub rpc_url: String,
    pub fallback_rpc_urls: Vec<String>,
}

impl SolanaChain {
    pub fn new_with_fallbacks(rpc_url: &str, fallback_rpc_urls: &[String]) -> Self {
        Self {
            rpc_url: rpc_url.to_owned(),
            fallback_rpc_urls: fallback_rpc_urls.to_vec(),
        }
    }

    pub fn from_config(cfg: &SwarmConfig) -> Self {
        Self::new_with_fallbacks(&cfg.effective_rpc_url(), cfg.fallback_rpc_urls())
    }

    /// Primary first, then fallbacks, trimmed and de-duplicated.
    fn all_rpc_urls(&self) -> Vec<String> {
        let mut urls = Vec::with_capacity(1 + self.fallback_rpc_urls.len());
        if !self.rpc_url.trim().is_empty() {
            urls.push(self.rpc_url.trim().to_owned());
        }
        for u in &self.fallback_rpc_urls {
            let t = u.trim();
            if t.is_empty() || urls.iter().any(|x| x == t) {
                continue;
            }
            urls.push(t.to_owned());
        }
        urls
    }

    fn rpc_for_url(url: &str) -> RpcClient {
        RpcClient::new_with_timeout_and_commitment(
            url.to_owned(),
            RPC_TIMEOUT,
            CommitmentConfig::confirmed(),
        )
    }

    async fn with_fallback_and_backoff<T, Fut>(
        &self,
        context_label: &'static str,
        f: impl Fn(RpcClient) -> Fut,
    ) -> eyre::Result<T>
    where
        Fut: std::future::Future<Output = eyre::Result<T>>,
    {
        let urls = self.all_rpc_urls();
        try_endpoints(
            &urls,
            &BackoffConfig::default(),
            |u| f(Self::rpc_for_url(u)),
            context_label,
        )
        .await
    }
}

impl Ledger for SolanaChain {
    async fn balance_lamports(&self, owner: Pubkey) -> eyre::Result<u64> {
        self.with_fallback_and_backoff("get balance", |rpc| async move {
            let v = rpc.get_balance(&owner).await.context("get balance")?;
            Ok(v)
        })
        .await
    }

    async fn latest_blockhash(&self) -> eyre::Result<Hash> {
        self.with_fallback_and_backoff("latest blockhash", |rpc| async move {
            let bh = rpc
                .get_latest_blockhash()
                .await
                .context("latest blockhash")?;
            Ok(bh)
        })
        .await
    }

    async fn submit(&self, tx: &Transaction) -> eyre::Result<Signature> {
        // A resend after an ambiguous failure could double-spend, so only the primary sees it.
        let url = self.rpc_url.trim();
        debug!(rpc = %url, "submitting transaction");
        Self::rpc_for_url(url)
            .send_and_confirm_transaction(tx)
            .await
            .context("send and confirm transaction")
    }
}
