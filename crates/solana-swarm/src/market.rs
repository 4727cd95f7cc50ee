use crate::{config::HttpConfig, gateway::MarketData};
use eyre::Context as _;
use reqwest::Client;
use serde_json::Value;

const OHLCV_INTERVAL: &str = "15m";
const OHLCV_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Birdeye-compatible market data API.
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl MarketDataClient {
    pub fn new(cfg: &HttpConfig) -> eyre::Result<Self> {
        Ok(Self {
            base_url: cfg.market_data_base_url.trim().trim_end_matches('/').to_owned(),
            api_key: cfg
                .market_data_api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned),
            http: crate::http::client()?,
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> eyre::Result<Value> {
        let Some(key) = self.api_key.as_deref() else {
            eyre::bail!(
                "market data API key is not configured (set BIRDEYE_API_KEY or http.market_data_api_key)"
            );
        };
        crate::http::ensure_https_or_loopback(&self.base_url, "market_data_base_url")?;

        let url = format!("{}{path}", self.base_url);
        let v: Value = self
            .http
            .get(&url)
            .query(query)
            .header("X-API-KEY", key)
            .header("x-chain", "solana")
            .header("accept", "application/json")
            .send()
            .await
            .with_context(|| format!("market data request {path}"))?
            .error_for_status()
            .with_context(|| format!("market data status {path}"))?
            .json()
            .await
            .with_context(|| format!("market data json {path}"))?;
        unwrap_envelope(v).with_context(|| format!("market data {path}"))
    }
}

/// Responses come wrapped as `{"success": bool, "data": ...}`.
fn unwrap_envelope(mut v: Value) -> eyre::Result<Value> {
    if v.get("success").and_then(Value::as_bool) == Some(false) {
        let msg = v
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request was not successful");
        eyre::bail!("{msg}");
    }
    Ok(match v.get_mut("data") {
        Some(data) => data.take(),
        None => v,
    })
}

impl MarketData for MarketDataClient {
    async fn token_overview(&self, address: &str) -> eyre::Result<Value> {
        self.get_json("/defi/token_overview", &[("address", address.to_owned())])
            .await
    }

    async fn token_ohlcv(&self, address: &str) -> eyre::Result<Value> {
        let now = chrono::Utc::now().timestamp();
        self.get_json(
            "/defi/ohlcv",
            &[
                ("address", address.to_owned()),
                ("type", OHLCV_INTERVAL.to_owned()),
                ("time_from", (now - OHLCV_WINDOW_SECS).to_string()),
                ("time_to", now.to_string()),
            ],
        )
        .await
    }

    async fn wallet_token_balance(
        &self,
        wallet: &str,
        token_address: &str,
    ) -> eyre::Result<Value> {
        self.get_json(
            "/v1/wallet/token_balance",
            &[
                ("wallet", wallet.to_owned()),
                ("token_address", token_address.to_owned()),
            ],
        )
        .await
    }
}
