//! Token directory: a local cache of a verified-token catalog, used to resolve free-text token
//! names ("usdc", "Jupiter") to mint addresses before calling market-data endpoints.

use crate::{
    db::{Db, TokenRow},
    errors::SwarmError,
};
use eyre::Context as _;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub daily_volume: Option<f64>,
    pub created_at: Option<String>,
    /// The catalog entry as received, including fields we do not model.
    pub raw: Value,
}

impl TokenRecord {
    /// Build a record from one catalog entry. Entries without an address, name or symbol are not
    /// usable for lookup and yield `None`.
    pub fn from_document(raw: Value) -> Option<Self> {
        let text = |k: &str| {
            raw.get(k)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        let address = text("address")?;
        let name = text("name")?;
        let symbol = text("symbol")?;
        let decimals = raw
            .get("decimals")
            .and_then(Value::as_u64)
            .and_then(|d| u8::try_from(d).ok())
            .unwrap_or(0);
        let daily_volume = raw.get("daily_volume").and_then(Value::as_f64);
        let created_at = text("created_at");
        Some(Self {
            address,
            name,
            symbol,
            decimals,
            daily_volume,
            created_at,
            raw,
        })
    }

    fn matches(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.symbol.to_lowercase().contains(needle_lower)
    }

    pub fn describe(&self) -> String {
        format!(
            "Token: {} ({})\nAddress: {}\nDecimals: {}",
            self.name, self.symbol, self.address, self.decimals
        )
    }
}

/// Parse a catalog response body (a JSON array of token documents).
pub fn parse_catalog(body: Value) -> eyre::Result<Vec<TokenRecord>> {
    let Value::Array(items) = body else {
        eyre::bail!("token catalog must be a JSON array");
    };
    let total = items.len();
    let out: Vec<TokenRecord> = items
        .into_iter()
        .filter_map(TokenRecord::from_document)
        .collect();
    if out.len() < total {
        warn!(
            skipped = total - out.len(),
            "token catalog entries missing address/name/symbol"
        );
    }
    Ok(out)
}

pub async fn fetch_catalog(url: &str) -> eyre::Result<Vec<TokenRecord>> {
    crate::http::ensure_https_or_loopback(url, "token_list_url")?;
    let body: Value = crate::http::client()?
        .get(url)
        .send()
        .await
        .context("token catalog request")?
        .error_for_status()
        .context("token catalog status")?
        .json()
        .await
        .context("token catalog json")?;
    parse_catalog(body)
}

#[derive(Debug, Default)]
pub struct TokenDirectory {
    records: Vec<TokenRecord>,
}

impl TokenDirectory {
    pub async fn load(db: &Db) -> eyre::Result<Self> {
        let mut this = Self::default();
        this.reload(db).await?;
        Ok(this)
    }

    async fn reload(&mut self, db: &Db) -> eyre::Result<()> {
        let docs = db.list_token_json().await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            let v: Value = serde_json::from_str(&doc).context("parse stored token json")?;
            if let Some(r) = TokenRecord::from_document(v) {
                records.push(r);
            }
        }
        self.records = records;
        Ok(())
    }

    /// Upsert `records` by address, then rebuild the in-memory view from storage so that lookup
    /// order always follows the table scan. The view is rebuilt even when a write fails, so it
    /// matches whatever part of the catalog was stored.
    pub async fn store_catalog(&mut self, db: &Db, records: &[TokenRecord]) -> eyre::Result<usize> {
        let written = Self::upsert_all(db, records).await;
        let reloaded = self.reload(db).await;
        written?;
        reloaded?;
        Ok(records.len())
    }

    async fn upsert_all(db: &Db, records: &[TokenRecord]) -> eyre::Result<()> {
        for r in records {
            let raw_json = serde_json::to_string(&r.raw).context("serialize token json")?;
            db.upsert_token(&TokenRow {
                address: &r.address,
                name: &r.name,
                symbol: &r.symbol,
                decimals: i64::from(r.decimals),
                daily_volume: r.daily_volume.unwrap_or(0.0),
                created_at: r.created_at.as_deref().unwrap_or(""),
                raw_json: &raw_json,
            })
            .await
            .with_context(|| format!("store token {}", r.address))?;
        }
        Ok(())
    }

    /// Fetch the remote catalog and merge it in. On failure the cached records are untouched;
    /// callers treat the error as a warning.
    pub async fn refresh(&mut self, db: &Db, url: &str) -> eyre::Result<usize> {
        let fetched = fetch_catalog(url).await.context("refresh token directory")?;
        let n = self.store_catalog(db, &fetched).await?;
        info!(fetched = n, cached = self.records.len(), "token directory refreshed");
        Ok(n)
    }

    /// First record whose name or symbol contains `query`, case-insensitively. Ties resolve to
    /// whichever row the storage scan returns first.
    pub fn lookup(&self, query: &str) -> Option<&TokenRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.records.iter().find(|r| r.matches(&needle))
    }

    pub fn resolve(&self, query: &str) -> Result<&TokenRecord, SwarmError> {
        self.lookup(query)
            .ok_or_else(|| SwarmError::TokenNotFound(query.trim().to_owned()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
