//! In-process stand-ins for the ledger and market-data collaborators.

use crate::gateway::{Ledger, MarketData};
use serde_json::{json, Value};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

pub const FAKE_FEE_LAMPORTS: u64 = 5_000;

/// Lamport balances keyed by owner. `submit` applies system transfers and charges a flat fee.
#[derive(Debug, Default)]
pub struct FakeLedger {
    balances: RefCell<HashMap<Pubkey, u64>>,
    submissions: Cell<usize>,
}

impl FakeLedger {
    pub fn with_balance(owner: Pubkey, lamports: u64) -> Self {
        let this = Self::default();
        this.balances.borrow_mut().insert(owner, lamports);
        this
    }

    pub fn lamports(&self, owner: &Pubkey) -> u64 {
        self.balances.borrow().get(owner).copied().unwrap_or(0)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.get()
    }
}

fn decode_transfer(tx: &Transaction) -> eyre::Result<(Pubkey, Pubkey, u64)> {
    let ix = tx
        .message
        .instructions
        .first()
        .ok_or_else(|| eyre::eyre!("no instructions"))?;
    let key = |pos: usize| {
        ix.accounts
            .get(pos)
            .and_then(|i| tx.message.account_keys.get(usize::from(*i)))
            .map(|a| Pubkey::new_from_array(a.to_bytes()))
            .ok_or_else(|| eyre::eyre!("missing account {pos}"))
    };
    let data: [u8; 12] = ix
        .data
        .as_slice()
        .try_into()
        .map_err(|e| eyre::eyre!("not a system transfer: {e}"))?;
    let (tag, amount) = data.split_at(4);
    if tag != 2_u32.to_le_bytes() {
        eyre::bail!("not a system transfer");
    }
    let lamports = u64::from_le_bytes(amount.try_into()?);
    Ok((key(0)?, key(1)?, lamports))
}

impl Ledger for FakeLedger {
    async fn balance_lamports(&self, owner: Pubkey) -> eyre::Result<u64> {
        Ok(self.lamports(&owner))
    }

    async fn latest_blockhash(&self) -> eyre::Result<Hash> {
        Ok(Hash::new_from_array([7; 32]))
    }

    async fn submit(&self, tx: &Transaction) -> eyre::Result<Signature> {
        self.submissions.set(self.submissions.get() + 1);
        if !tx.is_signed() {
            eyre::bail!("transaction is not signed");
        }
        let (from, to, lamports) = decode_transfer(tx)?;
        let mut balances = self.balances.borrow_mut();
        let have = balances.get(&from).copied().unwrap_or(0);
        let need = lamports.saturating_add(FAKE_FEE_LAMPORTS);
        if have < need {
            eyre::bail!(
                "Transaction simulation failed: insufficient funds for {need} lamports (have {have})"
            );
        }
        balances.insert(from, have - need);
        *balances.entry(to).or_default() += lamports;
        tx.signatures
            .first()
            .copied()
            .ok_or_else(|| eyre::eyre!("missing signature"))
    }
}

/// Canned Birdeye-shaped documents. `fail` makes every call return a transport-style error.
#[derive(Debug)]
pub struct FakeMarket {
    pub overview: Value,
    pub ohlcv: Value,
    pub balance: Value,
    pub fail: bool,
}

impl Default for FakeMarket {
    fn default() -> Self {
        Self {
            overview: json!({ "price": 1.0001, "liquidity": 5.1e8, "v24hUSD": 2.3e8 }),
            ohlcv: json!({ "items": [
                { "unixTime": 1_726_670_700, "o": 0.9998, "h": 1.0002, "l": 0.9997, "c": 1.0001, "v": 1200.5 },
                { "unixTime": 1_726_671_600, "o": 1.0001, "h": 1.0003, "l": 0.9999, "c": 1.0, "v": 980.0 }
            ]}),
            balance: json!({ "uiAmount": 12.5, "decimals": 6 }),
            fail: false,
        }
    }
}

impl FakeMarket {
    fn answer(&self, v: &Value) -> eyre::Result<Value> {
        if self.fail {
            eyre::bail!("market data: 503 Service Unavailable");
        }
        Ok(v.clone())
    }
}

impl MarketData for FakeMarket {
    async fn token_overview(&self, _address: &str) -> eyre::Result<Value> {
        self.answer(&self.overview)
    }

    async fn token_ohlcv(&self, _address: &str) -> eyre::Result<Value> {
        self.answer(&self.ohlcv)
    }

    async fn wallet_token_balance(
        &self,
        _wallet: &str,
        _token_address: &str,
    ) -> eyre::Result<Value> {
        self.answer(&self.balance)
    }
}

/// Loopback HTTP/1.1 server that answers every request with `status` and a JSON `body`.
/// Returns the base URL. The server lives until the test runtime shuts down.
pub async fn http_stub(status: u16, body: impl Into<String>) -> eyre::Result<String> {
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

    let body = body.into();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            // GET requests carry no body, so the headers are the whole request.
            let mut req: Vec<u8> = vec![];
            while !req.windows(4).any(|w| w == b"\r\n\r\n") {
                match sock.read_buf(&mut req).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            let resp = format!(
                "HTTP/1.1 {status} STUB\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            if sock.write_all(resp.as_bytes()).await.is_ok() {
                sock.shutdown().await.ok();
            }
        }
    });
    Ok(format!("http://{addr}"))
}
