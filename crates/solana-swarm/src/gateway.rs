//! Ledger gateway: wallet-index based balance, transfer and market-data calls.
//!
//! The network sits behind [`Ledger`] and [`MarketData`] so the same code runs against Solana
//! RPC and Birdeye in production and against in-process fakes in tests.

use crate::{
    amount::{lamports_to_sol, sol_to_lamports},
    errors::SwarmError,
    wallet::KeypairStore,
};
use rust_decimal::Decimal;
use serde_json::Value;
use solana_address::Address;
use solana_sdk::{
    hash::Hash, message::Message, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use solana_system_interface::instruction as system_instruction;
use tracing::{info, warn};

pub trait Ledger {
    async fn balance_lamports(&self, owner: Pubkey) -> eyre::Result<u64>;
    async fn latest_blockhash(&self) -> eyre::Result<Hash>;
    /// Submit a signed transaction and wait for confirmation. Called at most once per transfer.
    async fn submit(&self, tx: &Transaction) -> eyre::Result<Signature>;
}

pub trait MarketData {
    async fn token_overview(&self, address: &str) -> eyre::Result<Value>;
    async fn token_ohlcv(&self, address: &str) -> eyre::Result<Value>;
    async fn wallet_token_balance(&self, wallet: &str, token_address: &str)
        -> eyre::Result<Value>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: Decimal,
    pub signature: Signature,
}

#[derive(Debug)]
pub struct Gateway<L, M> {
    ledger: L,
    market: M,
}

impl<L: Ledger, M: MarketData> Gateway<L, M> {
    pub const fn new(ledger: L, market: M) -> Self {
        Self { ledger, market }
    }

    #[cfg(test)]
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    pub async fn balance(
        &self,
        wallets: &KeypairStore,
        index: i64,
    ) -> Result<(Pubkey, Decimal), SwarmError> {
        let owner = wallets.get(index)?.pubkey();
        let lamports = self
            .ledger
            .balance_lamports(owner)
            .await
            .map_err(|e| SwarmError::remote(&e))?;
        Ok((owner, lamports_to_sol(lamports)))
    }

    pub async fn transfer(
        &self,
        wallets: &KeypairStore,
        from_index: i64,
        to_index: i64,
        amount: Decimal,
    ) -> Result<TransferReceipt, SwarmError> {
        let source = wallets.get(from_index)?;
        let dest = wallets.get(to_index)?.pubkey();
        if from_index == to_index {
            return Err(SwarmError::SameAccount(
                usize::try_from(from_index).unwrap_or_default(),
            ));
        }
        let lamports = sol_to_lamports(amount)?;

        let from = source.pubkey();
        let ix = system_instruction::transfer(
            &Address::new_from_array(from.to_bytes()),
            &Address::new_from_array(dest.to_bytes()),
            lamports,
        );
        let blockhash = self
            .ledger
            .latest_blockhash()
            .await
            .map_err(|e| SwarmError::remote(&e))?;
        let msg = Message::new(&[ix], Some(&from));
        let mut tx = Transaction::new_unsigned(msg);
        tx.try_sign(&[source.keypair()], blockhash)
            .map_err(|e| SwarmError::Remote(format!("sign transfer: {e}")))?;

        let signature = match self.ledger.submit(&tx).await {
            Ok(sig) => sig,
            Err(e) => {
                warn!(
                    from = %from,
                    to = %dest,
                    lamports,
                    error = %format!("{e:#}"),
                    "transfer failed"
                );
                return Err(SwarmError::remote(&e));
            }
        };
        info!(from = %from, to = %dest, lamports, signature = %signature, "transfer confirmed");
        Ok(TransferReceipt {
            from,
            to: dest,
            amount: amount.normalize(),
            signature,
        })
    }

    pub async fn token_market_data(&self, address: &str) -> Result<Value, SwarmError> {
        self.market
            .token_overview(address)
            .await
            .map_err(|e| SwarmError::remote(&e))
    }

    pub async fn token_ohlc(&self, address: &str) -> Result<Value, SwarmError> {
        self.market
            .token_ohlcv(address)
            .await
            .map_err(|e| SwarmError::remote(&e))
    }

    pub async fn token_balance(
        &self,
        wallets: &KeypairStore,
        index: i64,
        token_address: &str,
    ) -> Result<(Pubkey, Value), SwarmError> {
        let owner = wallets.get(index)?.pubkey();
        let doc = self
            .market
            .wallet_token_balance(&owner.to_string(), token_address)
            .await
            .map_err(|e| SwarmError::remote(&e))?;
        Ok((owner, doc))
    }
}

/// The candle with the greatest `unixTime` in an OHLCV document's `items`.
pub fn latest_ohlc(doc: &Value) -> Option<&Value> {
    doc.get("items")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|item| item.get("unixTime").and_then(Value::as_i64).map(|t| (t, item)))
        .max_by_key(|(t, _)| *t)
        .map(|(_, item)| item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::Db, testing::{FakeLedger, FakeMarket}};
    use serde_json::json;
    use std::str::FromStr as _;

    async fn two_wallets(td: &tempfile::TempDir) -> eyre::Result<(Db, KeypairStore)> {
        let db = Db::open_at(&td.path().join("swarm.db")).await?;
        let mut store = KeypairStore::default();
        store.create(&db).await?;
        store.create(&db).await?;
        Ok((db, store))
    }

    #[tokio::test]
    async fn transfer_moves_lamports_and_reports_both_keys() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let (_db, store) = two_wallets(&td).await?;
        let a = store.get(1)?.pubkey();
        let b = store.get(2)?.pubkey();
        let gw = Gateway::new(FakeLedger::with_balance(a, 2_000_000_000), FakeMarket::default());

        let r = gw
            .transfer(&store, 1, 2, Decimal::from_str("0.5")?)
            .await?;
        assert_eq!((r.from, r.to), (a, b));
        assert_eq!(gw.ledger().submissions(), 1);
        assert_eq!(gw.ledger().lamports(&b), 500_000_000);
        assert_eq!(gw.balance(&store, 2).await?.1, Decimal::from_str("0.5")?);
        Ok(())
    }

    #[tokio::test]
    async fn insufficient_funds_is_a_remote_error() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let (_db, store) = two_wallets(&td).await?;
        let a = store.get(1)?.pubkey();
        let gw = Gateway::new(FakeLedger::with_balance(a, 1_000), FakeMarket::default());

        let res = gw.transfer(&store, 1, 2, Decimal::ONE).await;
        assert!(matches!(res, Err(SwarmError::Remote(_))));
        assert_eq!(gw.ledger().lamports(&a), 1_000);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_transfers_never_reach_the_ledger() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let (_db, store) = two_wallets(&td).await?;
        let gw = Gateway::new(FakeLedger::default(), FakeMarket::default());

        assert_eq!(
            gw.transfer(&store, 1, 1, Decimal::ONE).await.err(),
            Some(SwarmError::SameAccount(1))
        );
        assert!(matches!(
            gw.transfer(&store, 1, 2, Decimal::ZERO).await,
            Err(SwarmError::MalformedArgument(_))
        ));
        assert!(matches!(
            gw.transfer(&store, 1, 3, Decimal::ONE).await,
            Err(SwarmError::InvalidIndex { index: 3, count: 2 })
        ));
        assert_eq!(gw.ledger().submissions(), 0);
        Ok(())
    }

    #[test]
    fn latest_ohlc_picks_greatest_timestamp() {
        let doc = json!({ "items": [
            { "unixTime": 1_700_000_900, "c": 2.0 },
            { "unixTime": 1_700_001_800, "c": 3.0 },
            { "unixTime": 1_700_000_000, "c": 1.0 }
        ]});
        let latest = latest_ohlc(&doc).and_then(|v| v.get("c")).and_then(Value::as_f64);
        assert_eq!(latest, Some(3.0));
        assert!(latest_ohlc(&json!({ "items": [] })).is_none());
        assert!(latest_ohlc(&json!({})).is_none());
    }
}
