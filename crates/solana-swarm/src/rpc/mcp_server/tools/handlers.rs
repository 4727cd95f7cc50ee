use super::WalletTools;
use crate::{
    errors::SwarmError,
    gateway::{latest_ohlc, Ledger, MarketData},
    rpc::mcp_server::SharedState,
};
use rust_decimal::Decimal;
use serde_json::Value;

fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_e| v.to_string())
}

impl<L: Ledger, M: MarketData> WalletTools for SharedState<L, M> {
    async fn list_wallets(&self) -> Result<String, SwarmError> {
        if self.wallets.is_empty() {
            return Ok("No wallets found".to_owned());
        }
        Ok(self
            .wallets
            .list()
            .iter()
            .map(|(i, pk)| format!("{i}: {pk}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn create_account(&mut self) -> Result<String, SwarmError> {
        let (index, wallet) = self.wallets.create(&self.db).await?;
        Ok(format!(
            "Created new account: {index} with public key: {}",
            wallet.pubkey()
        ))
    }

    async fn get_balance(&self, account_index: i64) -> Result<String, SwarmError> {
        let (owner, sol) = self.gateway.balance(&self.wallets, account_index).await?;
        Ok(format!("Balance of {owner} is {sol} SOL"))
    }

    async fn transfer_sol(
        &self,
        from_account_index: i64,
        to_account_index: i64,
        amount: Decimal,
    ) -> Result<String, SwarmError> {
        let r = self
            .gateway
            .transfer(&self.wallets, from_account_index, to_account_index, amount)
            .await?;
        Ok(format!(
            "Transferred {} SOL from {} to {} with transaction ID: {}",
            r.amount, r.from, r.to, r.signature
        ))
    }

    async fn map_token_name_to_info(&self, query: &str) -> Result<String, SwarmError> {
        Ok(self.tokens.resolve(query)?.describe())
    }

    async fn get_trading_info(&self, query: &str) -> Result<String, SwarmError> {
        let token = self.tokens.resolve(query)?;
        let doc = self.gateway.token_market_data(&token.address).await?;
        Ok(format!("{}\nMarket data: {}", token.describe(), pretty(&doc)))
    }

    async fn get_ohlc_data(&self, query: &str) -> Result<String, SwarmError> {
        let token = self.tokens.resolve(query)?;
        let doc = self.gateway.token_ohlc(&token.address).await?;
        let latest = latest_ohlc(&doc).ok_or_else(|| {
            SwarmError::NoOhlcData(format!("{} ({})", token.symbol, token.address))
        })?;
        Ok(format!("{}\nLatest OHLC: {}", token.describe(), pretty(latest)))
    }

    async fn get_token_balance(
        &self,
        account_index: i64,
        query: &str,
    ) -> Result<String, SwarmError> {
        let token = self.tokens.resolve(query)?;
        let (owner, doc) = self
            .gateway
            .token_balance(&self.wallets, account_index, &token.address)
            .await?;
        Ok(format!(
            "{}\nBalance for {owner}: {}",
            token.describe(),
            pretty(&doc)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{call_tool, handle_tools_call, ToolKind, ToolReply};
    use super::*;
    use crate::{
        db::Db,
        gateway::Gateway,
        testing::{FakeLedger, FakeMarket, FAKE_FEE_LAMPORTS},
        tokens::parse_catalog,
    };
    use serde_json::json;

    type TestState = SharedState<FakeLedger, FakeMarket>;

    async fn state_with(
        td: &tempfile::TempDir,
        ledger: FakeLedger,
        market: FakeMarket,
    ) -> eyre::Result<TestState> {
        let db = Db::open_at(&td.path().join("swarm.db")).await?;
        let mut state = SharedState::with_gateway(db, Gateway::new(ledger, market)).await?;
        let catalog = parse_catalog(json!([
            { "address": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "name": "USD Coin", "symbol": "USDC", "decimals": 6 },
            { "address": "So11111111111111111111111111111111111111112", "name": "Wrapped SOL", "symbol": "SOL", "decimals": 9 }
        ]))?;
        state.tokens.store_catalog(&state.db, &catalog).await?;
        Ok(state)
    }

    async fn call(
        state: &mut TestState,
        kind: ToolKind,
        args: Value,
    ) -> Result<String, SwarmError> {
        call_tool(state, kind, &args).await
    }

    #[tokio::test]
    async fn create_then_list_in_creation_order() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let mut s = state_with(&td, FakeLedger::default(), FakeMarket::default()).await?;

        assert_eq!(call(&mut s, ToolKind::ListWallets, Value::Null).await?, "No wallets found");
        let mut keys = vec![];
        for n in 1..=3 {
            let out = call(&mut s, ToolKind::CreateAccount, json!({})).await?;
            assert!(out.starts_with(&format!("Created new account: {n} with public key: ")));
            keys.push(s.wallets.get(n)?.pubkey().to_string());
        }
        let listed = call(&mut s, ToolKind::ListWallets, json!({})).await?;
        let expected: Vec<String> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| format!("{}: {k}", i + 1))
            .collect();
        assert_eq!(listed, expected.join("\n"));
        Ok(())
    }

    #[tokio::test]
    async fn balance_outside_range_is_an_error_string() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let mut s = state_with(&td, FakeLedger::default(), FakeMarket::default()).await?;
        call(&mut s, ToolKind::CreateAccount, json!({})).await?;

        for bad in [json!(0), json!(2), json!("-1")] {
            let args = json!({ "account_index": bad });
            let reply = handle_tools_call(json!(1), "get_balance", &args, &mut s).await;
            let ToolReply::Done(resp) = reply else {
                eyre::bail!("unexpected fatal reply");
            };
            let result = resp.result.unwrap_or_default();
            assert_eq!(result.get("isError"), Some(&json!(true)));
            let text = result
                .pointer("/content/0/text")
                .and_then(Value::as_str)
                .unwrap_or_default();
            assert!(text.starts_with("Error: account index"), "got {text}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn transfer_end_to_end_reports_both_keys_and_signature() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let mut s = state_with(&td, FakeLedger::default(), FakeMarket::default()).await?;
        call(&mut s, ToolKind::CreateAccount, json!({})).await?;
        call(&mut s, ToolKind::CreateAccount, json!({})).await?;
        let a = s.wallets.get(1)?.pubkey();
        let b = s.wallets.get(2)?.pubkey();
        s.gateway = Gateway::new(FakeLedger::with_balance(a, 1_000_000_000), FakeMarket::default());

        let out = call(
            &mut s,
            ToolKind::TransferSol,
            json!({ "from_account_index": 1, "to_account_index": "2", "amount": 0.5 }),
        )
        .await?;
        let expected = format!("Transferred 0.5 SOL from {a} to {b} with transaction ID: ");
        assert!(out.starts_with(&expected));
        let sig = out.rsplit(' ').next().unwrap_or_default();
        assert!(sig.len() > 60, "signature missing: {out}");

        assert_eq!(
            call(&mut s, ToolKind::GetBalance, json!({ "account_index": 2 })).await?,
            format!("Balance of {b} is 0.5 SOL")
        );
        assert_eq!(
            s.gateway.ledger().lamports(&a),
            500_000_000 - FAKE_FEE_LAMPORTS
        );
        Ok(())
    }

    #[tokio::test]
    async fn insufficient_funds_leaves_wallets_unchanged() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let mut s = state_with(&td, FakeLedger::default(), FakeMarket::default()).await?;
        call(&mut s, ToolKind::CreateAccount, json!({})).await?;
        call(&mut s, ToolKind::CreateAccount, json!({})).await?;
        let before = call(&mut s, ToolKind::ListWallets, json!({})).await?;

        let reply = handle_tools_call(
            json!(7),
            "transfer_sol",
            &json!({ "from_account_index": 1, "to_account_index": 2, "amount": "3" }),
            &mut s,
        )
        .await;
        let ToolReply::Done(resp) = reply else {
            eyre::bail!("unexpected fatal reply");
        };
        let text = resp
            .result
            .as_ref()
            .and_then(|r| r.pointer("/content/0/text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        assert!(text.starts_with("Error: "), "got {text}");
        assert!(text.contains("insufficient funds"), "got {text}");

        assert_eq!(call(&mut s, ToolKind::ListWallets, json!({})).await?, before);
        let reloaded = crate::wallet::KeypairStore::load_all(&s.db).await?;
        assert_eq!(reloaded.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn self_transfer_and_zero_amount_are_rejected() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let mut s = state_with(&td, FakeLedger::default(), FakeMarket::default()).await?;
        call(&mut s, ToolKind::CreateAccount, json!({})).await?;
        call(&mut s, ToolKind::CreateAccount, json!({})).await?;

        let same = call(
            &mut s,
            ToolKind::TransferSol,
            json!({ "from_account_index": 2, "to_account_index": 2, "amount": 1 }),
        )
        .await;
        assert_eq!(same, Err(SwarmError::SameAccount(2)));

        let zero = call(
            &mut s,
            ToolKind::TransferSol,
            json!({ "from_account_index": 1, "to_account_index": 2, "amount": 0 }),
        )
        .await;
        assert!(matches!(zero, Err(SwarmError::MalformedArgument(_))));
        assert_eq!(s.gateway.ledger().submissions(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn token_tools_resolve_then_call_market() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let mut s = state_with(&td, FakeLedger::default(), FakeMarket::default()).await?;

        let info = call(&mut s, ToolKind::MapTokenNameToInfo, json!({ "query": "usdc" })).await?;
        assert!(info.contains("USD Coin (USDC)"));
        assert!(info.contains("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"));

        let missing = call(
            &mut s,
            ToolKind::MapTokenNameToInfo,
            json!({ "query": "doesnotexist" }),
        )
        .await;
        assert_eq!(missing, Err(SwarmError::TokenNotFound("doesnotexist".into())));

        let trading = call(&mut s, ToolKind::GetTradingInfo, json!({ "query": "USDC" })).await?;
        assert!(trading.contains("\"price\": 1.0001"));

        let ohlc = call(&mut s, ToolKind::GetOhlcData, json!({ "query": "wrapped" })).await?;
        assert!(ohlc.contains("1726671600"), "latest candle not chosen: {ohlc}");

        call(&mut s, ToolKind::CreateAccount, json!({})).await?;
        let bal = call(
            &mut s,
            ToolKind::GetTokenBalance,
            json!({ "account_index": 1, "query": "usdc" }),
        )
        .await?;
        assert!(bal.contains("\"uiAmount\": 12.5"));
        Ok(())
    }

    #[tokio::test]
    async fn empty_ohlc_and_market_failures_become_errors() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let market = FakeMarket {
            ohlcv: json!({ "items": [] }),
            ..FakeMarket::default()
        };
        let mut s = state_with(&td, FakeLedger::default(), market).await?;
        let empty = call(&mut s, ToolKind::GetOhlcData, json!({ "query": "usdc" })).await;
        assert!(matches!(empty, Err(SwarmError::NoOhlcData(_))));

        s.gateway = Gateway::new(
            FakeLedger::default(),
            FakeMarket {
                fail: true,
                ..FakeMarket::default()
            },
        );
        let down = call(&mut s, ToolKind::GetTradingInfo, json!({ "query": "usdc" })).await;
        assert!(matches!(down, Err(SwarmError::Remote(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found() -> eyre::Result<()> {
        let td = tempfile::tempdir()?;
        let mut s = state_with(&td, FakeLedger::default(), FakeMarket::default()).await?;
        let reply = handle_tools_call(json!(3), "swap_tokens", &json!({}), &mut s).await;
        let ToolReply::Done(resp) = reply else {
            eyre::bail!("unexpected fatal reply");
        };
        assert_eq!(resp.error.map(|e| e.code), Some(-32601));
        Ok(())
    }
}
