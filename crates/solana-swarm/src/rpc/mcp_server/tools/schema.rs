use super::ToolKind;
use serde_json::{json, Value};

fn no_args() -> Value {
    json!({ "type": "object", "properties": {}, "additionalProperties": false })
}

fn account_index(description: &str) -> Value {
    json!({
        "type": ["integer", "string"],
        "description": description
    })
}

fn token_query() -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "description": "Token name or symbol, matched case-insensitively as a substring (e.g. \"usdc\", \"jupiter\")."
    })
}

fn description(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::ListWallets => "List all wallets created so far as `index: public key` lines. Indices are 1-based.",
        ToolKind::CreateAccount => "Create a new Solana wallet and return its 1-based index and public key.",
        ToolKind::GetBalance => "Get the SOL balance of a wallet by its 1-based index.",
        ToolKind::TransferSol => "Transfer SOL between two of the managed wallets, identified by 1-based index. Submits a transaction and waits for confirmation.",
        ToolKind::MapTokenNameToInfo => "Resolve a token name or symbol to its mint address and decimals using the verified token list.",
        ToolKind::GetTradingInfo => "Resolve a token by name or symbol and fetch its market overview (price, liquidity, volume).",
        ToolKind::GetOhlcData => "Resolve a token by name or symbol and return the most recent 15m OHLC candle from the last 24 hours.",
        ToolKind::GetTokenBalance => "Resolve a token by name or symbol and fetch a wallet's balance of that token from the market data API.",
    }
}

fn input_schema(kind: ToolKind) -> Value {
    match kind {
        ToolKind::ListWallets | ToolKind::CreateAccount => no_args(),
        ToolKind::GetBalance => json!({
            "type": "object",
            "properties": { "account_index": account_index("1-based wallet index from list_wallets.") },
            "required": ["account_index"],
            "additionalProperties": false
        }),
        ToolKind::TransferSol => json!({
            "type": "object",
            "properties": {
                "from_account_index": account_index("1-based index of the paying wallet."),
                "to_account_index": account_index("1-based index of the receiving wallet."),
                "amount": {
                    "type": ["number", "string"],
                    "description": "Amount in SOL (up to 9 decimal places). Must be greater than zero."
                }
            },
            "required": ["from_account_index", "to_account_index", "amount"],
            "additionalProperties": false
        }),
        ToolKind::MapTokenNameToInfo | ToolKind::GetTradingInfo | ToolKind::GetOhlcData => json!({
            "type": "object",
            "properties": { "query": token_query() },
            "required": ["query"],
            "additionalProperties": false
        }),
        ToolKind::GetTokenBalance => json!({
            "type": "object",
            "properties": {
                "account_index": account_index("1-based wallet index from list_wallets."),
                "query": token_query()
            },
            "required": ["account_index", "query"],
            "additionalProperties": false
        }),
    }
}

pub fn list_tools_result() -> Value {
    let tools: Vec<Value> = ToolKind::ALL
        .iter()
        .map(|k| {
            json!({
                "name": k.name(),
                "description": description(*k),
                "inputSchema": input_schema(*k)
            })
        })
        .collect();
    json!({ "tools": tools })
}
