mod args;
mod handlers;
mod schema;

pub use schema::list_tools_result;

use super::jsonrpc::{err, ok, tool_text, JsonRpcResponse, METHOD_NOT_FOUND};
use crate::errors::{render_tool_text, SwarmError};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{info, warn};

/// Every tool the agent can call. The only place tool names are spelled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ListWallets,
    CreateAccount,
    GetBalance,
    TransferSol,
    MapTokenNameToInfo,
    GetTradingInfo,
    GetOhlcData,
    GetTokenBalance,
}

impl ToolKind {
    pub const ALL: [Self; 8] = [
        Self::ListWallets,
        Self::CreateAccount,
        Self::GetBalance,
        Self::TransferSol,
        Self::MapTokenNameToInfo,
        Self::GetTradingInfo,
        Self::GetOhlcData,
        Self::GetTokenBalance,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::ListWallets => "list_wallets",
            Self::CreateAccount => "create_account",
            Self::GetBalance => "get_balance",
            Self::TransferSol => "transfer_sol",
            Self::MapTokenNameToInfo => "map_token_name_to_info",
            Self::GetTradingInfo => "get_trading_info",
            Self::GetOhlcData => "get_ohlc_data",
            Self::GetTokenBalance => "get_token_balance",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// The operations behind the tools, with arguments already parsed. Each returns the text the
/// agent reads on success.
pub trait WalletTools {
    async fn list_wallets(&self) -> Result<String, SwarmError>;
    async fn create_account(&mut self) -> Result<String, SwarmError>;
    async fn get_balance(&self, account_index: i64) -> Result<String, SwarmError>;
    async fn transfer_sol(
        &self,
        from_account_index: i64,
        to_account_index: i64,
        amount: Decimal,
    ) -> Result<String, SwarmError>;
    async fn map_token_name_to_info(&self, query: &str) -> Result<String, SwarmError>;
    async fn get_trading_info(&self, query: &str) -> Result<String, SwarmError>;
    async fn get_ohlc_data(&self, query: &str) -> Result<String, SwarmError>;
    async fn get_token_balance(&self, account_index: i64, query: &str)
        -> Result<String, SwarmError>;
}

/// Parse `arguments` for `kind` and run it.
pub async fn call_tool<T: WalletTools>(
    tools: &mut T,
    kind: ToolKind,
    arguments: &Value,
) -> Result<String, SwarmError> {
    match kind {
        ToolKind::ListWallets => tools.list_wallets().await,
        ToolKind::CreateAccount => tools.create_account().await,
        ToolKind::GetBalance => {
            tools
                .get_balance(args::index(arguments, "account_index")?)
                .await
        }
        ToolKind::TransferSol => {
            let from = args::index(arguments, "from_account_index")?;
            let to = args::index(arguments, "to_account_index")?;
            let amount = args::sol_amount(arguments, "amount")?;
            tools.transfer_sol(from, to, amount).await
        }
        ToolKind::MapTokenNameToInfo => {
            tools
                .map_token_name_to_info(&args::text(arguments, "query")?)
                .await
        }
        ToolKind::GetTradingInfo => tools.get_trading_info(&args::text(arguments, "query")?).await,
        ToolKind::GetOhlcData => tools.get_ohlc_data(&args::text(arguments, "query")?).await,
        ToolKind::GetTokenBalance => {
            let index = args::index(arguments, "account_index")?;
            let query = args::text(arguments, "query")?;
            tools.get_token_balance(index, &query).await
        }
    }
}

#[derive(Debug)]
pub enum ToolReply {
    Done(JsonRpcResponse),
    /// The response to send before shutting down, and the error that forces it.
    Fatal(JsonRpcResponse, SwarmError),
}

pub async fn handle_tools_call<T: WalletTools>(
    req_id: Value,
    tool_name: &str,
    arguments: &Value,
    tools: &mut T,
) -> ToolReply {
    let Some(kind) = ToolKind::from_name(tool_name) else {
        return ToolReply::Done(err(
            req_id,
            METHOD_NOT_FOUND,
            format!("unknown tool: {tool_name}"),
        ));
    };

    let res = call_tool(tools, kind, arguments).await;
    match &res {
        Ok(_) => info!(tool = tool_name, "tool call ok"),
        Err(e) if e.is_fatal() => {
            return ToolReply::Fatal(
                err(req_id, super::jsonrpc::INTERNAL_ERROR, e.to_string()),
                e.clone(),
            );
        }
        Err(e) => warn!(tool = tool_name, code = e.code(), error = %e, "tool call failed"),
    }
    ToolReply::Done(ok(req_id, tool_text(render_tool_text(&res), res.is_err())))
}
