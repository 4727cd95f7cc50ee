use crate::{config::SwarmConfig, paths::SwarmPaths};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::BufReader;
use tracing::{error, info, warn};

mod jsonrpc;
mod state;
mod tools;
mod transport;

use jsonrpc::{err, ok};
use transport::Inbound;
use state::LiveState;
use tools::{handle_tools_call, list_tools_result, ToolReply};

pub use state::SharedState;
pub use tools::WalletTools;

pub const PROTOCOL_VERSION: &str = "2025-06-18";

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

fn initialize_result() -> Value {
    json!({
      "protocolVersion": PROTOCOL_VERSION,
      "serverInfo": { "name": "solana-swarm", "version": env!("CARGO_PKG_VERSION") },
      "capabilities": { "tools": {} }
    })
}

pub async fn run(
    paths: &SwarmPaths,
    cfg: &SwarmConfig,
    refresh_tokens: bool,
) -> eyre::Result<()> {
    let mut shared = LiveState::open(paths, cfg, refresh_tokens).await?;
    let mut stdout = tokio::io::stdout();
    serve(&mut shared, tokio::io::stdin(), &mut stdout).await
}

/// Answer requests from `input` one line at a time until EOF. Returns an error only for I/O
/// failures and for tool errors that leave the wallet store inconsistent.
pub async fn serve<T, R, W>(tools: &mut T, input: R, out: &mut W) -> eyre::Result<()>
where
    T: WalletTools,
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();
    info!("mcp server ready");

    loop {
        let line = match transport::read_line(&mut reader, &mut buf).await? {
            Inbound::Line(line) => line,
            Inbound::Invalid => continue,
            Inbound::TooLong => {
                warn!(
                    limit = transport::MAX_JSONRPC_LINE_BYTES,
                    "request line too long; closing session"
                );
                break;
            }
            Inbound::Eof => break,
        };
        let Some(v) = transport::parse_frame(&line) else {
            continue;
        };

        // Notifications carry no id and get no response.
        let Some(id) = v.get("id").cloned() else {
            continue;
        };

        let req: JsonRpcRequest = match serde_json::from_value(v) {
            Ok(parsed_req) => parsed_req,
            Err(e) => {
                warn!(error = %e, "failed to parse jsonrpc request");
                transport::write_frame(out, &err(id, jsonrpc::INVALID_REQUEST, "invalid request"))
                    .await?;
                continue;
            }
        };

        if req.jsonrpc != "2.0" {
            transport::write_frame(
                out,
                &err(req.id, jsonrpc::INVALID_REQUEST, "invalid jsonrpc version"),
            )
            .await?;
            continue;
        }

        let resp = match req.method.as_str() {
            "initialize" => ok(req.id, initialize_result()),
            "ping" => ok(req.id, json!({})),
            "tools/list" => ok(req.id, list_tools_result()),
            "tools/call" => {
                let name = req
                    .params
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let args = req.params.get("arguments").cloned().unwrap_or(Value::Null);
                match handle_tools_call(req.id, name, &args, tools).await {
                    ToolReply::Done(r) => r,
                    ToolReply::Fatal(r, e) => {
                        error!(error = %e, "fatal tool error; shutting down");
                        transport::write_frame(out, &r).await?;
                        return Err(eyre::Report::new(e));
                    }
                }
            }
            _ => err(req.id, jsonrpc::METHOD_NOT_FOUND, "method not found"),
        };

        transport::write_frame(out, &resp).await?;
    }

    info!("stdin closed; mcp server exiting");
    Ok(())
}
