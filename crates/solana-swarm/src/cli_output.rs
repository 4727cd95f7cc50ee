//! Human-facing notices written to stderr. Stdout carries MCP frames and JSON command output.

use std::io::{IsTerminal as _, Write as _};

fn stderr_writeln(s: &str) {
    let mut stderr = std::io::stderr().lock();
    if stderr.write_all(s.as_bytes()).is_err() {
        return;
    }
    if stderr.write_all(b"\n").is_err() {
        return;
    }
    let _flush = stderr.flush();
}

fn banner_enabled() -> bool {
    match std::env::var("SOLANA_SWARM_BANNER") {
        Ok(v) => {
            let v = v.trim().to_ascii_lowercase();
            !(v.is_empty() || v == "0" || v == "false" || v == "no" || v == "off")
        }
        Err(_) => std::io::stderr().is_terminal(),
    }
}

/// Startup banner for operators running the server by hand. Never includes secrets.
pub fn print_mcp_banner(version: &str, network: &str, rpc_url: &str) {
    if !banner_enabled() {
        return;
    }
    stderr_writeln(&format!(
        "solana-swarm MCP\n================\nVersion : v{version}\nNetwork : {network}\nRPC     : {rpc_url}\n"
    ));
}

pub fn warn_missing_market_key() {
    stderr_writeln(
        "warning: no market data API key configured; get_trading_info, get_ohlc_data and \
         get_token_balance will return errors. Set BIRDEYE_API_KEY or http.market_data_api_key.",
    );
}
