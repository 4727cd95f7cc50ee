use eyre::Context as _;
use reqwest::Client;
use std::time::Duration;

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

fn allow_insecure_http() -> bool {
    std::env::var("SOLANA_SWARM_ALLOW_INSECURE_HTTP")
        .ok()
        .is_some_and(|v| {
            matches!(
                v.as_str(),
                "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON"
            )
        })
}

pub fn is_loopback_http(url: &str) -> bool {
    fn host_prefix_ok(s: &str, prefix: &str) -> bool {
        if !s.starts_with(prefix) {
            return false;
        }
        matches!(s.as_bytes().get(prefix.len()), None | Some(b':' | b'/'))
    }
    let u = url.trim();
    host_prefix_ok(u, "http://127.0.0.1")
        || host_prefix_ok(u, "http://localhost")
        || host_prefix_ok(u, "http://[::1]")
}

/// API keys travel in headers, so plain http is only accepted for local test servers.
pub fn ensure_https_or_loopback(url: &str, label: &str) -> eyre::Result<()> {
    let u = url.trim();
    if u.starts_with("https://") || is_loopback_http(u) || allow_insecure_http() {
        return Ok(());
    }
    eyre::bail!(
        "{label} must use https (or loopback); set SOLANA_SWARM_ALLOW_INSECURE_HTTP=1 to override"
    )
}

pub fn client() -> eyre::Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("solana-swarm/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build http client")
}
