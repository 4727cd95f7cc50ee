use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Number of full rounds. Each round tries every endpoint once.
    pub rounds: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Random jitter (`0..=jitter_max_ms`) added to each backoff sleep.
    pub jitter_max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            // Bounded so a dead cluster fails a tool call in seconds, not minutes.
            rounds: 2,
            base_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(2),
            jitter_max_ms: 200,
        }
    }
}

fn backoff_delay(cfg: &BackoffConfig, round: usize) -> Duration {
    let shift = u32::try_from(round.min(16)).unwrap_or(16_u32);
    let base_ms = u64::try_from(cfg.base_delay.as_millis()).unwrap_or(u64::MAX);
    let max_ms = u64::try_from(cfg.max_delay.as_millis()).unwrap_or(u64::MAX);
    let ms = base_ms
        .saturating_mul(1_u64.checked_shl(shift).unwrap_or(u64::MAX))
        .min(max_ms);
    let jitter = if cfg!(test) || cfg.jitter_max_ms == 0 {
        0
    } else {
        rand::random::<u64>() % cfg.jitter_max_ms.saturating_add(1).max(1)
    };
    Duration::from_millis(ms.saturating_add(jitter))
}

/// Run `op` against each endpoint in order until one succeeds. After a full round of failures,
/// sleep with exponential backoff and start over, up to `cfg.rounds` rounds. The last error is
/// returned wrapped in `context_label`.
///
/// Only for idempotent reads. Transaction submission must not go through here.
pub async fn try_endpoints<T, Fut>(
    endpoints: &[String],
    cfg: &BackoffConfig,
    mut op: impl FnMut(&str) -> Fut,
    context_label: &'static str,
) -> eyre::Result<T>
where
    Fut: std::future::Future<Output = eyre::Result<T>>,
{
    if endpoints.is_empty() {
        eyre::bail!("no endpoints configured");
    }
    if cfg.rounds == 0 {
        eyre::bail!("invalid backoff config: rounds=0");
    }

    let mut last_err: Option<eyre::Report> = None;
    for round in 0..cfg.rounds {
        for url in endpoints {
            match op(url).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    debug!(
                        endpoint = %url,
                        round,
                        error = %e,
                        op = context_label,
                        "endpoint failed"
                    );
                    last_err = Some(e);
                }
            }
        }
        if round + 1 < cfg.rounds {
            tokio::time::sleep(backoff_delay(cfg, round)).await;
        }
    }

    Err(last_err
        .unwrap_or_else(|| eyre::eyre!("unknown error"))
        .wrap_err(context_label))
}
