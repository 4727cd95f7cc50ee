use thiserror::Error;

/// Failure kinds surfaced by tool handlers.
///
/// Every variant except [`SwarmError::Persist`] is rendered into an `"Error: ..."` string at the
/// tool boundary and handed back to the agent as an ordinary tool result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwarmError {
    #[error("account index {index} is out of range (valid range is 1..={count})")]
    InvalidIndex { index: i64, count: usize },

    #[error("{0}")]
    Remote(String),

    #[error("no token found matching \"{0}\"")]
    TokenNotFound(String),

    #[error("no OHLC data available for {0}")]
    NoOhlcData(String),

    #[error("invalid argument: {0}")]
    MalformedArgument(String),

    #[error("source and destination accounts are the same (account {0})")]
    SameAccount(usize),

    /// A newly generated wallet could not be written to storage. The in-memory index would drift
    /// from what reloads at the next start, so this is not recoverable at the tool boundary.
    #[error("failed to persist wallet: {0}")]
    Persist(String),
}

impl SwarmError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidIndex { .. } => "invalid_index",
            Self::Remote(_) => "remote_call_failed",
            Self::TokenNotFound(_) | Self::NoOhlcData(_) => "lookup_miss",
            Self::MalformedArgument(_) | Self::SameAccount(_) => "malformed_argument",
            Self::Persist(_) => "persist_failed",
        }
    }

    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Persist(_))
    }

    /// Wrap a plumbing error (RPC, HTTP) keeping its full context chain.
    pub fn remote(e: &eyre::Report) -> Self {
        Self::Remote(format!("{e:#}"))
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedArgument(msg.into())
    }
}

/// Collapse a handler result into the text the agent sees.
pub fn render_tool_text(res: &Result<String, SwarmError>) -> String {
    match res {
        Ok(s) => s.clone(),
        Err(e) => format!("Error: {e}"),
    }
}
