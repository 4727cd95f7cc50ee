use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncReadExt as _};
use tracing::warn;

/// Longest request line accepted on stdin. Longer input ends the session.
pub const MAX_JSONRPC_LINE_BYTES: usize = 1_000_000;

#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    Line(String),
    /// Not UTF-8; already logged.
    Invalid,
    TooLong,
    Eof,
}

/// Read one newline-terminated line, buffering at most a little over the line cap.
pub async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> eyre::Result<Inbound>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    // Room for the cap plus a CRLF terminator.
    let cap = u64::try_from(MAX_JSONRPC_LINE_BYTES + 2).unwrap_or(u64::MAX);
    let n = (&mut *reader).take(cap).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(Inbound::Eof);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    if buf.len() > MAX_JSONRPC_LINE_BYTES {
        return Ok(Inbound::TooLong);
    }
    match std::str::from_utf8(buf) {
        Ok(s) => Ok(Inbound::Line(s.to_owned())),
        Err(e) => {
            warn!(error = %e, bytes = buf.len(), "non utf-8 line on stdin");
            Ok(Inbound::Invalid)
        }
    }
}

/// Parse one stdin line. Blank and malformed lines are logged and skipped.
pub fn parse_frame(line: &str) -> Option<Value> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "invalid json on stdin");
            None
        }
    }
}

/// Frames are newline-delimited JSON, flushed one at a time.
pub async fn write_frame<W, T>(out: &mut W, v: &T) -> eyre::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
    T: Serialize,
{
    use tokio::io::AsyncWriteExt as _;

    let mut buf = serde_json::to_vec(v)?;
    buf.push(b'\n');
    out.write_all(&buf).await?;
    out.flush().await?;
    Ok(())
}
