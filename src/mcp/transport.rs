//! Newline-delimited stdio transport: one request per line in, one response
//! per line out, strictly in arrival order.

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{JsonRpcResponse, McpServer, RpcError};
use crate::host::{ProcessLauncher, ProjectValidator};
use crate::{log_debug, log_info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeReport {
    /// Non-blank lines read.
    pub requests: usize,
    pub responses: usize,
    /// Responses carrying a JSON-RPC `error`.
    pub errors: usize,
}

/// Longest accepted request line in bytes, newline excluded.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Serve until end of input.
///
/// Blank lines are skipped. A line that is not valid UTF-8 is answered with
/// a parse error like any other malformed JSON.
pub async fn serve<H, R, W>(server: &McpServer<H>, reader: R, writer: W) -> Result<ServeReport>
where
    H: ProcessLauncher + ProjectValidator,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    serve_with_limit(server, reader, writer, MAX_LINE_BYTES).await
}

/// [`serve`] with an explicit line cap. Longer lines are discarded up to the
/// next newline and answered with `-32600` and a `null` id.
pub async fn serve_with_limit<H, R, W>(
    server: &McpServer<H>,
    mut reader: R,
    mut writer: W,
    max_line: usize,
) -> Result<ServeReport>
where
    H: ProcessLauncher + ProjectValidator,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut report = ServeReport::default();
    let mut buf = Vec::new();
    let cap = u64::try_from(max_line).unwrap_or(u64::MAX).saturating_add(1);

    loop {
        buf.clear();
        let read = (&mut reader)
            .take(cap)
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read from input stream")?;
        if read == 0 {
            break;
        }

        if buf.len() > max_line && buf.last() != Some(&b'\n') {
            discard_line(&mut reader).await?;
            report.requests += 1;
            log_debug!("dropping request line longer than {max_line} bytes");
            let response = JsonRpcResponse::failure(
                Value::Null,
                RpcError::invalid_request(format!("request line exceeds {max_line} bytes")),
            );
            report.errors += 1;
            write_response(&mut writer, &response).await?;
            report.responses += 1;
            continue;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                report.requests += 1;
                server.handle_line(line).await
            }
            Err(_) => {
                report.requests += 1;
                log_debug!("input line is not valid UTF-8");
                Some(JsonRpcResponse::failure(Value::Null, RpcError::parse_error()))
            }
        };

        let Some(response) = response else {
            continue;
        };
        if response.is_error() {
            report.errors += 1;
        }
        write_response(&mut writer, &response).await?;
        report.responses += 1;
    }

    log_info!(
        "input closed: {} request(s), {} response(s), {} error(s)",
        report.requests,
        report.responses,
        report.errors
    );
    Ok(report)
}

/// Skip input up to and including the next newline (or end of input).
async fn discard_line<R>(reader: &mut R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (found, used) = {
            let chunk = reader
                .fill_buf()
                .await
                .context("Failed to read from input stream")?;
            if chunk.is_empty() {
                return Ok(());
            }
            match chunk.iter().position(|b| *b == b'\n') {
                Some(i) => (true, i + 1),
                None => (false, chunk.len()),
            }
        };
        reader.consume(used);
        if found {
            return Ok(());
        }
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let encoded = match serde_json::to_string(response) {
        Ok(encoded) => encoded,
        Err(e) => serde_json::to_string(&JsonRpcResponse::failure(
            response.id.clone(),
            RpcError::internal(e.to_string()),
        ))?,
    };
    writer
        .write_all(encoded.as_bytes())
        .await
        .context("Failed to write response")?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
