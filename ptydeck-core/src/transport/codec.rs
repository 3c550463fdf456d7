//! JSON-lines framing: one message per `\n`-terminated line.

use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

pub fn encode_line<T: Serialize>(message: &T) -> Result<String, CodecError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(line.trim_end_matches(['\r', '\n']))
}

/// Read messages from `reader` and forward them until EOF or until the
/// receiving side is gone. Blank lines are ignored and malformed lines are
/// logged and skipped. Returns the number of forwarded messages.
pub async fn read_lines<R, T>(
    reader: R,
    sender: mpsc::UnboundedSender<T>,
) -> Result<usize, CodecError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut lines = reader.lines();
    let mut forwarded = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match decode_line::<T>(&line) {
            Ok(message) => {
                if sender.send(message).is_err() {
                    debug!(target: "ptydeck.transport", "receiver closed; stop reading");
                    break;
                }
                forwarded += 1;
            }
            Err(err) => {
                warn!(target: "ptydeck.transport", error = %err, "skipping malformed line");
            }
        }
    }
    Ok(forwarded)
}

/// Write every message from `messages` as one line, flushing after each.
/// Returns the number of written messages once the channel closes.
pub async fn write_lines<W, T>(
    mut messages: mpsc::UnboundedReceiver<T>,
    mut writer: W,
) -> Result<usize, CodecError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut written = 0usize;
    while let Some(message) = messages.recv().await {
        let line = encode_line(&message)?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        written += 1;
    }
    Ok(written)
}
