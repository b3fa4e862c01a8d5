//! Newline-delimited JSON event source.
//!
//! Each non-blank line is one `GovernorLog`. Lines are yielded in file order;
//! a line that is not UTF-8 or fails to parse is logged with its line number
//! and skipped. A read error ends the stream with an `Err`.

use anyhow::Result;
use futures::Stream;
use govindex_world::GovernorLog;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

pub fn read_logs<R>(mut reader: R) -> impl Stream<Item = Result<GovernorLog>> + Send
where
    R: AsyncBufRead + Unpin + Send,
{
    async_stream::stream! {
        let mut buf = Vec::new();
        let mut line_no: u64 = 0;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    let err = anyhow::Error::new(e)
                        .context(format!("reading event input at line {}", line_no + 1));
                    yield Err::<GovernorLog, _>(err);
                    break;
                }
            }
            line_no += 1;

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    warn!(line = line_no, error = %e, "Skipping event line that is not UTF-8");
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<GovernorLog>(line) {
                Ok(log) => yield Ok::<_, anyhow::Error>(log),
                Err(e) => warn!(line = line_no, error = %e, "Skipping malformed event line"),
            }
        }
    }
}
