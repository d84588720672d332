//! Replay transport: feeds newline-delimited snapshot JSON into an inbox.
//!
//! Stands in for the network transport when running the viewer locally.
//! Each non-empty line is one raw message; lines are pushed untouched, so
//! malformed ones reach the decoder exactly as a live feed would deliver them.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, info};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::inbox::InboxSender;

pub type LineSource = Box<dyn AsyncBufRead + Unpin + Send>;

/// Open `path`, or stdin when `path` is `None` or `-`.
pub async fn open_source(path: Option<&Path>) -> std::io::Result<LineSource> {
    match path {
        Some(p) if p != Path::new("-") => {
            let file = tokio::fs::File::open(p).await?;
            info!("Replaying snapshots from {}", p.display());
            Ok(Box::new(BufReader::new(file)))
        }
        _ => {
            info!("Replaying snapshots from stdin");
            Ok(Box::new(BufReader::new(tokio::io::stdin())))
        }
    }
}

/// Push every non-empty line of `reader` into `sender`, waiting `interval`
/// between messages. Returns the number of messages pushed.
pub async fn replay_lines<R>(reader: R, sender: &InboxSender, interval: Duration) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut pushed = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        sender.push(Bytes::copy_from_slice(line.as_bytes()));
        pushed += 1;

        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    debug!("Replay source exhausted after {} message(s)", pushed);
    Ok(pushed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbox::Inbox;

    #[test]
    fn replays_non_empty_lines_in_order() {
        let inbox = Inbox::new();
        let tx = inbox.sender();
        let input: &[u8] = b"first\n\n  \nsecond\nthird";

        let pushed =
            tokio_test::block_on(replay_lines(input, &tx, Duration::ZERO)).unwrap();
        assert_eq!(pushed, 3);
        assert_eq!(inbox.len(), 3);

        let (latest, discarded) = inbox.take_latest().unwrap();
        assert_eq!(latest, Bytes::from_static(b"third"));
        assert_eq!(discarded, 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = tokio_test::block_on(open_source(Some(Path::new(
            "/definitely/not/here.jsonl",
        ))));
        assert!(result.is_err());
    }
}
