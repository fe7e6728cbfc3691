//! Line-oriented chat loop over stdin/stdout.
//!
//! Each line is one turn. Turns run as independent tasks, so replies can finish out of
//! order; a reply is only shown while its turn is still the newest one.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::MedSafeError;
use crate::pipeline::Pipeline;
use crate::render::reply::transcript_line;
use crate::transcript::{Transcript, TranscriptEntry, TurnToken};

/// Runs the chat loop on the process's stdin and stdout.
///
/// # Errors
///
/// Returns an error when reading stdin or writing stdout fails.
pub async fn run_stdio(pipeline: Pipeline, sequential: bool) -> Result<(), MedSafeError> {
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();
    run(pipeline, input, output, sequential).await?;
    Ok(())
}

/// Strips the line terminator and decodes, replacing invalid UTF-8 rather than failing.
fn decode_line(mut raw: Vec<u8>) -> String {
    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    }
    String::from_utf8(raw).unwrap_or_else(|err| {
        warn!("input line was not valid UTF-8; replacing invalid bytes");
        String::from_utf8_lossy(err.as_bytes()).into_owned()
    })
}

async fn write_entry<W>(output: &mut W, entry: &TranscriptEntry) -> Result<(), MedSafeError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = transcript_line(entry);
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

/// Drives turns until `input` is exhausted and every in-flight turn has finished.
///
/// Only bot replies are written to `output`; the returned transcript holds both sides.
/// With `sequential`, the next line is not read until the current reply is in.
pub async fn run<R, W>(
    pipeline: Pipeline,
    mut input: R,
    mut output: W,
    sequential: bool,
) -> Result<Transcript, MedSafeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // `read_until` keeps partial reads in `pending`, so losing a select race loses nothing.
    let mut pending = Vec::new();
    let mut transcript = Transcript::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<(TurnToken, String)>();
    let mut input_open = true;
    let mut in_flight = 0usize;

    loop {
        let can_read = input_open && (!sequential || in_flight == 0);
        tokio::select! {
            read = input.read_until(b'\n', &mut pending), if can_read => {
                if read? == 0 && pending.is_empty() {
                    input_open = false;
                    continue;
                }
                let line = decode_line(std::mem::take(&mut pending));
                let token = transcript.submit(&line);
                in_flight += 1;
                let pipeline = pipeline.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = pipeline.run_turn(&line).await;
                    // The loop only stops receiving once every turn has reported back.
                    let _ = tx.send((token, result.reply()));
                });
            }
            Some((token, reply)) = rx.recv(), if in_flight > 0 => {
                in_flight -= 1;
                match transcript.deliver(token, reply) {
                    Some(entry) => write_entry(&mut output, entry).await?,
                    None => debug!(turn = token.get(), "dropping reply from superseded turn"),
                }
            }
            else => break,
        }
    }

    Ok(transcript)
}
