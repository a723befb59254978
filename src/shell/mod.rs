//! Shell Module
//!
//! A line-oriented command interpreter over a shared string cache. Reads one
//! command per line and answers with one JSON line.

mod commands;
mod responses;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::cache::SharedCache;

pub use commands::{
    execute, Command, Setting, StringCache, HELP, MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
pub use responses::{
    CountResponse, ErrorResponse, ExistsResponse, KeysResponse, MessageResponse, Response,
    StatsResponse, ValueResponse, ValuesResponse,
};

/// Serves commands from `input` until EOF or `QUIT`.
///
/// Malformed commands and cache errors are answered with an error line; only
/// I/O failures end the session early.
pub async fn run<R, W>(
    cache: SharedCache<String, String>,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    info!("Shell ready");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                debug!(?command, "Executing command");
                let mut cache_guard = cache.lock().await;
                execute(&mut cache_guard, command)
                    .unwrap_or_else(|err| Response::Error(ErrorResponse::new(err.to_string())))
            }
            Err(err) => Response::Error(ErrorResponse::new(err.to_string())),
        };

        output.write_all(response.to_line().as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }

    info!("Shell session ended");
    Ok(())
}
