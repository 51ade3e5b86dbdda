use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

use ephem_model::JobId;

/// Configuration for worker output logging.
#[derive(Debug, Clone, Copy)]
pub struct LogConfig {
    /// Max line length before truncation.
    pub max_line_length: usize,
    /// Log stdout at INFO level (false = DEBUG).
    pub stdout_info: bool,
    /// Log stderr at WARN level (false = DEBUG).
    pub stderr_warn: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_line_length: 4096,
            stdout_info: false,
            stderr_warn: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) enum Stream {
    Stdout,
    Stderr,
}

/// Forward every line of `reader` to the log until EOF.
pub(super) async fn forward<R>(reader: R, id: JobId, stream: Stream, cfg: LogConfig)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => emit(id, stream, cfg, truncate(&line, cfg.max_line_length)),
            Ok(None) => break,
            Err(e) => {
                debug!(id, error = %e, "worker output closed");
                break;
            }
        }
    }
}

fn emit(id: JobId, stream: Stream, cfg: LogConfig, line: &str) {
    match stream {
        Stream::Stdout if cfg.stdout_info => info!(id, stream = "stdout", "{line}"),
        Stream::Stderr if cfg.stderr_warn => warn!(id, stream = "stderr", "{line}"),
        Stream::Stdout => debug!(id, stream = "stdout", "{line}"),
        Stream::Stderr => debug!(id, stream = "stderr", "{line}"),
    }
}

fn truncate(line: &str, max: usize) -> &str {
    if line.len() <= max {
        return line;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
