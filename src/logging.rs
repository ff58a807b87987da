use std::path::PathBuf;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Install the global tracing subscriber. Called once from main.
pub fn init() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .init();
}

/// Append-only log file. Every record is a single complete line written with
/// one append call, so concurrent pipelines never interleave partial records.
/// Write failures are reported and swallowed; logging must not take down a
/// cycle.
#[derive(Clone, Debug)]
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub async fn append(&self, line: &str) {
        let record = format!("{}\n", line.trim_end());
        let open = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await;
        match open {
            Ok(mut file) => {
                if let Err(e) = file.write_all(record.as_bytes()).await {
                    warn!(path = %self.path.display(), "failed to append log record: {e}");
                }
            }
            Err(e) => warn!(path = %self.path.display(), "failed to open log sink: {e}"),
        }
    }
}
