use std::io::Write;

use anyhow::{anyhow, Context, Result};
use carewatch_common::CareLog;
use tokio::sync::mpsc;
use tracing::debug;

/// Destination for finished care logs (UI, storage, stdout).
pub trait CareLogSink: Send {
    fn deliver(&mut self, log: &CareLog) -> Result<()>;
}

/// Writes each log as one JSON object per line.
///
/// Writes block the calling task. Logs arrive at most once per closed
/// session, so the tracker task writes them inline.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> CareLogSink for JsonLinesSink<W> {
    fn deliver(&mut self, log: &CareLog) -> Result<()> {
        let line = serde_json::to_string(log).context("Failed to serialize care log")?;
        writeln!(self.writer, "{}", line).context("Failed to write care log")?;
        self.writer.flush().context("Failed to flush care log output")?;

        debug!("Wrote care log {} for session {}", log.id, log.session_id);
        Ok(())
    }
}

/// Hands logs to another task.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CareLog>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<CareLog>) -> Self {
        Self { tx }
    }
}

impl CareLogSink for ChannelSink {
    fn deliver(&mut self, log: &CareLog) -> Result<()> {
        self.tx.send(log.clone()).map_err(|_| anyhow!("care log receiver dropped"))
    }
}

impl CareLogSink for Vec<CareLog> {
    fn deliver(&mut self, log: &CareLog) -> Result<()> {
        self.push(log.clone());
        Ok(())
    }
}
