use anyhow::{Context, Result};
use carewatch_common::{FrameMessage, LandmarkFrame};
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, warn};

/// One frame as handed to the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedFrame {
    pub timestamp: DateTime<Utc>,
    pub pose: Option<LandmarkFrame>,
}

impl TimedFrame {
    pub fn new(timestamp: DateTime<Utc>, pose: Option<LandmarkFrame>) -> Self {
        Self { timestamp, pose }
    }

    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, pose: None }
    }
}

/// Reads landmark frames encoded as JSON lines.
///
/// Lines without a timestamp take the last timestamp the stream carried, or
/// the receipt time if it has carried none yet. A line that does not parse
/// still counts as a frame, just one with no body in it.
pub struct FrameReader<R> {
    lines: Lines<R>,
    line_number: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), line_number: 0, last_timestamp: None }
    }

    pub async fn next_frame(&mut self) -> Result<Option<TimedFrame>> {
        loop {
            let Some(line) = self.lines.next_line().await.context("Failed to read frame input")?
            else {
                return Ok(None);
            };
            self.line_number += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return Ok(Some(self.parse(line)));
        }
    }

    fn fallback_timestamp(&self) -> DateTime<Utc> {
        self.last_timestamp.unwrap_or_else(Utc::now)
    }

    fn parse(&mut self, line: &str) -> TimedFrame {
        match FrameMessage::from_json(line) {
            Ok(message) => {
                if message.timestamp.is_some() {
                    self.last_timestamp = message.timestamp;
                }
                let timestamp = message.timestamp.unwrap_or_else(|| self.fallback_timestamp());
                let pose = message.primary_pose().cloned();
                debug!(
                    "Frame {} at {}: {} poses",
                    self.line_number,
                    timestamp,
                    message.landmarks.len()
                );
                TimedFrame::new(timestamp, pose)
            }
            Err(e) => {
                warn!("Malformed frame on line {}: {}. Treating as empty.", self.line_number, e);
                TimedFrame::empty(self.fallback_timestamp())
            }
        }
    }
}
