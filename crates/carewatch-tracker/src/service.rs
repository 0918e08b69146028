use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::frame_reader::TimedFrame;
use crate::monitor::ActivityMonitor;
use crate::segmenter::Transition;
use crate::sink::CareLogSink;

#[derive(Debug)]
pub enum TrackerInput {
    Frame(TimedFrame),
    ClearLogs,
    /// Stop ingestion; the open session is flushed.
    Stop,
}

/// Owns the monitor and is its only writer. Frames and watchdog expiry are
/// handled on one task, so a timeout can never race a frame-driven close.
pub struct TrackerService {
    monitor: ActivityMonitor,
    sink: Box<dyn CareLogSink>,
    last_frame: Option<(DateTime<Utc>, Instant)>,
    wake_at: Option<Instant>,
}

impl TrackerService {
    pub fn new(monitor: ActivityMonitor, sink: Box<dyn CareLogSink>) -> Self {
        Self { monitor, sink, last_frame: None, wake_at: None }
    }

    pub fn spawn(self, buffer: usize) -> TrackerHandle {
        let (tx, rx) = mpsc::channel(buffer);
        let task = tokio::spawn(self.run(rx));
        TrackerHandle { tx, task }
    }

    /// Process inputs until `Stop` or until every sender is gone, then flush
    /// and hand the monitor back.
    pub async fn run(mut self, mut rx: mpsc::Receiver<TrackerInput>) -> ActivityMonitor {
        info!("Tracker running for {}", self.monitor.segmenter().child_name());

        loop {
            let wake_at = self.wake_at;

            tokio::select! {
                biased;

                _ = sleep_until(wake_at.unwrap_or_else(Instant::now)), if wake_at.is_some() => {
                    self.handle_watchdog();
                }
                input = rx.recv() => match input {
                    Some(TrackerInput::Frame(frame)) => self.handle_frame(frame),
                    Some(TrackerInput::ClearLogs) => {
                        debug!("Clearing {} care logs", self.monitor.logs().len());
                        self.monitor.clear_logs();
                    }
                    Some(TrackerInput::Stop) | None => break,
                },
            }
        }

        // A deadline that passed before the stop still closes at the deadline.
        let now = self.logical_now();
        let expired = self.monitor.poll_watchdog(now);
        self.publish(expired);
        let transition = self.monitor.flush(now);
        self.publish(transition);

        info!(
            "Tracker stopped: {} sessions, {} care logs",
            self.monitor.history().len(),
            self.monitor.logs().len()
        );
        self.monitor
    }

    fn handle_frame(&mut self, frame: TimedFrame) {
        let received = Instant::now();
        let report = self.monitor.process_frame(frame.pose.as_ref(), frame.timestamp);

        if let Some(gesture) = report.gesture {
            debug!(
                "Gesture: {} ({:.2}), activity: {} ({:.2})",
                gesture.gesture.description(),
                gesture.confidence,
                report.detection.label,
                report.detection.confidence
            );
        }

        self.last_frame = Some((frame.timestamp, received));
        self.wake_at = self.monitor.watchdog_deadline().map(|deadline| {
            let remaining = (deadline - frame.timestamp).to_std().unwrap_or_default();
            received + remaining
        });

        self.publish(report.transition);
    }

    fn handle_watchdog(&mut self) {
        self.wake_at = None;

        if let Some(deadline) = self.monitor.watchdog_deadline() {
            debug!("No frames since watchdog was armed, closing at {}", deadline);
            let transition = self.monitor.poll_watchdog(deadline);
            self.publish(transition);
        }
    }

    /// Timestamp of the latest frame advanced by the time since it arrived.
    fn logical_now(&self) -> DateTime<Utc> {
        match self.last_frame {
            Some((timestamp, received)) => chrono::Duration::from_std(received.elapsed())
                .map(|elapsed| timestamp + elapsed)
                .unwrap_or(timestamp),
            None => Utc::now(),
        }
    }

    fn publish(&mut self, transition: Transition) {
        let Some(log) = transition.care_log else {
            return;
        };

        info!(
            "Care log: {} {} for {} ({:?})",
            log.child, log.activity, log.duration, log.outcome
        );

        if let Err(e) = self.sink.deliver(&log) {
            warn!("Failed to deliver care log {}: {}", log.id, e);
        }
    }
}

/// Sending side of a spawned [`TrackerService`].
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerInput>,
    task: JoinHandle<ActivityMonitor>,
}

impl TrackerHandle {
    pub async fn send_frame(&self, frame: TimedFrame) -> Result<()> {
        self.tx
            .send(TrackerInput::Frame(frame))
            .await
            .map_err(|_| anyhow!("tracker service is not running"))
    }

    pub async fn clear_logs(&self) -> Result<()> {
        self.tx
            .send(TrackerInput::ClearLogs)
            .await
            .map_err(|_| anyhow!("tracker service is not running"))
    }

    /// Stop the service, flushing any open session.
    pub async fn stop(self) -> Result<ActivityMonitor> {
        // The service may already have exited; joining still returns its state.
        let _ = self.tx.send(TrackerInput::Stop).await;
        self.task.await.context("tracker service task failed to join")
    }
}
