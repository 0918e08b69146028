use carewatch_common::{
    ActivityLabel, ActivitySession, CareLog, DetectionConfig, Detection, WatchdogReset,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::synthesizer;

/// What a single segmenter call changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub closed: Option<ActivitySession>,
    pub care_log: Option<CareLog>,
    pub opened: Option<ActivitySession>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.closed.is_none() && self.opened.is_none()
    }

    /// Combine a watchdog closure with the detection that followed it.
    pub fn then(self, next: Transition) -> Transition {
        Transition {
            closed: next.closed.or(self.closed),
            care_log: next.care_log.or(self.care_log),
            opened: next.opened.or(self.opened),
        }
    }
}

/// Splits a stream of detections into activity sessions.
///
/// Holds at most one open session. Closed sessions go to an append-only
/// history; those long enough also produce a [`CareLog`]. Time never runs
/// backwards: every `now` is clamped to the latest one already seen, so
/// sessions in history never overlap.
#[derive(Debug)]
pub struct ActivitySegmenter {
    config: DetectionConfig,
    child_name: String,
    current: Option<ActivitySession>,
    last_accepted: Option<ActivityLabel>,
    watchdog_deadline: Option<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
    history: Vec<ActivitySession>,
    logs: Vec<CareLog>,
}

impl ActivitySegmenter {
    pub fn new(child_name: impl Into<String>, config: DetectionConfig) -> Self {
        Self {
            config,
            child_name: child_name.into(),
            current: None,
            last_accepted: None,
            watchdog_deadline: None,
            last_seen: None,
            history: Vec::new(),
            logs: Vec::new(),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn child_name(&self) -> &str {
        &self.child_name
    }

    pub fn current_session(&self) -> Option<&ActivitySession> {
        self.current.as_ref()
    }

    pub fn last_accepted(&self) -> Option<ActivityLabel> {
        self.last_accepted
    }

    pub fn history(&self) -> &[ActivitySession] {
        &self.history
    }

    pub fn logs(&self) -> &[CareLog] {
        &self.logs
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    /// When the inactivity watchdog will fire, if armed.
    pub fn watchdog_deadline(&self) -> Option<DateTime<Utc>> {
        self.watchdog_deadline
    }

    /// Latest time passed to the segmenter.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    fn observe(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let now = match self.last_seen {
            Some(last) if now < last => {
                debug!("Clock went back from {} to {}, holding at {}", last, now, last);
                last
            }
            _ => now,
        };
        self.last_seen = Some(now);
        now
    }

    fn accepts(&self, detection: &Detection) -> bool {
        detection.confidence >= self.config.confidence_threshold
            && self.last_accepted != Some(detection.label)
    }

    fn arm_watchdog(&mut self, now: DateTime<Utc>) {
        self.watchdog_deadline = Some(now + self.config.idle_timeout());
    }

    pub fn on_detection(&mut self, detection: Detection, now: DateTime<Utc>) -> Transition {
        let now = self.observe(now);

        if self.config.watchdog_reset == WatchdogReset::EveryFrame {
            self.arm_watchdog(now);
        }

        if !self.accepts(&detection) {
            debug!(
                "Ignoring detection {} ({:.2}), last accepted {:?}",
                detection.label, detection.confidence, self.last_accepted
            );
            return Transition::default();
        }

        let mut transition = self.close_current(now);

        let session = ActivitySession::open(detection.label, now, detection.confidence);
        info!(
            "Session started: {} ({}) for {} with confidence {:.2}",
            session.activity, session.id, self.child_name, session.confidence
        );
        self.current = Some(session.clone());
        self.last_accepted = Some(detection.label);
        self.arm_watchdog(now);

        transition.opened = Some(session);
        transition
    }

    /// Close the open session after a period of silence.
    pub fn on_idle_timeout(&mut self, now: DateTime<Utc>) -> Transition {
        let now = self.observe(now);
        self.watchdog_deadline = None;
        self.last_accepted = None;
        self.close_current(now)
    }

    /// Close the open session because ingestion stopped.
    pub fn flush(&mut self, now: DateTime<Utc>) -> Transition {
        self.on_idle_timeout(now)
    }

    /// Fire the watchdog if its deadline has passed by `now`. The session is
    /// closed at the deadline, not at `now`.
    pub fn poll_watchdog(&mut self, now: DateTime<Utc>) -> Transition {
        let now = self.observe(now);
        match self.watchdog_deadline {
            Some(deadline) if deadline <= now => {
                debug!("Inactivity watchdog fired at {}", deadline);
                self.watchdog_deadline = None;
                self.last_accepted = None;
                // The deadline was armed at or after the open session started.
                self.close_current(deadline)
            }
            _ => Transition::default(),
        }
    }

    fn close_current(&mut self, now: DateTime<Utc>) -> Transition {
        let Some(session) = self.current.take() else {
            return Transition::default();
        };

        let closed = session.close(now);
        let care_log = if closed.duration() >= self.config.min_session_duration() {
            let log = synthesizer::synthesize(&closed, &self.child_name);
            self.logs.push(log.clone());
            Some(log)
        } else {
            None
        };

        info!(
            "Session ended: {} ({}) after {}ms, logged: {}",
            closed.activity,
            closed.id,
            closed.duration().num_milliseconds(),
            care_log.is_some()
        );

        self.history.push(closed.clone());
        Transition { closed: Some(closed), care_log, opened: None }
    }
}
