use carewatch_common::{
    ActivitySession, CareLog, Detection, DetectionConfig, GestureReading, LandmarkFrame,
};
use chrono::{DateTime, Utc};

use crate::classifier;
use crate::segmenter::{ActivitySegmenter, Transition};

/// Everything learned from one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub detection: Detection,
    pub gesture: Option<GestureReading>,
    pub transition: Transition,
}

/// Classifier, gesture reader and segmenter behind a single per-frame call.
#[derive(Debug)]
pub struct ActivityMonitor {
    segmenter: ActivitySegmenter,
}

impl ActivityMonitor {
    pub fn new(child_name: impl Into<String>, config: DetectionConfig) -> Self {
        Self { segmenter: ActivitySegmenter::new(child_name, config) }
    }

    /// Classify `frame` and feed the result to the segmenter. A watchdog
    /// deadline that passed before `now` is honoured first, so replayed or
    /// delayed frames still see the timeout.
    pub fn process_frame(
        &mut self,
        frame: Option<&LandmarkFrame>,
        now: DateTime<Utc>,
    ) -> FrameReport {
        let detection = classifier::classify(frame);
        let gesture = classifier::read_gesture(frame);

        let expired = self.segmenter.poll_watchdog(now);
        let transition = expired.then(self.segmenter.on_detection(detection, now));

        FrameReport { detection, gesture, transition }
    }

    pub fn poll_watchdog(&mut self, now: DateTime<Utc>) -> Transition {
        self.segmenter.poll_watchdog(now)
    }

    pub fn flush(&mut self, now: DateTime<Utc>) -> Transition {
        self.segmenter.flush(now)
    }

    pub fn watchdog_deadline(&self) -> Option<DateTime<Utc>> {
        self.segmenter.watchdog_deadline()
    }

    pub fn current_session(&self) -> Option<&ActivitySession> {
        self.segmenter.current_session()
    }

    pub fn history(&self) -> &[ActivitySession] {
        self.segmenter.history()
    }

    pub fn logs(&self) -> &[CareLog] {
        self.segmenter.logs()
    }

    pub fn clear_logs(&mut self) {
        self.segmenter.clear_logs()
    }

    pub fn segmenter(&self) -> &ActivitySegmenter {
        &self.segmenter
    }
}
