use carewatch_common::{
    ActivityLabel, CareLog, Detection, DetectionConfig, LandmarkFrame, Outcome, WatchdogReset,
};
use carewatch_tracker::segmenter::{ActivitySegmenter, Transition};
use chrono::{DateTime, Duration, Utc};
use cucumber::World;

/// BDD World for activity classification and session tracking
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct SessionWorld {
    /// Child named in care logs
    pub child_name: String,

    /// Detection settings applied when the segmenter is first used
    pub config: DetectionConfig,

    /// Created lazily so Given steps can still change the configuration
    pub segmenter: Option<ActivitySegmenter>,

    /// Frame under test for classification scenarios
    pub frame: Option<LandmarkFrame>,

    /// Result of the latest classification
    pub detection: Option<Detection>,

    /// Every transition reported, in order
    pub transitions: Vec<Transition>,
}

impl SessionWorld {
    pub fn new() -> Self {
        Self {
            child_name: "Child".to_string(),
            config: DetectionConfig::default(),
            segmenter: None,
            frame: None,
            detection: None,
            transitions: Vec::new(),
        }
    }

    /// Scenario clock: milliseconds after a fixed morning.
    pub fn at(ms: i64) -> DateTime<Utc> {
        let base = DateTime::from_timestamp(1_768_806_000, 0).unwrap_or_default();
        base + Duration::milliseconds(ms)
    }

    pub fn segmenter(&mut self) -> &mut ActivitySegmenter {
        let (child_name, config) = (&self.child_name, &self.config);
        self.segmenter
            .get_or_insert_with(|| ActivitySegmenter::new(child_name.clone(), config.clone()))
    }

    /// Feed one detection the way the monitor does: an expired watchdog
    /// fires before the detection is considered.
    pub fn detect(&mut self, label: ActivityLabel, confidence: f64, ms: i64) {
        let now = Self::at(ms);
        let segmenter = self.segmenter();
        let expired = segmenter.poll_watchdog(now);
        let detected = segmenter.on_detection(Detection::new(label, confidence), now);
        self.transitions.push(expired.then(detected));
    }

    pub fn wait_until(&mut self, ms: i64) {
        let transition = self.segmenter().poll_watchdog(Self::at(ms));
        self.transitions.push(transition);
    }

    pub fn stop(&mut self, ms: i64) {
        let transition = self.segmenter().flush(Self::at(ms));
        self.transitions.push(transition);
    }

    pub fn set_reset_policy(&mut self, policy: WatchdogReset) {
        self.config.watchdog_reset = policy;
    }

    pub fn logs(&mut self) -> Vec<CareLog> {
        self.segmenter().logs().to_vec()
    }
}

impl Default for SessionWorld {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_outcome(name: &str) -> anyhow::Result<Outcome> {
    match name {
        "Positive" => Ok(Outcome::Positive),
        "Neutral" => Ok(Outcome::Neutral),
        "Concerning" => Ok(Outcome::Concerning),
        other => anyhow::bail!("unknown outcome: {}", other),
    }
}
