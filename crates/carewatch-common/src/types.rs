use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Landmark Input
// ============================================================================

/// A single body keypoint in normalized image coordinates.
///
/// `x` and `y` lie in `[0, 1]` with the origin at the top-left corner and `y`
/// growing downward, so a smaller `y` means higher up in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0, visibility: None }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Indices into the 33-point body topology produced by the pose landmarker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseLandmark {
    Nose = 0,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftHip = 23,
    RightHip = 24,
}

impl PoseLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One pose worth of keypoints, ordered by [`PoseLandmark`] index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    pub keypoints: Vec<Keypoint>,
}

impl LandmarkFrame {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Returns the keypoint when present with finite coordinates.
    pub fn get(&self, landmark: PoseLandmark) -> Option<&Keypoint> {
        self.keypoints.get(landmark.index()).filter(|k| k.is_finite())
    }
}

/// One line of the inbound frame stream.
///
/// `landmarks` holds every pose the landmarker found; only the first is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub landmarks: Vec<LandmarkFrame>,
}

impl FrameMessage {
    pub fn from_json(line: &str) -> crate::Result<Self> {
        serde_json::from_str(line).map_err(|e| crate::Error::InvalidFrame(e.to_string()))
    }

    pub fn primary_pose(&self) -> Option<&LandmarkFrame> {
        self.landmarks.first().filter(|pose| !pose.is_empty())
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Activity states the classifier can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActivityLabel {
    Play,
    Rest,
    Hyper,
    Idle,
    Sleep,
}

impl ActivityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLabel::Play => "Play",
            ActivityLabel::Rest => "Rest",
            ActivityLabel::Hyper => "Hyper",
            ActivityLabel::Idle => "Idle",
            ActivityLabel::Sleep => "Sleep",
        }
    }
}

impl fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLabel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "play" => Ok(ActivityLabel::Play),
            "rest" => Ok(ActivityLabel::Rest),
            "hyper" => Ok(ActivityLabel::Hyper),
            "idle" => Ok(ActivityLabel::Idle),
            "sleep" => Ok(ActivityLabel::Sleep),
            _ => Err(crate::Error::UnknownLabel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: ActivityLabel,
    pub confidence: f64,
}

impl Detection {
    pub fn new(label: ActivityLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Coarse gesture shown next to the live camera feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Celebrating,
    Reaching,
    Still,
}

impl Gesture {
    pub fn description(&self) -> &'static str {
        match self {
            Gesture::Celebrating => "Jumping Jacks or Celebration",
            Gesture::Reaching => "Waving or Reaching",
            Gesture::Still => "Standing or Sitting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureReading {
    pub gesture: Gesture,
    pub confidence: f64,
}

// ============================================================================
// Sessions and Care Logs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySession {
    pub id: Uuid,
    pub activity: ActivityLabel,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Confidence of the detection that opened the session
    pub confidence: f64,
}

impl ActivitySession {
    pub fn open(activity: ActivityLabel, start_time: DateTime<Utc>, confidence: f64) -> Self {
        Self { id: Uuid::new_v4(), activity, start_time, end_time: None, confidence }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Closes the session, never letting the end precede the start.
    pub fn close(mut self, at: DateTime<Utc>) -> Self {
        self.end_time = Some(at.max(self.start_time));
        self
    }

    /// Elapsed time of a closed session; zero while open.
    pub fn duration(&self) -> Duration {
        self.end_time.map(|end| end - self.start_time).unwrap_or_else(Duration::zero)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Positive,
    Neutral,
    Concerning,
}

/// Caregiver-facing summary of one completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareLog {
    pub id: Uuid,
    pub session_id: Uuid,
    pub child: String,
    pub activity: ActivityLabel,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Local wall-clock `HH:MM`
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    /// Display form, e.g. `"3 min"`
    pub duration: String,
    pub outcome: Outcome,
    pub description: String,
}
