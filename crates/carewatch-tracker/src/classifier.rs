// Pose classification
//
// Turns one frame of body landmarks into an activity label plus confidence,
// and separately into a coarse gesture for live display. Both are pure.

use carewatch_common::{
    ActivityLabel, Detection, Gesture, GestureReading, Keypoint, LandmarkFrame, PoseLandmark,
};

/// Shoulder/hip vertical gap below which the torso counts as horizontal.
const LYING_TORSO_SPAN: f64 = 0.1;
/// Shoulders must sit this low in the frame for a lying-down pose.
const LYING_MIN_SHOULDER_Y: f64 = 0.6;
/// How far above its shoulder a wrist must be for the arm to count as active.
const ARM_RAISE_MARGIN: f64 = 0.1;
/// A nose above this line suggests jumping or stretching upward.
const HIGH_NOSE_Y: f64 = 0.3;

pub const FALLBACK_CONFIDENCE: f64 = 0.5;
pub const REST_CONFIDENCE: f64 = 0.9;
pub const HYPER_CONFIDENCE: f64 = 0.85;
pub const PLAY_CONFIDENCE: f64 = 0.8;
pub const IDLE_CONFIDENCE: f64 = 0.7;

const CELEBRATING_CONFIDENCE: f64 = 0.9;
const REACHING_CONFIDENCE: f64 = 0.85;
const STILL_CONFIDENCE: f64 = 0.8;

/// The keypoints the activity heuristics look at.
struct Body {
    nose: Keypoint,
    left_shoulder: Keypoint,
    right_shoulder: Keypoint,
    left_wrist: Keypoint,
    right_wrist: Keypoint,
    left_hip: Keypoint,
    right_hip: Keypoint,
}

impl Body {
    fn from_frame(frame: &LandmarkFrame) -> Option<Self> {
        Some(Self {
            nose: *frame.get(PoseLandmark::Nose)?,
            left_shoulder: *frame.get(PoseLandmark::LeftShoulder)?,
            right_shoulder: *frame.get(PoseLandmark::RightShoulder)?,
            left_wrist: *frame.get(PoseLandmark::LeftWrist)?,
            right_wrist: *frame.get(PoseLandmark::RightWrist)?,
            left_hip: *frame.get(PoseLandmark::LeftHip)?,
            right_hip: *frame.get(PoseLandmark::RightHip)?,
        })
    }

    fn shoulder_y(&self) -> f64 {
        (self.left_shoulder.y + self.right_shoulder.y) / 2.0
    }

    fn hip_y(&self) -> f64 {
        (self.left_hip.y + self.right_hip.y) / 2.0
    }

    fn is_lying_down(&self) -> bool {
        let shoulder_y = self.shoulder_y();
        (shoulder_y - self.hip_y()).abs() < LYING_TORSO_SPAN && shoulder_y > LYING_MIN_SHOULDER_Y
    }

    fn left_arm_active(&self) -> bool {
        self.left_wrist.y < self.left_shoulder.y - ARM_RAISE_MARGIN
    }

    fn right_arm_active(&self) -> bool {
        self.right_wrist.y < self.right_shoulder.y - ARM_RAISE_MARGIN
    }
}

/// Classify a frame into an activity.
///
/// Missing frames and frames lacking any required keypoint fall back to a
/// low-confidence `Idle` so the stream keeps flowing.
pub fn classify(frame: Option<&LandmarkFrame>) -> Detection {
    let Some(body) = frame.and_then(Body::from_frame) else {
        return Detection::new(ActivityLabel::Idle, FALLBACK_CONFIDENCE);
    };

    let left_active = body.left_arm_active();
    let right_active = body.right_arm_active();
    let both_active = left_active && right_active;
    let high_energy = body.nose.y < HIGH_NOSE_Y || both_active;

    if body.is_lying_down() {
        return Detection::new(ActivityLabel::Rest, REST_CONFIDENCE);
    }

    if high_energy && both_active {
        return Detection::new(ActivityLabel::Hyper, HYPER_CONFIDENCE);
    }

    if left_active || right_active {
        return Detection::new(ActivityLabel::Play, PLAY_CONFIDENCE);
    }

    Detection::new(ActivityLabel::Idle, IDLE_CONFIDENCE)
}

/// Name the visible gesture. Unlike [`classify`], a wrist only has to be above
/// its shoulder, with no margin. Returns `None` when no body is visible.
pub fn read_gesture(frame: Option<&LandmarkFrame>) -> Option<GestureReading> {
    let frame = frame?;
    let left_shoulder = frame.get(PoseLandmark::LeftShoulder)?;
    let right_shoulder = frame.get(PoseLandmark::RightShoulder)?;
    let left_wrist = frame.get(PoseLandmark::LeftWrist)?;
    let right_wrist = frame.get(PoseLandmark::RightWrist)?;

    let left_raised = left_wrist.y < left_shoulder.y;
    let right_raised = right_wrist.y < right_shoulder.y;

    let (gesture, confidence) = match (left_raised, right_raised) {
        (true, true) => (Gesture::Celebrating, CELEBRATING_CONFIDENCE),
        (true, false) | (false, true) => (Gesture::Reaching, REACHING_CONFIDENCE),
        (false, false) => (Gesture::Still, STILL_CONFIDENCE),
    };

    Some(GestureReading { gesture, confidence })
}
