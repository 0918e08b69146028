use carewatch_common::{Keypoint, LandmarkFrame, PoseLandmark};

/// A full 33-point body standing upright with both arms at its sides.
pub fn standing() -> Vec<Keypoint> {
    let mut keypoints = vec![Keypoint::new(0.5, 0.5); 33];
    set(&mut keypoints, PoseLandmark::Nose, 0.5, 0.35);
    set(&mut keypoints, PoseLandmark::LeftShoulder, 0.4, 0.45);
    set(&mut keypoints, PoseLandmark::RightShoulder, 0.6, 0.45);
    set(&mut keypoints, PoseLandmark::LeftWrist, 0.35, 0.65);
    set(&mut keypoints, PoseLandmark::RightWrist, 0.65, 0.65);
    set(&mut keypoints, PoseLandmark::LeftHip, 0.45, 0.75);
    set(&mut keypoints, PoseLandmark::RightHip, 0.55, 0.75);
    keypoints
}

/// Shoulders and hips level near the bottom of the image.
pub fn lying_down() -> Vec<Keypoint> {
    let mut keypoints = standing();
    set(&mut keypoints, PoseLandmark::Nose, 0.2, 0.8);
    set(&mut keypoints, PoseLandmark::LeftShoulder, 0.3, 0.8);
    set(&mut keypoints, PoseLandmark::RightShoulder, 0.3, 0.82);
    set(&mut keypoints, PoseLandmark::LeftWrist, 0.4, 0.85);
    set(&mut keypoints, PoseLandmark::RightWrist, 0.4, 0.85);
    set(&mut keypoints, PoseLandmark::LeftHip, 0.6, 0.85);
    set(&mut keypoints, PoseLandmark::RightHip, 0.6, 0.86);
    keypoints
}

pub fn raise_left_arm(keypoints: &mut [Keypoint]) {
    let shoulder = keypoints[PoseLandmark::LeftShoulder.index()];
    set(keypoints, PoseLandmark::LeftWrist, shoulder.x, shoulder.y - 0.25);
}

pub fn raise_right_arm(keypoints: &mut [Keypoint]) {
    let shoulder = keypoints[PoseLandmark::RightShoulder.index()];
    set(keypoints, PoseLandmark::RightWrist, shoulder.x, shoulder.y - 0.25);
}

/// Look up a named pose as written in feature files.
pub fn named(name: &str) -> anyhow::Result<Option<LandmarkFrame>> {
    let keypoints = match name {
        "no body" => return Ok(None),
        "standing still" => standing(),
        "standing with one arm raised" => {
            let mut keypoints = standing();
            raise_left_arm(&mut keypoints);
            keypoints
        }
        "standing with both arms raised" => {
            let mut keypoints = standing();
            raise_left_arm(&mut keypoints);
            raise_right_arm(&mut keypoints);
            keypoints
        }
        "lying down" => lying_down(),
        "lying down with both arms raised" => {
            let mut keypoints = lying_down();
            raise_left_arm(&mut keypoints);
            raise_right_arm(&mut keypoints);
            keypoints
        }
        "missing its hips" => standing().into_iter().take(23).collect(),
        other => anyhow::bail!("unknown pose: {}", other),
    };
    Ok(Some(LandmarkFrame::new(keypoints)))
}

fn set(keypoints: &mut [Keypoint], landmark: PoseLandmark, x: f64, y: f64) {
    keypoints[landmark.index()] = Keypoint::new(x, y);
}
