use crate::models::{ClassificationResult, FaceObservation, PoseObservation};

/// Maximum vertical shoulder-to-hip gap (normalized units) that still counts as a
/// horizontal torso.
pub const LYING_GAP_THRESHOLD: f64 = 0.05;

/// Maps one frame's observations to a presence verdict. Never fails: every
/// combination of inputs has a defined result.
pub fn classify(
    pose: Option<&PoseObservation>,
    face: Option<&FaceObservation>,
    lying_gap_threshold: f64,
) -> ClassificationResult {
    let face_detected = face.is_some();

    match pose {
        Some(pose) => {
            let vertical_gap = (pose.left_shoulder.y - pose.left_hip.y).abs();
            ClassificationResult {
                body_detected: true,
                face_detected,
                lying_down: vertical_gap < lying_gap_threshold,
                horizontal_position: (pose.left_shoulder.x + pose.right_shoulder.x) / 2.0,
            }
        }
        None => ClassificationResult {
            face_detected,
            ..ClassificationResult::default()
        },
    }
}
