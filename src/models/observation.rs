use serde::{Deserialize, Serialize};

/// Normalized image coordinate, both axes in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Torso landmarks of one detected body. The four points always travel together;
/// a partial skeleton is reported as no observation at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoseObservation {
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
    pub left_hip: Landmark,
    pub right_hip: Landmark,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One or more faces found in a frame. Only the count matters downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaceObservation {
    boxes: Vec<FaceBox>,
}

impl FaceObservation {
    /// Returns `None` for an empty detection list so that "face observed" always
    /// means at least one box.
    pub fn from_boxes(boxes: Vec<FaceBox>) -> Option<Self> {
        if boxes.is_empty() {
            None
        } else {
            Some(Self { boxes })
        }
    }

    pub fn count(&self) -> usize {
        self.boxes.len()
    }

    pub fn boxes(&self) -> &[FaceBox] {
        &self.boxes
    }
}

/// Per-frame presence verdict. Recomputed on every ingested frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub body_detected: bool,
    pub face_detected: bool,
    pub lying_down: bool,
    pub horizontal_position: f64,
}

impl ClassificationResult {
    pub const CENTER: f64 = 0.5;

    pub fn user_present(&self) -> bool {
        self.body_detected || self.face_detected
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self {
            body_detected: false,
            face_detected: false,
            lying_down: false,
            horizontal_position: Self::CENTER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_face_list_is_no_observation() {
        assert!(FaceObservation::from_boxes(Vec::new()).is_none());

        let face = FaceObservation::from_boxes(vec![FaceBox {
            x: 0.1,
            y: 0.1,
            width: 0.2,
            height: 0.2,
        }])
        .unwrap();
        assert_eq!(face.count(), 1);
    }

    #[test]
    fn default_classification_is_centered_and_absent() {
        let result = ClassificationResult::default();
        assert!(!result.user_present());
        assert!(!result.lying_down);
        assert_eq!(result.horizontal_position, 0.5);
    }
}
