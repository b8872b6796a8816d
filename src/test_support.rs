use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::alerts::{Alert, AlertChannel, AlertKind};
use crate::hardware::HardwareLink;
use crate::models::{FaceBox, FaceObservation, Landmark, PoseObservation};
use crate::status::CommandSnapshot;
use crate::vision::VisionDetector;

pub fn png_frame() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30])));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Shoulder 0.40 and hip 0.43: a horizontal torso.
pub fn lying_pose() -> PoseObservation {
    PoseObservation {
        left_shoulder: Landmark::new(0.30, 0.40),
        right_shoulder: Landmark::new(0.50, 0.41),
        left_hip: Landmark::new(0.70, 0.43),
        right_hip: Landmark::new(0.72, 0.44),
    }
}

pub fn standing_pose(left_x: f64, right_x: f64) -> PoseObservation {
    PoseObservation {
        left_shoulder: Landmark::new(left_x, 0.30),
        right_shoulder: Landmark::new(right_x, 0.30),
        left_hip: Landmark::new(left_x, 0.60),
        right_hip: Landmark::new(right_x, 0.60),
    }
}

pub fn one_face() -> FaceObservation {
    FaceObservation::from_boxes(vec![FaceBox {
        x: 0.4,
        y: 0.1,
        width: 0.1,
        height: 0.15,
    }])
    .unwrap()
}

#[derive(Default)]
struct Script {
    pose: Option<PoseObservation>,
    face: Option<FaceObservation>,
    failing: bool,
}

/// Detector whose answers are set by the test.
#[derive(Default)]
pub struct ScriptedDetector {
    script: Mutex<Script>,
    delay: Option<Duration>,
}

impl ScriptedDetector {
    pub fn seeing(pose: Option<PoseObservation>, face: Option<FaceObservation>) -> Self {
        let detector = Self::default();
        detector.set(pose, face);
        detector
    }

    pub fn failing() -> Self {
        let detector = Self::default();
        detector.set_failing(true);
        detector
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set(&self, pose: Option<PoseObservation>, face: Option<FaceObservation>) {
        let mut script = self.script.lock().unwrap();
        script.pose = pose;
        script.face = face;
    }

    pub fn set_failing(&self, failing: bool) {
        self.script.lock().unwrap().failing = failing;
    }

    fn answer<T>(&self, pick: impl FnOnce(&Script) -> Option<T>) -> Result<Option<T>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let script = self.script.lock().unwrap();
        if script.failing {
            bail!("model crashed");
        }
        Ok(pick(&script))
    }
}

impl VisionDetector for ScriptedDetector {
    fn detect_pose(&self, _image: &DynamicImage) -> Result<Option<PoseObservation>> {
        self.answer(|script| script.pose)
    }

    fn detect_faces(&self, _image: &DynamicImage) -> Result<Option<FaceObservation>> {
        self.answer(|script| script.face.clone())
    }
}

#[derive(Clone, Default)]
pub struct RecordingChannel {
    sent: Arc<Mutex<Vec<(String, Alert)>>>,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<(String, Alert)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, kind: AlertKind) -> usize {
        self.sent().iter().filter(|(_, alert)| alert.kind == kind).count()
    }
}

impl AlertChannel for RecordingChannel {
    fn deliver(&self, recipient: &str, alert: &Alert) -> Result<()> {
        self.sent.lock().unwrap().push((recipient.to_string(), alert.clone()));
        Ok(())
    }
}

pub struct FailingChannel;

impl AlertChannel for FailingChannel {
    fn deliver(&self, _recipient: &str, _alert: &Alert) -> Result<()> {
        bail!("smtp authentication failed")
    }
}

/// Hardware link that records pushed commands and replays queued distances.
#[derive(Clone, Default)]
pub struct MockLink {
    pub pushed: Arc<Mutex<Vec<CommandSnapshot>>>,
    pub distances: Arc<Mutex<Vec<f64>>>,
    pub broken: bool,
}

impl HardwareLink for MockLink {
    fn push_command(&mut self, command: &CommandSnapshot) -> Result<()> {
        if self.broken {
            bail!("serial port unplugged");
        }
        self.pushed.lock().unwrap().push(*command);
        Ok(())
    }

    fn poll_distance(&mut self) -> Result<Option<f64>> {
        Ok(self.distances.lock().unwrap().pop())
    }
}

/// Link whose first push blocks until the returned sender is dropped.
pub struct GatedLink {
    calls: Arc<AtomicUsize>,
    gate: mpsc::Receiver<()>,
}

pub fn gated_link() -> (GatedLink, Arc<AtomicUsize>, mpsc::Sender<()>) {
    let (release, gate) = mpsc::channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let link = GatedLink {
        calls: Arc::clone(&calls),
        gate,
    };
    (link, calls, release)
}

impl HardwareLink for GatedLink {
    fn push_command(&mut self, _command: &CommandSnapshot) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.gate.recv().is_err() {
            bail!("link closed");
        }
        Ok(())
    }

    fn poll_distance(&mut self) -> Result<Option<f64>> {
        Ok(None)
    }
}

/// Detector whose calls block until the returned sender is dropped.
pub struct GatedDetector {
    pub pose_calls: AtomicUsize,
    pub face_calls: AtomicUsize,
    gate: Mutex<mpsc::Receiver<()>>,
}

pub fn gated_detector() -> (Arc<GatedDetector>, mpsc::Sender<()>) {
    let (release, gate) = mpsc::channel();
    let detector = GatedDetector {
        pose_calls: AtomicUsize::new(0),
        face_calls: AtomicUsize::new(0),
        gate: Mutex::new(gate),
    };
    (Arc::new(detector), release)
}

impl GatedDetector {
    fn wait(&self) -> Result<()> {
        let gate = self.gate.lock().unwrap();
        if gate.recv().is_err() {
            bail!("detector released");
        }
        Ok(())
    }
}

impl VisionDetector for GatedDetector {
    fn detect_pose(&self, _image: &DynamicImage) -> Result<Option<PoseObservation>> {
        self.pose_calls.fetch_add(1, Ordering::SeqCst);
        self.wait()?;
        Ok(None)
    }

    fn detect_faces(&self, _image: &DynamicImage) -> Result<Option<FaceObservation>> {
        self.face_calls.fetch_add(1, Ordering::SeqCst);
        self.wait()?;
        Ok(None)
    }
}
