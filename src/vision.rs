use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, RgbImage};
use log::warn;
use tokio::sync::Semaphore;

use crate::models::{FaceObservation, PoseObservation};

const PLACEHOLDER_WIDTH: u32 = 320;
const PLACEHOLDER_HEIGHT: u32 = 240;

/// Pose and face models. Both calls are blocking and run on a blocking worker.
/// An `Err` means the model failed on this frame, which is distinct from `Ok(None)`
/// (nothing found).
pub trait VisionDetector: Send + Sync + 'static {
    fn detect_pose(&self, image: &DynamicImage) -> Result<Option<PoseObservation>>;
    fn detect_faces(&self, image: &DynamicImage) -> Result<Option<FaceObservation>>;
}

/// Detector used when no models are wired in; it never sees anyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDetector;

impl VisionDetector for NoopDetector {
    fn detect_pose(&self, _image: &DynamicImage) -> Result<Option<PoseObservation>> {
        Ok(None)
    }

    fn detect_faces(&self, _image: &DynamicImage) -> Result<Option<FaceObservation>> {
        Ok(None)
    }
}

pub fn decode_frame(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).context("frame is not a decodable image")
}

/// Detector with one call slot per modality. A call that outlives its timeout keeps
/// its slot until it returns, so a hung model costs at most one blocking worker per
/// modality; later frames wait out their own timeout and see no observation.
#[derive(Clone)]
pub struct GuardedDetector {
    detector: Arc<dyn VisionDetector>,
    pose_slot: Arc<Semaphore>,
    face_slot: Arc<Semaphore>,
}

impl GuardedDetector {
    pub fn new(detector: Arc<dyn VisionDetector>) -> Self {
        Self {
            detector,
            pose_slot: Arc::new(Semaphore::new(1)),
            face_slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Runs both detectors on `image`. Any failure, timeout or worker panic degrades
    /// that modality to "no observation".
    pub async fn observe(
        &self,
        image: Arc<DynamicImage>,
        timeout: Duration,
    ) -> (Option<PoseObservation>, Option<FaceObservation>) {
        let pose = run_detector(&self.pose_slot, timeout, "pose", {
            let detector = Arc::clone(&self.detector);
            let image = Arc::clone(&image);
            move || detector.detect_pose(&image)
        });
        let face = run_detector(&self.face_slot, timeout, "face", {
            let detector = Arc::clone(&self.detector);
            move || detector.detect_faces(&image)
        });

        tokio::join!(pose, face)
    }
}

async fn run_detector<T, F>(
    slot: &Arc<Semaphore>,
    timeout: Duration,
    modality: &str,
    call: F,
) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<Option<T>> + Send + 'static,
{
    let slot = Arc::clone(slot);
    let guarded = async move {
        let permit = slot.acquire_owned().await.ok()?;
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            call()
        })
        .await;
        Some(joined)
    };

    match tokio::time::timeout(timeout, guarded).await {
        Ok(Some(Ok(Ok(observation)))) => observation,
        Ok(Some(Ok(Err(err)))) => {
            warn!("{modality} detector failed, treating as no observation: {err:?}");
            None
        }
        Ok(Some(Err(join_err))) => {
            warn!("{modality} detector worker panicked: {join_err}");
            None
        }
        Ok(None) => None,
        Err(_) => {
            warn!(
                "{modality} detector timed out or busy (> {}ms), treating as no observation",
                timeout.as_millis()
            );
            None
        }
    }
}

/// Encoded black JPEG served before the first frame arrives.
pub fn placeholder_frame() -> Result<Vec<u8>> {
    let blank = DynamicImage::ImageRgb8(RgbImage::new(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT));
    let mut out = Cursor::new(Vec::new());
    blank
        .write_to(&mut out, ImageFormat::Jpeg)
        .context("failed to encode placeholder frame")?;
    Ok(out.into_inner())
}
