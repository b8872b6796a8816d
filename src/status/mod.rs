use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    models::{ClassificationResult, RobotCommand},
    presence::{transition, AlertLatch, Transition},
};

/// The single long-lived mutable record. Every field holds only its latest value.
#[derive(Debug, Clone)]
pub struct Status {
    pub latest_frame: Option<Arc<[u8]>>,
    pub last_frame_at: Option<DateTime<Utc>>,
    pub frames_ingested: u64,
    pub latest_classification: ClassificationResult,
    pub current_command: RobotCommand,
    pub sleep_mode: bool,
    pub alert_recipient: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub fall_alert: AlertLatch,
    pub missing_alert: AlertLatch,
    pub last_sensor_distance: Option<f64>,
}

impl Status {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            latest_frame: None,
            last_frame_at: None,
            frames_ingested: 0,
            latest_classification: ClassificationResult::default(),
            current_command: RobotCommand::Stop,
            sleep_mode: false,
            alert_recipient: None,
            last_seen_at: now,
            fall_alert: AlertLatch::Armed,
            missing_alert: AlertLatch::Armed,
            last_sensor_distance: None,
        }
    }

    /// Stores a classified frame and advances the command policy. Frame, classification,
    /// command and sighting bookkeeping change together.
    pub fn apply_frame(
        &mut self,
        frame: Arc<[u8]>,
        classification: ClassificationResult,
        now: DateTime<Utc>,
    ) -> Transition {
        let step = transition(&classification, self.sleep_mode, &mut self.fall_alert);

        self.latest_frame = Some(frame);
        self.last_frame_at = Some(now);
        self.frames_ingested = self.frames_ingested.saturating_add(1);
        self.latest_classification = classification;
        self.current_command = step.command;

        if step.sighting {
            self.last_seen_at = now;
            self.missing_alert.rearm();
        }

        step
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let classification = self.latest_classification;
        StatusSnapshot {
            command: self.current_command,
            horizontal_position: classification.horizontal_position,
            body_detected: classification.body_detected,
            face_detected: classification.face_detected,
            lying_down: classification.lying_down,
            user_detected: classification.user_present(),
            fall_detected: self.current_command == RobotCommand::AlertFall,
            sleep_mode: self.sleep_mode,
            alert_recipient: self.alert_recipient.clone(),
            last_seen_at: self.last_seen_at,
            missing_alert_armed: self.missing_alert.is_armed(),
            last_sensor_distance: self.last_sensor_distance,
            last_frame_at: self.last_frame_at,
            frames_ingested: self.frames_ingested,
        }
    }
}

/// Consistent copy of the status for dashboards and queries.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub command: RobotCommand,
    pub horizontal_position: f64,
    pub body_detected: bool,
    pub face_detected: bool,
    pub lying_down: bool,
    pub user_detected: bool,
    pub fall_detected: bool,
    pub sleep_mode: bool,
    pub alert_recipient: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub missing_alert_armed: bool,
    pub last_sensor_distance: Option<f64>,
    pub last_frame_at: Option<DateTime<Utc>>,
    pub frames_ingested: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandSnapshot {
    pub command: RobotCommand,
    pub horizontal_position: f64,
}

/// Shared handle over [`Status`]. Each call runs its closure inside one critical
/// section, so callers never see a half-applied update. Closures must not block.
#[derive(Clone)]
pub struct StatusStore {
    inner: Arc<Mutex<Status>>,
}

impl StatusStore {
    pub fn new(status: Status) -> Self {
        Self {
            inner: Arc::new(Mutex::new(status)),
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Status) -> R) -> R {
        let guard = self.inner.lock().await;
        f(&guard)
    }

    pub async fn update<R>(&self, f: impl FnOnce(&mut Status) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.read(Status::snapshot).await
    }

    pub async fn command(&self) -> CommandSnapshot {
        self.read(|status| CommandSnapshot {
            command: status.current_command,
            horizontal_position: status.latest_classification.horizontal_position,
        })
        .await
    }

    pub async fn latest_frame(&self) -> Option<Arc<[u8]>> {
        self.read(|status| status.latest_frame.clone()).await
    }
}
