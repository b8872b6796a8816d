mod error;
mod ingest;
mod live_view;

pub use error::IngestError;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::{
    alerts::{AlertChannel, AlertDispatcher},
    clock::Clock,
    config::ServiceConfig,
    hardware::{hardware_loop, HardwareLink},
    models::RobotCommand,
    monitor::missing_user_loop,
    status::{CommandSnapshot, Status, StatusSnapshot, StatusStore},
    vision::{GuardedDetector, VisionDetector},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SleepModeRequest {
    Set(bool),
    Toggle,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorAck {
    pub distance_cm: f64,
    pub stopped: bool,
}

/// Owns the status store and every background task around it. Cheap to clone; all
/// clones share the same state.
#[derive(Clone)]
pub struct MonitoringService {
    store: StatusStore,
    dispatcher: AlertDispatcher,
    detector: GuardedDetector,
    clock: Arc<dyn Clock>,
    config: Arc<ServiceConfig>,
    cancel_token: CancellationToken,
    tracker: TaskTracker,
    monitor_started: Arc<Mutex<bool>>,
    hardware_started: Arc<Mutex<bool>>,
    dispatcher_cancel: CancellationToken,
    dispatcher_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MonitoringService {
    /// Must be called inside a tokio runtime; the alert worker starts immediately.
    pub fn new(
        config: ServiceConfig,
        detector: Arc<dyn VisionDetector>,
        channel: Arc<dyn AlertChannel>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut status = Status::new(clock.now());
        status.sleep_mode = config.sleep_mode;
        status.alert_recipient = config.alert_recipient.clone();

        let dispatcher_cancel = CancellationToken::new();
        let (dispatcher, dispatcher_handle) =
            AlertDispatcher::spawn(channel, dispatcher_cancel.clone());

        Self {
            store: StatusStore::new(status),
            dispatcher,
            detector: GuardedDetector::new(detector),
            clock,
            config: Arc::new(config),
            cancel_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            monitor_started: Arc::new(Mutex::new(false)),
            hardware_started: Arc::new(Mutex::new(false)),
            dispatcher_cancel,
            dispatcher_handle: Arc::new(Mutex::new(Some(dispatcher_handle))),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub async fn get_command(&self) -> CommandSnapshot {
        self.store.command().await
    }

    pub async fn get_status(&self) -> StatusSnapshot {
        self.store.snapshot().await
    }

    pub async fn set_sleep_mode(&self, request: SleepModeRequest) -> bool {
        let sleep_mode = self
            .store
            .update(|status| {
                status.sleep_mode = match request {
                    SleepModeRequest::Set(value) => value,
                    SleepModeRequest::Toggle => !status.sleep_mode,
                };
                status.sleep_mode
            })
            .await;
        info!("sleep mode set to {sleep_mode}");
        sleep_mode
    }

    /// Blank input clears the recipient, which turns alerting into a no-op.
    pub async fn set_alert_recipient(&self, recipient: &str) {
        let recipient = recipient.trim();
        let recipient = (!recipient.is_empty()).then(|| recipient.to_string());
        info!("alert recipient set to {recipient:?}");
        self.store
            .update(|status| status.alert_recipient = recipient)
            .await;
    }

    /// Operator override. The next ingested frame recomputes the command as usual.
    pub async fn set_command(&self, command: RobotCommand) {
        info!("command overridden to {command}");
        self.store
            .update(|status| status.current_command = command)
            .await;
    }

    /// Records a distance reading; anything closer than the proximity limit forces
    /// `Stop`. Non-finite readings are dropped.
    pub async fn push_sensor_reading(&self, distance_cm: f64) -> SensorAck {
        if !distance_cm.is_finite() {
            warn!("ignoring non-finite sensor reading {distance_cm}");
            return SensorAck {
                distance_cm,
                stopped: false,
            };
        }

        let limit = self.config.proximity_stop_cm;
        let stopped = self
            .store
            .update(|status| {
                status.last_sensor_distance = Some(distance_cm);
                let too_close = distance_cm < limit;
                if too_close {
                    status.current_command = RobotCommand::Stop;
                }
                too_close
            })
            .await;

        if stopped {
            info!("obstacle at {distance_cm}cm (< {limit}cm), forcing stop");
        }
        SensorAck {
            distance_cm,
            stopped,
        }
    }

    pub async fn start_monitor(&self) -> Result<()> {
        let mut started = self.monitor_started.lock().await;
        if *started {
            bail!("missing-user monitor already running");
        }
        if self.cancel_token.is_cancelled() {
            bail!("service is shutting down");
        }

        self.tracker.spawn(missing_user_loop(
            self.store.clone(),
            self.dispatcher.clone(),
            Arc::clone(&self.clock),
            self.config.monitor_interval(),
            self.config.absence_threshold(),
            self.cancel_token.clone(),
        ));
        *started = true;
        info!(
            "missing-user monitor started (every {:?}, threshold {}s)",
            self.config.monitor_interval(),
            self.config.absence_threshold_secs
        );
        Ok(())
    }

    pub async fn start_hardware<L: HardwareLink>(&self, link: L) -> Result<()> {
        let mut started = self.hardware_started.lock().await;
        if *started {
            bail!("hardware loop already running");
        }
        if self.cancel_token.is_cancelled() {
            bail!("service is shutting down");
        }

        self.tracker.spawn(hardware_loop(
            self.clone(),
            link,
            self.config.hardware_interval(),
            self.cancel_token.clone(),
        ));
        *started = true;
        info!("hardware loop started");
        Ok(())
    }

    /// Stops every background task and waits for it, including frames already inside
    /// `submit_frame`. Alerts raised before the call returns are still delivered. Safe
    /// to call more than once.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutting down monitoring service");
        self.cancel_token.cancel();
        self.tracker.close();
        self.tracker.wait().await;

        self.dispatcher_cancel.cancel();
        if let Some(handle) = self.dispatcher_handle.lock().await.take() {
            handle.await.context("alert dispatcher failed to join")?;
        }
        Ok(())
    }
}
