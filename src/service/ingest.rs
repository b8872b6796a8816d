use std::sync::Arc;

use log::debug;

use crate::alerts::Alert;
use crate::presence::classify;
use crate::status::CommandSnapshot;
use crate::vision::decode_frame;

use super::{IngestError, MonitoringService};

impl MonitoringService {
    /// Decodes, classifies and applies one camera frame. Only undecodable input is
    /// reported back; detector trouble degrades to "nobody seen".
    pub async fn submit_frame(&self, bytes: Vec<u8>) -> Result<CommandSnapshot, IngestError> {
        // Held until the frame is applied so `shutdown` waits for it.
        let _in_flight = self.tracker.token();
        if self.cancel_token.is_cancelled() {
            return Err(IngestError::ShuttingDown);
        }
        if bytes.is_empty() {
            return Err(IngestError::EmptyFrame);
        }

        let frame: Arc<[u8]> = Arc::from(bytes);
        let image = tokio::task::spawn_blocking({
            let frame = Arc::clone(&frame);
            move || decode_frame(&frame)
        })
        .await
        .map_err(|join_err| IngestError::Undecodable(join_err.to_string()))?
        .map_err(|err| IngestError::Undecodable(format!("{err:#}")))?;

        let (pose, face) = self
            .detector
            .observe(Arc::new(image), self.config.detector_timeout())
            .await;
        let classification = classify(
            pose.as_ref(),
            face.as_ref(),
            self.config.lying_gap_threshold,
        );

        // Time is read under the lock so frames and monitor ticks see it in order.
        let (step, recipient, now) = self
            .store
            .update(|status| {
                let now = self.clock.now();
                let step = status.apply_frame(frame, classification, now);
                (step, status.alert_recipient.clone(), now)
            })
            .await;

        debug!(
            "frame classified: body={} face={} lying={} -> {}",
            classification.body_detected,
            classification.face_detected,
            classification.lying_down,
            step.command
        );

        if step.fall_alert {
            self.dispatcher.dispatch(recipient, Alert::fall(now));
        }

        Ok(CommandSnapshot {
            command: step.command,
            horizontal_position: classification.horizontal_position,
        })
    }
}
