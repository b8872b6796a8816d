use crate::models::{ClassificationResult, RobotCommand};

use super::latch::AlertLatch;

/// Outcome of evaluating one frame against the command policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub command: RobotCommand,
    /// Set on the edge into a fall episode only.
    pub fall_alert: bool,
    /// A face was seen; the caller refreshes last-seen and re-arms the missing alert.
    pub sighting: bool,
}

/// Picks the next command for one classified frame.
///
/// Precedence: a lying body outside sleep mode wins (`AlertFall`), then any
/// presence (`Follow`), otherwise `Search`. `Stop` is never produced here; it only
/// arrives through an override or the proximity sensor.
///
/// `fall_latch` tracks the current fall episode: it fires on the first frame of
/// the episode and is re-armed by the first frame that leaves it.
pub fn transition(
    classification: &ClassificationResult,
    sleep_mode: bool,
    fall_latch: &mut AlertLatch,
) -> Transition {
    let fallen = classification.body_detected && classification.lying_down && !sleep_mode;

    let (command, fall_alert) = if fallen {
        (RobotCommand::AlertFall, fall_latch.try_fire())
    } else {
        fall_latch.rearm();
        if classification.user_present() {
            (RobotCommand::Follow, false)
        } else {
            (RobotCommand::Search, false)
        }
    };

    Transition {
        command,
        fall_alert,
        sighting: classification.face_detected,
    }
}
