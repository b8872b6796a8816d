mod loop_worker;

pub use loop_worker::missing_user_loop;

use chrono::{DateTime, Duration, Utc};

use crate::alerts::Alert;
use crate::status::Status;

/// Missing-user alert ready to dispatch once the status lock is released.
#[derive(Debug, Clone)]
pub struct MissingUser {
    pub recipient: Option<String>,
    pub alert: Alert,
}

/// One monitor tick. Disarms and returns an alert when the user has been absent for
/// longer than `threshold` and the alert is still armed for this absence episode.
pub fn check_absence(
    status: &mut Status,
    now: DateTime<Utc>,
    threshold: Duration,
) -> Option<MissingUser> {
    if !status.missing_alert.is_armed() || now - status.last_seen_at <= threshold {
        return None;
    }

    status.missing_alert.try_fire();
    Some(MissingUser {
        recipient: status.alert_recipient.clone(),
        alert: Alert::user_missing(status.last_seen_at, now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use crate::models::ClassificationResult;
    use std::sync::Arc;

    fn threshold() -> Duration {
        Duration::minutes(20)
    }

    #[test]
    fn fires_only_after_threshold() {
        let seen = Utc::now();
        let mut status = Status::new(seen);

        let just_before = seen + Duration::minutes(19) + Duration::seconds(59);
        assert!(check_absence(&mut status, just_before, threshold()).is_none());
        assert!(status.missing_alert.is_armed());

        let just_after = seen + Duration::minutes(20) + Duration::seconds(1);
        let fired = check_absence(&mut status, just_after, threshold()).unwrap();
        assert_eq!(fired.alert.kind, AlertKind::UserMissing);
        assert!(!status.missing_alert.is_armed());
    }

    #[test]
    fn exactly_at_threshold_does_not_fire() {
        let seen = Utc::now();
        let mut status = Status::new(seen);
        assert!(check_absence(&mut status, seen + threshold(), threshold()).is_none());
    }

    #[test]
    fn fires_once_per_absence_episode() {
        let seen = Utc::now();
        let mut status = Status::new(seen);
        status.alert_recipient = Some("carer@example.com".into());

        let fired = (21..40)
            .filter_map(|minute| {
                check_absence(&mut status, seen + Duration::minutes(minute), threshold())
            })
            .collect::<Vec<_>>();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].recipient.as_deref(), Some("carer@example.com"));
    }

    #[test]
    fn sighting_rearms_for_next_episode() {
        let seen = Utc::now();
        let mut status = Status::new(seen);
        assert!(check_absence(&mut status, seen + Duration::minutes(25), threshold()).is_some());

        let back = seen + Duration::minutes(26);
        let face = ClassificationResult {
            face_detected: true,
            ..ClassificationResult::default()
        };
        status.apply_frame(Arc::from(vec![0u8]), face, back);
        assert!(status.missing_alert.is_armed());

        assert!(check_absence(&mut status, back + Duration::minutes(10), threshold()).is_none());
        assert!(check_absence(&mut status, back + Duration::minutes(21), threshold()).is_some());
    }
}
