pub mod dispatcher;

pub use dispatcher::AlertDispatcher;

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Fall,
    UserMissing,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Fall => f.write_str("fall"),
            AlertKind::UserMissing => f.write_str("user_missing"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub subject: String,
    pub body: String,
    pub raised_at: DateTime<Utc>,
    /// Last face sighting the alert refers to; only set for `UserMissing`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(
        kind: AlertKind,
        subject: impl Into<String>,
        body: impl Into<String>,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            subject: subject.into(),
            body: body.into(),
            raised_at,
            last_seen_at: None,
        }
    }

    pub fn fall(raised_at: DateTime<Utc>) -> Self {
        Self::new(
            AlertKind::Fall,
            "Fall detected",
            format!(
                "A lying-down posture was detected at {}. Please check on the user.",
                raised_at.to_rfc3339()
            ),
            raised_at,
        )
    }

    pub fn user_missing(last_seen_at: DateTime<Utc>, raised_at: DateTime<Utc>) -> Self {
        let minutes = (raised_at - last_seen_at).num_minutes();
        let alert = Self::new(
            AlertKind::UserMissing,
            "User missing",
            format!(
                "The user has not been seen for {minutes} minutes (last seen {}).",
                last_seen_at.to_rfc3339()
            ),
            raised_at,
        );
        Self {
            last_seen_at: Some(last_seen_at),
            ..alert
        }
    }
}

/// Delivery channel for alerts (email, SMS gateway, ...). Called from a blocking
/// worker, so implementations may do synchronous network I/O.
pub trait AlertChannel: Send + Sync + 'static {
    fn deliver(&self, recipient: &str, alert: &Alert) -> Result<()>;
}

/// Channel that only writes alerts to the log. Used when no delivery backend is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

impl AlertChannel for LogChannel {
    fn deliver(&self, recipient: &str, alert: &Alert) -> Result<()> {
        info!(
            "[alert:{}] to={} subject={:?} body={:?}",
            alert.kind, recipient, alert.subject, alert.body
        );
        Ok(())
    }
}
