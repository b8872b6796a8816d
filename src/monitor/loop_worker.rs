use std::sync::Arc;

use log::{debug, info};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::alerts::AlertDispatcher;
use crate::clock::Clock;
use crate::status::StatusStore;

use super::check_absence;

/// Periodic absence check. Runs until `cancel_token` fires; the alert is dispatched
/// after the status lock has been released.
pub async fn missing_user_loop(
    store: StatusStore,
    dispatcher: AlertDispatcher,
    clock: Arc<dyn Clock>,
    interval: Duration,
    threshold: chrono::Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (now, fired) = store
                    .update(|status| {
                        let now = clock.now();
                        (now, check_absence(status, now, threshold))
                    })
                    .await;

                match fired {
                    Some(missing) => {
                        let id = &missing.alert.id;
                        info!("user absent past threshold, raising missing alert {id}");
                        dispatcher.dispatch(missing.recipient, missing.alert);
                    }
                    None => debug!("missing-user check at {now}: nothing to report"),
                }
            }
            _ = cancel_token.cancelled() => {
                info!("missing-user monitor shutting down");
                break;
            }
        }
    }
}
