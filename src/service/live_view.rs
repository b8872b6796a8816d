use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::vision::placeholder_frame;

use super::MonitoringService;

impl MonitoringService {
    /// Streams the latest encoded frame every `live_view_interval` until the receiver
    /// is dropped or the service shuts down. A blank frame stands in until the first
    /// real one arrives.
    pub fn live_view(&self) -> mpsc::Receiver<Arc<[u8]>> {
        let (tx, rx) = mpsc::channel(1);
        let store = self.store.clone();
        let interval = self.config.live_view_interval();
        let cancel_token = self.cancel_token.clone();

        self.tracker.spawn(async move {
            let placeholder: Option<Arc<[u8]>> = match placeholder_frame() {
                Ok(bytes) => Some(Arc::from(bytes)),
                Err(err) => {
                    warn!("live view has no placeholder frame: {err:?}");
                    None
                }
            };

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let latest = store.latest_frame().await;
                        let Some(frame) = latest.or_else(|| placeholder.clone()) else {
                            continue;
                        };
                        tokio::select! {
                            sent = tx.send(frame) => {
                                if sent.is_err() {
                                    debug!("live view consumer disconnected");
                                    break;
                                }
                            }
                            _ = cancel_token.cancelled() => break,
                        }
                    }
                    _ = cancel_token.cancelled() => break,
                }
            }
        });

        rx
    }
}
