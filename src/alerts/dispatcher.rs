use std::sync::Arc;

use log::{error, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{Alert, AlertChannel};

struct Delivery {
    recipient: String,
    alert: Alert,
}

/// Best-effort, non-blocking alert queue. `dispatch` only enqueues; a single worker
/// task performs delivery and swallows (logs) every failure.
#[derive(Clone)]
pub struct AlertDispatcher {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl AlertDispatcher {
    /// Starts the delivery worker. The worker drains queued alerts and exits once
    /// `cancel_token` fires or every dispatcher handle is dropped.
    pub fn spawn(
        channel: Arc<dyn AlertChannel>,
        cancel_token: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(delivery_loop(channel, rx, cancel_token));
        (Self { tx }, handle)
    }

    /// Queues `alert` for `recipient`. Without a recipient this is a logged no-op.
    pub fn dispatch(&self, recipient: Option<String>, alert: Alert) {
        let Some(recipient) = recipient else {
            info!(
                "no alert recipient configured; dropping {} alert {}",
                alert.kind, alert.id
            );
            return;
        };

        info!("dispatching {} alert {} to {}", alert.kind, alert.id, recipient);
        if let Err(err) = self.tx.send(Delivery { recipient, alert }) {
            error!("alert queue closed, {} alert {} lost", err.0.alert.kind, err.0.alert.id);
        }
    }
}

async fn delivery_loop(
    channel: Arc<dyn AlertChannel>,
    mut rx: mpsc::UnboundedReceiver<Delivery>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            next = rx.recv() => match next {
                Some(delivery) => deliver(&channel, delivery).await,
                None => break,
            },
            _ = cancel_token.cancelled() => {
                // flush what was already queued, then stop
                rx.close();
                while let Some(delivery) = rx.recv().await {
                    deliver(&channel, delivery).await;
                }
                break;
            }
        }
    }
    info!("alert dispatcher shutting down");
}

async fn deliver(channel: &Arc<dyn AlertChannel>, delivery: Delivery) {
    let channel = Arc::clone(channel);
    let id = delivery.alert.id.clone();
    let result = tokio::task::spawn_blocking(move || {
        channel.deliver(&delivery.recipient, &delivery.alert)
    })
    .await;

    match result {
        Ok(Ok(())) => info!("alert {id} delivered"),
        Ok(Err(err)) => error!("alert {id} delivery failed: {err:?}"),
        Err(join_err) => error!("alert {id} delivery worker panicked: {join_err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use crate::test_support::{FailingChannel, RecordingChannel};
    use chrono::Utc;

    #[tokio::test]
    async fn delivers_to_configured_recipient() {
        let channel = RecordingChannel::default();
        let cancel = CancellationToken::new();
        let (dispatcher, handle) =
            AlertDispatcher::spawn(Arc::new(channel.clone()), cancel.clone());

        dispatcher.dispatch(Some("carer@example.com".into()), Alert::fall(Utc::now()));
        cancel.cancel();
        handle.await.unwrap();

        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "carer@example.com");
        assert_eq!(sent[0].1.kind, AlertKind::Fall);
    }

    #[tokio::test]
    async fn missing_recipient_is_a_no_op() {
        let channel = RecordingChannel::default();
        let cancel = CancellationToken::new();
        let (dispatcher, handle) =
            AlertDispatcher::spawn(Arc::new(channel.clone()), cancel.clone());

        dispatcher.dispatch(None, Alert::fall(Utc::now()));
        cancel.cancel();
        handle.await.unwrap();

        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn delivery_failures_do_not_stop_the_worker() {
        let cancel = CancellationToken::new();
        let (dispatcher, handle) =
            AlertDispatcher::spawn(Arc::new(FailingChannel), cancel.clone());

        dispatcher.dispatch(Some("a@example.com".into()), Alert::fall(Utc::now()));
        dispatcher.dispatch(Some("b@example.com".into()), Alert::fall(Utc::now()));
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        cancel.cancel();
        handle.await.unwrap();
    }
}
