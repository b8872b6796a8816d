use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::service::MonitoringService;
use crate::status::CommandSnapshot;

use super::HardwareLink;

/// Pushes the current command to the device and feeds its distance readings back,
/// once per `interval`, until `cancel_token` fires. Link failures are logged and the
/// loop carries on.
///
/// At most one exchange is in flight. The link moves into the blocking worker and
/// comes back with the result; while a call is stuck, ticks are skipped instead of
/// queueing more blocked workers.
pub async fn hardware_loop<L: HardwareLink>(
    service: MonitoringService,
    link: L,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let stall_after = interval * 10;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut idle = Some(link);
    let mut in_flight: Option<(JoinHandle<(L, Result<Option<f64>>)>, Instant)> = None;
    let mut stall_reported = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some((handle, started)) = &in_flight {
                    if !handle.is_finished() {
                        if !stall_reported && started.elapsed() >= stall_after {
                            warn!(
                                "hardware exchange stuck for {:?}, skipping ticks until it returns",
                                started.elapsed()
                            );
                            stall_reported = true;
                        }
                        continue;
                    }
                }

                if let Some((handle, _)) = in_flight.take() {
                    stall_reported = false;
                    match handle.await {
                        Ok((link, result)) => {
                            idle = Some(link);
                            apply_exchange(&service, result).await;
                        }
                        Err(join_err) => {
                            error!("hardware worker panicked, link lost: {join_err}");
                            break;
                        }
                    }
                }

                let Some(mut link) = idle.take() else {
                    break;
                };
                let command = service.get_command().await;
                let handle = tokio::task::spawn_blocking(move || {
                    let result = exchange(&mut link, &command);
                    (link, result)
                });
                in_flight = Some((handle, Instant::now()));
            }
            _ = cancel_token.cancelled() => {
                info!("hardware loop shutting down");
                break;
            }
        }
    }
}

async fn apply_exchange(service: &MonitoringService, result: Result<Option<f64>>) {
    match result {
        Ok(Some(distance)) => {
            service.push_sensor_reading(distance).await;
        }
        Ok(None) => {}
        Err(err) => warn!("hardware exchange failed: {err:?}"),
    }
}

fn exchange<L: HardwareLink>(link: &mut L, command: &CommandSnapshot) -> Result<Option<f64>> {
    link.push_command(command).context("failed to push command")?;
    link.poll_distance().context("failed to read distance")
}
