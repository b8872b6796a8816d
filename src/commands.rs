use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    models::RobotCommand,
    service::{SensorAck, SleepModeRequest},
    status::{CommandSnapshot, StatusSnapshot},
    AppState,
};

pub async fn submit_frame(state: &AppState, frame: Vec<u8>) -> Result<CommandSnapshot, String> {
    state
        .service
        .submit_frame(frame)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_command(state: &AppState) -> Result<CommandSnapshot, String> {
    Ok(state.service.get_command().await)
}

pub async fn get_status(state: &AppState) -> Result<StatusSnapshot, String> {
    Ok(state.service.get_status().await)
}

/// `None` toggles the current mode.
pub async fn set_sleep_mode(state: &AppState, enabled: Option<bool>) -> Result<bool, String> {
    let request = match enabled {
        Some(value) => SleepModeRequest::Set(value),
        None => SleepModeRequest::Toggle,
    };
    Ok(state.service.set_sleep_mode(request).await)
}

pub async fn set_alert_recipient(state: &AppState, recipient: String) -> Result<(), String> {
    state.service.set_alert_recipient(&recipient).await;
    Ok(())
}

pub async fn set_command(state: &AppState, command: String) -> Result<RobotCommand, String> {
    let command: RobotCommand = command.parse().map_err(|e: anyhow::Error| e.to_string())?;
    state.service.set_command(command).await;
    Ok(command)
}

pub async fn push_sensor_reading(state: &AppState, distance_cm: f64) -> Result<SensorAck, String> {
    Ok(state.service.push_sensor_reading(distance_cm).await)
}

pub fn live_view(state: &AppState) -> mpsc::Receiver<Arc<[u8]>> {
    state.service.live_view()
}
