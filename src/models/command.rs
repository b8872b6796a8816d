use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

/// Instruction for the physical follower device. Exactly one is current at a time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RobotCommand {
    Search,
    Follow,
    AlertFall,
    #[default]
    Stop,
}

impl RobotCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotCommand::Search => "search",
            RobotCommand::Follow => "follow",
            RobotCommand::AlertFall => "alert_fall",
            RobotCommand::Stop => "stop",
        }
    }

    /// Upper-case token pushed to hardware controllers.
    pub fn wire_name(&self) -> &'static str {
        match self {
            RobotCommand::Search => "SEARCH",
            RobotCommand::Follow => "FOLLOW",
            RobotCommand::AlertFall => "ALERT_FALL",
            RobotCommand::Stop => "STOP",
        }
    }
}

impl fmt::Display for RobotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RobotCommand {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "search" => Ok(RobotCommand::Search),
            "follow" => Ok(RobotCommand::Follow),
            "alert_fall" => Ok(RobotCommand::AlertFall),
            "stop" => Ok(RobotCommand::Stop),
            _ => Err(anyhow!("unknown robot command '{value}'")),
        }
    }
}
