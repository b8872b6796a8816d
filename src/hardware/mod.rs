mod loop_worker;

pub use loop_worker::hardware_loop;

use anyhow::Result;

use crate::status::CommandSnapshot;

/// Link to the follower device (serial port, BLE bridge, ...). Calls are blocking and
/// run on a blocking worker.
pub trait HardwareLink: Send + 'static {
    /// Pushes the current command downstream.
    fn push_command(&mut self, command: &CommandSnapshot) -> Result<()>;

    /// Latest distance reading in centimetres, if the device produced one since the
    /// last poll.
    fn poll_distance(&mut self) -> Result<Option<f64>>;
}
