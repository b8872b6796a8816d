pub mod command;
pub mod observation;

pub use command::RobotCommand;
pub use observation::{
    ClassificationResult, FaceBox, FaceObservation, Landmark, PoseObservation,
};
