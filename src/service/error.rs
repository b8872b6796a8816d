/// Failures surfaced to whoever submitted a frame. Everything else is absorbed
/// inside the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("frame payload is empty")]
    EmptyFrame,

    #[error("frame could not be decoded: {0}")]
    Undecodable(String),

    #[error("service is shutting down")]
    ShuttingDown,
}
