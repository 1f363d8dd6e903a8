use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentsError {
    #[error("vote carries no signature")]
    MissingSignature,

    #[error("vote signature verification failed")]
    InvalidSignature,

    #[error("Core error: {0}")]
    Core(#[from] devote_core::CoreError),
}
