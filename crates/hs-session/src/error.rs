use hs_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid world: {0}")]
    Core(#[from] CoreError),

    #[error("failed to spawn behavior thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("session driver is gone")]
    Disconnected,
}

pub type SessionResult<T> = Result<T, SessionError>;
