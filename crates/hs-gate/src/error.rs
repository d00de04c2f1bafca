use thiserror::Error;

/// The run was reset or shut down while (or before) waiting for permission.
///
/// This is a normal abort, not a failure: callers unwind and report nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("run cancelled")]
pub struct Cancelled;
