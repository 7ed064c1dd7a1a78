//! Error types for the persistence coordinator
use thiserror::Error;

/// A stage of [`flush_all`](super::PersistenceCoordinator::flush_all).
///
/// Stages run in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushStage {
    /// Provider credential stores
    Credentials,
    /// Users, refresh tokens and the signing key
    Identity,
}

impl std::fmt::Display for FlushStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushStage::Credentials => write!(f, "credentials"),
            FlushStage::Identity => write!(f, "identity"),
        }
    }
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A flush stage failed. Stages before it were written and are not
    /// rolled back; stages after it were not attempted.
    #[error("Flush failed at the {stage} stage")]
    FlushFailed {
        stage: FlushStage,
        #[source]
        source: Box<crate::Error>,
    },
}

impl PersistenceError {
    /// The stage that failed.
    pub fn stage(&self) -> FlushStage {
        match self {
            PersistenceError::FlushFailed { stage, .. } => *stage,
        }
    }
}

impl From<PersistenceError> for crate::Error {
    fn from(err: PersistenceError) -> Self {
        crate::Error::Persistence(err)
    }
}
