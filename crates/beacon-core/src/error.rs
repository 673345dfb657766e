use thiserror::Error;

use crate::app::{BuildError, ConfigError};

/// Errors raised before a request reaches the resolver.
///
/// Transport failures never show up here; they are reported in the
/// `ResultEnvelope`.
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("invalid endpoint: {0:?}")]
    InvalidEndpoint(String),

    #[error("{0} must not be empty")]
    MissingField(&'static str),
}
