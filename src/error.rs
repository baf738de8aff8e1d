use std::error::Error;
use std::fmt;

/// Fatal construction-time failures. Everything else in the simulator is
/// either a warning (topology gaps) or ordinary data (unused grant capacity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Invalid line rate, refractive index, or traffic profile parameters.
    Configuration(String),
    /// Algorithm name absent from the DBA registry.
    UnknownAlgorithm(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            SimError::UnknownAlgorithm(name) => write!(f, "unknown DBA algorithm: {}", name),
        }
    }
}

impl Error for SimError {}
