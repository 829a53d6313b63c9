use thiserror::Error;

/// Errors at the host boundary. The synchronization engine itself never fails;
/// these only come out of configuration and controller construction.
#[derive(Debug, Error)]
pub enum SegviewError {
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("surface `{0}` was dropped before it could be wired")]
    SurfaceDropped(&'static str),
}

pub type Result<T, E = SegviewError> = std::result::Result<T, E>;
