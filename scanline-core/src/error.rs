// scanline-core/src/error.rs

use std::io;
use std::path::PathBuf;

/// Hard failures while opening a surface.
///
/// Everything else (format writes, pan requests, console mode, teardown)
/// is logged and skipped rather than surfaced here.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("unable to open fb device {primary:?} or {secondary:?}: {source}")]
    DeviceUnavailable {
        primary: PathBuf,
        secondary: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unusable pixel layout: {0}")]
    NegotiationFailed(String),

    #[error("failed to {what}: {source}")]
    AllocationFailed {
        what: &'static str,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SurfaceError>;
