//! Error taxonomy for detector construction.
//!
//! Every error here is raised before the first frame is processed. Per-frame
//! evaluation has no error channel: empty grids, zero survivors and zero
//! clusters are all represented as empty results.

use thiserror::Error;

/// Structural or numeric problems found while compiling a cascade tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A required node is missing or has the wrong shape.
    #[error("invalid cascade syntax: {0}")]
    InvalidSyntax(String),
    /// A numeric field could not be parsed as the expected number type.
    #[error("failed to parse numeric field: {0}")]
    ParsingError(String),
    /// A classifier tree node branches, which the engine does not support.
    #[error("stage {stage} classifier {classifier}: tree holds more than one Haar feature")]
    ClassifierMoreThanOneHaarFeature { stage: usize, classifier: usize },
}

/// Allocation failures for packed or scratch buffers.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("failed to allocate {what} ({requested} elements)")]
    Allocation { what: &'static str, requested: usize },
    #[error("packed layout overflow: {field} = {value} exceeds {max}")]
    PackedLayoutOverflow {
        field: &'static str,
        value: usize,
        max: usize,
    },
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
    #[error("frame workspace pool is closed")]
    FramePoolClosed,
}

/// Terminal error returned when a detector instance cannot be constructed.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("invalid detector parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T, E = DetectorError> = std::result::Result<T, E>;

/// Reserves exactly `capacity` elements, mapping allocator failure to a
/// [`ResourceError`].
pub(crate) fn try_alloc<T>(capacity: usize, what: &'static str) -> Result<Vec<T>, ResourceError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(capacity)
        .map_err(|_| ResourceError::Allocation {
            what,
            requested: capacity,
        })?;
    Ok(buffer)
}
