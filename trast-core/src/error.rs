/// Error types for the rendering core
use thiserror::Error;

/// Failures surfaced by the core arenas and the palette quantizer.
///
/// Arena and bounds errors indicate a bug in the surrounding render-loop
/// logic and should be propagated, not recovered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("capacity exceeded: {arena} is full at {capacity} entries")]
    CapacityExceeded {
        arena: &'static str,
        capacity: usize,
    },
    #[error("{what} {index} out of range (valid: 0..{len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("invalid palette: no entries to quantize against")]
    InvalidPalette,
}
