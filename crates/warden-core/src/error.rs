//! Error types for core format handling.

/// Errors raised while resolving format options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The requested point target falls outside the format's range.
    #[error("point target {requested} is outside the allowed range {min}-{max}")]
    TargetOutOfRange { requested: u32, min: u32, max: u32 },
}
