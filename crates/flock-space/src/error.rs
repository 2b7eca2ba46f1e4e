//! Error types for grid layout validation.

use std::fmt;

/// Errors arising from an unusable [`GridLayout`](crate::GridLayout).
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceError {
    /// Cell size is zero, negative, or not finite.
    InvalidCellSize {
        /// The rejected value.
        value: f64,
    },
    /// Baked query radius is zero, negative, or not finite.
    InvalidQueryRadius {
        /// The rejected value.
        value: f64,
    },
    /// World extent is empty or inverted on some axis.
    EmptyWorld {
        /// Human-readable description of the offending axis.
        reason: String,
    },
    /// The world needs more cells on an axis than its key bits can hold.
    ExtentExceedsKeyBudget {
        /// Axis name (`"x"`, `"y"` or `"z"`).
        axis: &'static str,
        /// Cells required along the axis.
        cells: u64,
        /// Maximum cells addressable along the axis.
        max: u64,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { value } => {
                write!(f, "cell_size must be finite and positive, got {value}")
            }
            Self::InvalidQueryRadius { value } => {
                write!(f, "query_radius must be finite and positive, got {value}")
            }
            Self::EmptyWorld { reason } => write!(f, "empty world extent: {reason}"),
            Self::ExtentExceedsKeyBudget { axis, cells, max } => write!(
                f,
                "world needs {cells} cells along {axis}, key budget allows {max}"
            ),
        }
    }
}

impl std::error::Error for SpaceError {}
