use std::result;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Caller contract violations raised by the grouping and resampling entry
/// points. All preconditions are validated eagerly; there is no retry or
/// partial-failure recovery.
///
#[derive(Debug, Error)]
pub enum Error {
    #[error("no coordinate named {0:?}")]
    MissingCoordinate(String),

    #[error("no dimension named {0:?}")]
    MissingDimension(String),

    #[error("dimension {0:?} must be the leading (chunked) axis")]
    NotLeadingAxis(String),

    #[error("time axis is irregular: {0}")]
    IrregularAxis(String),

    #[error("time axis does not span whole years: starts {start}, ends {end}")]
    PartialYear {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("{samples} samples does not evenly divide axis length {length}")]
    UnevenSamples { samples: usize, length: usize },

    #[error("{dims} dimension names given for an array of {ndim} dimensions")]
    DimensionMismatch { dims: usize, ndim: usize },

    #[error(
        "coordinate for {dim:?} has {coordinate} values but the dimension \
         has length {dimension}"
    )]
    CoordinateLength {
        dim: String,
        coordinate: usize,
        dimension: usize,
    },

    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}

pub type Result<T> = result::Result<T, Error>;
