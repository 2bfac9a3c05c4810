//! Defines [`CatchmentError`], representing all errors returned by this crate.

use std::borrow::Cow;
use std::fmt::Debug;

use arrow_schema::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CatchmentError {
    /// The designated geometry column does not exist in the input table.
    #[error("Geometry column '{0}' not found in table")]
    MissingGeometryColumn(String),

    /// A non-geometry column required by an operation does not exist.
    #[error("Column '{0}' not found in table")]
    MissingColumn(String),

    /// The geometry column (or a decoded geometry) does not follow the
    /// multipolygon / ring / vertex nesting.
    #[error("Unsupported geometry shape: {0}")]
    UnsupportedGeometryShape(Cow<'static, str>),

    /// Incorrect type was passed to an operation.
    #[error("Incorrect type passed to operation: {0}")]
    IncorrectType(Cow<'static, str>),

    /// None of the expected input files were present.
    #[error("No input files found in {0}")]
    NoInputs(String),

    /// General error.
    #[error("General error: {0}")]
    General(String),

    /// Offsets no longer fit in 32 bits.
    #[error("Overflow")]
    Overflow,

    /// [ArrowError]
    #[error(transparent)]
    Arrow(#[from] ArrowError),

    /// [ParquetError]
    #[error(transparent)]
    Parquet(#[from] ParquetError),

    /// [std::io::Error]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    /// [wkb::error::WKBError]
    #[error(transparent)]
    WkbError(#[from] wkb::error::WKBError),

    /// [gdal::errors::GdalError]
    #[cfg(feature = "gdal")]
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, CatchmentError>;
