use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    /// A structural invariant was violated while building a geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A binary read needed more bytes than the buffer holds.
    #[error("truncated data: needed {needed} byte(s) at offset {offset}, {available} available")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Unknown type code, unsupported encoding feature, or a capability that is switched off.
    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("geometry is not a {0}")]
    WrongType(&'static str),

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("geozero error: {0}")]
    Geozero(#[from] geozero::error::GeozeroError),
}

impl GeometryError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedGeometry(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GeometryError>;
