use std::fmt;

/// Errors surfaced by the presentation bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Buffer length is not an exact multiple of `width * 4`, or width is zero
    InvalidBufferShape { len: usize, width: u32 },

    /// The display surface could not be found or created at startup
    SurfaceUnavailable(String),

    /// The graphics backend rejected an operation after initialization
    Backend(String),
}

impl BridgeError {
    pub fn surface_unavailable(reason: impl Into<String>) -> Self {
        Self::SurfaceUnavailable(reason.into())
    }

    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend(reason.into())
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBufferShape { len, width } => write!(
                f,
                "invalid buffer shape: {} bytes is not a whole number of {}-pixel RGBA rows",
                len, width
            ),
            Self::SurfaceUnavailable(reason) => write!(f, "display surface unavailable: {}", reason),
            Self::Backend(reason) => write!(f, "graphics backend error: {}", reason),
        }
    }
}

impl std::error::Error for BridgeError {}

pub type Result<T> = std::result::Result<T, BridgeError>;
