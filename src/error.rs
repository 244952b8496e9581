//! Standardised error enum and result type for this crate.

/// Standard result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("depth sensor driver error: {0}")]
    Driver(String),

    #[error("no depth sensor connected")]
    NoDevice,

    #[error("capture thread exited before startup completed")]
    CaptureExited,

    #[error("display error: {0}")]
    Display(String),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The driver's error type stays on its side of the boundary; we keep the text.
    pub(crate) fn driver(err: impl std::fmt::Display) -> Self {
        Error::Driver(err.to_string())
    }

    pub(crate) fn display(err: impl std::fmt::Display) -> Self {
        Error::Display(err.to_string())
    }
}
