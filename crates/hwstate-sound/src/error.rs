//! Error and trace model
//!
//! Every fallible operation returns [`Result<T>`]. An [`Error`] carries its root
//! cause plus a trace of call-site frames collected while it propagates upward,
//! rendered as `root cause -> frame -> frame`.

use std::fmt;
use std::panic::Location;
use thiserror::Error as ThisError;

/// Sentinel returned by [`Outcome::error_message`] for a successful result
pub const NO_ERROR: &str = "no error";

/// Root cause of a failed mixer operation
#[derive(Debug, ThisError)]
pub enum MixerError {
    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Volume {0}% out of bounds [0, 100]")]
    OutOfRange(f64),

    #[error("Invalid access: result holds no value")]
    InvalidAccess,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// A [`MixerError`] with its accumulated trace
#[derive(Debug)]
pub struct Error {
    kind: MixerError,
    trace: Vec<String>,
}

impl Error {
    /// Create an error with an empty trace
    pub fn new(kind: MixerError) -> Self {
        Self {
            kind,
            trace: Vec::new(),
        }
    }

    /// Shorthand for a platform failure
    pub fn platform(message: impl Into<String>) -> Self {
        Self::new(MixerError::Platform(message.into()))
    }

    /// Root cause
    pub fn kind(&self) -> &MixerError {
        &self.kind
    }

    /// Frames appended while propagating, innermost first
    pub fn frames(&self) -> &[String] {
        &self.trace
    }

    /// Append a frame naming `operation` and the caller's location
    #[track_caller]
    pub fn trace(self, operation: &str) -> Self {
        self.trace_at(operation, Location::caller())
    }

    fn trace_at(mut self, operation: &str, location: &Location<'_>) -> Self {
        self.trace.push(format!(
            "{} ({}:{})",
            operation,
            location.file(),
            location.line()
        ));
        self
    }

    pub fn is_platform(&self) -> bool {
        matches!(self.kind, MixerError::Platform(_))
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, MixerError::OutOfRange(_))
    }

    pub fn is_invalid_access(&self) -> bool {
        matches!(self.kind, MixerError::InvalidAccess)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for frame in &self.trace {
            write!(f, " -> {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<MixerError> for Error {
    fn from(kind: MixerError) -> Self {
        Self::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.into())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(err.into())
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// A fallible operation with no payload
pub type Status = Result<()>;

/// Trace propagation for results
pub trait ResultExt<T> {
    /// On failure, append a frame naming `operation` and the caller's location
    fn trace(self, operation: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[track_caller]
    fn trace(self, operation: &str) -> Result<T> {
        let location = Location::caller();
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(err.trace_at(operation, location)),
        }
    }
}

/// Checked inspection of a result without consuming it
pub trait Outcome<T> {
    fn has_value(&self) -> bool;

    fn has_error(&self) -> bool;

    /// Borrow the value, or fail with [`MixerError::InvalidAccess`]
    fn value(&self) -> Result<&T>;

    /// The rendered error, or [`NO_ERROR`] on success
    fn error_message(&self) -> String;
}

impl<T> Outcome<T> for Result<T> {
    fn has_value(&self) -> bool {
        self.is_ok()
    }

    fn has_error(&self) -> bool {
        self.is_err()
    }

    #[track_caller]
    fn value(&self) -> Result<&T> {
        match self {
            Ok(value) => Ok(value),
            Err(_) => Err(Error::new(MixerError::InvalidAccess).trace("Outcome::value")),
        }
    }

    fn error_message(&self) -> String {
        match self {
            Ok(_) => NO_ERROR.to_string(),
            Err(err) => err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing() -> Result<u32> {
        Err(Error::platform("device busy"))
    }

    fn middle() -> Result<u32> {
        failing().trace("middle")
    }

    fn outer() -> Result<u32> {
        middle().trace("outer")
    }

    #[test]
    fn test_trace_order_root_first() {
        let err = outer().unwrap_err();
        let message = err.to_string();

        assert!(message.starts_with("Platform error: device busy -> middle ("));
        let middle_at = message.find("middle").unwrap();
        let outer_at = message.find("outer").unwrap();
        assert!(middle_at < outer_at);
        assert_eq!(err.frames().len(), 2);
        assert!(err.frames()[0].contains("error.rs:"));
    }

    #[test]
    fn test_trace_on_success_is_noop() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(ok.trace("unused").unwrap(), 7);
    }

    #[test]
    fn test_outcome_success() {
        let ok: Result<u32> = Ok(3);
        assert!(ok.has_value());
        assert!(!ok.has_error());
        assert_eq!(*ok.value().unwrap(), 3);
        assert_eq!(ok.error_message(), NO_ERROR);
    }

    #[test]
    fn test_outcome_failure() {
        let status: Status = Err(Error::new(MixerError::OutOfRange(101.0)));
        assert!(!status.has_value());
        assert!(status.has_error());
        assert!(status.value().unwrap_err().is_invalid_access());
        assert_eq!(
            status.error_message(),
            "Volume 101% out of bounds [0, 100]"
        );
    }

    #[test]
    fn test_error_kind_predicates() {
        assert!(Error::platform("x").is_platform());
        assert!(Error::new(MixerError::OutOfRange(-1.0)).is_out_of_range());
        assert!(!Error::platform("x").is_out_of_range());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err.kind(), MixerError::Io(_)));
    }
}
