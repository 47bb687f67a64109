//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns [`Result<T, Error>`](Error).
//! There is no panic path in the core: malformed peer input, protocol
//! violations and resource-exhaustion conditions are all typed return
//! values.

use std::{
    error::Error as StdError,
    fmt::{self, Display},
};

/// The single error type shared by the band estimator, DPP core, FT core
/// and netlink attribute codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Malformed caller input (bad URI grammar, wrong buffer length, ...).
    InvalidArgument,
    /// Protocol-level framing or signature/MIC failure.
    BadMessage,
    /// A required capability is absent (e.g. no HT/VHT support advertised).
    Unsupported,
    /// No workable configuration exists (e.g. RSSI too low for any rate).
    NotApplicable,
    /// An attribute id is not present in the codec's schema at all.
    NotSupported,
    /// An attribute id occurs more than once in the same message.
    AlreadyPresent,
    /// A requested attribute id was not found in the message.
    NotFound,
    /// The peer replied with a non-zero protocol status code.
    Rejected(u16),
    /// No response arrived before the timeout window elapsed.
    Timeout,
    /// Arbitrary contextual error message, for cases the typed variants
    /// above don't capture precisely.
    Msg(MsgError),
}

impl Error {
    /// Construct an [`Error::Msg`] from anything [`Display`].
    pub fn msg<D>(d: D) -> Self
    where
        D: Display,
    {
        Error::Msg(MsgError::new(d))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument => write!(f, "invalid argument"),
            Error::BadMessage => write!(f, "malformed or unauthenticated message"),
            Error::Unsupported => write!(f, "required capability not supported"),
            Error::NotApplicable => write!(f, "no applicable configuration"),
            Error::NotSupported => write!(f, "attribute id not present in schema"),
            Error::AlreadyPresent => write!(f, "attribute occurred more than once"),
            Error::NotFound => write!(f, "attribute not found"),
            Error::Rejected(status) => write!(f, "peer rejected with status {status}"),
            Error::Timeout => write!(f, "timed out waiting for a response"),
            Error::Msg(ref m) => write!(f, "{m}"),
        }
    }
}

impl StdError for Error {}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::Msg(MsgError::new(err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Msg(MsgError::new(err))
    }
}

impl From<std::array::TryFromSliceError> for Error {
    fn from(_: std::array::TryFromSliceError) -> Self {
        Error::InvalidArgument
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Msg(MsgError::new(err))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Msg(MsgError::new(err))
    }
}

/// Arbitrary error message, boxed up so [`Error`] stays [`Clone`] + [`Eq`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgError(String);

impl MsgError {
    /// Construct a new error message from anything [`Display`].
    pub fn new<D>(d: D) -> Self
    where
        D: Display,
    {
        MsgError(d.to_string())
    }
}

impl Display for MsgError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for MsgError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
