//! This is the module that contains the error types used in `genl-netdev`
//!
//! There are two layers of errors:
//! * Codec errors - [`SerError`], [`DeError`] and [`PolicyError`] describe
//!   failures to turn data structures into bytes and back.
//! * Protocol errors - [`BindingError`], [`TransportError`], [`DecodeError`],
//!   [`QueryError`] and [`NetdevError`] describe why a device query or a
//!   cache read did not produce a value.
//!
//! # Design decisions
//! All errors implement `std::error::Error` in an attempt to allow
//! them to be used in conjunction with `Result` for easier error
//! management even at the protocol error level.
//!
//! [`BindingError`] is `Clone` because the outcome of the one-time
//! family binding is handed out to every later caller.

use std::{
    error::Error,
    fmt::{self, Display},
    io, str, string,
};

use crate::{netdev::CachedField, policy::PolicyType};

macro_rules! err_from {
    ($err:ident, $($from_err:path { $from_impl:expr }),+) => {
        $(
            impl From<$from_err> for $err {
                fn from(e: $from_err) -> Self {
                    $from_impl(e)
                }
            }
        )*
    };
}

/// Error returned by the `build()` method of every builder in this
/// crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuilderError(String);

impl From<derive_builder::UninitializedFieldError> for BuilderError {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        BuilderError(e.to_string())
    }
}

impl From<String> for BuilderError {
    fn from(s: String) -> Self {
        BuilderError(s)
    }
}

impl Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Builder failed: {}", self.0)
    }
}

impl Error for BuilderError {}

/// Serialization error
#[derive(Debug)]
pub enum SerError {
    /// Abitrary error message.
    Msg(String),
    /// A wrapped error from lower in the call stack.
    Wrapped(WrappedError),
    /// A required field was not provided to a builder.
    Builder(BuilderError),
    /// The end of the buffer was reached before serialization finished.
    UnexpectedEOB,
}

err_from!(
    SerError,
    WrappedError { SerError::Wrapped },
    BuilderError { SerError::Builder },
    std::io::Error { |e: io::Error| SerError::Wrapped(WrappedError::from(e)) }
);

impl SerError {
    /// Create a new error with the given message as description.
    pub fn new<D>(msg: D) -> Self
    where
        D: Display,
    {
        SerError::Msg(msg.to_string())
    }
}

impl Display for SerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SerError::Msg(ref s) => write!(f, "{}", s),
            SerError::Wrapped(ref e) => write!(f, "Error while serializing: {}", e),
            SerError::Builder(ref e) => write!(f, "{}", e),
            SerError::UnexpectedEOB => write!(
                f,
                "The buffer was too small for the requested serialization operation",
            ),
        }
    }
}

impl Error for SerError {}

/// Deserialization error
#[derive(Debug)]
pub enum DeError {
    /// Abitrary error message.
    Msg(String),
    /// A wrapped error from lower in the call stack.
    Wrapped(WrappedError),
    /// The end of the buffer was reached before deserialization
    /// finished.
    UnexpectedEOB,
    /// The provided length does not fit in the remaining buffer.
    InvalidInput(usize),
    /// A null byte was found before the end of the serialized
    /// [`String`].
    NullError,
    /// A null byte was not found at the end of the serialized
    /// [`String`].
    NoNullError,
}

err_from!(
    DeError,
    WrappedError { DeError::Wrapped },
    std::io::Error {
        |e: io::Error| if e.kind() == io::ErrorKind::UnexpectedEof {
            DeError::UnexpectedEOB
        } else {
            DeError::Wrapped(WrappedError::from(e))
        }
    },
    std::str::Utf8Error { |e: str::Utf8Error| DeError::Wrapped(WrappedError::from(e)) },
    std::string::FromUtf8Error {
        |e: string::FromUtf8Error| DeError::Wrapped(WrappedError::from(e))
    }
);

impl DeError {
    /// Create new error from a type implementing
    /// [`Display`][std::fmt::Display]
    pub fn new<D>(s: D) -> Self
    where
        D: Display,
    {
        DeError::Msg(s.to_string())
    }
}

impl Display for DeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DeError::Msg(ref s) => write!(f, "{}", s),
            DeError::UnexpectedEOB => write!(
                f,
                "The buffer was not large enough to complete the deserialize \
                 operation",
            ),
            DeError::InvalidInput(input) => {
                write!(f, "The length {} does not fit in the remaining buffer", input)
            }
            DeError::NullError => write!(f, "A null was found before the end of the buffer"),
            DeError::NoNullError => write!(f, "No terminating null byte was found in the buffer"),
            DeError::Wrapped(ref e) => write!(f, "Error while deserializing: {}", e),
        }
    }
}

impl Error for DeError {}

/// An error to wrap all system level errors in a single, higher level
/// error.
#[derive(Debug)]
pub enum WrappedError {
    /// Wrapper for [`std::io::Error`]
    IOError(io::Error),
    /// Wrapper for [`std::str::Utf8Error`]
    StrUtf8Error(str::Utf8Error),
    /// Wrapper for [`std::string::FromUtf8Error`]
    StringUtf8Error(string::FromUtf8Error),
}

impl Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            WrappedError::IOError(ref e) => write!(f, "Wrapped IO error: {}", e),
            WrappedError::StrUtf8Error(ref e) => write!(f, "Wrapped &str error: {}", e),
            WrappedError::StringUtf8Error(ref e) => write!(f, "Wrapped String error: {}", e),
        }
    }
}

impl Error for WrappedError {}

macro_rules! wrapped_err_from {
    ($($var:ident => $from_err_name:path),*) => {
        $(
            impl From<$from_err_name> for WrappedError {
                fn from(v: $from_err_name) -> Self {
                    WrappedError::$var(v)
                }
            }
        )*
    }
}

wrapped_err_from!(
    IOError => std::io::Error,
    StrUtf8Error => std::str::Utf8Error,
    StringUtf8Error => std::string::FromUtf8Error
);

/// An attribute stream that does not conform to its attribute
/// policy.
#[derive(Debug)]
pub enum PolicyError {
    /// The attribute identifier has no entry in the policy.
    UnknownAttribute(u16),
    /// The attribute header marks a representation the policy entry
    /// does not allow.
    TypeMismatch {
        /// Attribute identifier
        attr: u16,
        /// Type the policy expects
        expected: PolicyType,
    },
    /// The payload length is outside of the bounds of the policy
    /// entry.
    InvalidLength {
        /// Attribute identifier
        attr: u16,
        /// Payload length found in the attribute
        len: usize,
        /// Minimum payload length
        min: usize,
        /// Maximum payload length, if bounded
        max: Option<usize>,
    },
    /// A string attribute is not null terminated.
    NotTerminated(u16),
    /// A string attribute has a null byte before its terminator.
    EmbeddedNull(u16),
    /// An attribute named by the policy is absent.
    MissingAttribute(u16),
    /// The attribute stream itself could not be parsed.
    Malformed(DeError),
}

err_from!(PolicyError, DeError { PolicyError::Malformed });

impl Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PolicyError::UnknownAttribute(attr) => {
                write!(f, "Attribute {} is not part of the policy", attr)
            }
            PolicyError::TypeMismatch { attr, expected } => {
                write!(f, "Attribute {} is not encoded as {:?}", attr, expected)
            }
            PolicyError::InvalidLength {
                attr,
                len,
                min,
                max: Some(max),
            } => write!(
                f,
                "Attribute {} has length {}, expected {} to {} bytes",
                attr, len, min, max
            ),
            PolicyError::InvalidLength {
                attr,
                len,
                min,
                max: None,
            } => write!(
                f,
                "Attribute {} has length {}, expected at least {} bytes",
                attr, len, min
            ),
            PolicyError::NotTerminated(attr) => {
                write!(f, "String attribute {} is not null terminated", attr)
            }
            PolicyError::EmbeddedNull(attr) => {
                write!(f, "String attribute {} contains a null byte", attr)
            }
            PolicyError::MissingAttribute(attr) => {
                write!(f, "Required attribute {} is missing", attr)
            }
            PolicyError::Malformed(ref e) => write!(f, "Malformed attribute stream: {}", e),
        }
    }
}

impl Error for PolicyError {}

/// A response that could not be turned into a device record.
#[derive(Debug)]
pub enum DecodeError {
    /// The buffer ended before the netlink, generic netlink and
    /// datapath headers were complete.
    TruncatedHeader,
    /// The message type is not the resolved family.
    FamilyMismatch {
        /// Resolved family ID
        expected: u16,
        /// Message type found in the response
        found: u16,
    },
    /// The attributes violate the attribute policy.
    PolicyViolation(PolicyError),
}

err_from!(
    DecodeError,
    PolicyError { DecodeError::PolicyViolation },
    DeError { |e: DeError| DecodeError::PolicyViolation(PolicyError::Malformed(e)) }
);

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeError::TruncatedHeader => write!(f, "Response is shorter than its headers"),
            DecodeError::FamilyMismatch { expected, found } => write!(
                f,
                "Response belongs to family {}, expected family {}",
                found, expected
            ),
            DecodeError::PolicyViolation(ref e) => write!(f, "Policy violation: {}", e),
        }
    }
}

impl Error for DecodeError {}

/// Failure of the one-time family binding. The same value is
/// returned to every caller for the life of the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingError {
    /// The family name could not be resolved to an ID.
    Unresolved {
        /// Family name
        family: String,
        /// OS error code, if the failure carried one
        errno: Option<i32>,
        /// Description of the failure
        reason: String,
    },
    /// The transport handle could not be created.
    Transport {
        /// Family name
        family: String,
        /// OS error code, if the failure carried one
        errno: Option<i32>,
        /// Description of the failure
        reason: String,
    },
}

impl BindingError {
    /// OS error code equivalent to this failure.
    pub fn errno(&self) -> i32 {
        match *self {
            BindingError::Unresolved { errno, .. } => errno.unwrap_or(libc::ENODEV),
            BindingError::Transport { errno, .. } => errno.unwrap_or(libc::EIO),
        }
    }
}

impl Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BindingError::Unresolved {
                ref family,
                ref reason,
                ..
            } => write!(
                f,
                "Generic netlink family {} could not be resolved: {}",
                family, reason
            ),
            BindingError::Transport {
                ref family,
                ref reason,
                ..
            } => write!(
                f,
                "Transport for generic netlink family {} could not be created: {}",
                family, reason
            ),
        }
    }
}

impl Error for BindingError {}

/// Failure reported by a family resolver.
#[derive(Debug)]
pub enum ResolveError {
    /// No family is registered under the name.
    NotFound(String),
    /// The lookup transaction failed.
    Transport(TransportError),
    /// The controller reply could not be parsed.
    De(DeError),
}

err_from!(
    ResolveError,
    TransportError { ResolveError::Transport },
    DeError { ResolveError::De }
);

impl ResolveError {
    /// OS error code equivalent to this failure.
    pub fn errno(&self) -> Option<i32> {
        match *self {
            ResolveError::NotFound(_) => Some(libc::ENOENT),
            ResolveError::Transport(ref e) => Some(e.errno()),
            ResolveError::De(_) => Some(libc::EPROTO),
        }
    }
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ResolveError::NotFound(ref name) => {
                write!(f, "Generic netlink family {} was not found", name)
            }
            ResolveError::Transport(ref e) => write!(f, "{}", e),
            ResolveError::De(ref e) => write!(f, "Unparseable controller reply: {}", e),
        }
    }
}

impl Error for ResolveError {}

/// Failure of a single request/response transaction.
#[derive(Debug)]
pub enum TransportError {
    /// Socket level failure.
    Io(io::Error),
    /// The peer answered with an error message carrying this errno.
    Nlmsgerr(i32),
    /// The request could not be serialized.
    Ser(SerError),
    /// The reply could not be parsed far enough to be matched with
    /// the request.
    De(DeError),
    /// The peer acknowledged the request without a reply payload.
    NoResponse,
    /// A datagram of this many bytes did not fit the receive buffer.
    Truncated(usize),
}

err_from!(
    TransportError,
    io::Error { TransportError::Io },
    SerError { TransportError::Ser },
    DeError { TransportError::De }
);

impl TransportError {
    /// OS error code equivalent to this failure.
    pub fn errno(&self) -> i32 {
        match *self {
            TransportError::Io(ref e) => e.raw_os_error().unwrap_or(libc::EIO),
            TransportError::Nlmsgerr(errno) => errno,
            TransportError::Ser(_) => libc::EINVAL,
            TransportError::De(_) => libc::EPROTO,
            TransportError::NoResponse => libc::ENODATA,
            TransportError::Truncated(_) => libc::EMSGSIZE,
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TransportError::Io(ref e) => write!(f, "Socket failure: {}", e),
            TransportError::Nlmsgerr(errno) => write!(
                f,
                "Error response received from netlink: {}",
                io::Error::from_raw_os_error(errno)
            ),
            TransportError::Ser(ref e) => write!(f, "Serialization error: {}", e),
            TransportError::De(ref e) => write!(f, "Deserialization error: {}", e),
            TransportError::NoResponse => write!(f, "No reply received for the request"),
            TransportError::Truncated(len) => {
                write!(f, "Reply of {} bytes exceeds the receive buffer", len)
            }
        }
    }
}

impl Error for TransportError {}

/// Failure of a device query.
#[derive(Debug)]
pub enum QueryError {
    /// The family binding failed.
    Binding(BindingError),
    /// The request could not be built.
    InvalidRequest(String),
    /// The transaction failed.
    Transport(TransportError),
    /// The reply was malformed.
    Decode(DecodeError),
}

err_from!(
    QueryError,
    BindingError { QueryError::Binding },
    TransportError { QueryError::Transport },
    DecodeError { QueryError::Decode }
);

impl QueryError {
    /// OS error code to report to the device layer for this failure.
    pub fn errno(&self) -> i32 {
        match *self {
            QueryError::Binding(ref e) => e.errno(),
            QueryError::InvalidRequest(_) => libc::EINVAL,
            QueryError::Transport(ref e) => e.errno(),
            QueryError::Decode(_) => libc::EINVAL,
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            QueryError::Binding(ref e) => write!(f, "{}", e),
            QueryError::InvalidRequest(ref msg) => write!(f, "Invalid request: {}", msg),
            QueryError::Transport(ref e) => write!(f, "Transaction failed: {}", e),
            QueryError::Decode(ref e) => write!(f, "Invalid response: {}", e),
        }
    }
}

impl Error for QueryError {}

/// Device level error.
#[derive(Debug)]
pub enum NetdevError {
    /// Construction failed because the device query failed.
    Query(QueryError),
    /// A cached field was read before it was populated.
    InvalidState(CachedField),
}

err_from!(NetdevError, QueryError { NetdevError::Query });

impl NetdevError {
    /// OS error code to report to the device layer for this failure.
    pub fn errno(&self) -> i32 {
        match *self {
            NetdevError::Query(ref e) => e.errno(),
            NetdevError::InvalidState(_) => libc::EINVAL,
        }
    }
}

impl Display for NetdevError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            NetdevError::Query(ref e) => write!(f, "Device construction failed: {}", e),
            NetdevError::InvalidState(field) => {
                write!(f, "Cached {:?} was read before it was populated", field)
            }
        }
    }
}

impl Error for NetdevError {}
