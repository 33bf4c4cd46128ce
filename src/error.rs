//! Error type used within crate with From for commonly used crate errors
use std::error;
use std::{fmt, io};

/// Result type used within crate
pub type Result<T> = std::result::Result<T, Error>;

/// Contained with [`ErrorKind`] to provide more context
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ErrorArg<E, G>
where
    E: fmt::Debug,
    G: fmt::Debug,
{
    expected: E,
    got: G,
}

impl fmt::Display for ErrorArg<usize, usize> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Expected: {}, Got: {}", self.expected, self.got)
    }
}

impl<E, G> ErrorArg<E, G>
where
    E: fmt::Debug,
    G: fmt::Debug,
{
    /// New ErrorArg
    pub fn new(expected: E, got: G) -> ErrorArg<E, G> {
        ErrorArg { expected, got }
    }

    /// The expected value
    pub fn expected(&self) -> &E {
        &self.expected
    }

    /// The actual value
    pub fn got(&self) -> &G {
        &self.got
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
/// Kind of error produced
pub enum ErrorKind {
    /// Buffer shorter than the header or the declared `bLength`; nothing consumed
    TruncatedDescriptor(ErrorArg<usize, usize>),
    /// `bDescriptorSubtype` has no catalog entry for the context
    UnknownSubtype(u8),
    /// `bDescriptorType` is not the class-specific type of the context
    DescriptorTypeMismatch(ErrorArg<u8, u8>),
    /// `bLength` inconsistent with the kind: below the fixed size, remainder in a trailing array or count disagreeing with an explicit count field
    MalformedLength(ErrorArg<usize, usize>),
    /// Encoded length would not fit in `bLength`
    DescriptorTooLong(usize),
    /// Reserved (0b10) control value cannot be encoded
    InvalidControlValue(&'static str),
    /// Field value outside its domain
    InvalidField(&'static str),
    /// Entity id collision or dangling id reference within an audio function
    InvalidReference(u8),
    /// Error parsing a string into a value - hex input or json
    Parsing,
    /// Error parsing config file
    Config,
    /// [`std::io::Error`] probably not found when reading file to parse
    Io,
    /// Invalid arg for method or cli
    InvalidArg,
    /// Error From other crate without enum variant
    Other(&'static str),
}

#[derive(Debug, PartialEq, Eq, Clone)]
/// uacdesc error which impl [`std::error`]
pub struct Error {
    /// The [`ErrorKind`]
    pub kind: ErrorKind,
    /// String description
    pub message: String,
    /// Byte offset of the failing descriptor when produced while scanning a buffer
    pub offset: Option<usize>,
}

impl Error {
    /// New error helper
    pub fn new(kind: ErrorKind, message: &str) -> Error {
        Error {
            kind,
            message: message.to_string(),
            offset: None,
        }
    }

    /// New error helper for a buffer too short for the header or declared length
    pub fn new_truncated(name: &str, expected: usize, got: usize) -> Error {
        Error::new(
            ErrorKind::TruncatedDescriptor(ErrorArg::new(expected, got)),
            &format!(
                "{} truncated. Expected: {} bytes, Got {}",
                name, expected, got
            ),
        )
    }

    /// New error helper for descriptor length
    pub fn new_descriptor_len(name: &str, expected: usize, got: usize) -> Error {
        Error::new(
            ErrorKind::MalformedLength(ErrorArg::new(expected, got)),
            &format!(
                "Invalid descriptor length for {}. Expected: {}, Got {}",
                name, expected, got
            ),
        )
    }

    /// Attach the byte offset within a scanned buffer
    pub fn at_offset(mut self, offset: usize) -> Error {
        self.offset = Some(offset);
        self
    }

    /// The [`ErrorKind`]
    pub fn kind(&self) -> ErrorKind {
        self.kind.to_owned()
    }

    /// The description
    pub fn message(&self) -> &String {
        &self.message
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(offset) = self.offset {
            write!(f, "@{:#06x} ", offset)?;
        }
        if f.alternate() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{:?} Error: {}", self.kind, self.message)
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::new(ErrorKind::Io, &error.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::new(ErrorKind::Parsing, &error.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(error: std::num::ParseIntError) -> Self {
        Error::new(ErrorKind::Parsing, &error.to_string())
    }
}

impl From<Error> for io::Error {
    fn from(val: Error) -> Self {
        io::Error::new(io::ErrorKind::Other, val.message)
    }
}
