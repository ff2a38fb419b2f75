//! Error types for bitmap ownership and lifecycle management.

use crate::Format;
use std::io;

/// Errors surfaced by bitmap, block, view, bulk-context and cursor operations.
///
/// Every failure is reported synchronously to the immediate caller; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CRoaring or the Rust allocator returned no memory.
    #[error("cannot allocate {what}")]
    AllocationFailed { what: &'static str },

    /// The normalised start of a range lies past its exclusive end.
    #[error("invalid range: start {start} is past end {end}")]
    InvalidRange { start: u64, end: u64 },

    /// A stepped range was given a step of zero.
    #[error("range step must be non-zero")]
    ZeroStep,

    /// `offset + count` does not fit in the source buffer.
    #[error("offset {offset} + count {count} exceeds buffer length {len}")]
    OutOfBounds {
        offset: usize,
        count: usize,
        len: usize,
    },

    /// Attempted to allocate a memory block of zero bytes.
    #[error("cannot allocate a zero-sized memory block")]
    ZeroSizedBlock,

    /// The destination buffer cannot hold the serialized bitmap.
    #[error("buffer too small: {required} bytes required, {available} available")]
    BufferTooSmall { required: usize, available: usize },

    /// The destination buffer does not meet the alignment of the format.
    #[error("buffer must be aligned to {required} bytes")]
    Misaligned { required: usize },

    /// A batch query that requires ascending input was given unsorted values.
    #[error("values must be sorted in ascending order")]
    UnsortedInput,

    /// A bulk context was used against a bitmap other than the one it was created for.
    #[error("bulk context belongs to bitmap {expected}, not bitmap {actual}")]
    ForeignBulkContext { expected: u64, actual: u64 },

    /// The memory block cannot be written while frozen views read from it.
    #[error("memory block is in use by {dependents} frozen view(s)")]
    BlockInUse { dependents: usize },

    /// A cursor's current value was read while it was not on a value.
    #[error("iterator is not positioned on a value")]
    NotPositioned,

    /// The resource was explicitly released earlier.
    #[error("{resource} has already been released")]
    Released { resource: &'static str },

    /// The operation cannot be carried out in the requested format.
    #[error("{operation} does not support the {format} format")]
    UnsupportedFormat {
        format: Format,
        operation: &'static str,
    },

    /// The capability does not exist for this type.
    #[error("{0} is not supported")]
    NotSupported(&'static str),

    /// The bytes are not a valid bitmap in the given format.
    #[error("failed to deserialize bitmap in {format} format")]
    Deserialization { format: Format },

    /// CRoaring refused to size or serialize the bitmap in the given format.
    #[error("cannot serialize bitmap in {format} format")]
    SerializationFailed { format: Format },

    /// CRoaring's internal validator rejected the bitmap.
    #[error("bitmap failed internal validation: {reason}")]
    Invalid { reason: String },

    /// The cancellation signal was raised before the operation started.
    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AllocationFailure,
    InvalidArgument,
    /// Valid arguments used against the wrong instance or in the wrong state.
    Misuse,
    Released,
    Unsupported,
    Malformed,
    Cancelled,
    Io,
}

impl Error {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AllocationFailed { .. } => ErrorKind::AllocationFailure,
            Error::InvalidRange { .. }
            | Error::ZeroStep
            | Error::OutOfBounds { .. }
            | Error::ZeroSizedBlock
            | Error::BufferTooSmall { .. }
            | Error::Misaligned { .. }
            | Error::UnsortedInput => ErrorKind::InvalidArgument,
            Error::ForeignBulkContext { .. } | Error::BlockInUse { .. } | Error::NotPositioned => {
                ErrorKind::Misuse
            }
            Error::Released { .. } => ErrorKind::Released,
            Error::UnsupportedFormat { .. } | Error::NotSupported(_) => ErrorKind::Unsupported,
            Error::Deserialization { .. }
            | Error::SerializationFailed { .. }
            | Error::Invalid { .. } => ErrorKind::Malformed,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::AllocationFailed { what: "bitmap" }.kind(),
            ErrorKind::AllocationFailure
        );
        assert_eq!(Error::ZeroStep.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            Error::ForeignBulkContext {
                expected: 1,
                actual: 2
            }
            .kind(),
            ErrorKind::Misuse
        );
        assert_eq!(Error::NotSupported("reset").kind(), ErrorKind::Unsupported);
        assert_eq!(
            Error::Deserialization {
                format: Format::Portable
            }
            .kind(),
            ErrorKind::Malformed
        );
    }

    #[test]
    fn test_display() {
        let err = Error::OutOfBounds {
            offset: 4,
            count: 10,
            len: 8,
        };
        assert_eq!(err.to_string(), "offset 4 + count 10 exceeds buffer length 8");
        let err = Error::UnsupportedFormat {
            format: Format::Native,
            operation: "freeze",
        };
        assert_eq!(err.to_string(), "freeze does not support the native format");
    }
}
