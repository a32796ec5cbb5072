//! Errors of the resource engine, the platform interface and the PE image layer.

use std::{io::Error as IOError, path::PathBuf};

use crate::{
    constants::{DWORD, ERROR_BAD_EXE_FORMAT, ERROR_INVALID_DATA},
    identifier::ResourceId,
    registry::ResourceType,
};

/// Error that can occur when reading and parsing bytes.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ReadError(pub String);

/// Errors that can occur when reading a PE image.
#[derive(Debug, thiserror::Error)]
pub enum ImageReadError {
    #[error("invalid bytes: {0}")]
    InvalidBytes(ReadError),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("invalid section: {0}")]
    InvalidSection(String),
    #[error("invalid resource directory: {0}")]
    InvalidResourceDirectory(String),
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<ReadError> for ImageReadError {
    fn from(error: ReadError) -> Self { ImageReadError::InvalidBytes(error) }
}
impl From<IOError> for ImageReadError {
    fn from(error: IOError) -> Self { ImageReadError::IOError(error) }
}

/// Errors that can occur when writing a PE image.
#[derive(Debug, thiserror::Error)]
pub enum ImageWriteError {
    #[error("not enough space in file header: {0} bytes required, {1} available")]
    NotEnoughSpaceInHeader(u64, u64),
    #[error("section points outside image: {0} > {1}")]
    InvalidSectionRange(u64, u64),
    #[error("resource directory too large: {0} bytes")]
    ResourceDirectoryTooLarge(u64),
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<IOError> for ImageWriteError {
    fn from(error: IOError) -> Self { ImageWriteError::IOError(error) }
}

/// Failure reported by a [`ResourcePlatform`](crate::ResourcePlatform) call.
///
/// Carries the platform error code together with its human readable message, the equivalent of `GetLastError` at the time of the failure.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct PlatformError {
    pub code:    DWORD,
    pub message: String,
}
impl PlatformError {
    pub fn new<S: Into<String>>(code: DWORD, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Capture the last OS error of the calling thread.
    pub fn last_os_error() -> Self { Self::from(IOError::last_os_error()) }
}
impl From<IOError> for PlatformError {
    fn from(error: IOError) -> Self {
        Self::new(error.raw_os_error().map(|code| code as DWORD).unwrap_or_default(), error.to_string())
    }
}
impl From<ImageReadError> for PlatformError {
    fn from(error: ImageReadError) -> Self {
        match error {
            ImageReadError::IOError(error) => error.into(),
            error => Self::new(ERROR_BAD_EXE_FORMAT, error.to_string()),
        }
    }
}
impl From<ImageWriteError> for PlatformError {
    fn from(error: ImageWriteError) -> Self {
        match error {
            ImageWriteError::IOError(error) => error.into(),
            error => Self::new(ERROR_INVALID_DATA, error.to_string()),
        }
    }
}

/// Discriminator of a [`ResourceError`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceErrorKind {
    ArgumentNull,
    InvalidArguments,
    InvalidData,
    FileOpen,
    ResourceNotFound,
    ResourceLock,
    UpdateFailed,
    CommitFailed,
    EnumerationFailed,
    Io,
}

/// Errors that can occur when reading, writing or enumerating resources.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("required argument is missing: {0}")]
    ArgumentNull(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArguments(String),
    #[error("no resource data to write")]
    InvalidData,
    #[error("unable to open file '{}': {source}", path.display())]
    FileOpen {
        path:   PathBuf,
        source: PlatformError,
    },
    #[error("finding resource {id} of type {resource_type} in file '{}' failed: {source}", path.display())]
    ResourceNotFound {
        path:          PathBuf,
        resource_type: ResourceType,
        id:            ResourceId,
        source:        PlatformError,
    },
    #[error("locking resource {id} of type {resource_type} in file '{}' failed: {source}", path.display())]
    ResourceLock {
        path:          PathBuf,
        resource_type: ResourceType,
        id:            ResourceId,
        source:        PlatformError,
    },
    #[error("updating resource {id} of type {resource_type} failed: {source}")]
    UpdateFailed {
        resource_type: ResourceType,
        id:            ResourceId,
        source:        PlatformError,
    },
    #[error("resource update of file '{}' could not be written: {source}", path.display())]
    CommitFailed {
        path:   PathBuf,
        source: PlatformError,
    },
    #[error("enumerating resources of file '{}' failed: {source}", path.display())]
    EnumerationFailed {
        path:   PathBuf,
        source: PlatformError,
    },
    #[error("unable to access '{}': {source}", path.display())]
    Io {
        path:   PathBuf,
        source: IOError,
    },
}
impl ResourceError {
    /// Returns the kind of the error.
    pub fn kind(&self) -> ResourceErrorKind {
        match self {
            ResourceError::ArgumentNull(_) => ResourceErrorKind::ArgumentNull,
            ResourceError::InvalidArguments(_) => ResourceErrorKind::InvalidArguments,
            ResourceError::InvalidData => ResourceErrorKind::InvalidData,
            ResourceError::FileOpen { .. } => ResourceErrorKind::FileOpen,
            ResourceError::ResourceNotFound { .. } => ResourceErrorKind::ResourceNotFound,
            ResourceError::ResourceLock { .. } => ResourceErrorKind::ResourceLock,
            ResourceError::UpdateFailed { .. } => ResourceErrorKind::UpdateFailed,
            ResourceError::CommitFailed { .. } => ResourceErrorKind::CommitFailed,
            ResourceError::EnumerationFailed { .. } => ResourceErrorKind::EnumerationFailed,
            ResourceError::Io { .. } => ResourceErrorKind::Io,
        }
    }

    /// Returns the platform failure behind the error, if any.
    pub fn platform_error(&self) -> Option<&PlatformError> {
        match self {
            ResourceError::FileOpen { source, .. }
            | ResourceError::ResourceNotFound { source, .. }
            | ResourceError::ResourceLock { source, .. }
            | ResourceError::UpdateFailed { source, .. }
            | ResourceError::CommitFailed { source, .. }
            | ResourceError::EnumerationFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns whether the error is caused by invalid caller input rather than a failed operation.
    pub fn is_argument_error(&self) -> bool {
        matches!(self.kind(), ResourceErrorKind::ArgumentNull | ResourceErrorKind::InvalidArguments)
    }
}
