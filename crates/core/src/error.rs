use thiserror::Error;

/// Boxed native cause carried by every [`FilesystemError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, FilesystemError>;

/// The operation family a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Write,
    Update,
    FileExists,
    CreateDirectory,
    Delete,
    DeleteDirectory,
    Move,
    RetrieveMetadata,
    Copy,
    Read,
    SetVisibility,
}

/// Which piece of metadata could not be retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    MimeType,
    Visibility,
    FileSize,
    LastModified,
}

impl MetadataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKind::MimeType => "mime_type",
            MetadataKind::Visibility => "visibility",
            MetadataKind::FileSize => "file_size",
            MetadataKind::LastModified => "last_modified",
        }
    }
}

impl std::fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure an adapter can surface. Native errors never escape in their
/// own form; they ride along as `source`.
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("unable to check file existence for: {location}")]
    UnableToCheckFileExistence {
        location: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to write file at location: {location}")]
    UnableToWriteFile {
        location: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to read file at location: {location}")]
    UnableToReadFile {
        location: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to delete file at location: {location}")]
    UnableToDeleteFile {
        location: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to delete directory at location: {location}")]
    UnableToDeleteDirectory {
        location: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to create directory at location: {location}")]
    UnableToCreateDirectory {
        location: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to set visibility for location: {location}")]
    UnableToSetVisibility {
        location: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to retrieve the {kind} for file at location: {location}")]
    UnableToRetrieveMetadata {
        location: String,
        kind: MetadataKind,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to copy file from {source_path} to {destination}")]
    UnableToCopyFile {
        source_path: String,
        destination: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to move file from {source_path} to {destination}")]
    UnableToMoveFile {
        source_path: String,
        destination: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unsupported symbolic link encountered at location: {location}")]
    SymbolicLinkEncountered { location: String },
}

impl FilesystemError {
    pub fn check_existence(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::UnableToCheckFileExistence {
            location: location.into(),
            source: Some(source.into()),
        }
    }

    pub fn write(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::UnableToWriteFile {
            location: location.into(),
            source: Some(source.into()),
        }
    }

    pub fn read(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::UnableToReadFile {
            location: location.into(),
            source: Some(source.into()),
        }
    }

    pub fn delete(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::UnableToDeleteFile {
            location: location.into(),
            source: Some(source.into()),
        }
    }

    pub fn delete_directory(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::UnableToDeleteDirectory {
            location: location.into(),
            source: Some(source.into()),
        }
    }

    pub fn create_directory(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::UnableToCreateDirectory {
            location: location.into(),
            source: Some(source.into()),
        }
    }

    pub fn set_visibility(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::UnableToSetVisibility {
            location: location.into(),
            source: Some(source.into()),
        }
    }

    pub fn metadata(location: impl Into<String>, kind: MetadataKind) -> Self {
        Self::UnableToRetrieveMetadata {
            location: location.into(),
            kind,
            source: None,
        }
    }

    pub fn metadata_with_source(
        location: impl Into<String>,
        kind: MetadataKind,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::UnableToRetrieveMetadata {
            location: location.into(),
            kind,
            source: Some(source.into()),
        }
    }

    pub fn copy(
        source_path: impl Into<String>,
        destination: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::UnableToCopyFile {
            source_path: source_path.into(),
            destination: destination.into(),
            source: Some(source.into()),
        }
    }

    pub fn move_file(
        source_path: impl Into<String>,
        destination: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::UnableToMoveFile {
            source_path: source_path.into(),
            destination: destination.into(),
            source: Some(source.into()),
        }
    }

    pub fn symbolic_link(location: impl Into<String>) -> Self {
        Self::SymbolicLinkEncountered {
            location: location.into(),
        }
    }

    /// The operation this failure belongs to. Symbolic links are hit while
    /// listing, which has no operation tag of its own.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::UnableToCheckFileExistence { .. } => Some(Operation::FileExists),
            Self::UnableToWriteFile { .. } => Some(Operation::Write),
            Self::UnableToReadFile { .. } => Some(Operation::Read),
            Self::UnableToDeleteFile { .. } => Some(Operation::Delete),
            Self::UnableToDeleteDirectory { .. } => Some(Operation::DeleteDirectory),
            Self::UnableToCreateDirectory { .. } => Some(Operation::CreateDirectory),
            Self::UnableToSetVisibility { .. } => Some(Operation::SetVisibility),
            Self::UnableToRetrieveMetadata { .. } => Some(Operation::RetrieveMetadata),
            Self::UnableToCopyFile { .. } => Some(Operation::Copy),
            Self::UnableToMoveFile { .. } => Some(Operation::Move),
            Self::SymbolicLinkEncountered { .. } => None,
        }
    }

    /// The virtual path involved; the source path for copy and move.
    pub fn location(&self) -> &str {
        match self {
            Self::UnableToCheckFileExistence { location, .. }
            | Self::UnableToWriteFile { location, .. }
            | Self::UnableToReadFile { location, .. }
            | Self::UnableToDeleteFile { location, .. }
            | Self::UnableToDeleteDirectory { location, .. }
            | Self::UnableToCreateDirectory { location, .. }
            | Self::UnableToSetVisibility { location, .. }
            | Self::UnableToRetrieveMetadata { location, .. }
            | Self::SymbolicLinkEncountered { location } => location,
            Self::UnableToCopyFile { source_path, .. }
            | Self::UnableToMoveFile { source_path, .. } => source_path,
        }
    }

    pub fn destination(&self) -> Option<&str> {
        match self {
            Self::UnableToCopyFile { destination, .. }
            | Self::UnableToMoveFile { destination, .. } => Some(destination),
            _ => None,
        }
    }

    pub fn metadata_kind(&self) -> Option<MetadataKind> {
        match self {
            Self::UnableToRetrieveMetadata { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
