use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Abstract access level, translated per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(format!("unknown visibility: {s}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAttributes {
    pub path: String,
    pub file_size: Option<u64>,
    pub visibility: Option<Visibility>,
    pub last_modified: Option<DateTime<Utc>>,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub extra_metadata: Vec<String>,
}

impl FileAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryAttributes {
    pub path: String,
    pub visibility: Option<Visibility>,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra_metadata: Vec<String>,
}

impl DirectoryAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// One listed entry. The path never carries the backend's root prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageAttributes {
    File(FileAttributes),
    Directory(DirectoryAttributes),
}

impl StorageAttributes {
    pub fn path(&self) -> &str {
        match self {
            StorageAttributes::File(file) => &file.path,
            StorageAttributes::Directory(dir) => &dir.path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, StorageAttributes::File(_))
    }

    pub fn is_dir(&self) -> bool {
        !self.is_file()
    }

    pub fn visibility(&self) -> Option<Visibility> {
        match self {
            StorageAttributes::File(file) => file.visibility,
            StorageAttributes::Directory(dir) => dir.visibility,
        }
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match self {
            StorageAttributes::File(file) => file.last_modified,
            StorageAttributes::Directory(dir) => dir.last_modified,
        }
    }
}

impl From<FileAttributes> for StorageAttributes {
    fn from(file: FileAttributes) -> Self {
        StorageAttributes::File(file)
    }
}

impl From<DirectoryAttributes> for StorageAttributes {
    fn from(dir: DirectoryAttributes) -> Self {
        StorageAttributes::Directory(dir)
    }
}
