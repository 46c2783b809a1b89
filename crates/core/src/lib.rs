//! Uniform file operations over local disk, memory and object storage.

pub mod attributes;
pub mod backend;
pub mod bridge;
pub mod config;
pub mod error;
pub mod prefixer;
pub mod splitter;
pub mod visibility;

pub use attributes::{DirectoryAttributes, FileAttributes, StorageAttributes, Visibility};
pub use backend::local::{LocalFilesystemAdapter, SymbolicLinkPolicy};
pub use backend::memory::{InMemoryFile, InMemoryFilesystemAdapter};
pub use backend::s3::{S3Bucket, S3FilesystemAdapter};
pub use backend::{
    AsyncFilesystemAdapter, AsyncFilesystemAdapterExt, FilesystemAdapter, FilesystemAdapterExt,
};
pub use bridge::SyncToAsyncAdapter;
pub use config::Config;
pub use error::{FilesystemError, MetadataKind, Operation, Result};
pub use prefixer::PathPrefixer;
