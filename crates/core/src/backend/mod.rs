pub mod local;
pub mod memory;
pub mod s3;

use std::io::{Read, Seek};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::attributes::{FileAttributes, StorageAttributes, Visibility};
use crate::config::Config;
use crate::error::{FilesystemError, Result};

/// A seekable byte stream handed back by `read`.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

pub type FileStream = Box<dyn ReadSeek>;

/// Lazy listing produced by a synchronous adapter.
pub type Listing<'a> = Box<dyn Iterator<Item = Result<StorageAttributes>> + Send + 'a>;

/// Lazy listing produced by an asynchronous adapter.
pub type AsyncListing<'a> = BoxStream<'a, Result<StorageAttributes>>;

/// Uniform, synchronous file operations over one backend bound to one root.
///
/// Paths are virtual: `/`-separated, with or without a leading slash; `""`
/// and `"/"` both name the root. Mutations take `&mut self`; callers sharing
/// an adapter serialize access themselves.
pub trait FilesystemAdapter {
    /// Never fails for a missing file, only for a genuine backend fault.
    fn file_exists(&self, path: &str) -> Result<bool>;

    /// Writes `contents` fully, replacing any existing file.
    fn write(&mut self, path: &str, contents: &mut dyn Read, config: &Config) -> Result<()>;

    fn read(&self, path: &str) -> Result<FileStream>;

    /// Deleting a missing file succeeds.
    fn delete(&mut self, path: &str) -> Result<()>;

    /// Recursive. Deleting a missing directory succeeds.
    fn delete_directory(&mut self, path: &str) -> Result<()>;

    /// Idempotent; re-creating re-applies the requested visibility.
    fn create_directory(&mut self, path: &str, config: &Config) -> Result<()>;

    fn set_visibility(&mut self, path: &str, visibility: Visibility) -> Result<()>;

    fn visibility(&self, path: &str) -> Result<FileAttributes>;

    fn mime_type(&self, path: &str) -> Result<FileAttributes>;

    fn last_modified(&self, path: &str) -> Result<FileAttributes>;

    fn file_size(&self, path: &str) -> Result<FileAttributes>;

    /// Immediate children, or every descendant when `deep`. A missing
    /// directory lists as empty.
    fn list_contents(&self, path: &str, deep: bool) -> Listing<'_>;

    fn move_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()>;

    fn copy_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()>;
}

/// The asynchronous counterpart of [`FilesystemAdapter`], with identical
/// semantics. Dropping a returned future abandons the operation.
#[async_trait]
pub trait AsyncFilesystemAdapter: Send + Sync {
    async fn file_exists(&self, path: &str) -> Result<bool>;

    async fn write(&mut self, path: &str, contents: &[u8], config: &Config) -> Result<()>;

    async fn read(&self, path: &str) -> Result<FileStream>;

    async fn delete(&mut self, path: &str) -> Result<()>;

    async fn delete_directory(&mut self, path: &str) -> Result<()>;

    async fn create_directory(&mut self, path: &str, config: &Config) -> Result<()>;

    async fn set_visibility(&mut self, path: &str, visibility: Visibility) -> Result<()>;

    async fn visibility(&self, path: &str) -> Result<FileAttributes>;

    async fn mime_type(&self, path: &str) -> Result<FileAttributes>;

    async fn last_modified(&self, path: &str) -> Result<FileAttributes>;

    async fn file_size(&self, path: &str) -> Result<FileAttributes>;

    fn list_contents<'a>(&'a self, path: &'a str, deep: bool) -> AsyncListing<'a>;

    async fn move_file(&mut self, source: &str, destination: &str, config: &Config)
    -> Result<()>;

    async fn copy_file(&mut self, source: &str, destination: &str, config: &Config)
    -> Result<()>;
}

/// String conveniences for any synchronous adapter.
pub trait FilesystemAdapterExt: FilesystemAdapter {
    fn write_string(&mut self, path: &str, contents: &str, config: &Config) -> Result<()> {
        self.write(path, &mut contents.as_bytes(), config)
    }

    fn read_string(&self, path: &str) -> Result<String> {
        let mut stream = self.read(path)?;
        read_to_string(path, &mut stream)
    }
}

impl<T: FilesystemAdapter + ?Sized> FilesystemAdapterExt for T {}

/// String conveniences for any asynchronous adapter.
#[async_trait]
pub trait AsyncFilesystemAdapterExt: AsyncFilesystemAdapter {
    async fn write_string(&mut self, path: &str, contents: &str, config: &Config) -> Result<()> {
        self.write(path, contents.as_bytes(), config).await
    }

    async fn read_string(&self, path: &str) -> Result<String> {
        let mut stream = self.read(path).await?;
        read_to_string(path, &mut stream)
    }
}

impl<T: AsyncFilesystemAdapter + ?Sized> AsyncFilesystemAdapterExt for T {}

fn read_to_string(path: &str, stream: &mut FileStream) -> Result<String> {
    let mut contents = String::new();
    stream
        .read_to_string(&mut contents)
        .map_err(|e| FilesystemError::read(path, e))?;
    Ok(contents)
}

/// MIME type derived from the path's extension.
pub(crate) fn guess_mime_type(path: &str) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}
