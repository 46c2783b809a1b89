use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::attributes::{FileAttributes, Visibility};
use crate::backend::{AsyncFilesystemAdapter, AsyncListing, FileStream, FilesystemAdapter};
use crate::config::Config;
use crate::error::Result;

/// Exposes a synchronous adapter through the asynchronous contract.
///
/// Every call runs the synchronous operation inline on the polling task and
/// completes on first poll; listings yield one element per poll. Nothing is
/// moved to another thread, so dropping a future mid-call has no effect once
/// the blocking work has started.
#[derive(Debug, Default)]
pub struct SyncToAsyncAdapter<A> {
    inner: A,
}

impl<A> SyncToAsyncAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

#[async_trait]
impl<A> AsyncFilesystemAdapter for SyncToAsyncAdapter<A>
where
    A: FilesystemAdapter + Send + Sync,
{
    async fn file_exists(&self, path: &str) -> Result<bool> {
        self.inner.file_exists(path)
    }

    async fn write(&mut self, path: &str, contents: &[u8], config: &Config) -> Result<()> {
        let mut reader = contents;
        self.inner.write(path, &mut reader, config)
    }

    async fn read(&self, path: &str) -> Result<FileStream> {
        self.inner.read(path)
    }

    async fn delete(&mut self, path: &str) -> Result<()> {
        self.inner.delete(path)
    }

    async fn delete_directory(&mut self, path: &str) -> Result<()> {
        self.inner.delete_directory(path)
    }

    async fn create_directory(&mut self, path: &str, config: &Config) -> Result<()> {
        self.inner.create_directory(path, config)
    }

    async fn set_visibility(&mut self, path: &str, visibility: Visibility) -> Result<()> {
        self.inner.set_visibility(path, visibility)
    }

    async fn visibility(&self, path: &str) -> Result<FileAttributes> {
        self.inner.visibility(path)
    }

    async fn mime_type(&self, path: &str) -> Result<FileAttributes> {
        self.inner.mime_type(path)
    }

    async fn last_modified(&self, path: &str) -> Result<FileAttributes> {
        self.inner.last_modified(path)
    }

    async fn file_size(&self, path: &str) -> Result<FileAttributes> {
        self.inner.file_size(path)
    }

    fn list_contents<'a>(&'a self, path: &'a str, deep: bool) -> AsyncListing<'a> {
        stream::iter(self.inner.list_contents(path, deep)).boxed()
    }

    async fn move_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()> {
        self.inner.move_file(source, destination, config)
    }

    async fn copy_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()> {
        self.inner.copy_file(source, destination, config)
    }
}
