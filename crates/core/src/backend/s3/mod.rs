pub mod acl;
pub mod bucket;
pub mod client;
pub mod options;

use std::collections::HashSet;
use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use super::{AsyncFilesystemAdapter, AsyncListing, FileStream, guess_mime_type};
use crate::attributes::{DirectoryAttributes, FileAttributes, StorageAttributes, Visibility};
use crate::config::Config;
use crate::error::{FilesystemError, MetadataKind, Result};
use crate::prefixer::PathPrefixer;
use crate::splitter;
use crate::visibility::VisibilityConverter;

pub use acl::{AclVisibilityConverter, CannedAcl, Grant};
pub use bucket::S3Bucket;
pub use client::{
    ClientResult, ListObjectsPage, ListObjectsRequest, ObjectHead, ObjectStorageClient,
    ObjectStorageError, ObjectSummary,
};
pub use options::{NATIVE_OPTIONS, ObjectOptions};

/// Keys removed per bulk-delete call.
pub const DELETE_BATCH_SIZE: usize = 1000;

const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";
const DELIMITER: &str = "/";

/// Adapter over one bucket of an object store. Directories exist only as
/// key prefixes, optionally marked by a zero-length `prefix/` object.
pub struct S3FilesystemAdapter<C> {
    client: C,
    prefixer: PathPrefixer,
    converter: AclVisibilityConverter,
}

impl<C: ObjectStorageClient> S3FilesystemAdapter<C> {
    /// `prefix` roots every key; empty means the bucket root.
    pub fn new(client: C, prefix: &str) -> Self {
        Self::with_converter(client, prefix, AclVisibilityConverter::default())
    }

    pub fn with_converter(client: C, prefix: &str, converter: AclVisibilityConverter) -> Self {
        info!(prefix, "object storage adapter ready");
        Self {
            client,
            prefixer: PathPrefixer::new(prefix, '/'),
            converter,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn head(&self, path: &str, kind: MetadataKind) -> Result<client::ObjectHead> {
        self.client
            .head_object(&self.prefixer.prefix_path(path))
            .await
            .map_err(|e| FilesystemError::metadata_with_source(path, kind, e))
    }

    async fn put_acl(&self, path: &str, visibility: Visibility) -> Result<()> {
        let file_key = self.prefixer.prefix_path(path);
        match self
            .client
            .put_object_acl(&file_key, self.converter.for_file(visibility))
            .await
        {
            Err(e) if e.is_not_found() => {}
            other => return other.map_err(|e| FilesystemError::set_visibility(path, e)),
        }

        let directory_key = self.prefixer.prefix_directory_path(path);
        let acl = self.converter.for_directory(visibility);
        match self.client.put_object_acl(&directory_key, acl).await {
            Err(e) if e.is_not_found() => {}
            other => return other.map_err(|e| FilesystemError::set_visibility(path, e)),
        }

        // A directory implied by deeper keys gets a marker to carry its ACL.
        let implied = self
            .directory_is_implied(&directory_key)
            .await
            .map_err(|e| FilesystemError::set_visibility(path, e))?;
        if !implied {
            return Err(FilesystemError::set_visibility(
                path,
                ObjectStorageError::NotFound(directory_key),
            ));
        }
        self.client
            .put_object(
                &directory_key,
                Bytes::new(),
                &ObjectOptions::default().with_canned_acl(acl),
            )
            .await
            .map_err(|e| FilesystemError::set_visibility(path, e))?;
        debug!(key = %directory_key, "created directory marker");
        Ok(())
    }

    /// Whether any key lives below `directory_key`.
    async fn directory_is_implied(&self, directory_key: &str) -> client::ClientResult<bool> {
        let page = self
            .client
            .list_objects(ListObjectsRequest {
                prefix: directory_key.to_string(),
                delimiter: Some(DELIMITER.to_string()),
                continuation_token: None,
            })
            .await?;
        Ok(!page.objects.is_empty() || !page.common_prefixes.is_empty())
    }

    async fn copy(&self, source: &str, destination: &str, config: &Config) -> Result<()> {
        let source_key = self.prefixer.prefix_path(source);
        let mut options = ObjectOptions::from_config(config);

        if options.canned_acl.is_none() {
            let visibility = match config.visibility() {
                Some(visibility) => visibility,
                None => {
                    let grants = self
                        .client
                        .get_object_acl(&source_key)
                        .await
                        .map_err(|e| FilesystemError::copy(source, destination, e))?;
                    self.converter.inverse_for_file(&grants)
                }
            };
            options.canned_acl = Some(self.converter.for_file(visibility));
        }

        self.client
            .copy_object(&source_key, &self.prefixer.prefix_path(destination), &options)
            .await
            .map_err(|e| FilesystemError::copy(source, destination, e))
    }

    /// Every page of a listing, following continuation tokens.
    fn pages(
        &self,
        prefix: String,
        delimiter: Option<String>,
    ) -> BoxStream<'_, client::ClientResult<ListObjectsPage>> {
        stream::try_unfold(Some(None), move |token: Option<Option<String>>| {
            let request = token.map(|continuation_token| ListObjectsRequest {
                prefix: prefix.clone(),
                delimiter: delimiter.clone(),
                continuation_token,
            });
            async move {
                let Some(request) = request else {
                    return Ok(None);
                };
                let page = self.client.list_objects(request).await?;
                let next = page.next_continuation_token.clone().map(Some);
                Ok::<_, ObjectStorageError>(Some((page, next)))
            }
        })
        .boxed()
    }

    /// Entries of one page. Deep listings also report every ancestor
    /// directory below `listed`, once per listing.
    fn page_entries(
        &self,
        page: ListObjectsPage,
        listed: &str,
        deep: bool,
        seen: &mut HashSet<String>,
    ) -> Vec<StorageAttributes> {
        let mut entries = Vec::new();
        let below = |path: &str| listed.is_empty() || path.starts_with(&format!("{listed}/"));

        for object in page.objects {
            let path = self.prefixer.strip_prefix(&object.key);
            if path.trim_end_matches('/') == listed {
                continue;
            }

            if deep {
                let rooted = format!("/{}", path.trim_end_matches('/'));
                for ancestor in splitter::split_from_path(&rooted) {
                    let ancestor = ancestor.trim_start_matches('/');
                    if !ancestor.is_empty() && below(ancestor) && seen.insert(ancestor.to_string()) {
                        entries.push(DirectoryAttributes::new(ancestor).into());
                    }
                }
            }

            if let Some(directory) = path.strip_suffix('/') {
                if seen.insert(directory.to_string()) {
                    let mut attributes = DirectoryAttributes::new(directory);
                    attributes.last_modified = object.last_modified;
                    entries.push(attributes.into());
                }
                continue;
            }

            let mut attributes = FileAttributes::new(path).with_file_size(object.size);
            attributes.last_modified = object.last_modified;
            entries.push(attributes.into());
        }

        for prefix in page.common_prefixes {
            let directory = self.prefixer.strip_directory_prefix(&prefix);
            if seen.insert(directory.clone()) {
                entries.push(DirectoryAttributes::new(directory).into());
            }
        }
        entries
    }
}

#[async_trait]
impl<C: ObjectStorageClient> AsyncFilesystemAdapter for S3FilesystemAdapter<C> {
    async fn file_exists(&self, path: &str) -> Result<bool> {
        match self.client.head_object(&self.prefixer.prefix_path(path)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(FilesystemError::check_existence(path, e)),
        }
    }

    async fn write(&mut self, path: &str, contents: &[u8], config: &Config) -> Result<()> {
        let mut options = ObjectOptions::from_config(config);
        if options.canned_acl.is_none() {
            let visibility = config.visibility().unwrap_or(Visibility::Private);
            options.canned_acl = Some(self.converter.for_file(visibility));
        }
        if !contents.is_empty() && options.content_type.is_none() {
            options.content_type = guess_mime_type(path);
        }

        let key = self.prefixer.prefix_path(path);
        self.client
            .put_object(&key, Bytes::copy_from_slice(contents), &options)
            .await
            .map_err(|e| FilesystemError::write(path, e))?;
        debug!(key = %key, "wrote object");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<FileStream> {
        let body = self
            .client
            .get_object(&self.prefixer.prefix_path(path))
            .await
            .map_err(|e| FilesystemError::read(path, e))?;
        Ok(Box::new(Cursor::new(body)))
    }

    async fn delete(&mut self, path: &str) -> Result<()> {
        let key = self.prefixer.prefix_path(path);
        match self.client.delete_object(&key).await {
            Ok(()) => {
                debug!(key = %key, "deleted object");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(key = %key, "object to delete was already gone");
                Ok(())
            }
            Err(e) => Err(FilesystemError::delete(path, e)),
        }
    }

    async fn delete_directory(&mut self, path: &str) -> Result<()> {
        let prefix = self.prefixer.prefix_directory_path(path);
        let mut pages = self.pages(prefix.clone(), None);
        let mut batch = Vec::with_capacity(DELETE_BATCH_SIZE);
        let mut deleted = 0;

        while let Some(page) = pages
            .try_next()
            .await
            .map_err(|e| FilesystemError::delete_directory(path, e))?
        {
            for object in page.objects {
                batch.push(object.key);
                if batch.len() == DELETE_BATCH_SIZE {
                    self.client
                        .delete_objects(&batch)
                        .await
                        .map_err(|e| FilesystemError::delete_directory(path, e))?;
                    deleted += batch.len();
                    batch.clear();
                }
            }
        }

        if !batch.is_empty() {
            self.client
                .delete_objects(&batch)
                .await
                .map_err(|e| FilesystemError::delete_directory(path, e))?;
            deleted += batch.len();
        }
        debug!(prefix = %prefix, objects = deleted, "deleted directory");
        Ok(())
    }

    async fn create_directory(&mut self, path: &str, config: &Config) -> Result<()> {
        let visibility = config
            .directory_visibility()
            .or_else(|| config.visibility())
            .unwrap_or_else(|| self.converter.default_for_directories());
        let options =
            ObjectOptions::default().with_canned_acl(self.converter.for_directory(visibility));

        let key = self.prefixer.prefix_directory_path(path);
        self.client
            .put_object(&key, Bytes::new(), &options)
            .await
            .map_err(|e| FilesystemError::create_directory(path, e))?;
        debug!(key = %key, "created directory placeholder");
        Ok(())
    }

    async fn set_visibility(&mut self, path: &str, visibility: Visibility) -> Result<()> {
        self.put_acl(path, visibility).await
    }

    async fn visibility(&self, path: &str) -> Result<FileAttributes> {
        let to_error = |e: ObjectStorageError| {
            FilesystemError::metadata_with_source(path, MetadataKind::Visibility, e)
        };

        let visibility = match self
            .client
            .get_object_acl(&self.prefixer.prefix_path(path))
            .await
        {
            Ok(grants) => self.converter.inverse_for_file(&grants),
            Err(e) if e.is_not_found() => {
                let directory_key = self.prefixer.prefix_directory_path(path);
                match self.client.get_object_acl(&directory_key).await {
                    Ok(grants) => self.converter.inverse_for_directory(&grants),
                    Err(e) if e.is_not_found() => {
                        let implied = self
                            .directory_is_implied(&directory_key)
                            .await
                            .map_err(to_error)?;
                        if !implied {
                            return Err(to_error(e));
                        }
                        self.converter.default_for_directories()
                    }
                    Err(e) => return Err(to_error(e)),
                }
            }
            Err(e) => return Err(to_error(e)),
        };

        Ok(FileAttributes::new(path).with_visibility(visibility))
    }

    async fn mime_type(&self, path: &str) -> Result<FileAttributes> {
        let head = self.head(path, MetadataKind::MimeType).await?;
        let mime_type = head
            .content_type
            .filter(|content_type| content_type != UNKNOWN_MIME_TYPE)
            .or_else(|| guess_mime_type(path))
            .ok_or_else(|| FilesystemError::metadata(path, MetadataKind::MimeType))?;
        Ok(FileAttributes::new(path).with_mime_type(mime_type))
    }

    async fn last_modified(&self, path: &str) -> Result<FileAttributes> {
        let head = self.head(path, MetadataKind::LastModified).await?;
        let last_modified = head
            .last_modified
            .ok_or_else(|| FilesystemError::metadata(path, MetadataKind::LastModified))?;
        Ok(FileAttributes::new(path).with_last_modified(last_modified))
    }

    async fn file_size(&self, path: &str) -> Result<FileAttributes> {
        let head = self.head(path, MetadataKind::FileSize).await?;
        let size = head
            .content_length
            .ok_or_else(|| FilesystemError::metadata(path, MetadataKind::FileSize))?;
        Ok(FileAttributes::new(path).with_file_size(size))
    }

    fn list_contents<'a>(&'a self, path: &'a str, deep: bool) -> AsyncListing<'a> {
        let listed = path.trim_matches('/').to_string();
        let delimiter = (!deep).then(|| DELIMITER.to_string());
        let mut seen = HashSet::new();

        self.pages(self.prefixer.prefix_directory_path(path), delimiter)
            .map_err(move |e| FilesystemError::read(path, e))
            .map_ok(move |page| {
                let entries = self.page_entries(page, &listed, deep, &mut seen);
                stream::iter(entries.into_iter().map(Ok))
            })
            .try_flatten()
            .boxed()
    }

    async fn move_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()> {
        self.copy(source, destination, config)
            .await
            .map_err(|e| FilesystemError::move_file(source, destination, e))?;
        self.delete(source)
            .await
            .map_err(|e| FilesystemError::move_file(source, destination, e))
    }

    async fn copy_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()> {
        self.copy(source, destination, config).await?;
        debug!(source, destination, "copied object");
        Ok(())
    }
}
