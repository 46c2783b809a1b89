pub mod permissions;

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{FileStream, FilesystemAdapter, Listing, guess_mime_type};
use crate::attributes::{DirectoryAttributes, FileAttributes, StorageAttributes, Visibility};
use crate::config::Config;
use crate::error::{FilesystemError, MetadataKind, Result};
use crate::prefixer::PathPrefixer;

pub use permissions::{PermissionStrategy, UnixPermissions, WindowsPermissions};

/// Visibility applied to directories when no config value says otherwise.
pub const DEFAULT_DIRECTORY_VISIBILITY: Visibility = Visibility::Private;

/// What to do when a listing walks into a symbolic link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolicLinkPolicy {
    #[default]
    #[serde(rename = "disallow")]
    DisallowLinks,
    #[serde(rename = "skip")]
    SkipLinks,
}

/// Adapter over a directory on the local disk.
#[derive(Debug)]
pub struct LocalFilesystemAdapter {
    root: PathBuf,
    prefixer: PathPrefixer,
    permissions: PermissionStrategy,
    links: SymbolicLinkPolicy,
}

impl LocalFilesystemAdapter {
    /// Binds to `root` with the host's permission strategy, creating the
    /// root when missing.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let permissions = PermissionStrategy::for_current_os()
            .map_err(|e| FilesystemError::create_directory("", e))?;
        Self::with_options(root, permissions, SymbolicLinkPolicy::default())
    }

    pub fn with_options(
        root: impl AsRef<Path>,
        permissions: PermissionStrategy,
        links: SymbolicLinkPolicy,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let prefixer = PathPrefixer::new(&root.to_string_lossy(), std::path::MAIN_SEPARATOR);
        let adapter = Self {
            root,
            prefixer,
            permissions,
            links,
        };

        if !adapter.root.is_dir() {
            info!(root = %adapter.root.display(), "creating filesystem root");
            adapter.ensure_directory("", DEFAULT_DIRECTORY_VISIBILITY, true)?;
        }
        Ok(adapter)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn symbolic_link_policy(&self) -> SymbolicLinkPolicy {
        self.links
    }

    /// Native path below the root. Parent segments are refused so no
    /// virtual path can reach outside the root.
    fn native(&self, path: &str) -> io::Result<PathBuf> {
        if path.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("path escapes the filesystem root: {path}"),
            ));
        }
        Ok(PathBuf::from(self.prefixer.prefix_path(path)))
    }

    /// Virtual path of a native path found below the root.
    fn virtual_path(&self, native: &Path) -> String {
        let relative = native.strip_prefix(&self.root).unwrap_or(native);
        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Creates `location` when missing. Visibility is applied to a freshly
    /// created directory, or to an existing one when `reapply` is set.
    fn ensure_directory(&self, location: &str, visibility: Visibility, reapply: bool) -> Result<()> {
        let native = self
            .native(location)
            .map_err(|e| FilesystemError::create_directory(location, e))?;
        let existed = native.is_dir();

        if !existed {
            fs::create_dir_all(&native)
                .map_err(|e| FilesystemError::create_directory(location, e))?;
            debug!(path = location, "created directory");
        }
        if !existed || reapply {
            self.permissions
                .set_directory_visibility(&native, location, visibility)?;
        }
        Ok(())
    }

    /// Metadata of an existing regular file, or a metadata error of `kind`.
    fn file_metadata(&self, path: &str, kind: MetadataKind) -> Result<fs::Metadata> {
        let to_error = |e: io::Error| FilesystemError::metadata_with_source(path, kind, e);
        let metadata = fs::metadata(self.native(path).map_err(to_error)?).map_err(to_error)?;
        if !metadata.is_file() {
            return Err(FilesystemError::metadata_with_source(path, kind, not_a_file()));
        }
        Ok(metadata)
    }

    fn ensure_parent(&self, path: &str, config: &Config) -> Result<()> {
        let visibility = config
            .directory_visibility()
            .unwrap_or(DEFAULT_DIRECTORY_VISIBILITY);
        self.ensure_directory(parent_of(path), visibility, false)
    }

    fn remove_existing_file(&self, path: &str) -> Result<()> {
        if self.file_exists(path)? {
            let native = self
                .native(path)
                .map_err(|e| FilesystemError::delete(path, e))?;
            fs::remove_file(native).map_err(|e| FilesystemError::delete(path, e))?;
        }
        Ok(())
    }

    fn entry_attributes(&self, entry: &fs::DirEntry) -> io::Result<StorageAttributes> {
        let metadata = entry.metadata()?;
        let path = self.virtual_path(&entry.path());
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

        if metadata.is_dir() {
            let mut attributes = DirectoryAttributes::new(path);
            attributes.last_modified = modified;
            return Ok(attributes.into());
        }

        let mut attributes = FileAttributes::new(path).with_file_size(metadata.len());
        attributes.last_modified = modified;
        Ok(attributes.into())
    }
}

impl FilesystemAdapter for LocalFilesystemAdapter {
    fn file_exists(&self, path: &str) -> Result<bool> {
        let native = self
            .native(path)
            .map_err(|e| FilesystemError::check_existence(path, e))?;
        match fs::metadata(native) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(FilesystemError::check_existence(path, e)),
        }
    }

    fn write(&mut self, path: &str, contents: &mut dyn Read, config: &Config) -> Result<()> {
        let native = self
            .native(path)
            .map_err(|e| FilesystemError::write(path, e))?;
        self.ensure_parent(path, config)?;

        let mut file = fs::File::create(&native).map_err(|e| FilesystemError::write(path, e))?;
        let written = io::copy(contents, &mut file).map_err(|e| FilesystemError::write(path, e))?;
        debug!(path, bytes = written, "wrote file");

        if let Some(visibility) = config.visibility() {
            self.set_visibility(path, visibility)?;
        }
        Ok(())
    }

    fn read(&self, path: &str) -> Result<FileStream> {
        let native = self
            .native(path)
            .map_err(|e| FilesystemError::read(path, e))?;
        let metadata = fs::metadata(&native).map_err(|e| FilesystemError::read(path, e))?;
        if !metadata.is_file() {
            return Err(FilesystemError::read(path, not_a_file()));
        }

        let file = fs::File::open(&native).map_err(|e| FilesystemError::read(path, e))?;
        Ok(Box::new(file))
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        self.remove_existing_file(path)?;
        debug!(path, "deleted file");
        Ok(())
    }

    fn delete_directory(&mut self, path: &str) -> Result<()> {
        let native = self
            .native(path)
            .map_err(|e| FilesystemError::delete_directory(path, e))?;
        match fs::remove_dir_all(native) {
            Ok(()) => {
                debug!(path, "deleted directory");
                Ok(())
            }
            Err(e) if is_absent(&e) => Ok(()),
            Err(e) => Err(FilesystemError::delete_directory(path, e)),
        }
    }

    fn create_directory(&mut self, path: &str, config: &Config) -> Result<()> {
        let visibility = config
            .directory_visibility()
            .or_else(|| config.visibility())
            .unwrap_or(DEFAULT_DIRECTORY_VISIBILITY);
        self.ensure_directory(path, visibility, true)
    }

    fn set_visibility(&mut self, path: &str, visibility: Visibility) -> Result<()> {
        let native = self
            .native(path)
            .map_err(|e| FilesystemError::set_visibility(path, e))?;
        let metadata =
            fs::metadata(&native).map_err(|e| FilesystemError::set_visibility(path, e))?;

        if metadata.is_dir() {
            self.permissions
                .set_directory_visibility(&native, path, visibility)
        } else {
            self.permissions.set_file_visibility(&native, path, visibility)
        }
    }

    fn visibility(&self, path: &str) -> Result<FileAttributes> {
        let to_error =
            |e: io::Error| FilesystemError::metadata_with_source(path, MetadataKind::Visibility, e);
        let native = self.native(path).map_err(to_error)?;
        let metadata = fs::metadata(&native).map_err(to_error)?;

        let visibility = if metadata.is_dir() {
            self.permissions.directory_visibility(&native)
        } else {
            self.permissions.file_visibility(&native)
        }
        .map_err(to_error)?;

        Ok(FileAttributes::new(path).with_visibility(visibility))
    }

    fn mime_type(&self, path: &str) -> Result<FileAttributes> {
        self.file_metadata(path, MetadataKind::MimeType)?;
        let mime_type = guess_mime_type(path)
            .ok_or_else(|| FilesystemError::metadata(path, MetadataKind::MimeType))?;
        Ok(FileAttributes::new(path).with_mime_type(mime_type))
    }

    fn last_modified(&self, path: &str) -> Result<FileAttributes> {
        let metadata = self.file_metadata(path, MetadataKind::LastModified)?;
        let modified = metadata.modified().map_err(|e| {
            FilesystemError::metadata_with_source(path, MetadataKind::LastModified, e)
        })?;
        Ok(FileAttributes::new(path).with_last_modified(modified.into()))
    }

    fn file_size(&self, path: &str) -> Result<FileAttributes> {
        let metadata = self.file_metadata(path, MetadataKind::FileSize)?;
        Ok(FileAttributes::new(path).with_file_size(metadata.len()))
    }

    fn list_contents(&self, path: &str, deep: bool) -> Listing<'_> {
        let location = path.trim_matches('/').to_string();
        match self.native(path).and_then(fs::read_dir) {
            Ok(entries) => Box::new(LocalListing {
                adapter: self,
                pending: vec![entries],
                location,
                deep,
            }),
            Err(e) if is_absent(&e) => Box::new(std::iter::empty()),
            Err(e) => Box::new(std::iter::once(Err(FilesystemError::read(location, e)))),
        }
    }

    fn move_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()> {
        let wrap = |e: FilesystemError| FilesystemError::move_file(source, destination, e);
        let fail = |e: io::Error| FilesystemError::move_file(source, destination, e);
        // The destination is only touched once the source is known to exist.
        if !self.file_exists(source).map_err(wrap)? {
            return Err(fail(not_a_file()));
        }
        let from = self.native(source).map_err(fail)?;
        let to = self.native(destination).map_err(fail)?;
        self.ensure_parent(destination, config).map_err(wrap)?;

        // Replaces an existing destination file.
        fs::rename(from, to).map_err(fail)?;
        debug!(source, destination, "moved file");
        Ok(())
    }

    fn copy_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()> {
        let wrap = |e: FilesystemError| FilesystemError::copy(source, destination, e);
        if !self.file_exists(source).map_err(wrap)? {
            return Err(FilesystemError::copy(source, destination, not_a_file()));
        }
        let fail = |e: io::Error| FilesystemError::copy(source, destination, e);
        let from = self.native(source).map_err(fail)?;
        let to = self.native(destination).map_err(fail)?;
        self.ensure_parent(destination, config).map_err(wrap)?;
        self.remove_existing_file(destination).map_err(wrap)?;

        fs::copy(from, to).map_err(fail)?;
        debug!(source, destination, "copied file");

        if let Some(visibility) = config.visibility() {
            self.set_visibility(destination, visibility).map_err(wrap)?;
        }
        Ok(())
    }
}

/// Lazy walk over one directory, descending depth-first when deep.
struct LocalListing<'a> {
    adapter: &'a LocalFilesystemAdapter,
    pending: Vec<fs::ReadDir>,
    location: String,
    deep: bool,
}

impl Iterator for LocalListing<'_> {
    type Item = Result<StorageAttributes>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.pending.last_mut()?.next() {
                None => {
                    self.pending.pop();
                    continue;
                }
                Some(Err(e)) => return Some(Err(FilesystemError::read(self.location.clone(), e))),
                Some(Ok(entry)) => entry,
            };

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => return Some(Err(FilesystemError::read(self.location.clone(), e))),
            };

            if file_type.is_symlink() {
                let path = self.adapter.virtual_path(&entry.path());
                match self.adapter.links {
                    SymbolicLinkPolicy::SkipLinks => {
                        warn!(path = %path, "skipping symbolic link");
                        continue;
                    }
                    SymbolicLinkPolicy::DisallowLinks => {
                        return Some(Err(FilesystemError::symbolic_link(path)));
                    }
                }
            }

            if self.deep && file_type.is_dir() {
                match fs::read_dir(entry.path()) {
                    Ok(children) => self.pending.push(children),
                    Err(e) => return Some(Err(FilesystemError::read(self.location.clone(), e))),
                }
            }

            return Some(
                self.adapter
                    .entry_attributes(&entry)
                    .map_err(|e| FilesystemError::read(self.location.clone(), e)),
            );
        }
    }
}

fn parent_of(path: &str) -> &str {
    path.trim_matches('/')
        .rsplit_once('/')
        .map_or("", |(parent, _)| parent)
}

fn is_absent(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn not_a_file() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "no such file")
}
