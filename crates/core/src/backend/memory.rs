use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{FileStream, FilesystemAdapter, Listing, guess_mime_type};
use crate::attributes::{DirectoryAttributes, FileAttributes, StorageAttributes, Visibility};
use crate::config::Config;
use crate::error::{FilesystemError, MetadataKind, Result};
use crate::splitter;

const ROOT: char = '/';
const PLACEHOLDER: &str = "/.";

#[derive(Debug, Error)]
enum MemoryError {
    #[error("file does not exist")]
    FileNotFound,
    #[error("destination [{0}] already exists")]
    DestinationExists(String),
    #[error("mime type could not be identified")]
    UnknownMimeType,
    #[error("path does not exist")]
    PathNotFound,
}

/// One record in the in-memory file table.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryFile {
    pub contents: Bytes,
    pub last_modified: DateTime<Utc>,
    pub visibility: Visibility,
    placeholder: bool,
}

impl InMemoryFile {
    pub fn new(contents: impl Into<Bytes>) -> Self {
        Self {
            contents: contents.into(),
            last_modified: Utc::now(),
            visibility: Visibility::Public,
            placeholder: false,
        }
    }

    /// Zero-length marker standing in for an otherwise implicit directory.
    pub fn directory_placeholder(visibility: Visibility) -> Self {
        Self {
            visibility,
            placeholder: true,
            ..Self::new(Bytes::new())
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn is_directory_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Shares the buffer, optionally overriding visibility and timestamp.
    pub fn copy(
        &self,
        visibility: Option<Visibility>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            contents: self.contents.clone(),
            last_modified: last_modified.unwrap_or(self.last_modified),
            visibility: visibility.unwrap_or(self.visibility),
            placeholder: self.placeholder,
        }
    }
}

/// Adapter whose whole state is one owned table keyed by normalized virtual
/// path (`/`-rooted).
#[derive(Debug, Default)]
pub struct InMemoryFilesystemAdapter {
    files: BTreeMap<String, InMemoryFile>,
}

impl InMemoryFilesystemAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the table. Keys are expected in normalized (`/`-rooted) form.
    pub fn with_files(files: BTreeMap<String, InMemoryFile>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &BTreeMap<String, InMemoryFile> {
        &self.files
    }

    pub fn into_files(self) -> BTreeMap<String, InMemoryFile> {
        self.files
    }

    fn file(&self, path: &str) -> Option<&InMemoryFile> {
        self.files
            .get(&location(path))
            .filter(|file| !file.placeholder)
    }

    fn ensure_file(&self, path: &str) -> std::result::Result<&InMemoryFile, MemoryError> {
        self.file(path).ok_or(MemoryError::FileNotFound)
    }

    fn directory_exists(&self, path: &str) -> bool {
        let prefix = directory_location(path);
        self.files.keys().any(|key| key.starts_with(&prefix))
    }

    fn placeholder_key(path: &str) -> String {
        format!("{}{PLACEHOLDER}", location(path).trim_end_matches(ROOT))
    }
}

impl FilesystemAdapter for InMemoryFilesystemAdapter {
    fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.file(path).is_some())
    }

    fn write(&mut self, path: &str, contents: &mut dyn Read, config: &Config) -> Result<()> {
        let mut buffer = Vec::new();
        contents
            .read_to_end(&mut buffer)
            .map_err(|e| FilesystemError::write(path, e))?;

        let visibility = config.visibility().unwrap_or(Visibility::Public);
        self.files.insert(
            location(path),
            InMemoryFile::new(buffer).with_visibility(visibility),
        );
        Ok(())
    }

    fn read(&self, path: &str) -> Result<FileStream> {
        let file = self
            .ensure_file(path)
            .map_err(|e| FilesystemError::read(path, e))?;
        Ok(Box::new(Cursor::new(file.contents.clone())))
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        self.files.remove(&location(path));
        Ok(())
    }

    fn delete_directory(&mut self, path: &str) -> Result<()> {
        let prefix = directory_location(path);
        self.files.retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }

    fn create_directory(&mut self, path: &str, config: &Config) -> Result<()> {
        let visibility = config
            .directory_visibility()
            .or_else(|| config.visibility())
            .unwrap_or(Visibility::Public);
        self.files.insert(
            Self::placeholder_key(path),
            InMemoryFile::directory_placeholder(visibility),
        );
        Ok(())
    }

    fn set_visibility(&mut self, path: &str, visibility: Visibility) -> Result<()> {
        if let Some(file) = self.file(path) {
            let updated = file.copy(Some(visibility), None);
            self.files.insert(location(path), updated);
            return Ok(());
        }

        if self.directory_exists(path) {
            let key = Self::placeholder_key(path);
            let placeholder = match self.files.get(&key) {
                Some(existing) => existing.copy(Some(visibility), None),
                None => InMemoryFile::directory_placeholder(visibility),
            };
            self.files.insert(key, placeholder);
            return Ok(());
        }

        Err(FilesystemError::set_visibility(path, MemoryError::PathNotFound))
    }

    fn visibility(&self, path: &str) -> Result<FileAttributes> {
        if let Some(file) = self.file(path) {
            return Ok(FileAttributes::new(path).with_visibility(file.visibility));
        }

        if self.directory_exists(path) {
            let visibility = self
                .files
                .get(&Self::placeholder_key(path))
                .map_or(Visibility::Public, |placeholder| placeholder.visibility);
            return Ok(FileAttributes::new(path).with_visibility(visibility));
        }

        Err(FilesystemError::metadata_with_source(
            path,
            MetadataKind::Visibility,
            MemoryError::PathNotFound,
        ))
    }

    fn mime_type(&self, path: &str) -> Result<FileAttributes> {
        self.ensure_file(path)
            .map_err(|e| FilesystemError::metadata_with_source(path, MetadataKind::MimeType, e))?;

        let mime_type = guess_mime_type(path).ok_or_else(|| {
            FilesystemError::metadata_with_source(
                path,
                MetadataKind::MimeType,
                MemoryError::UnknownMimeType,
            )
        })?;
        Ok(FileAttributes::new(path).with_mime_type(mime_type))
    }

    fn last_modified(&self, path: &str) -> Result<FileAttributes> {
        let file = self.ensure_file(path).map_err(|e| {
            FilesystemError::metadata_with_source(path, MetadataKind::LastModified, e)
        })?;
        Ok(FileAttributes::new(path).with_last_modified(file.last_modified))
    }

    fn file_size(&self, path: &str) -> Result<FileAttributes> {
        let file = self
            .ensure_file(path)
            .map_err(|e| FilesystemError::metadata_with_source(path, MetadataKind::FileSize, e))?;
        Ok(FileAttributes::new(path).with_file_size(file.contents.len() as u64))
    }

    fn list_contents(&self, path: &str, deep: bool) -> Listing<'_> {
        let location = directory_location(path);
        let is_requested = |candidate: &str| {
            candidate.starts_with(&location)
                && (deep
                    || !candidate[location.len()..]
                        .trim_start_matches(ROOT)
                        .contains(ROOT))
        };

        let files: Vec<StorageAttributes> = self
            .files
            .iter()
            .filter(|(key, file)| !file.placeholder && is_requested(key.as_str()))
            .map(|(key, file)| {
                FileAttributes::new(key.trim_start_matches(ROOT))
                    .with_file_size(file.contents.len() as u64)
                    .with_visibility(file.visibility)
                    .with_last_modified(file.last_modified)
                    .into()
            })
            .collect();

        let directories: Vec<StorageAttributes> =
            splitter::split_from_paths(self.files.keys().map(String::as_str))
                .filter(|dir| dir != "/" && is_requested(dir.as_str()))
                .map(|dir| {
                    let mut attributes = DirectoryAttributes::new(dir.trim_start_matches(ROOT));
                    if let Some(placeholder) = self.files.get(&format!("{dir}{PLACEHOLDER}")) {
                        attributes.visibility = Some(placeholder.visibility);
                        attributes.last_modified = Some(placeholder.last_modified);
                    }
                    attributes.into()
                })
                .collect();

        Box::new(files.into_iter().chain(directories).map(Ok))
    }

    fn move_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()> {
        if self.files.contains_key(&location(destination)) {
            return Err(FilesystemError::move_file(
                source,
                destination,
                MemoryError::DestinationExists(destination.to_string()),
            ));
        }

        self.ensure_file(source)
            .map_err(|e| FilesystemError::move_file(source, destination, e))?;
        self.copy_file(source, destination, config)
            .map_err(|e| FilesystemError::move_file(source, destination, e))?;
        self.delete(source)
            .map_err(|e| FilesystemError::move_file(source, destination, e))
    }

    fn copy_file(&mut self, source: &str, destination: &str, config: &Config) -> Result<()> {
        let file = self
            .ensure_file(source)
            .map_err(|e| FilesystemError::copy(source, destination, e))?;
        let copied = file.copy(config.visibility(), None);
        self.files.insert(location(destination), copied);
        Ok(())
    }
}

fn location(path: &str) -> String {
    format!("{ROOT}{}", path.trim_start_matches(ROOT))
}

fn directory_location(path: &str) -> String {
    format!("{}{ROOT}", location(path).trim_end_matches(ROOT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FilesystemAdapterExt;

    fn seeded(paths: &[&str]) -> InMemoryFilesystemAdapter {
        InMemoryFilesystemAdapter::with_files(
            paths
                .iter()
                .map(|path| (path.to_string(), InMemoryFile::new(Bytes::new())))
                .collect(),
        )
    }

    fn listed_paths(adapter: &InMemoryFilesystemAdapter, path: &str, deep: bool) -> Vec<(String, bool)> {
        adapter
            .list_contents(path, deep)
            .map(|entry| {
                let entry = entry.unwrap();
                (entry.path().to_string(), entry.is_file())
            })
            .collect()
    }

    #[test]
    fn deleting_a_file_with_or_without_leading_slash() {
        for path in ["/path.txt", "path.txt"] {
            let mut adapter = seeded(&["/path.txt"]);
            adapter.delete(path).unwrap();
            assert!(!adapter.files().contains_key("/path.txt"));
        }
    }

    #[test]
    fn deleting_a_directory_keeps_siblings() {
        let mut adapter = seeded(&["/a/path.txt", "/a/b.txt", "/a/b/path.txt", "/a/b/c/path.txt"]);

        adapter.delete_directory("a/b").unwrap();

        let keys: Vec<_> = adapter.files().keys().cloned().collect();
        assert_eq!(keys, ["/a/b.txt", "/a/path.txt"]);
    }

    #[test]
    fn writing_stores_under_a_rooted_key() {
        let mut adapter = InMemoryFilesystemAdapter::new();

        adapter.write_string("test.txt", "contents", &Config::new()).unwrap();

        let file = &adapter.files()["/test.txt"];
        assert_eq!(file.contents, Bytes::from_static(b"contents"));
        assert_eq!(file.visibility, Visibility::Public);
    }

    #[test]
    fn listing_deep_from_any_spelling_of_the_directory() {
        for list_path in ["/a", "/a/", "a"] {
            let adapter = seeded(&["/path.txt", "/a/path.txt", "/a/b/c/path.txt"]);

            let listing = listed_paths(&adapter, list_path, true);

            assert_eq!(
                listing,
                [
                    ("a/b/c/path.txt".to_string(), true),
                    ("a/path.txt".to_string(), true),
                    ("a/b/c".to_string(), false),
                    ("a/b".to_string(), false),
                ]
            );
        }
    }

    #[test]
    fn listing_shallow_stops_at_the_first_level() {
        for list_path in ["/a", "/a/", "a"] {
            let adapter = seeded(&["/path.txt", "/a/path.txt", "/a/b/path.txt", "/a/b/c/path.txt"]);

            let listing = listed_paths(&adapter, list_path, false);

            assert_eq!(
                listing,
                [("a/path.txt".to_string(), true), ("a/b".to_string(), false)]
            );
        }
    }

    #[test]
    fn directory_placeholders_are_listed_as_directories_only() {
        let mut adapter = InMemoryFilesystemAdapter::new();

        adapter.create_directory("directory", &Config::new()).unwrap();

        assert_eq!(listed_paths(&adapter, "", true), [("directory".to_string(), false)]);
        assert!(!adapter.file_exists("directory").unwrap());
    }

    #[test]
    fn moving_onto_an_existing_file_is_refused() {
        let mut adapter = InMemoryFilesystemAdapter::new();
        adapter.write_string("path.txt", "first", &Config::new()).unwrap();
        adapter.write_string("new-path.txt", "second", &Config::new()).unwrap();

        let err = adapter
            .move_file("path.txt", "new-path.txt", &Config::new())
            .unwrap_err();

        assert!(matches!(err, FilesystemError::UnableToMoveFile { .. }));
        assert_eq!(adapter.read_string("path.txt").unwrap(), "first");
        assert_eq!(adapter.read_string("new-path.txt").unwrap(), "second");
    }

    #[test]
    fn moving_a_file() {
        let mut adapter = seeded(&["/path.txt"]);

        adapter.move_file("path.txt", "new-path.txt", &Config::new()).unwrap();

        assert!(adapter.files().contains_key("/new-path.txt"));
        assert!(!adapter.files().contains_key("/path.txt"));
    }

    #[test]
    fn copies_share_contents_and_keep_the_timestamp() {
        let date = DateTime::parse_from_rfc3339("2021-01-01T01:01:01Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut files = BTreeMap::new();
        files.insert(
            "/flysystem.svg".to_string(),
            InMemoryFile::new(&b"<svg/>"[..]).with_last_modified(date),
        );
        let mut adapter = InMemoryFilesystemAdapter::with_files(files);

        adapter
            .copy_file("flysystem.svg", "copy.svg", &Config::new())
            .unwrap();

        assert_eq!(adapter.last_modified("copy.svg").unwrap().last_modified, Some(date));
        assert_eq!(adapter.file_size("copy.svg").unwrap().file_size, Some(6));
        assert_eq!(
            adapter.mime_type("copy.svg").unwrap().mime_type.as_deref(),
            Some("image/svg+xml")
        );
    }

    #[test]
    fn directory_visibility_follows_its_placeholder() {
        let mut adapter = InMemoryFilesystemAdapter::new();
        adapter
            .create_directory("dir", &Config::new().with_visibility(Visibility::Private))
            .unwrap();
        assert_eq!(adapter.visibility("dir").unwrap().visibility, Some(Visibility::Private));

        adapter.set_visibility("dir", Visibility::Public).unwrap();
        assert_eq!(adapter.visibility("dir").unwrap().visibility, Some(Visibility::Public));
    }

    #[test]
    fn metadata_errors_carry_their_kind() {
        let adapter = InMemoryFilesystemAdapter::new();

        let kinds = [
            adapter.mime_type("path.txt").unwrap_err().metadata_kind(),
            adapter.last_modified("path.txt").unwrap_err().metadata_kind(),
            adapter.file_size("path.txt").unwrap_err().metadata_kind(),
            adapter.visibility("path.txt").unwrap_err().metadata_kind(),
        ];

        assert_eq!(
            kinds,
            [
                Some(MetadataKind::MimeType),
                Some(MetadataKind::LastModified),
                Some(MetadataKind::FileSize),
                Some(MetadataKind::Visibility),
            ]
        );
    }
}
