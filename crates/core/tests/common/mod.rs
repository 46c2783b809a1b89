#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tempfile::TempDir;

use flystore_core::backend::s3::acl::grants_for;
use flystore_core::backend::s3::{
    CannedAcl, ClientResult, Grant, ListObjectsPage, ListObjectsRequest, ObjectHead,
    ObjectOptions, ObjectStorageClient, ObjectStorageError, ObjectSummary, S3FilesystemAdapter,
};
use flystore_core::{
    AsyncFilesystemAdapter, InMemoryFilesystemAdapter, LocalFilesystemAdapter, SyncToAsyncAdapter,
};

pub const OWNER: &str = "owner";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub acl: CannedAcl,
    pub content_type: Option<String>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    failures: HashSet<(&'static str, String)>,
    delete_batches: Vec<usize>,
    list_calls: usize,
}

/// In-process object store holding one bucket.
pub struct MemoryObjectStore {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::with_page_size(1000)
    }
}

impl MemoryObjectStore {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size,
        }
    }

    /// Makes every later `operation` call on `key` fail with a 500.
    pub fn fail_on(&self, operation: &'static str, key: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((operation, key.to_string()));
    }

    pub fn insert(&self, key: &str, body: &'static [u8], content_type: Option<&str>) {
        self.state.lock().unwrap().objects.insert(
            key.to_string(),
            StoredObject {
                body: Bytes::from_static(body),
                acl: CannedAcl::Private,
                content_type: content_type.map(str::to_owned),
                last_modified: Utc::now(),
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn delete_batches(&self) -> Vec<usize> {
        self.state.lock().unwrap().delete_batches.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    fn check(&self, operation: &'static str, key: &str) -> ClientResult<()> {
        if self
            .state
            .lock()
            .unwrap()
            .failures
            .contains(&(operation, key.to_string()))
        {
            return Err(ObjectStorageError::Status {
                key: key.to_string(),
                status: 500,
                message: format!("injected {operation} failure"),
            });
        }
        Ok(())
    }
}

enum Entry {
    Object(ObjectSummary),
    Prefix(String),
}

#[async_trait]
impl ObjectStorageClient for MemoryObjectStore {
    async fn put_object(&self, key: &str, body: Bytes, options: &ObjectOptions) -> ClientResult<()> {
        self.check("put_object", key)?;
        self.state.lock().unwrap().objects.insert(
            key.to_string(),
            StoredObject {
                body,
                acl: options.canned_acl.unwrap_or(CannedAcl::Private),
                content_type: options.content_type.clone(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> ClientResult<Bytes> {
        self.check("get_object", key)?;
        self.object(key)
            .map(|object| object.body)
            .ok_or_else(|| ObjectStorageError::NotFound(key.to_string()))
    }

    async fn head_object(&self, key: &str) -> ClientResult<ObjectHead> {
        self.check("head_object", key)?;
        let object = self
            .object(key)
            .ok_or_else(|| ObjectStorageError::NotFound(key.to_string()))?;
        Ok(ObjectHead {
            content_length: Some(object.body.len() as u64),
            content_type: object.content_type,
            last_modified: Some(object.last_modified),
        })
    }

    async fn delete_object(&self, key: &str) -> ClientResult<()> {
        self.check("delete_object", key)?;
        self.state.lock().unwrap().objects.remove(key);
        Ok(())
    }

    async fn delete_objects(&self, keys: &[String]) -> ClientResult<()> {
        for key in keys {
            self.check("delete_objects", key)?;
        }
        let mut state = self.state.lock().unwrap();
        state.delete_batches.push(keys.len());
        for key in keys {
            state.objects.remove(key);
        }
        Ok(())
    }

    async fn copy_object(
        &self,
        source_key: &str,
        destination_key: &str,
        options: &ObjectOptions,
    ) -> ClientResult<()> {
        self.check("copy_object", source_key)?;
        let source = self
            .object(source_key)
            .ok_or_else(|| ObjectStorageError::NotFound(source_key.to_string()))?;
        self.state.lock().unwrap().objects.insert(
            destination_key.to_string(),
            StoredObject {
                acl: options.canned_acl.unwrap_or(CannedAcl::Private),
                last_modified: Utc::now(),
                ..source
            },
        );
        Ok(())
    }

    async fn get_object_acl(&self, key: &str) -> ClientResult<Vec<Grant>> {
        self.check("get_object_acl", key)?;
        let object = self
            .object(key)
            .ok_or_else(|| ObjectStorageError::NotFound(key.to_string()))?;
        Ok(grants_for(object.acl, OWNER))
    }

    async fn put_object_acl(&self, key: &str, acl: CannedAcl) -> ClientResult<()> {
        self.check("put_object_acl", key)?;
        let mut state = self.state.lock().unwrap();
        let object = state
            .objects
            .get_mut(key)
            .ok_or_else(|| ObjectStorageError::NotFound(key.to_string()))?;
        object.acl = acl;
        Ok(())
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> ClientResult<ListObjectsPage> {
        self.check("list_objects", &request.prefix)?;
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        let mut prefixes = BTreeSet::new();
        let mut entries = Vec::new();
        for (key, object) in state.objects.range(request.prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&request.prefix) else {
                break;
            };
            let grouped = request
                .delimiter
                .as_deref()
                .and_then(|delimiter| rest.find(delimiter).map(|at| at + delimiter.len()));
            match grouped {
                Some(end) => {
                    let prefix = format!("{}{}", request.prefix, &rest[..end]);
                    if prefixes.insert(prefix.clone()) {
                        entries.push((prefix.clone(), Entry::Prefix(prefix)));
                    }
                }
                None => entries.push((
                    key.clone(),
                    Entry::Object(ObjectSummary {
                        key: key.clone(),
                        size: object.body.len() as u64,
                        last_modified: Some(object.last_modified),
                    }),
                )),
            }
        }

        // Tokens name the last key handed out, so deletes between pages
        // do not shift later pages.
        let remaining: Vec<_> = entries
            .into_iter()
            .filter(|(key, _)| {
                request
                    .continuation_token
                    .as_ref()
                    .is_none_or(|token| key > token)
            })
            .collect();
        let more = remaining.len() > self.page_size;

        let mut page = ListObjectsPage::default();
        for (key, entry) in remaining.into_iter().take(self.page_size) {
            if more {
                page.next_continuation_token = Some(key);
            }
            match entry {
                Entry::Object(object) => page.objects.push(object),
                Entry::Prefix(prefix) => page.common_prefixes.push(prefix),
            }
        }
        Ok(page)
    }
}

/// One adapter under test, plus whatever must outlive it.
pub struct Fixture {
    pub label: &'static str,
    pub adapter: Box<dyn AsyncFilesystemAdapter>,
    _dir: Option<TempDir>,
}

pub fn memory_fixture() -> Fixture {
    Fixture {
        label: "memory",
        adapter: Box::new(SyncToAsyncAdapter::new(InMemoryFilesystemAdapter::new())),
        _dir: None,
    }
}

pub fn local_fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let adapter = LocalFilesystemAdapter::new(dir.path().join("root")).unwrap();
    Fixture {
        label: "local",
        adapter: Box::new(SyncToAsyncAdapter::new(adapter)),
        _dir: Some(dir),
    }
}

pub fn s3_fixture() -> Fixture {
    Fixture {
        label: "s3",
        adapter: Box::new(S3FilesystemAdapter::new(
            MemoryObjectStore::with_page_size(2),
            "prefix",
        )),
        _dir: None,
    }
}

pub fn fixtures() -> Vec<Fixture> {
    vec![memory_fixture(), local_fixture(), s3_fixture()]
}
