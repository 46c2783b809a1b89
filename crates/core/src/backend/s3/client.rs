use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::acl::{CannedAcl, Grant};
use super::options::ObjectOptions;
use crate::error::BoxError;

pub type ClientResult<T> = std::result::Result<T, ObjectStorageError>;

#[derive(Debug, Error)]
pub enum ObjectStorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object store answered {status} for {key}: {message}")]
    Status {
        key: String,
        status: u16,
        message: String,
    },

    #[error("object store request failed")]
    Transport(#[source] BoxError),
}

impl ObjectStorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ObjectStorageError::NotFound(_))
    }
}

/// Metadata returned by a head request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectHead {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsRequest {
    /// Empty lists the whole bucket.
    pub prefix: String,
    pub delimiter: Option<String>,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListObjectsPage {
    pub objects: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
    pub next_continuation_token: Option<String>,
}

/// The object-store operations the adapter needs, bound to one bucket.
///
/// Absent keys must surface as [`ObjectStorageError::NotFound`] from
/// `get_object`, `head_object`, `copy_object` and both ACL calls.
#[async_trait]
pub trait ObjectStorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, options: &ObjectOptions) -> ClientResult<()>;

    async fn get_object(&self, key: &str) -> ClientResult<Bytes>;

    async fn head_object(&self, key: &str) -> ClientResult<ObjectHead>;

    async fn delete_object(&self, key: &str) -> ClientResult<()>;

    async fn delete_objects(&self, keys: &[String]) -> ClientResult<()>;

    async fn copy_object(
        &self,
        source_key: &str,
        destination_key: &str,
        options: &ObjectOptions,
    ) -> ClientResult<()>;

    async fn get_object_acl(&self, key: &str) -> ClientResult<Vec<Grant>>;

    async fn put_object_acl(&self, key: &str, acl: CannedAcl) -> ClientResult<()>;

    async fn list_objects(&self, request: ListObjectsRequest) -> ClientResult<ListObjectsPage>;
}
