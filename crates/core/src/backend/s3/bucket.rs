use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use tracing::{debug, info, warn};

use super::acl::{CannedAcl, Grant, parse_access_control_policy};
use super::client::{
    ClientResult, ListObjectsPage, ListObjectsRequest, ObjectHead, ObjectStorageClient,
    ObjectStorageError, ObjectSummary,
};
use super::options::ObjectOptions;

/// [`ObjectStorageClient`] over a `rust-s3` bucket.
pub struct S3Bucket {
    bucket: Box<Bucket>,
}

impl S3Bucket {
    pub fn new(
        bucket_name: &str,
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
    ) -> ClientResult<Self> {
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint.to_string(),
        };
        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| ObjectStorageError::Transport(Box::new(e)))?;
        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(transport)?
            .with_path_style();
        info!(bucket = bucket_name, endpoint, "bound object storage bucket");
        Ok(Self { bucket })
    }

    pub fn from_bucket(bucket: Box<Bucket>) -> Self {
        Self { bucket }
    }

    /// A copy of the bucket handle carrying `options` as request headers.
    fn with_options(&self, options: &ObjectOptions) -> Bucket {
        let mut bucket = (*self.bucket).clone();
        for (name, value) in options.headers() {
            bucket.add_header(&name, &value);
        }
        bucket
    }

    fn acl_resource(&self) -> Bucket {
        let mut bucket = (*self.bucket).clone();
        bucket.add_query("acl", "");
        bucket
    }
}

#[async_trait]
impl ObjectStorageClient for S3Bucket {
    async fn put_object(&self, key: &str, body: Bytes, options: &ObjectOptions) -> ClientResult<()> {
        let bucket = self.with_options(options);
        let response = match &options.content_type {
            Some(content_type) => {
                bucket
                    .put_object_with_content_type(key, &body, content_type)
                    .await
            }
            None => bucket.put_object(key, &body).await,
        }
        .map_err(transport)?;
        check(key, response.status_code(), response.as_slice())?;
        debug!(key, bytes = body.len(), "put object");
        Ok(())
    }

    async fn get_object(&self, key: &str) -> ClientResult<Bytes> {
        let response = self.bucket.get_object(key).await.map_err(transport)?;
        check(key, response.status_code(), response.as_slice())?;
        Ok(Bytes::from(response.to_vec()))
    }

    async fn head_object(&self, key: &str) -> ClientResult<ObjectHead> {
        let (head, status) = self.bucket.head_object(key).await.map_err(transport)?;
        check(key, status, &[])?;
        Ok(ObjectHead {
            content_length: head.content_length.and_then(|len| u64::try_from(len).ok()),
            content_type: head.content_type,
            last_modified: head.last_modified.as_deref().and_then(parse_http_date),
        })
    }

    async fn delete_object(&self, key: &str) -> ClientResult<()> {
        let response = self.bucket.delete_object(key).await.map_err(transport)?;
        check(key, response.status_code(), response.as_slice())?;
        debug!(key, "deleted object");
        Ok(())
    }

    async fn delete_objects(&self, keys: &[String]) -> ClientResult<()> {
        for key in keys {
            match self.delete_object(key).await {
                Err(ObjectStorageError::NotFound(_)) => warn!(key = %key, "object already gone"),
                other => other?,
            }
        }
        Ok(())
    }

    async fn copy_object(
        &self,
        source_key: &str,
        destination_key: &str,
        options: &ObjectOptions,
    ) -> ClientResult<()> {
        let bucket = self.with_options(options);
        let status = bucket
            .copy_object_internal(source_key, destination_key)
            .await
            .map_err(transport)?;
        check(source_key, status, &[])?;
        debug!(source_key, destination_key, "copied object");
        Ok(())
    }

    async fn get_object_acl(&self, key: &str) -> ClientResult<Vec<Grant>> {
        let response = self
            .acl_resource()
            .get_object(key)
            .await
            .map_err(transport)?;
        check(key, response.status_code(), response.as_slice())?;
        let xml = String::from_utf8_lossy(response.as_slice());
        Ok(parse_access_control_policy(&xml))
    }

    async fn put_object_acl(&self, key: &str, acl: CannedAcl) -> ClientResult<()> {
        let mut bucket = self.acl_resource();
        bucket.add_header("x-amz-acl", acl.as_str());
        let response = bucket.put_object(key, &[]).await.map_err(transport)?;
        check(key, response.status_code(), response.as_slice())?;
        debug!(key, acl = %acl, "put object acl");
        Ok(())
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> ClientResult<ListObjectsPage> {
        let (result, status) = self
            .bucket
            .list_page(
                request.prefix.clone(),
                request.delimiter,
                request.continuation_token,
                None,
                None,
            )
            .await
            .map_err(transport)?;
        check(&request.prefix, status, &[])?;

        Ok(ListObjectsPage {
            objects: result
                .contents
                .into_iter()
                .map(|object| ObjectSummary {
                    last_modified: DateTime::parse_from_rfc3339(&object.last_modified)
                        .ok()
                        .map(|date| date.with_timezone(&Utc)),
                    key: object.key,
                    size: object.size,
                })
                .collect(),
            common_prefixes: result
                .common_prefixes
                .unwrap_or_default()
                .into_iter()
                .map(|common| common.prefix)
                .collect(),
            next_continuation_token: result.next_continuation_token,
        })
    }
}

fn transport(e: S3Error) -> ObjectStorageError {
    ObjectStorageError::Transport(Box::new(e))
}

fn check(key: &str, status: u16, body: &[u8]) -> ClientResult<()> {
    match status {
        200..=299 => Ok(()),
        404 => Err(ObjectStorageError::NotFound(key.to_string())),
        _ => Err(ObjectStorageError::Status {
            key: key.to_string(),
            status,
            message: String::from_utf8_lossy(body).trim().to_string(),
        }),
    }
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_client_errors() {
        assert!(check("key", 200, &[]).is_ok());
        assert!(check("key", 204, &[]).is_ok());
        assert!(check("key", 404, &[]).unwrap_err().is_not_found());
        assert!(matches!(
            check("key", 403, b"<Error>AccessDenied</Error>"),
            Err(ObjectStorageError::Status { status: 403, .. })
        ));
    }

    #[test]
    fn http_dates_parse_in_either_format() {
        let expected = DateTime::parse_from_rfc3339("2015-10-21T07:28:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_http_date("Wed, 21 Oct 2015 07:28:00 GMT"), Some(expected));
        assert_eq!(parse_http_date("2015-10-21T07:28:00Z"), Some(expected));
        assert_eq!(parse_http_date("yesterday"), None);
    }
}
