use std::collections::BTreeMap;

use serde_json::Value;

use super::acl::CannedAcl;
use crate::config::Config;

/// Per-request options understood by the object store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectOptions {
    pub canned_acl: Option<CannedAcl>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub content_type: Option<String>,
    pub expires: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub storage_class: Option<String>,
    pub server_side_encryption: Option<String>,
    pub sse_kms_key_id: Option<String>,
    pub tagging: Option<String>,
    pub website_redirect_location: Option<String>,
}

type OptionSetter = fn(&mut ObjectOptions, &Value);

/// Config keys recognized as native options, and where each one lands.
pub const NATIVE_OPTIONS: &[(&str, OptionSetter)] = &[
    ("canned_acl", |options, value| {
        options.canned_acl = serde_json::from_value(value.clone()).ok();
    }),
    ("cache_control", |options, value| {
        options.cache_control = string(value);
    }),
    ("content_disposition", |options, value| {
        options.content_disposition = string(value);
    }),
    ("content_encoding", |options, value| {
        options.content_encoding = string(value);
    }),
    ("content_type", |options, value| {
        options.content_type = string(value);
    }),
    ("expires", |options, value| {
        options.expires = string(value);
    }),
    ("metadata", |options, value| {
        if let Some(entries) = value.as_object() {
            options.metadata = entries
                .iter()
                .filter_map(|(key, value)| Some((key.clone(), value.as_str()?.to_owned())))
                .collect();
        }
    }),
    ("storage_class", |options, value| {
        options.storage_class = string(value);
    }),
    ("server_side_encryption", |options, value| {
        options.server_side_encryption = string(value);
    }),
    ("sse_kms_key_id", |options, value| {
        options.sse_kms_key_id = string(value);
    }),
    ("tagging", |options, value| {
        options.tagging = string(value);
    }),
    ("website_redirect_location", |options, value| {
        options.website_redirect_location = string(value);
    }),
];

fn string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

impl ObjectOptions {
    /// Picks the native options out of `config`; other keys are ignored.
    pub fn from_config(config: &Config) -> Self {
        let mut options = Self::default();
        for (key, set) in NATIVE_OPTIONS {
            if let Some(value) = config.raw(key) {
                set(&mut options, value);
            }
        }
        options
    }

    pub fn with_canned_acl(mut self, acl: CannedAcl) -> Self {
        self.canned_acl = Some(acl);
        self
    }

    /// Request headers for everything but the content type, which rides on
    /// the upload call itself.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        let mut push = |name: &str, value: &Option<String>| {
            if let Some(value) = value {
                headers.push((name.to_string(), value.clone()));
            }
        };

        push("x-amz-acl", &self.canned_acl.map(|acl| acl.as_str().to_string()));
        push("Cache-Control", &self.cache_control);
        push("Content-Disposition", &self.content_disposition);
        push("Content-Encoding", &self.content_encoding);
        push("Expires", &self.expires);
        push("x-amz-storage-class", &self.storage_class);
        push("x-amz-server-side-encryption", &self.server_side_encryption);
        push("x-amz-server-side-encryption-aws-kms-key-id", &self.sse_kms_key_id);
        push("x-amz-tagging", &self.tagging);
        push("x-amz-website-redirect-location", &self.website_redirect_location);

        headers.extend(
            self.metadata
                .iter()
                .map(|(key, value)| (format!("x-amz-meta-{key}"), value.clone())),
        );
        headers
    }
}
