use serde::{Deserialize, Serialize};

use crate::attributes::Visibility;
use crate::visibility::VisibilityConverter;

/// Grantee URI of the anonymous "everyone" group.
pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";
pub const PERMISSION_READ: &str = "READ";

/// Predefined access-control templates understood by the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    AwsExecRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl CannedAcl {
    /// Wire value, as sent in the `x-amz-acl` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
            CannedAcl::AuthenticatedRead => "authenticated-read",
            CannedAcl::AwsExecRead => "aws-exec-read",
            CannedAcl::BucketOwnerRead => "bucket-owner-read",
            CannedAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl std::fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an object's access-control list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub grantee_uri: Option<String>,
    pub grantee_id: Option<String>,
    pub permission: String,
}

impl Grant {
    pub fn group(uri: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            grantee_uri: Some(uri.into()),
            grantee_id: None,
            permission: permission.into(),
        }
    }

    pub fn canonical_user(id: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            grantee_uri: None,
            grantee_id: Some(id.into()),
            permission: permission.into(),
        }
    }
}

/// Grants a canned ACL expands to, with `owner` as the object owner.
pub fn grants_for(acl: CannedAcl, owner: &str) -> Vec<Grant> {
    let mut grants = vec![Grant::canonical_user(owner, "FULL_CONTROL")];
    match acl {
        CannedAcl::PublicRead => grants.push(Grant::group(ALL_USERS_URI, PERMISSION_READ)),
        CannedAcl::PublicReadWrite => {
            grants.push(Grant::group(ALL_USERS_URI, PERMISSION_READ));
            grants.push(Grant::group(ALL_USERS_URI, "WRITE"));
        }
        CannedAcl::AuthenticatedRead => grants.push(Grant::group(
            "http://acs.amazonaws.com/groups/global/AuthenticatedUsers",
            PERMISSION_READ,
        )),
        _ => {}
    }
    grants
}

/// Grants listed in an `AccessControlPolicy` XML document.
pub fn parse_access_control_policy(xml: &str) -> Vec<Grant> {
    xml.split("<Grant>")
        .skip(1)
        .filter_map(|chunk| {
            let grant = chunk.split("</Grant>").next()?;
            Some(Grant {
                grantee_uri: element(grant, "URI").map(str::to_owned),
                grantee_id: element(grant, "ID").map(str::to_owned),
                permission: element(grant, "Permission")?.to_owned(),
            })
        })
        .collect()
}

fn element<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].trim())
}

/// Visibility as canned ACLs. Reading back, a READ grant for the
/// all-users group means public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclVisibilityConverter {
    default_for_directories: Visibility,
}

impl Default for AclVisibilityConverter {
    fn default() -> Self {
        Self::new(Visibility::Public)
    }
}

impl AclVisibilityConverter {
    pub fn new(default_for_directories: Visibility) -> Self {
        Self {
            default_for_directories,
        }
    }

    fn acl(visibility: Visibility) -> CannedAcl {
        match visibility {
            Visibility::Public => CannedAcl::PublicRead,
            Visibility::Private => CannedAcl::Private,
        }
    }

    fn visibility(grants: &[Grant]) -> Visibility {
        let public = grants.iter().any(|grant| {
            grant.grantee_uri.as_deref() == Some(ALL_USERS_URI)
                && grant.permission == PERMISSION_READ
        });
        if public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

impl VisibilityConverter for AclVisibilityConverter {
    type Native = CannedAcl;
    type Observed = [Grant];

    fn for_file(&self, visibility: Visibility) -> CannedAcl {
        Self::acl(visibility)
    }

    fn for_directory(&self, visibility: Visibility) -> CannedAcl {
        Self::acl(visibility)
    }

    fn inverse_for_file(&self, grants: &[Grant]) -> Visibility {
        Self::visibility(grants)
    }

    fn inverse_for_directory(&self, grants: &[Grant]) -> Visibility {
        Self::visibility(grants)
    }

    fn default_for_directories(&self) -> Visibility {
        self.default_for_directories
    }
}
