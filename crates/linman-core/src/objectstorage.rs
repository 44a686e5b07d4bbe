//! Object storage types: buckets and access keys.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectStorageBucket {
    pub label: String,
    pub region: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectStorageBucketCreateOptions {
    pub label: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectStorageKey {
    pub id: i64,
    pub label: String,
    pub access_key: String,
    /// Only populated on creation; never returned by later reads.
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub limited: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectStorageKeyCreateOptions {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_access: Option<Vec<BucketAccess>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketAccess {
    pub bucket_name: String,
    pub region: String,
    pub permissions: String,
}
