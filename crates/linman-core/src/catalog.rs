//! Read-only catalog types: regions, images, and instance types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceType {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub vcpus: i64,
    pub memory: i64,
    pub disk: i64,
}
