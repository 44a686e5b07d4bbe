//! NodeBalancer types: balancers, port configs, and backend nodes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBalancer {
    pub id: i64,
    #[serde(default)]
    pub label: Option<String>,
    pub region: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeBalancerCreateOptions {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_conn_throttle: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A port configuration on a NodeBalancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBalancerConfig {
    pub id: i64,
    pub nodebalancer_id: i64,
    pub port: i64,
    pub protocol: String,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub check: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeBalancerConfigCreateOptions {
    pub port: i64,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_path: Option<String>,
}

/// A backend node attached to a NodeBalancer config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBalancerNode {
    pub id: i64,
    pub label: String,
    pub address: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeBalancerNodeCreateOptions {
    pub label: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}
