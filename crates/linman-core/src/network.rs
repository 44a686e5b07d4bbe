//! VPC types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vpc {
    pub id: i64,
    pub label: String,
    pub region: String,
    #[serde(default)]
    pub subnets: Vec<VpcSubnet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpcSubnet {
    pub id: i64,
    pub label: String,
    #[serde(default)]
    pub ipv4: Option<String>,
}
