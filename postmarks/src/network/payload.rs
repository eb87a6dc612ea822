use serde::{Deserialize, Serialize};

use crate::config::RangeRule;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PostmarkRequest {
    pub dev_id: String,
    #[serde(default)]
    pub requested: Option<u32>,
}

/// `pm` is absent when no postmark could be assigned.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PostmarkResponse {
    pub dev_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm: Option<u32>,
}

impl PostmarkResponse {
    pub fn not_present(dev_id: String) -> Self {
        Self { dev_id, pm: None }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConfigPayload {
    pub ranges: Vec<RangeRule>,
}
