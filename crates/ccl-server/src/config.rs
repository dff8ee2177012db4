use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use ccl_consensus::{DEFAULT_MAX_WALK_PAGES, DEFAULT_PAGE_LIMIT};
use ccl_types::FacilityType;

use crate::error::{ServerError, ServerResult};

/// A facility seeded into the in-memory directory at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FacilityEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub facility_type: FacilityType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Consensus log new batches are anchored to.
    #[serde(default = "default_log_id")]
    pub log_id: String,
    /// Ceiling on a single consensus submission before falling back.
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Page ceiling for "complete" timeline walks.
    #[serde(default = "default_max_walk_pages")]
    pub max_walk_pages: u32,
    #[serde(default)]
    pub facilities: Vec<FacilityEntry>,
}

fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:8471".parse().unwrap()
}

fn default_log_id() -> String {
    "0.0.4811".into()
}

fn default_submit_timeout_ms() -> u64 {
    2_000
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_max_walk_pages() -> u32 {
    DEFAULT_MAX_WALK_PAGES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            log_id: default_log_id(),
            submit_timeout_ms: default_submit_timeout_ms(),
            page_limit: default_page_limit(),
            max_walk_pages: default_max_walk_pages(),
            facilities: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
