//! Data models for the service catalog

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A service shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Registry service identifier, used only for reconciliation
    pub key: String,

    /// Display name
    pub name: String,

    /// Address the display name links to
    pub address: String,
}

impl ServiceEntry {
    /// Create a new entry
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Display attributes extracted from one registry record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAttributes {
    /// Display name, empty if the record has none
    pub name: String,

    /// Address, empty if the record has none
    pub address: String,
}

impl DisplayAttributes {
    /// Create display attributes from a name and an address
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Whether both name and address are present
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.address.is_empty()
    }
}

/// Full listing returned by one long-poll call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogListing {
    /// Service identifier -> raw attribute strings
    pub services: HashMap<String, Vec<String>>,

    /// Registry index this listing corresponds to
    pub index: u64,
}

impl CatalogListing {
    /// Create a listing
    pub fn new(services: HashMap<String, Vec<String>>, index: u64) -> Self {
        Self { services, index }
    }
}
