//! Extraction of display attributes from registry tags
//!
//! Registry records carry an unordered list of `key=value` tags. Two keys
//! are recognized: one for the display name and one for the address. Tags
//! that do not split into exactly two parts around a single `=` are skipped.

use crate::models::DisplayAttributes;
use serde::{Deserialize, Serialize};

/// Default tag key holding the display name
pub const DEFAULT_NAME_TAG: &str = "dashboard.service.name";

/// Default tag key holding the address
pub const DEFAULT_ADDRESS_TAG: &str = "dashboard.service.address";

/// Tag keys recognized by the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeKeys {
    /// Tag key holding the display name
    pub name: String,
    /// Tag key holding the address
    pub address: String,
}

impl Default for AttributeKeys {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_TAG.to_string(),
            address: DEFAULT_ADDRESS_TAG.to_string(),
        }
    }
}

impl AttributeKeys {
    /// Create a custom set of tag keys
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Extract the display name and address from a record's tags.
    ///
    /// Fields without a matching tag stay empty. When a key occurs more
    /// than once the last occurrence in scan order wins.
    pub fn extract<S: AsRef<str>>(&self, tags: &[S]) -> DisplayAttributes {
        let mut attrs = DisplayAttributes::default();

        for tag in tags {
            let Some((key, value)) = split_tag(tag.as_ref()) else {
                continue;
            };

            if key == self.name {
                attrs.name = value.to_string();
            } else if key == self.address {
                attrs.address = value.to_string();
            }
        }

        attrs
    }
}

/// Split `key=value`, rejecting tags with no `=` or more than one
fn split_tag(tag: &str) -> Option<(&str, &str)> {
    let (key, value) = tag.split_once('=')?;
    if value.contains('=') {
        return None;
    }
    Some((key, value))
}
