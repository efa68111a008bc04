//! Core domain types shared by the depot components

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DepotError;

/// Channel identifier partitioning the record log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub i64);

impl ChannelId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Name of the log file holding this channel's records
    pub fn log_file_name(&self) -> String {
        format!("logs_{}.txt", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChannelId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Filename of a stored image, guaranteed to name a single entry
/// directly inside the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageName(String);

impl ImageName {
    pub fn parse(name: impl Into<String>) -> Result<Self, DepotError> {
        let name = name.into();

        if name.is_empty() {
            return Err(DepotError::Validation("Filename must not be empty".into()));
        }
        if name.starts_with('.') {
            return Err(DepotError::Validation(format!(
                "Filename must not start with '.': {}",
                name
            )));
        }
        if name.contains(['/', '\\', '\0']) {
            return Err(DepotError::Validation(format!(
                "Filename must not contain path separators: {}",
                name
            )));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        self.0
            .rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

impl FromStr for ImageName {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ImageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
