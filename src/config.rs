//! Filesystem configuration (spec §6.1) and the two platform presets.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};
use crate::name::NormalizationList;
use crate::options::SupportedFeatures;

/// Which path syntax a filesystem instance uses (spec §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathType {
    Unix,
    Windows,
}

/// Interval at which [`crate::watch::PollingWatchService`] re-snapshots
/// registered directories (spec §4.I).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchServiceConfig {
    pub poll_interval_millis: u64,
}

impl Default for WatchServiceConfig {
    fn default() -> Self {
        Self { poll_interval_millis: 5000 }
    }
}

/// Builder covering every option in spec §6.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSystemConfig {
    pub path_type: PathType,
    pub name_display_normalization: NormalizationList,
    pub name_canonical_normalization: NormalizationList,
    pub path_equality_uses_canonical_form: bool,
    pub block_size: u64,
    pub max_size: u64,
    pub max_cache_size: u64,
    pub attribute_views: BTreeSet<String>,
    pub default_attribute_values: BTreeMap<String, String>,
    pub watch_service: WatchServiceConfig,
    pub roots: Vec<String>,
    pub working_directory: String,
    pub supported_features: SupportedFeatures,
}

const DEFAULT_BLOCK_SIZE: u64 = 8192;
const DEFAULT_MAX_SIZE: u64 = 4 * 1024 * 1024 * 1024;

impl FileSystemConfig {
    /// POSIX-like defaults: root `/`, working directory `/work`, views
    /// `{basic, owner, posix, unix}`.
    pub fn unix() -> Self {
        Self {
            path_type: PathType::Unix,
            name_display_normalization: NormalizationList::none(),
            name_canonical_normalization: NormalizationList::none(),
            path_equality_uses_canonical_form: false,
            block_size: DEFAULT_BLOCK_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            max_cache_size: DEFAULT_MAX_SIZE,
            attribute_views: ["basic", "owner", "posix", "unix"].iter().map(|s| s.to_string()).collect(),
            default_attribute_values: BTreeMap::new(),
            watch_service: WatchServiceConfig::default(),
            roots: vec!["/".to_string()],
            working_directory: "/work".to_string(),
            supported_features: SupportedFeatures::all(),
        }
    }

    /// Windows-like defaults: root `C:\`, working directory `C:\work`,
    /// views `{basic, owner, dos, acl}`.
    pub fn windows() -> Self {
        Self {
            path_type: PathType::Windows,
            name_display_normalization: NormalizationList::none(),
            name_canonical_normalization: crate::name::NormalizationList(vec![
                crate::name::Normalization::CaseFoldAscii,
            ]),
            path_equality_uses_canonical_form: true,
            block_size: DEFAULT_BLOCK_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            max_cache_size: DEFAULT_MAX_SIZE,
            attribute_views: ["basic", "owner", "dos", "acl"].iter().map(|s| s.to_string()).collect(),
            default_attribute_values: BTreeMap::new(),
            watch_service: WatchServiceConfig::default(),
            roots: vec![r"C:\".to_string()],
            working_directory: r"C:\work".to_string(),
            supported_features: SupportedFeatures::all(),
        }
    }

    pub fn with_block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_max_cache_size(mut self, max_cache_size: u64) -> Self {
        self.max_cache_size = max_cache_size;
        self
    }

    pub fn with_working_directory(mut self, path: impl Into<String>) -> Self {
        self.working_directory = path.into();
        self
    }

    pub fn from_toml_str(s: &str) -> FsResult<Self> {
        toml::from_str(s)
            .map_err(|_| FsError::PathSyntaxInvalid { path: s.to_string(), reason: "invalid TOML config" })
    }

    pub fn to_toml_string(&self) -> FsResult<String> {
        toml::to_string_pretty(self)
            .map_err(|_| FsError::Invariant("config is not serializable to TOML"))
    }

    /// Validates normalization-list and numeric constraints (spec §6.1
    /// "Constraints").
    pub fn validate(&self) -> FsResult<()> {
        self.name_display_normalization
            .validate()
            .map_err(|reason| FsError::PathSyntaxInvalid { path: String::new(), reason })?;
        self.name_canonical_normalization
            .validate()
            .map_err(|reason| FsError::PathSyntaxInvalid { path: String::new(), reason })?;
        if self.block_size == 0 {
            return Err(FsError::InvalidArgument("block_size must be positive"));
        }
        if self.roots.is_empty() {
            return Err(FsError::InvalidArgument("at least one root is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_preset_validates() {
        FileSystemConfig::unix().validate().unwrap();
    }

    #[test]
    fn windows_preset_validates() {
        FileSystemConfig::windows().validate().unwrap();
    }

    #[test]
    fn toml_round_trip() {
        let config = FileSystemConfig::unix().with_block_size(4096);
        let toml = config.to_toml_string().unwrap();
        let parsed = FileSystemConfig::from_toml_str(&toml).unwrap();
        assert_eq!(parsed.block_size, 4096);
        assert_eq!(parsed.roots, config.roots);
    }

    #[test]
    fn zero_block_size_rejected() {
        let config = FileSystemConfig::unix().with_block_size(0);
        assert!(config.validate().is_err());
    }
}
