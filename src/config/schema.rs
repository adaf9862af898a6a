//! Configuration schema for srcdeps
//!
//! Configuration is stored at `~/.config/srcdeps/config.toml`

use crate::request::{Verbosity, DEFAULT_VERSIONS_MAVEN_PLUGIN_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Build metadata cache settings
    pub cache: CacheConfig,

    /// Defaults for build requests
    pub build: BuildConfig,

    /// Maven specific settings
    pub maven: MavenConfig,

    /// Host properties available to `forward_properties`
    pub properties: BTreeMap<String, String>,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Build metadata cache configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store root; defaults to the platform cache directory
    pub root: Option<PathBuf>,
}

impl CacheConfig {
    /// Default store root (`~/.cache/srcdeps/build-metadata` on Linux)
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("srcdeps")
            .join("build-metadata")
    }

    /// Configured root or the default one
    pub fn resolved_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(Self::default_root)
    }
}

/// Defaults applied to every build request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub verbosity: Verbosity,

    pub skip_tests: bool,

    /// Prepend the build tool's default arguments
    pub add_default_build_arguments: bool,

    /// Start builds from the current process environment
    pub add_default_build_environment: bool,

    /// Build timeout in seconds; unbounded when unset
    pub timeout_secs: Option<u64>,

    /// Names or `prefix*` patterns of host properties to forward
    pub forward_properties: BTreeSet<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Info,
            skip_tests: true,
            add_default_build_arguments: true,
            add_default_build_environment: true,
            timeout_secs: None,
            forward_properties: BTreeSet::new(),
        }
    }
}

/// Maven configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MavenConfig {
    /// Version of `versions-maven-plugin` used to rewrite versions
    pub versions_maven_plugin_version: String,

    /// `settings.xml` passed with `-s` to default builds
    pub settings: Option<PathBuf>,
}

impl Default for MavenConfig {
    fn default() -> Self {
        Self {
            versions_maven_plugin_version: DEFAULT_VERSIONS_MAVEN_PLUGIN_VERSION.to_string(),
            settings: None,
        }
    }
}
