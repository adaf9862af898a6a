//! Build requests: what should be built and how
//!
//! A [`BuildRequest`] is immutable once built; its output-affecting fields
//! are folded into a [`BuildRequestId`], the key of the build metadata store.

mod id;
mod io;

pub use id::BuildRequestId;
pub use io::{IoRedirects, Redirect};

use crate::error::{SrcdepsError, SrcdepsResult};
use crate::version::SrcVersion;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default version of `org.codehaus.mojo:versions-maven-plugin`
pub const DEFAULT_VERSIONS_MAVEN_PLUGIN_VERSION: &str = "2.5";

/// Verbosity the build tool should use
///
/// Build tools map these onto whatever levels they support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = SrcdepsError;

    fn from_str(s: &str) -> SrcdepsResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(SrcdepsError::configuration(
                "verbosity",
                format!("no such verbosity '{}'", s),
            )),
        }
    }
}

/// A description of what and how should be built
#[derive(Debug, Clone)]
pub struct BuildRequest {
    project_root: PathBuf,
    src_version: SrcVersion,
    scm_urls: Vec<String>,
    build_arguments: Vec<String>,
    add_default_build_arguments: bool,
    add_default_build_environment: bool,
    skip_tests: bool,
    forward_properties: BTreeSet<String>,
    build_environment: BTreeMap<String, String>,
    verbosity: Verbosity,
    io_redirects: IoRedirects,
    timeout: Option<Duration>,
    versions_maven_plugin_version: String,
    tool_settings: Option<PathBuf>,
}

impl BuildRequest {
    pub fn builder() -> BuildRequestBuilder {
        BuildRequestBuilder::default()
    }

    /// Root directory of the source tree to build
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn src_version(&self) -> &SrcVersion {
        &self.src_version
    }

    /// URLs tried one after another until a checkout succeeds
    pub fn scm_urls(&self) -> &[String] {
        &self.scm_urls
    }

    /// Extra arguments for the build; combined with the tool's defaults
    /// when [`Self::add_default_build_arguments`] is set
    pub fn build_arguments(&self) -> &[String] {
        &self.build_arguments
    }

    pub fn add_default_build_arguments(&self) -> bool {
        self.add_default_build_arguments
    }

    /// Whether the child starts from the current process environment
    pub fn add_default_build_environment(&self) -> bool {
        self.add_default_build_environment
    }

    pub fn skip_tests(&self) -> bool {
        self.skip_tests
    }

    /// Property names to pass on to the child build as `-Dname=value`.
    /// A trailing `*` forwards every property starting with the prefix.
    pub fn forward_properties(&self) -> &BTreeSet<String> {
        &self.forward_properties
    }

    /// Environment variables overlaid on the child's environment
    pub fn build_environment(&self) -> &BTreeMap<String, String> {
        &self.build_environment
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn io_redirects(&self) -> &IoRedirects {
        &self.io_redirects
    }

    /// Deadline for each spawned process; `None` waits forever
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn versions_maven_plugin_version(&self) -> &str {
        &self.versions_maven_plugin_version
    }

    /// Build tool settings file, e.g. a Maven `settings.xml`
    pub fn tool_settings(&self) -> Option<&Path> {
        self.tool_settings.as_deref()
    }
}

impl fmt::Display for BuildRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BuildRequest [version={}, project_root={}, scm_urls={:?}, build_arguments={:?}, skip_tests={}, verbosity={}, io=({})]",
            self.src_version,
            self.project_root.display(),
            self.scm_urls,
            self.build_arguments,
            self.skip_tests,
            self.verbosity,
            self.io_redirects
        )
    }
}

/// Builder for [`BuildRequest`]
#[derive(Debug)]
pub struct BuildRequestBuilder {
    project_root: Option<PathBuf>,
    src_version: Option<SrcVersion>,
    scm_urls: Vec<String>,
    build_arguments: Vec<String>,
    add_default_build_arguments: bool,
    add_default_build_environment: bool,
    skip_tests: bool,
    forward_properties: BTreeSet<String>,
    build_environment: BTreeMap<String, String>,
    verbosity: Verbosity,
    io_redirects: IoRedirects,
    timeout: Option<Duration>,
    versions_maven_plugin_version: String,
    tool_settings: Option<PathBuf>,
}

impl Default for BuildRequestBuilder {
    fn default() -> Self {
        Self {
            project_root: None,
            src_version: None,
            scm_urls: Vec::new(),
            build_arguments: Vec::new(),
            add_default_build_arguments: true,
            add_default_build_environment: true,
            skip_tests: true,
            forward_properties: BTreeSet::new(),
            build_environment: BTreeMap::new(),
            verbosity: Verbosity::Info,
            io_redirects: IoRedirects::inherit_all(),
            timeout: None,
            versions_maven_plugin_version: DEFAULT_VERSIONS_MAVEN_PLUGIN_VERSION.to_string(),
            tool_settings: None,
        }
    }
}

impl BuildRequestBuilder {
    pub fn project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    pub fn src_version(mut self, version: SrcVersion) -> Self {
        self.src_version = Some(version);
        self
    }

    pub fn scm_url(mut self, url: impl Into<String>) -> Self {
        self.scm_urls.push(url.into());
        self
    }

    pub fn scm_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scm_urls.extend(urls.into_iter().map(Into::into));
        self
    }

    pub fn build_argument(mut self, argument: impl Into<String>) -> Self {
        self.build_arguments.push(argument.into());
        self
    }

    pub fn build_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_arguments
            .extend(arguments.into_iter().map(Into::into));
        self
    }

    pub fn add_default_build_arguments(mut self, value: bool) -> Self {
        self.add_default_build_arguments = value;
        self
    }

    pub fn add_default_build_environment(mut self, value: bool) -> Self {
        self.add_default_build_environment = value;
        self
    }

    pub fn skip_tests(mut self, value: bool) -> Self {
        self.skip_tests = value;
        self
    }

    pub fn forward_property(mut self, name: impl Into<String>) -> Self {
        self.forward_properties.insert(name.into());
        self
    }

    pub fn forward_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forward_properties
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn build_environment_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.build_environment.insert(name.into(), value.into());
        self
    }

    pub fn build_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.build_environment
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn io_redirects(mut self, io_redirects: IoRedirects) -> Self {
        self.io_redirects = io_redirects;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn versions_maven_plugin_version(mut self, version: impl Into<String>) -> Self {
        self.versions_maven_plugin_version = version.into();
        self
    }

    pub fn tool_settings(mut self, path: Option<PathBuf>) -> Self {
        self.tool_settings = path;
        self
    }

    /// Build the request, rejecting missing required fields
    pub fn build(self) -> SrcdepsResult<BuildRequest> {
        let project_root = self
            .project_root
            .ok_or_else(|| SrcdepsError::configuration("project_root", "must be set"))?;
        let src_version = self
            .src_version
            .ok_or_else(|| SrcdepsError::configuration("src_version", "must be set"))?;
        if self.scm_urls.is_empty() {
            return Err(SrcdepsError::configuration(
                "scm_urls",
                "at least one SCM URL is required",
            ));
        }
        if self.versions_maven_plugin_version.is_empty() {
            return Err(SrcdepsError::configuration(
                "versions_maven_plugin_version",
                "must not be empty",
            ));
        }
        self.io_redirects.validate()?;

        Ok(BuildRequest {
            project_root,
            src_version,
            scm_urls: self.scm_urls,
            build_arguments: self.build_arguments,
            add_default_build_arguments: self.add_default_build_arguments,
            add_default_build_environment: self.add_default_build_environment,
            skip_tests: self.skip_tests,
            forward_properties: self.forward_properties,
            build_environment: self.build_environment,
            verbosity: self.verbosity,
            io_redirects: self.io_redirects,
            timeout: self.timeout,
            versions_maven_plugin_version: self.versions_maven_plugin_version,
            tool_settings: self.tool_settings,
        })
    }
}
