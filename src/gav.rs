//! Artifact coordinates and selector sets

use crate::error::{SrcdepsError, SrcdepsResult};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// GroupId, artifactId, version, type and optional classifier of a built artifact
///
/// The string form is `group:artifact:version:type[:classifier]`. It is also
/// the file name under which the artifact's checksum is stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gavtc {
    group_id: String,
    artifact_id: String,
    version: String,
    type_: String,
    classifier: Option<String>,
}

impl Gavtc {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        type_: impl Into<String>,
        classifier: Option<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            type_: type_.into(),
            classifier: classifier.filter(|c| !c.is_empty()),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }
}

impl fmt::Display for Gavtc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.version, self.type_
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

impl FromStr for Gavtc {
    type Err = SrcdepsError;

    fn from_str(s: &str) -> SrcdepsResult<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if !(4..=5).contains(&parts.len()) || parts[..4].iter().any(|p| p.is_empty()) {
            return Err(SrcdepsError::parse(
                s,
                "expected group:artifact:version:type[:classifier]",
            ));
        }
        // The string form is used as a file name
        if let Some(part) = parts
            .iter()
            .find(|p| p.contains(['/', '\\']) || p.starts_with('.'))
        {
            return Err(SrcdepsError::parse(
                s,
                format!("'{}' is not a valid coordinate component", part),
            ));
        }
        Ok(Self::new(
            parts[0],
            parts[1],
            parts[2],
            parts[3],
            parts.get(4).map(|c| c.to_string()),
        ))
    }
}

/// A set of GAV include/exclude patterns selecting artifacts
///
/// Patterns take the forms `group`, `group:artifact`,
/// `group:artifact:version`, optionally with `*` wildcards. Only the content
/// of the set matters here; both sides are kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GavSet {
    includes: BTreeSet<String>,
    excludes: BTreeSet<String>,
}

impl GavSet {
    pub fn builder() -> GavSetBuilder {
        GavSetBuilder::default()
    }

    /// A set including everything
    pub fn include_all() -> Self {
        Self::builder().include("*").build()
    }

    pub fn includes(&self) -> &BTreeSet<String> {
        &self.includes
    }

    pub fn excludes(&self) -> &BTreeSet<String> {
        &self.excludes
    }
}

/// Builder for [`GavSet`]
#[derive(Debug, Default)]
pub struct GavSetBuilder {
    includes: BTreeSet<String>,
    excludes: BTreeSet<String>,
}

impl GavSetBuilder {
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.insert(pattern.into());
        self
    }

    pub fn includes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.insert(pattern.into());
        self
    }

    pub fn build(self) -> GavSet {
        GavSet {
            includes: self.includes,
            excludes: self.excludes,
        }
    }
}
