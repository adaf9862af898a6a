//! Source version grammar
//!
//! A source version looks like `<prefix>-SRC-<versionType>-<versionValue>`,
//! e.g. `1.2.3-SRC-revision-deadbeef`. The version type and value carry the
//! same meaning as `scmVersionType` and `scmVersion` of maven-scm-plugin.

use crate::error::{SrcdepsError, SrcdepsResult};
use std::fmt;
use std::hash::{Hash, Hasher};

const SRC_VERSION_INFIX: &str = "-SRC-";
const SRC_VERSION_DELIMITER: char = '-';

/// Version types with a known meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownKind {
    Branch,
    Revision,
    Tag,
}

impl WellKnownKind {
    /// Map a literal version type to a well-known kind, if it is one
    pub fn classify(version_type: &str) -> Option<Self> {
        match version_type {
            "branch" => Some(Self::Branch),
            "revision" => Some(Self::Revision),
            "tag" => Some(Self::Tag),
            _ => None,
        }
    }

    /// Whether versions of this kind stay the same across fetches from remotes
    pub fn is_immutable(&self) -> bool {
        match self {
            Self::Branch => false,
            Self::Revision | Self::Tag => true,
        }
    }
}

impl fmt::Display for WellKnownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Branch => "branch",
            Self::Revision => "revision",
            Self::Tag => "tag",
        };
        write!(f, "{}", name)
    }
}

/// A parsed source version
///
/// Equality and hashing follow the raw string the version was parsed from.
#[derive(Debug, Clone)]
pub struct SrcVersion {
    raw: String,
    version_type: String,
    version_value: String,
    kind: Option<WellKnownKind>,
}

impl SrcVersion {
    /// The `-SRC-` infix that marks out a source version string
    pub fn infix() -> &'static str {
        SRC_VERSION_INFIX
    }

    /// The character separating the version type from the version value
    pub fn delimiter() -> char {
        SRC_VERSION_DELIMITER
    }

    /// Cheap check whether `raw` contains the `-SRC-` infix
    pub fn is_src_version(raw: &str) -> bool {
        raw.contains(SRC_VERSION_INFIX)
    }

    /// Parse a raw version string
    ///
    /// Returns `Ok(None)` for ordinary versions without the `-SRC-` infix.
    pub fn parse(raw: &str) -> SrcdepsResult<Option<Self>> {
        let Some(pos) = raw.find(SRC_VERSION_INFIX) else {
            return Ok(None);
        };

        let rest = &raw[pos + SRC_VERSION_INFIX.len()..];
        let Some((version_type, version_value)) = rest.split_once(SRC_VERSION_DELIMITER) else {
            return Err(SrcdepsError::parse(
                raw,
                format!(
                    "contains '{}' that is not followed by a version type such as 'tag', 'branch', or 'revision'",
                    SRC_VERSION_INFIX
                ),
            ));
        };

        Ok(Some(Self {
            raw: raw.to_string(),
            kind: WellKnownKind::classify(version_type),
            version_type: version_type.to_string(),
            version_value: version_value.to_string(),
        }))
    }

    /// Parse a raw version string that must be a source version
    pub fn parse_required(raw: &str) -> SrcdepsResult<Self> {
        Self::parse(raw)?.ok_or_else(|| {
            SrcdepsError::parse(raw, format!("not a source version, '{}' missing", SRC_VERSION_INFIX))
        })
    }

    /// The string this version was parsed from
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn version_type(&self) -> &str {
        &self.version_type
    }

    pub fn version_value(&self) -> &str {
        &self.version_value
    }

    pub fn kind(&self) -> Option<WellKnownKind> {
        self.kind
    }

    /// True only for revisions and tags
    pub fn is_immutable(&self) -> bool {
        self.kind.is_some_and(|k| k.is_immutable())
    }
}

impl PartialEq for SrcVersion {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for SrcVersion {}

impl Hash for SrcVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for SrcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
