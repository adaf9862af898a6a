//! Canonical fingerprint of a build request

use super::{BuildRequest, Verbosity};
use crate::gav::GavSet;
use crate::version::SrcVersion;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

const FIELD_SEPARATOR: u8 = 0x00;
const ELEMENT_SEPARATOR: u8 = 0x01;
const KEY_VALUE_SEPARATOR: u8 = 0x02;
const UNSET: u8 = 0x03;
const ESCAPE: u8 = b'%';

/// Identifies the output-affecting inputs of a build
///
/// Ordered fields (SCM URLs, build arguments) keep their order; unordered
/// ones (environment, forwarded properties, selectors) are sorted before
/// encoding, so the collection types a caller used never change the id.
/// Equality and ordering compare the canonical encoding.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildRequestId {
    canonical: Vec<u8>,
    hash: String,
}

impl BuildRequestId {
    /// Compute the id of `request` built for the artifacts in `selectors`
    pub fn new(request: &BuildRequest, selectors: &GavSet) -> Self {
        Self::from_parts(
            request.add_default_build_arguments(),
            request.skip_tests(),
            request.build_arguments(),
            request.build_environment(),
            request.forward_properties(),
            selectors,
            request.scm_urls(),
            request.add_default_build_environment(),
            request.src_version(),
            request.timeout(),
            request.verbosity(),
        )
    }

    /// Compute an id from its individual parts
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts<A, E, K, V, P, U>(
        add_default_build_arguments: bool,
        skip_tests: bool,
        build_arguments: A,
        build_environment: E,
        forward_properties: P,
        selectors: &GavSet,
        scm_urls: U,
        add_default_build_environment: bool,
        src_version: &SrcVersion,
        timeout: Option<Duration>,
        verbosity: Verbosity,
    ) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        E: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        let build_environment: BTreeMap<String, String> = build_environment
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        let forward_properties: BTreeSet<String> = forward_properties
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();

        let mut encoder = CanonicalEncoder::default();
        encoder.boolean("addDefaultBuildArguments", add_default_build_arguments);
        encoder.boolean("skipTests", skip_tests);
        encoder.sequence("buildArguments", build_arguments);
        encoder.map("buildEnvironment", &build_environment);
        encoder.sequence("forwardProperties", &forward_properties);
        encoder.sequence("gavSet.includes", selectors.includes());
        encoder.sequence("gavSet.excludes", selectors.excludes());
        encoder.sequence("scmUrls", scm_urls);
        encoder.boolean("addDefaultBuildEnvironment", add_default_build_environment);
        encoder.string("srcVersion", src_version.raw());
        encoder.optional_number("timeoutMs", timeout.map(|t| t.as_millis()));
        encoder.string("verbosity", verbosity.as_str());

        let canonical = encoder.finish();
        let hash = hex::encode(Sha256::digest(&canonical));
        Self { canonical, hash }
    }

    /// Fixed-length lowercase hex SHA-256 of the canonical encoding
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The canonical encoding the hash is computed from
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical
    }
}

impl fmt::Display for BuildRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash)
    }
}

impl fmt::Debug for BuildRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuildRequestId({})", self.hash)
    }
}

/// Writes `name=value` fields separated by `FIELD_SEPARATOR`
///
/// String content is escaped so no separator or sentinel byte can appear
/// inside a value.
#[derive(Default)]
struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    fn begin(&mut self, name: &str) {
        if !self.buf.is_empty() {
            self.buf.push(FIELD_SEPARATOR);
        }
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.push(b'=');
    }

    fn escape(&mut self, value: &str) {
        for b in value.bytes() {
            match b {
                ESCAPE | FIELD_SEPARATOR | ELEMENT_SEPARATOR | KEY_VALUE_SEPARATOR | UNSET => {
                    self.buf.extend_from_slice(format!("%{:02X}", b).as_bytes());
                }
                _ => self.buf.push(b),
            }
        }
    }

    fn boolean(&mut self, name: &str, value: bool) {
        self.begin(name);
        let token: &[u8] = if value { b"true" } else { b"false" };
        self.buf.extend_from_slice(token);
    }

    fn string(&mut self, name: &str, value: &str) {
        self.begin(name);
        self.escape(value);
    }

    fn optional_number(&mut self, name: &str, value: Option<u128>) {
        self.begin(name);
        match value {
            Some(n) => self.buf.extend_from_slice(n.to_string().as_bytes()),
            None => self.buf.push(UNSET),
        }
    }

    /// Element count first, so `[]` and `[""]` differ
    fn sequence<I>(&mut self, name: &str, items: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.begin(name);
        let items: Vec<I::Item> = items.into_iter().collect();
        self.buf
            .extend_from_slice(items.len().to_string().as_bytes());
        for item in &items {
            self.buf.push(ELEMENT_SEPARATOR);
            self.escape(item.as_ref());
        }
    }

    fn map(&mut self, name: &str, entries: &BTreeMap<String, String>) {
        self.begin(name);
        self.buf
            .extend_from_slice(entries.len().to_string().as_bytes());
        for (key, value) in entries {
            self.buf.push(ELEMENT_SEPARATOR);
            self.escape(key);
            self.buf.push(KEY_VALUE_SEPARATOR);
            self.escape(value);
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}
