//! Metadata recorded for a successfully persisted build

use crate::error::{SrcdepsError, SrcdepsResult};
use crate::gav::Gavtc;
use crate::request::BuildRequestId;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Commit and artifact checksums produced by one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    build_request_id: BuildRequestId,
    commit_id: String,
    checksums: BTreeMap<Gavtc, String>,
}

impl BuildMetadata {
    pub fn builder(build_request_id: BuildRequestId, commit_id: impl Into<String>) -> BuildMetadataBuilder {
        BuildMetadataBuilder {
            build_request_id,
            commit_id: commit_id.into(),
            checksums: BTreeMap::new(),
        }
    }

    pub fn build_request_id(&self) -> &BuildRequestId {
        &self.build_request_id
    }

    pub fn commit_id(&self) -> &str {
        &self.commit_id
    }

    /// Checksums keyed by artifact, in coordinate order
    pub fn checksums(&self) -> &BTreeMap<Gavtc, String> {
        &self.checksums
    }
}

/// Builder for [`BuildMetadata`]
#[derive(Debug)]
pub struct BuildMetadataBuilder {
    build_request_id: BuildRequestId,
    commit_id: String,
    checksums: BTreeMap<Gavtc, String>,
}

impl BuildMetadataBuilder {
    pub fn checksum(mut self, gavtc: Gavtc, checksum: impl Into<String>) -> Self {
        self.checksums.insert(gavtc, checksum.into());
        self
    }

    pub fn build(self) -> BuildMetadata {
        BuildMetadata {
            build_request_id: self.build_request_id,
            commit_id: self.commit_id,
            checksums: self.checksums,
        }
    }
}

/// Hex SHA-1 of a file's contents, the value Maven keeps in `.sha1` files
pub fn checksum_file(path: &Path) -> SrcdepsResult<String> {
    let mut file = File::open(path)
        .map_err(|e| SrcdepsError::io(format!("opening artifact {}", path.display()), e))?;

    let mut hasher = Sha1::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|e| SrcdepsError::io(format!("reading artifact {}", path.display()), e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
