//! Build metadata storage
//!
//! Maps a [`BuildRequestId`] to the commit it was built from and to the
//! checksums of the artifacts the build produced. Producers always write
//! under the id matching their content, so once a value is visible it is
//! authoritative; there is no update or delete.

pub mod fs;

pub use fs::FsMetadataStore;

use crate::error::SrcdepsResult;
use crate::gav::Gavtc;
use crate::metadata::BuildMetadata;
use crate::request::BuildRequestId;

/// Durable mapping from build request ids to build results
///
/// A missing entry is `Ok(None)`, never an error.
pub trait MetadataStore: Send + Sync {
    /// The commit the request was built from, if it was built before
    fn retrieve_commit_id(&self, id: &BuildRequestId) -> SrcdepsResult<Option<String>>;

    /// Record the commit the request was built from
    fn store_commit_id(&self, id: &BuildRequestId, commit_id: &str) -> SrcdepsResult<()>;

    /// The SHA-1 recorded for `gavtc` under the request
    fn retrieve_sha1(&self, id: &BuildRequestId, gavtc: &Gavtc) -> SrcdepsResult<Option<String>>;

    /// Record the SHA-1 of `gavtc` built by the request
    fn store_sha1(&self, id: &BuildRequestId, gavtc: &Gavtc, sha1: &str) -> SrcdepsResult<()>;

    /// Persist a whole build result
    ///
    /// Checksums go first and the commit id last, so a visible commit id
    /// means every checksum of that build was written.
    fn store_metadata(&self, metadata: &BuildMetadata) -> SrcdepsResult<()> {
        let id = metadata.build_request_id();
        for (gavtc, checksum) in metadata.checksums() {
            self.store_sha1(id, gavtc, checksum)?;
        }
        self.store_commit_id(id, metadata.commit_id())
    }
}
