use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::MetadataStore;
use crate::error::{SrcdepsError, SrcdepsResult};
use crate::gav::Gavtc;
use crate::request::BuildRequestId;

/// File holding the commit id inside a request's directory
const COMMIT_ID_FILE: &str = "commitId";

/// Number of single-character directories in front of the leaf
const FAN_OUT_DEPTH: usize = 4;

/// Filesystem-backed metadata store with single-character fan-out.
///
/// Layout: `<root>/<h0>/<h1>/<h2>/<h3>/<rest of hash>/commitId` and
/// `.../<group:artifact:version:type[:classifier]>`. Each file holds exactly
/// the stored string.
#[derive(Debug, Clone)]
pub struct FsMetadataStore {
    root: PathBuf,
}

impl FsMetadataStore {
    /// Create a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl AsRef<Path>) -> SrcdepsResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| SrcdepsError::store_io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything stored for `id`
    pub fn build_request_id_path(&self, id: &BuildRequestId) -> PathBuf {
        let hash = id.hash();
        let mut path = self.root.clone();
        for i in 0..FAN_OUT_DEPTH {
            path.push(&hash[i..i + 1]);
        }
        path.push(&hash[FAN_OUT_DEPTH..]);
        path
    }

    /// File holding the SHA-1 of `gavtc`, directly inside the id's directory
    fn sha1_path(&self, id: &BuildRequestId, gavtc: &Gavtc) -> SrcdepsResult<PathBuf> {
        let name = gavtc.to_string();
        let mut components = Path::new(&name).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single || name.contains(['/', '\\']) {
            return Err(SrcdepsError::configuration(
                "gavtc",
                format!("'{}' cannot be used as a file name", name),
            ));
        }
        Ok(self.build_request_id_path(id).join(name))
    }

    fn read(path: &Path) -> SrcdepsResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SrcdepsError::store_io(path, e)),
        }
    }

    fn write(path: &Path, content: &str) -> SrcdepsResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| SrcdepsError::store_io(dir, e))?;
        }
        fs::write(path, content).map_err(|e| SrcdepsError::store_io(path, e))
    }
}

impl MetadataStore for FsMetadataStore {
    fn retrieve_commit_id(&self, id: &BuildRequestId) -> SrcdepsResult<Option<String>> {
        let path = self.build_request_id_path(id).join(COMMIT_ID_FILE);
        let result = Self::read(&path)?;
        match &result {
            Some(commit_id) => debug!("{} points at commit {}", path.display(), commit_id),
            None => debug!("{} does not exist", path.display()),
        }
        Ok(result)
    }

    fn store_commit_id(&self, id: &BuildRequestId, commit_id: &str) -> SrcdepsResult<()> {
        let path = self.build_request_id_path(id).join(COMMIT_ID_FILE);
        debug!("{} will point at commit {}", path.display(), commit_id);
        Self::write(&path, commit_id)
    }

    fn retrieve_sha1(&self, id: &BuildRequestId, gavtc: &Gavtc) -> SrcdepsResult<Option<String>> {
        let path = self.sha1_path(id, gavtc)?;
        let result = Self::read(&path)?;
        match &result {
            Some(checksum) => debug!("{} ({}) has checksum {}", path.display(), gavtc, checksum),
            None => debug!("{} does not exist", path.display()),
        }
        Ok(result)
    }

    fn store_sha1(&self, id: &BuildRequestId, gavtc: &Gavtc, sha1: &str) -> SrcdepsResult<()> {
        let path = self.sha1_path(id, gavtc)?;
        debug!("{} will hold checksum {}", path.display(), sha1);
        Self::write(&path, sha1)
    }
}
