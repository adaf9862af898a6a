//! Build orchestration
//!
//! Decides whether a build request needs building at all and, when it
//! does, drives checkout, version rewrite, build and metadata persistence.

use crate::builder::Builder;
use crate::error::{SrcdepsError, SrcdepsResult};
use crate::gav::{GavSet, Gavtc};
use crate::metadata::{checksum_file, BuildMetadata};
use crate::request::{BuildRequest, BuildRequestId};
use crate::scm::Checkout;
use crate::store::MetadataStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// An artifact a build is expected to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub gavtc: Gavtc,
    pub path: PathBuf,
}

impl ArtifactFile {
    pub fn new(gavtc: Gavtc, path: impl Into<PathBuf>) -> Self {
        Self {
            gavtc,
            path: path.into(),
        }
    }
}

/// What [`BuildService::build`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A previous build of the same request and commit is still valid
    UpToDate {
        id: BuildRequestId,
        commit_id: String,
    },
    /// The request was built and its metadata stored
    Built(BuildMetadata),
}

impl BuildOutcome {
    pub fn id(&self) -> &BuildRequestId {
        match self {
            Self::UpToDate { id, .. } => id,
            Self::Built(metadata) => metadata.build_request_id(),
        }
    }

    pub fn commit_id(&self) -> &str {
        match self {
            Self::UpToDate { commit_id, .. } => commit_id,
            Self::Built(metadata) => metadata.commit_id(),
        }
    }
}

/// Wires the metadata store, checkout and build tools together
pub struct BuildService {
    store: Arc<dyn MetadataStore>,
    checkout: Arc<dyn Checkout>,
    builders: Vec<Box<dyn Builder>>,
}

impl BuildService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        checkout: Arc<dyn Checkout>,
        builders: Vec<Box<dyn Builder>>,
    ) -> Self {
        Self {
            store,
            checkout,
            builders,
        }
    }

    pub fn store(&self) -> &dyn MetadataStore {
        self.store.as_ref()
    }

    fn select_builder(&self, project_root: &Path) -> SrcdepsResult<&dyn Builder> {
        self.builders
            .iter()
            .find(|b| b.can_build(project_root))
            .map(|b| b.as_ref())
            .ok_or_else(|| {
                SrcdepsError::configuration(
                    "project_root",
                    format!("no build tool recognizes {}", project_root.display()),
                )
            })
    }

    /// Build `request` unless an equivalent build is already recorded
    ///
    /// Nothing is stored unless every step succeeds.
    pub async fn build(
        &self,
        request: &BuildRequest,
        selectors: &GavSet,
        artifacts: &[ArtifactFile],
    ) -> SrcdepsResult<BuildOutcome> {
        let id = BuildRequestId::new(request, selectors);
        debug!("Build request {} has id {}", request, id);

        let cached = self.store.retrieve_commit_id(&id)?;
        if let Some(commit_id) = &cached {
            if request.src_version().is_immutable() {
                info!(
                    "{} already built from commit {}",
                    request.src_version(),
                    commit_id
                );
                return Ok(BuildOutcome::UpToDate {
                    id,
                    commit_id: commit_id.clone(),
                });
            }
        }

        let checkout = self.checkout.checkout(request).await?;
        if cached.as_deref() == Some(checkout.commit_id.as_str()) {
            info!(
                "{} still at commit {}, skipping build",
                request.src_version(),
                checkout.commit_id
            );
            return Ok(BuildOutcome::UpToDate {
                id,
                commit_id: checkout.commit_id,
            });
        }

        let builder = self.select_builder(request.project_root())?;
        info!(
            "Building {} from commit {} with {}",
            request.src_version(),
            checkout.commit_id,
            builder.name()
        );
        builder.set_versions(request).await?;
        builder.build(request).await?;

        let mut metadata = BuildMetadata::builder(id, checkout.commit_id);
        for artifact in artifacts {
            let checksum = checksum_artifact(&artifact.path).await?;
            debug!("{} has checksum {}", artifact.gavtc, checksum);
            metadata = metadata.checksum(artifact.gavtc.clone(), checksum);
        }
        let metadata = metadata.build();
        self.store.store_metadata(&metadata)?;

        Ok(BuildOutcome::Built(metadata))
    }

    /// Whether `path` still matches the checksum recorded for `gavtc`
    ///
    /// False when nothing is recorded.
    pub async fn verify_artifact(
        &self,
        id: &BuildRequestId,
        gavtc: &Gavtc,
        path: &Path,
    ) -> SrcdepsResult<bool> {
        match self.store.retrieve_sha1(id, gavtc)? {
            Some(expected) => Ok(checksum_artifact(path).await? == expected),
            None => Ok(false),
        }
    }
}

/// Hash an artifact on the blocking pool
async fn checksum_artifact(path: &Path) -> SrcdepsResult<String> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || checksum_file(&owned))
        .await
        .map_err(|e| {
            SrcdepsError::io(
                format!("checksum task for {}", path.display()),
                std::io::Error::other(e),
            )
        })?
}
