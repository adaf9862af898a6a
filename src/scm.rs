//! Source control checkout seam
//!
//! Fetching sources is owned by the caller; the build service only needs
//! to know which commit ended up in the project root.

use crate::error::{SrcdepsError, SrcdepsResult};
use crate::request::BuildRequest;
use async_trait::async_trait;
use tracing::debug;

/// Outcome of a successful checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutResult {
    pub commit_id: String,
}

/// Brings the request's project root to the requested version
///
/// Implementations try `request.scm_urls()` in order and fail with
/// [`SrcdepsError::Checkout`] once every URL has failed.
#[async_trait]
pub trait Checkout: Send + Sync {
    async fn checkout(&self, request: &BuildRequest) -> SrcdepsResult<CheckoutResult>;
}

/// A tree the caller has already checked out at the project root
#[derive(Debug, Clone)]
pub struct ExistingCheckout {
    commit_id: String,
}

impl ExistingCheckout {
    pub fn new(commit_id: impl Into<String>) -> Self {
        Self {
            commit_id: commit_id.into(),
        }
    }
}

#[async_trait]
impl Checkout for ExistingCheckout {
    async fn checkout(&self, request: &BuildRequest) -> SrcdepsResult<CheckoutResult> {
        let root = request.project_root();
        let exists = tokio::fs::try_exists(root)
            .await
            .map_err(|e| SrcdepsError::io(format!("checking checkout {}", root.display()), e))?;
        if !exists {
            return Err(SrcdepsError::Checkout {
                reason: format!("{} does not exist", root.display()),
            });
        }
        if self.commit_id.trim().is_empty() {
            return Err(SrcdepsError::Checkout {
                reason: "no commit id given for existing checkout".to_string(),
            });
        }
        debug!("Using existing checkout {} at {}", root.display(), self.commit_id);
        Ok(CheckoutResult {
            commit_id: self.commit_id.clone(),
        })
    }
}
