//! Build tool abstraction
//!
//! A [`Builder`] knows how to rewrite the versions of a checked out project
//! and how to build it. Both steps run as external processes through
//! [`crate::shell::execute`].

pub mod maven;

pub use maven::MavenBuilder;

use crate::error::SrcdepsResult;
use crate::request::BuildRequest;
use async_trait::async_trait;
use std::path::Path;

/// A build tool able to build source trees of one kind
#[async_trait]
pub trait Builder: Send + Sync {
    /// Human-readable tool name for logs
    fn name(&self) -> &'static str;

    /// Whether this tool recognizes the project at `project_root`
    fn can_build(&self, project_root: &Path) -> bool;

    /// Rewrite every module version of the project to the request's version
    async fn set_versions(&self, request: &BuildRequest) -> SrcdepsResult<()>;

    /// Build the project and install its artifacts
    async fn build(&self, request: &BuildRequest) -> SrcdepsResult<()>;
}
