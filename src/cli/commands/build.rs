//! Build command - build a checked out tree unless it is up to date

use crate::builder::{Builder, MavenBuilder};
use crate::cli::args::BuildArgs;
use crate::cli::commands::resolve_request;
use crate::config::Config;
use crate::error::SrcdepsResult;
use crate::gav::Gavtc;
use crate::scm::ExistingCheckout;
use crate::service::{ArtifactFile, BuildOutcome, BuildService};
use crate::store::FsMetadataStore;
use console::style;
use std::sync::Arc;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> SrcdepsResult<()> {
    let (request, selectors) = resolve_request(&args.request, config)?;

    let artifacts = args
        .artifacts
        .iter()
        .map(|(gavtc, path)| {
            let gavtc: Gavtc = gavtc.parse()?;
            let path = if path.is_relative() {
                request.project_root().join(path)
            } else {
                path.clone()
            };
            Ok(ArtifactFile::new(gavtc, path))
        })
        .collect::<SrcdepsResult<Vec<_>>>()?;

    let root = config.cache.resolved_root();
    debug!("Using build metadata store at {}", root.display());
    let store = Arc::new(FsMetadataStore::new(root)?);
    let builders: Vec<Box<dyn Builder>> = vec![Box::new(MavenBuilder::with_host_properties(
        config.properties.clone(),
    ))];
    let service = BuildService::new(store, Arc::new(ExistingCheckout::new(args.commit_id)), builders);

    match service.build(&request, &selectors, &artifacts).await? {
        BuildOutcome::UpToDate { id, commit_id } => {
            println!(
                "{} {} at {} ({})",
                style("Up to date:").green().bold(),
                request.src_version(),
                commit_id,
                id
            );
        }
        BuildOutcome::Built(metadata) => {
            println!(
                "{} {} at {} ({})",
                style("Built:").green().bold(),
                request.src_version(),
                metadata.commit_id(),
                metadata.build_request_id()
            );
            for (gavtc, checksum) in metadata.checksums() {
                println!("  {} {}", gavtc, style(checksum).dim());
            }
        }
    }

    Ok(())
}
