//! Cache command - inspect the build metadata store

use crate::cli::args::{CacheAction, CacheArgs};
use crate::cli::commands::resolve_request;
use crate::config::Config;
use crate::error::SrcdepsResult;
use crate::request::BuildRequestId;
use crate::store::{FsMetadataStore, MetadataStore};
use console::style;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> SrcdepsResult<()> {
    let store = FsMetadataStore::new(config.cache.resolved_root())?;

    match args.action {
        CacheAction::Lookup(request_args) => {
            let (request, selectors) = resolve_request(&request_args, config)?;
            let id = BuildRequestId::new(&request, &selectors);
            match store.retrieve_commit_id(&id)? {
                Some(commit_id) => println!("{}", commit_id),
                None => eprintln!(
                    "{} {} has not been built",
                    style("Not cached:").yellow(),
                    request.src_version()
                ),
            }
        }
        CacheAction::Path(request_args) => {
            let (request, selectors) = resolve_request(&request_args, config)?;
            let id = BuildRequestId::new(&request, &selectors);
            println!("{}", store.build_request_id_path(&id).display());
        }
    }

    Ok(())
}
