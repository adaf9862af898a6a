//! Id command - print the fingerprint of a build request

use crate::cli::args::RequestArgs;
use crate::cli::commands::resolve_request;
use crate::config::Config;
use crate::error::SrcdepsResult;
use crate::request::BuildRequestId;
use tracing::debug;

/// Execute the id command
pub async fn execute(args: RequestArgs, config: &Config) -> SrcdepsResult<()> {
    let (request, selectors) = resolve_request(&args, config)?;
    let id = BuildRequestId::new(&request, &selectors);
    debug!("{} -> {}", request, id);
    println!("{}", id);
    Ok(())
}
