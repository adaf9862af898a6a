//! Parse command - show how a version string is interpreted

use crate::cli::args::{OutputFormat, ParseArgs};
use crate::error::SrcdepsResult;
use crate::version::SrcVersion;
use console::style;
use serde_json::json;

/// Execute the parse command
pub async fn execute(args: ParseArgs) -> SrcdepsResult<()> {
    let parsed = SrcVersion::parse(&args.raw)?;

    match args.format {
        OutputFormat::Table => print_table(&args.raw, parsed.as_ref()),
        OutputFormat::Json => print_json(&args.raw, parsed.as_ref())?,
        OutputFormat::Plain => print_plain(parsed.as_ref()),
    }

    Ok(())
}

fn kind_name(version: &SrcVersion) -> String {
    version
        .kind()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "custom".to_string())
}

fn print_table(raw: &str, parsed: Option<&SrcVersion>) {
    let Some(version) = parsed else {
        println!("{} is not a source dependency version", style(raw).bold());
        return;
    };

    let mutability = if version.is_immutable() {
        style("immutable").green()
    } else {
        style("mutable").yellow()
    };
    println!("{:<12} {}", style("VERSION").bold(), version);
    println!("{:<12} {}", style("TYPE").bold(), version.version_type());
    println!("{:<12} {}", style("VALUE").bold(), version.version_value());
    println!("{:<12} {}", style("KIND").bold(), kind_name(version));
    println!("{:<12} {}", style("CACHING").bold(), mutability);
}

fn print_json(raw: &str, parsed: Option<&SrcVersion>) -> SrcdepsResult<()> {
    let value = match parsed {
        Some(version) => json!({
            "raw": version.raw(),
            "src_version": true,
            "version_type": version.version_type(),
            "version_value": version.version_value(),
            "kind": version.kind().map(|k| k.to_string()),
            "immutable": version.is_immutable(),
        }),
        None => json!({
            "raw": raw,
            "src_version": false,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_plain(parsed: Option<&SrcVersion>) {
    if let Some(version) = parsed {
        println!("{}", version.version_type());
        println!("{}", version.version_value());
        println!("{}", version.is_immutable());
    }
}
