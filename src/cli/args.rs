//! CLI argument definitions using clap derive

use crate::request::{Redirect, Verbosity};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// srcdeps - build source dependencies from version control
///
/// Fingerprints build requests and remembers which commit each one was
/// built from, so unchanged sources are never rebuilt.
#[derive(Parser, Debug)]
#[command(name = "srcdeps")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SRCDEPS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a source dependency version
    Parse(ParseArgs),

    /// Print the fingerprint of a build request
    Id(RequestArgs),

    /// Build an already checked out source tree unless it is up to date
    Build(BuildArgs),

    /// Inspect the build metadata cache
    Cache(CacheArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the parse command
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Version string, e.g. 1.0-SRC-revision-66ea95d
    #[arg(value_name = "VERSION")]
    pub raw: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Fields of a build request
///
/// Unset options fall back to the `[build]` and `[maven]` configuration.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Project root directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Source dependency version to build
    #[arg(long, value_name = "VERSION")]
    pub src_version: String,

    /// SCM URL, tried in the order given
    #[arg(short, long = "url", value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// Extra build argument (repeatable)
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Build environment variable (KEY=VALUE)
    #[arg(short, long, value_parser = parse_env_var)]
    pub env: Vec<(String, String)>,

    /// Host property name or `prefix*` pattern to forward
    #[arg(long = "forward-property", value_name = "PATTERN")]
    pub forward_properties: Vec<String>,

    /// Artifact selector included in the fingerprint
    #[arg(long = "select", value_name = "PATTERN")]
    pub selectors: Vec<String>,

    /// Run tests during the build
    #[arg(long)]
    pub run_tests: bool,

    /// Do not prepend the build tool's default arguments
    #[arg(long)]
    pub no_default_args: bool,

    /// Start the build from an empty environment
    #[arg(long)]
    pub clean_env: bool,

    /// Build tool verbosity
    #[arg(long, value_parser = parse_verbosity)]
    pub verbosity: Option<Verbosity>,

    /// Build timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// stdin redirect (inherit, discard, read:<path>)
    #[arg(long, value_parser = parse_redirect)]
    pub stdin: Option<Redirect>,

    /// stdout redirect (inherit, discard, write:<path>, append:<path>)
    #[arg(long, value_parser = parse_redirect)]
    pub stdout: Option<Redirect>,

    /// stderr redirect, or `out` to follow stdout
    #[arg(long, value_parser = parse_stderr)]
    pub stderr: Option<StderrTarget>,
}

/// Where stderr of the build goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StderrTarget {
    /// Wherever stdout goes
    Stdout,
    Redirect(Redirect),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Commit the project root is checked out at
    #[arg(long)]
    pub commit_id: String,

    /// Produced artifact to checksum (GROUP:ARTIFACT:VERSION:TYPE[:CLASSIFIER]=PATH)
    #[arg(long = "artifact", value_name = "GAVTC=PATH", value_parser = parse_artifact)]
    pub artifacts: Vec<(String, PathBuf)>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print the commit a request was last built from
    Lookup(RequestArgs),

    /// Print the directory holding a request's metadata
    Path(RequestArgs),
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

/// Output format for the parse command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one field per line)
    Plain,
}

/// Parse environment variable in KEY=VALUE format
fn parse_env_var(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE format: no '=' found in '{s}'"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Parse an artifact in GAVTC=PATH format
fn parse_artifact(s: &str) -> Result<(String, PathBuf), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid GAVTC=PATH format: no '=' found in '{s}'"))?;
    Ok((s[..pos].to_string(), PathBuf::from(&s[pos + 1..])))
}

fn parse_verbosity(s: &str) -> Result<Verbosity, String> {
    s.parse().map_err(|e: crate::error::SrcdepsError| e.to_string())
}

fn parse_redirect(s: &str) -> Result<Redirect, String> {
    s.parse().map_err(|e: crate::error::SrcdepsError| e.to_string())
}

fn parse_stderr(s: &str) -> Result<StderrTarget, String> {
    if s == "out" {
        Ok(StderrTarget::Stdout)
    } else {
        parse_redirect(s).map(StderrTarget::Redirect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_var_valid() {
        let (k, v) = parse_env_var("FOO=bar").unwrap();
        assert_eq!(k, "FOO");
        assert_eq!(v, "bar");
    }

    #[test]
    fn parse_env_var_with_equals() {
        let (k, v) = parse_env_var("FOO=bar=baz").unwrap();
        assert_eq!(k, "FOO");
        assert_eq!(v, "bar=baz");
    }

    #[test]
    fn parse_env_var_invalid() {
        assert!(parse_env_var("FOO").is_err());
    }

    #[test]
    fn parse_artifact_splits_at_first_equals() {
        let (gavtc, path) = parse_artifact("org.example:lib:1.0:jar=target/lib.jar").unwrap();
        assert_eq!(gavtc, "org.example:lib:1.0:jar");
        assert_eq!(path, PathBuf::from("target/lib.jar"));
        assert!(parse_artifact("org.example:lib:1.0:jar").is_err());
    }

    #[test]
    fn parse_stderr_accepts_out() {
        assert_eq!(parse_stderr("out").unwrap(), StderrTarget::Stdout);
        assert_eq!(
            parse_stderr("discard").unwrap(),
            StderrTarget::Redirect(Redirect::Discard)
        );
        assert!(parse_stderr("bogus:x").is_err());
    }

    #[test]
    fn cli_parses_parse() {
        let cli = Cli::parse_from(["srcdeps", "parse", "1.0-SRC-tag-v1", "--format", "json"]);
        match cli.command {
            Commands::Parse(args) => {
                assert_eq!(args.raw, "1.0-SRC-tag-v1");
                assert!(matches!(args.format, OutputFormat::Json));
            }
            _ => panic!("expected Parse command"),
        }
    }

    #[test]
    fn cli_parses_request_args() {
        let cli = Cli::parse_from([
            "srcdeps",
            "id",
            "--src-version",
            "1.0-SRC-branch-main",
            "--url",
            "git:a",
            "--url",
            "git:b",
            "--arg",
            "-Pfast",
            "--env",
            "JAVA_HOME=/opt/jdk",
            "--run-tests",
            "--verbosity",
            "DEBUG",
            "--stderr",
            "out",
        ]);
        match cli.command {
            Commands::Id(args) => {
                assert_eq!(args.urls, ["git:a", "git:b"]);
                assert_eq!(args.args, ["-Pfast"]);
                assert_eq!(args.env, [("JAVA_HOME".to_string(), "/opt/jdk".to_string())]);
                assert!(args.run_tests);
                assert!(!args.clean_env);
                assert_eq!(args.verbosity, Some(Verbosity::Debug));
                assert_eq!(args.stderr, Some(StderrTarget::Stdout));
            }
            _ => panic!("expected Id command"),
        }
    }

    #[test]
    fn cli_requires_url() {
        let result = Cli::try_parse_from(["srcdeps", "id", "--src-version", "1.0-SRC-tag-v1"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_build() {
        let cli = Cli::parse_from([
            "srcdeps",
            "build",
            "--src-version",
            "1.0-SRC-tag-v1",
            "--url",
            "git:a",
            "--commit-id",
            "abc",
            "--artifact",
            "g:a:1:jar=a.jar",
        ]);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.commit_id, "abc");
                assert_eq!(args.artifacts.len(), 1);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn cli_parses_cache_lookup() {
        let cli = Cli::parse_from([
            "srcdeps", "cache", "lookup", "--src-version", "1-SRC-tag-1", "--url", "u",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Cache(CacheArgs {
                action: CacheAction::Lookup(_)
            })
        ));
    }

    #[test]
    fn cli_parses_verbose_count() {
        let cli = Cli::parse_from(["srcdeps", "-vv", "config", "path"]);
        assert_eq!(cli.verbose, 2);
    }
}
