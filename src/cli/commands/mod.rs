//! CLI command implementations

pub mod build;
pub mod cache;
pub mod config;
pub mod id;
pub mod parse;

pub use build::execute as build;
pub use cache::execute as cache;
pub use config::execute as config;
pub use id::execute as id;
pub use parse::execute as parse;

use crate::cli::args::{RequestArgs, StderrTarget};
use crate::config::Config;
use crate::error::{SrcdepsError, SrcdepsResult};
use crate::gav::GavSet;
use crate::request::{BuildRequest, IoRedirects};
use crate::version::SrcVersion;
use std::time::Duration;

/// Combine command line request fields with configured defaults
pub(crate) fn resolve_request(
    args: &RequestArgs,
    config: &Config,
) -> SrcdepsResult<(BuildRequest, GavSet)> {
    let project_root = match &args.project {
        Some(path) => path.clone(),
        None => std::env::current_dir()
            .map_err(|e| SrcdepsError::io("getting current directory", e))?,
    };

    let (stderr, err2out) = match &args.stderr {
        Some(StderrTarget::Stdout) => (Default::default(), true),
        Some(StderrTarget::Redirect(redirect)) => (redirect.clone(), false),
        None => (Default::default(), false),
    };
    let io_redirects = IoRedirects {
        stdin: args.stdin.clone().unwrap_or_default(),
        stdout: args.stdout.clone().unwrap_or_default(),
        stderr,
        err2out,
    };

    let build = &config.build;
    let request = BuildRequest::builder()
        .project_root(project_root)
        .src_version(SrcVersion::parse_required(&args.src_version)?)
        .scm_urls(args.urls.iter().cloned())
        .build_arguments(args.args.iter().cloned())
        .build_environment(args.env.iter().cloned())
        .forward_properties(build.forward_properties.iter().cloned())
        .forward_properties(args.forward_properties.iter().cloned())
        .skip_tests(build.skip_tests && !args.run_tests)
        .add_default_build_arguments(build.add_default_build_arguments && !args.no_default_args)
        .add_default_build_environment(build.add_default_build_environment && !args.clean_env)
        .verbosity(args.verbosity.unwrap_or(build.verbosity))
        .timeout(args.timeout_secs.or(build.timeout_secs).map(Duration::from_secs))
        .io_redirects(io_redirects)
        .versions_maven_plugin_version(config.maven.versions_maven_plugin_version.clone())
        .tool_settings(config.maven.settings.clone())
        .build()?;

    let selectors = GavSet::builder()
        .includes(args.selectors.iter().cloned())
        .build();

    Ok((request, selectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Cli, Commands};
    use crate::request::{Redirect, Verbosity};
    use clap::Parser;

    fn request_args(extra: &[&str]) -> RequestArgs {
        let mut argv = vec![
            "srcdeps",
            "id",
            "--project",
            "/tmp/project",
            "--src-version",
            "1.0-SRC-revision-abc",
            "--url",
            "git:a",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Id(args) => args,
            _ => panic!("expected Id command"),
        }
    }

    #[test]
    fn config_defaults_apply() {
        let mut config = Config::default();
        config.build.verbosity = Verbosity::Warn;
        config.build.timeout_secs = Some(60);
        config.maven.versions_maven_plugin_version = "2.7".to_string();

        let (request, selectors) = resolve_request(&request_args(&[]), &config).unwrap();
        assert_eq!(request.verbosity(), Verbosity::Warn);
        assert_eq!(request.timeout(), Some(Duration::from_secs(60)));
        assert_eq!(request.versions_maven_plugin_version(), "2.7");
        assert!(request.skip_tests());
        assert_eq!(selectors, GavSet::default());
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        config.build.forward_properties.insert("maven.*".to_string());

        let args = request_args(&[
            "--run-tests",
            "--no-default-args",
            "--clean-env",
            "--timeout-secs",
            "5",
            "--forward-property",
            "user.name",
            "--select",
            "org.example",
            "--stdout",
            "write:/tmp/build.log",
            "--stderr",
            "out",
        ]);
        let (request, selectors) = resolve_request(&args, &config).unwrap();

        assert!(!request.skip_tests());
        assert!(!request.add_default_build_arguments());
        assert!(!request.add_default_build_environment());
        assert_eq!(request.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(request.forward_properties().len(), 2);
        assert!(selectors.includes().contains("org.example"));
        assert_eq!(
            request.io_redirects().stdout,
            Redirect::Write("/tmp/build.log".into())
        );
        assert!(request.io_redirects().err2out);
    }

    #[test]
    fn invalid_version_is_parse_error() {
        let mut args = request_args(&[]);
        args.src_version = "1.0".to_string();
        let err = resolve_request(&args, &Config::default()).unwrap_err();
        assert!(matches!(err, SrcdepsError::Parse { .. }));
    }
}
