//! Maven build tool
//!
//! Prefers the project's Maven wrapper over a `mvn` found on `PATH`.

use super::Builder;
use crate::error::SrcdepsResult;
use crate::request::{BuildRequest, Verbosity};
use crate::shell::{self, ShellCommand};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_ARGS: &[&str] = &["clean", "install"];
const SKIP_TESTS_ARG: &str = "-DskipTests";
const VERSIONS_PLUGIN: &str = "org.codehaus.mojo:versions-maven-plugin";

#[cfg(windows)]
const WRAPPER: &str = "mvnw.cmd";
#[cfg(not(windows))]
const WRAPPER: &str = "mvnw";

const POM_FILE_NAMES: &[&str] = &[
    "pom.xml",
    "pom.atom",
    "pom.clj",
    "pom.groovy",
    "pom.rb",
    "pom.scala",
    "pom.yml",
];

/// Builds Maven projects with `mvn` or the project's `mvnw`
#[derive(Debug, Clone, Default)]
pub struct MavenBuilder {
    /// Properties of the host build, candidates for forwarding
    host_properties: BTreeMap<String, String>,
}

impl MavenBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose forward patterns select from `host_properties`
    pub fn with_host_properties(host_properties: BTreeMap<String, String>) -> Self {
        Self { host_properties }
    }

    /// Whether `directory` contains any recognized POM file
    pub fn has_pom_file(directory: &Path) -> bool {
        POM_FILE_NAMES.iter().any(|name| directory.join(name).exists())
    }

    /// The Maven wrapper in `project_root` if there is one, else `mvn`
    pub fn locate_executable(project_root: &Path) -> String {
        let wrapper = project_root.join(WRAPPER);
        if wrapper.is_file() {
            wrapper.to_string_lossy().into_owned()
        } else {
            "mvn".to_string()
        }
    }

    fn verbosity_arguments(verbosity: Verbosity) -> &'static [&'static str] {
        match verbosity {
            Verbosity::Trace | Verbosity::Debug => &["--debug"],
            Verbosity::Info => &[],
            Verbosity::Warn | Verbosity::Error => &["--quiet"],
        }
    }

    /// `-Dname=value` for every host property picked by a forward pattern
    ///
    /// A pattern ending in `*` matches by prefix, any other pattern must
    /// equal the property name.
    fn forwarded_properties(&self, request: &BuildRequest) -> Vec<String> {
        let patterns = request.forward_properties();
        self.host_properties
            .iter()
            .filter(|(name, _)| {
                patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
                    Some(prefix) => name.starts_with(prefix),
                    None => pattern == *name,
                })
            })
            .map(|(name, value)| format!("-D{}={}", name, value))
            .collect()
    }

    /// Full argument list of the build invocation
    pub fn build_arguments(&self, request: &BuildRequest) -> Vec<String> {
        let mut args = Vec::new();
        if request.add_default_build_arguments() {
            args.extend(DEFAULT_ARGS.iter().map(|a| a.to_string()));
            if let Some(settings) = request.tool_settings() {
                args.push("-s".to_string());
                args.push(settings.to_string_lossy().into_owned());
            }
        }
        args.extend(request.build_arguments().iter().cloned());
        args.extend(
            Self::verbosity_arguments(request.verbosity())
                .iter()
                .map(|a| a.to_string()),
        );
        if request.skip_tests() {
            args.push(SKIP_TESTS_ARG.to_string());
        }
        args.extend(self.forwarded_properties(request));
        args
    }

    /// Argument list of the versions rewrite invocation
    pub fn set_versions_arguments(request: &BuildRequest) -> Vec<String> {
        let mut args = vec![
            format!("{}:{}:set", VERSIONS_PLUGIN, request.versions_maven_plugin_version()),
            format!("-DnewVersion={}", request.src_version()),
            "-DartifactId=*".to_string(),
            "-DgroupId=*".to_string(),
            "-DoldVersion=*".to_string(),
            "-DgenerateBackupPoms=false".to_string(),
        ];
        args.extend(
            Self::verbosity_arguments(request.verbosity())
                .iter()
                .map(|a| a.to_string()),
        );
        args
    }

    fn command(request: &BuildRequest, args: Vec<String>) -> ShellCommand {
        ShellCommand::builder(Self::locate_executable(request.project_root()))
            .arguments(args)
            .working_directory(request.project_root())
            .environment(request.build_environment())
            .inherit_environment(request.add_default_build_environment())
            .io_redirects(request.io_redirects().clone())
            .timeout(request.timeout())
            .build()
    }
}

#[async_trait]
impl Builder for MavenBuilder {
    fn name(&self) -> &'static str {
        "maven"
    }

    fn can_build(&self, project_root: &Path) -> bool {
        Self::has_pom_file(project_root)
    }

    async fn set_versions(&self, request: &BuildRequest) -> SrcdepsResult<()> {
        info!(
            "Setting versions of {} to {}",
            request.project_root().display(),
            request.src_version()
        );
        let command = Self::command(request, Self::set_versions_arguments(request));
        shell::execute(&command).await?;
        Ok(())
    }

    async fn build(&self, request: &BuildRequest) -> SrcdepsResult<()> {
        info!("Building {}", request.project_root().display());
        let command = Self::command(request, self.build_arguments(request));
        let output = shell::execute(&command).await?;
        debug!("Maven build took {} ms", output.duration.as_millis());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::IoRedirects;
    use crate::version::SrcVersion;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn request_in(dir: &Path) -> crate::request::BuildRequestBuilder {
        BuildRequest::builder()
            .project_root(dir)
            .src_version(SrcVersion::parse_required("1.0-SRC-revision-abc").unwrap())
            .scm_url("git:https://example.com/repo.git")
    }

    #[test]
    fn default_arguments() {
        let request = request_in(Path::new("/tmp")).build().unwrap();
        assert_eq!(
            MavenBuilder::new().build_arguments(&request),
            ["clean", "install", "-DskipTests"]
        );
    }

    #[test]
    fn settings_follow_default_arguments() {
        let request = request_in(Path::new("/tmp"))
            .tool_settings(Some(PathBuf::from("/home/me/.m2/settings.xml")))
            .build_argument("-Pfast")
            .build()
            .unwrap();
        assert_eq!(
            MavenBuilder::new().build_arguments(&request),
            [
                "clean",
                "install",
                "-s",
                "/home/me/.m2/settings.xml",
                "-Pfast",
                "-DskipTests"
            ]
        );
    }

    #[test]
    fn no_defaults_with_tests_and_verbosity() {
        let request = request_in(Path::new("/tmp"))
            .add_default_build_arguments(false)
            .tool_settings(Some(PathBuf::from("settings.xml")))
            .skip_tests(false)
            .build_argument("verify")
            .verbosity(Verbosity::Debug)
            .build()
            .unwrap();
        assert_eq!(
            MavenBuilder::new().build_arguments(&request),
            ["verify", "--debug"]
        );
    }

    #[test]
    fn quiet_for_warn_and_error() {
        for verbosity in [Verbosity::Warn, Verbosity::Error] {
            let request = request_in(Path::new("/tmp"))
                .verbosity(verbosity)
                .build()
                .unwrap();
            assert!(MavenBuilder::new()
                .build_arguments(&request)
                .contains(&"--quiet".to_string()));
        }
    }

    #[test]
    fn forwards_exact_and_prefixed_properties() {
        let mut host = BTreeMap::new();
        host.insert("maven.repo.local".to_string(), "/repo".to_string());
        host.insert("srcdeps.mvn.settings".to_string(), "s.xml".to_string());
        host.insert("srcdeps.mvn.failfast".to_string(), "true".to_string());
        host.insert("user.home".to_string(), "/home/me".to_string());
        let builder = MavenBuilder::with_host_properties(host);

        let request = request_in(Path::new("/tmp"))
            .add_default_build_arguments(false)
            .skip_tests(false)
            .forward_properties(["srcdeps.mvn.*", "maven.repo.local"])
            .build()
            .unwrap();
        assert_eq!(
            builder.build_arguments(&request),
            [
                "-Dmaven.repo.local=/repo",
                "-Dsrcdeps.mvn.failfast=true",
                "-Dsrcdeps.mvn.settings=s.xml"
            ]
        );
    }

    #[test]
    fn set_versions_arguments_use_plugin_version() {
        let request = request_in(Path::new("/tmp"))
            .versions_maven_plugin_version("2.7")
            .verbosity(Verbosity::Warn)
            .build()
            .unwrap();
        assert_eq!(
            MavenBuilder::set_versions_arguments(&request),
            [
                "org.codehaus.mojo:versions-maven-plugin:2.7:set",
                "-DnewVersion=1.0-SRC-revision-abc",
                "-DartifactId=*",
                "-DgroupId=*",
                "-DoldVersion=*",
                "-DgenerateBackupPoms=false",
                "--quiet"
            ]
        );
    }

    #[test]
    fn recognizes_pom_files() {
        let dir = TempDir::new().unwrap();
        assert!(!MavenBuilder::new().can_build(dir.path()));
        std::fs::write(dir.path().join("pom.yml"), "").unwrap();
        assert!(MavenBuilder::new().can_build(dir.path()));
    }

    #[test]
    fn falls_back_to_mvn_without_wrapper() {
        let dir = TempDir::new().unwrap();
        assert_eq!(MavenBuilder::locate_executable(dir.path()), "mvn");
    }

    #[cfg(unix)]
    fn write_wrapper(dir: &Path, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("mvnw");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_wrapper_with_arguments() {
        let dir = TempDir::new().unwrap();
        write_wrapper(dir.path(), "#!/bin/sh\necho \"$@\" >> invocations.log\n");
        assert!(MavenBuilder::locate_executable(dir.path()).ends_with("mvnw"));

        let request = request_in(dir.path())
            .io_redirects(IoRedirects::discard_all())
            .build()
            .unwrap();
        let builder = MavenBuilder::new();
        builder.set_versions(&request).await.unwrap();
        builder.build(&request).await.unwrap();

        let log = std::fs::read_to_string(dir.path().join("invocations.log")).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("org.codehaus.mojo:versions-maven-plugin:2.5:set"));
        assert_eq!(lines[1], "clean install -DskipTests");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_wrapper_fails_build() {
        let dir = TempDir::new().unwrap();
        write_wrapper(dir.path(), "#!/bin/sh\nexit 1\n");

        let request = request_in(dir.path())
            .io_redirects(IoRedirects::discard_all())
            .build()
            .unwrap();
        let err = MavenBuilder::new().build(&request).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::SrcdepsError::ProcessExit { code: Some(1), .. }
        ));
    }
}
