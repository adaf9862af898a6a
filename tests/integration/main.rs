//! Integration tests for srcdeps

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn srcdeps() -> Command {
        cargo_bin_cmd!("srcdeps")
    }

    /// Config file whose cache lives inside `dir`
    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("config.toml");
        let cache = dir.join("cache");
        std::fs::write(
            &path,
            format!("[cache]\nroot = {:?}\n", cache.to_string_lossy()),
        )
        .unwrap();
        path
    }

    #[test]
    fn help_displays() {
        srcdeps()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build source dependencies"));
    }

    #[test]
    fn version_displays() {
        srcdeps()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("srcdeps"));
    }

    #[test]
    fn parse_table() {
        srcdeps()
            .args(["parse", "1.0-SRC-revision-66ea95d"])
            .assert()
            .success()
            .stdout(predicate::str::contains("66ea95d"))
            .stdout(predicate::str::contains("immutable"));
    }

    #[test]
    fn parse_json() {
        srcdeps()
            .args(["parse", "1.0-SRC-branch-main", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"version_type\": \"branch\""))
            .stdout(predicate::str::contains("\"immutable\": false"));
    }

    #[test]
    fn parse_plain_version() {
        srcdeps()
            .args(["parse", "1.0.0", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"src_version\": false"));
    }

    #[test]
    fn parse_missing_delimiter_fails() {
        srcdeps()
            .args(["parse", "1.0-SRC-revision"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("1.0-SRC-revision"));
    }

    #[test]
    fn id_is_stable_hex() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        let args = [
            "id",
            "--project",
            ".",
            "--src-version",
            "1.0-SRC-revision-abc",
            "--url",
            "git:https://example.com/repo.git",
        ];

        let first = srcdeps().arg("--config").arg(&config).args(args).output().unwrap();
        let second = srcdeps().arg("--config").arg(&config).args(args).output().unwrap();
        assert!(first.status.success());

        let hash = String::from_utf8(first.stdout.clone()).unwrap();
        let hash = hash.trim();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first.stdout, second.stdout);
    }

    #[test]
    fn id_depends_on_arguments() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        let base = [
            "id",
            "--src-version",
            "1.0-SRC-revision-abc",
            "--url",
            "git:a",
        ];

        let plain = srcdeps().arg("--config").arg(&config).args(base).output().unwrap();
        let with_tests = srcdeps()
            .arg("--config")
            .arg(&config)
            .args(base)
            .arg("--run-tests")
            .output()
            .unwrap();
        assert_ne!(plain.stdout, with_tests.stdout);
    }

    #[test]
    fn id_requires_url() {
        srcdeps()
            .args(["id", "--src-version", "1.0-SRC-tag-v1"])
            .assert()
            .failure();
    }

    #[test]
    fn cache_path_is_under_root() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        srcdeps()
            .arg("--config")
            .arg(&config)
            .args(["cache", "path", "--src-version", "1-SRC-tag-1", "--url", "u"])
            .assert()
            .success()
            .stdout(predicate::str::contains(temp.path().join("cache").to_string_lossy().into_owned()));
    }

    #[test]
    fn cache_lookup_reports_missing() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        srcdeps()
            .arg("--config")
            .arg(&config)
            .args(["cache", "lookup", "--src-version", "1-SRC-tag-1", "--url", "u"])
            .assert()
            .success()
            .stderr(predicate::str::contains("has not been built"));
    }

    #[test]
    fn config_path() {
        srcdeps()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        srcdeps()
            .arg("--config")
            .arg(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[build]"))
            .stdout(predicate::str::contains("versions_maven_plugin_version"));
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        std::fs::write(&config, "[build]\nverbosity = \"loud\"\n").unwrap();
        srcdeps()
            .arg("--config")
            .arg(&config)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[cfg(unix)]
    #[test]
    fn build_then_up_to_date() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        let project = temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("pom.xml"), "<project/>").unwrap();
        let wrapper = project.join("mvnw");
        std::fs::write(
            &wrapper,
            "#!/bin/sh\necho \"$@\" >> invocations.log\nprintf jar > lib.jar\n",
        )
        .unwrap();
        std::fs::set_permissions(&wrapper, std::fs::Permissions::from_mode(0o755)).unwrap();

        let args = [
            "build",
            "--src-version",
            "1.0-SRC-revision-abc",
            "--url",
            "git:https://example.com/repo.git",
            "--commit-id",
            "abc",
            "--artifact",
            "org.example:lib:1.0-SRC-revision-abc:jar=lib.jar",
            "--stdout",
            "discard",
        ];

        srcdeps()
            .arg("--config")
            .arg(&config)
            .args(args)
            .arg("--project")
            .arg(&project)
            .assert()
            .success()
            .stdout(predicate::str::contains("Built:"))
            .stdout(predicate::str::contains("org.example:lib:1.0-SRC-revision-abc:jar"));

        srcdeps()
            .arg("--config")
            .arg(&config)
            .args(args)
            .arg("--project")
            .arg(&project)
            .assert()
            .success()
            .stdout(predicate::str::contains("Up to date:"));

        let log = std::fs::read_to_string(project.join("invocations.log")).unwrap();
        assert_eq!(log.lines().count(), 2, "second run must not invoke maven");

        srcdeps()
            .arg("--config")
            .arg(&config)
            .args(["cache", "lookup", "--src-version", "1.0-SRC-revision-abc"])
            .args(["--url", "git:https://example.com/repo.git"])
            .arg("--project")
            .arg(&project)
            .assert()
            .success()
            .stdout(predicate::str::diff("abc\n"));
    }
}
