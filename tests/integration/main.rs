//! Integration tests for cmake2nix

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    const PLACEHOLDER: &str = "sha256-AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    const DISCOVERY_LOG: &str = r#"{"name": "widget", "version": "2.0", "gitRepository": "https://github.com/acme/widget", "gitTag": "v2.0"}
{"name": "repo", "version": "1.0", "gitRepository": "https://example.com/repo.git"}

{"broken":
"#;

    fn cmake2nix() -> Command {
        cargo_bin_cmd!("cmake2nix")
    }

    /// Command isolated from the user's global and local config
    fn in_project(dir: &Path) -> Command {
        let mut cmd = cmake2nix();
        cmd.current_dir(dir)
            .env_remove("CMAKE2NIX_CONFIG")
            .env("CI", "1")
            .arg("--no-local")
            .arg("--config")
            .arg(dir.join("no-global-config.toml"));
        cmd
    }

    fn write_log(dir: &Path) {
        std::fs::write(dir.join("discovery-log.json"), DISCOVERY_LOG).unwrap();
    }

    fn read_lock(dir: &Path) -> serde_json::Value {
        let text = std::fs::read_to_string(dir.join("cmake-lock.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn help_displays() {
        cmake2nix()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Lock CMake dependencies for Nix builds"));
    }

    #[test]
    fn version_displays() {
        cmake2nix()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cmake2nix"));
    }

    #[test]
    fn status_without_lock_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        in_project(temp.path())
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Lock file not found"))
            .stderr(predicate::str::contains("cmake2nix discover"));
    }

    #[test]
    fn prefetch_without_lock_fails() {
        let temp = TempDir::new().unwrap();
        in_project(temp.path())
            .arg("prefetch")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Lock file not found"));
    }

    #[test]
    fn discover_without_log_fails() {
        let temp = TempDir::new().unwrap();
        in_project(temp.path())
            .arg("discover")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Discovery log not found"));
        assert!(!temp.path().join("cmake-lock.json").exists());
    }

    #[test]
    fn discover_then_status() {
        let temp = TempDir::new().unwrap();
        write_log(temp.path());

        in_project(temp.path())
            .arg("discover")
            .assert()
            .success()
            .stdout(predicate::str::contains("Skipped line 4"));

        let lock = read_lock(temp.path());
        assert_eq!(lock["version"], "1.0");
        let widget = &lock["dependencies"]["widget"];
        assert_eq!(widget["method"], "fetchFromGitHub");
        assert_eq!(widget["args"]["owner"], "acme");
        assert_eq!(widget["args"]["repo"], "widget");
        assert_eq!(widget["args"]["rev"], "v2.0");
        assert_eq!(widget["args"]["hash"], PLACEHOLDER);
        let repo = &lock["dependencies"]["repo"];
        assert_eq!(repo["method"], "fetchgit");
        assert_eq!(repo["args"]["url"], "https://example.com/repo.git");
        assert_eq!(repo["args"]["sha256"], PLACEHOLDER);

        in_project(temp.path())
            .args(["status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("widget\t2.0\tplaceholder"))
            .stdout(predicate::str::contains("repo\t1.0\tplaceholder"));
    }

    #[test]
    fn status_json_lists_dependencies() {
        let temp = TempDir::new().unwrap();
        write_log(temp.path());
        in_project(temp.path()).arg("discover").assert().success();

        let output = in_project(temp.path())
            .args(["status", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 2);
        assert_eq!(rows[0]["name"], "repo");
        assert_eq!(rows[1]["source"], "github:acme/widget@v2.0");
    }

    #[test]
    fn lock_file_flag_overrides_location() {
        let temp = TempDir::new().unwrap();
        write_log(temp.path());

        in_project(temp.path())
            .args(["-l", "nix/deps.json", "discover"])
            .assert()
            .success();

        assert!(temp.path().join("nix/deps.json").exists());
        assert!(!temp.path().join("cmake-lock.json").exists());
    }

    #[test]
    fn corrupt_lock_is_reported() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("cmake-lock.json"), "{ not json").unwrap();

        in_project(temp.path())
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("corrupt"));
    }

    #[test]
    fn init_creates_local_config() {
        let temp = TempDir::new().unwrap();
        cmake2nix()
            .args(["init", "--path"])
            .arg(temp.path())
            .env("CI", "1")
            .assert()
            .success();
        assert!(temp.path().join("cmake2nix.toml").exists());

        cmake2nix()
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn config_show_and_path() {
        let temp = TempDir::new().unwrap();
        in_project(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[prefetch]"));

        in_project(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("no-global-config.toml"));
    }

    #[test]
    fn local_config_is_discovered_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("cmake2nix.toml"),
            "[lock]\npath = \"locks/cmake.json\"\n",
        )
        .unwrap();
        write_log(temp.path());
        let sub = temp.path().join("src");
        std::fs::create_dir(&sub).unwrap();

        cmake2nix()
            .current_dir(&sub)
            .env("CI", "1")
            .arg("--config")
            .arg(temp.path().join("no-global-config.toml"))
            .arg("discover")
            .arg("--log")
            .arg(temp.path().join("discovery-log.json"))
            .assert()
            .success();

        assert!(temp.path().join("locks/cmake.json").exists());
    }

    #[test]
    fn completions_generate() {
        cmake2nix()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cmake2nix"));
    }

    #[cfg(unix)]
    mod with_fake_tools {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn tool(dir: &Path, name: &str, body: &str) -> String {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.display().to_string()
        }

        fn write_config(dir: &Path, git_body: &str) -> std::path::PathBuf {
            let github = tool(
                dir,
                "fake-prefetch-github",
                r#"echo '{"owner": "'$1'", "repo": "'$2'", "hash": "sha256-R2l0SHViPQ=="}'"#,
            );
            let git = tool(dir, "fake-prefetch-git", git_body);
            let config = dir.join("config.toml");
            std::fs::write(
                &config,
                format!(
                    "[prefetch]\njobs = 2\ngithub_tool = \"{}\"\ngit_tool = \"{}\"\n",
                    github, git
                ),
            )
            .unwrap();
            config
        }

        fn with_config(dir: &Path, config: &Path) -> Command {
            let mut cmd = cmake2nix();
            cmd.current_dir(dir)
                .env("CI", "1")
                .arg("--no-local")
                .arg("--config")
                .arg(config);
            cmd
        }

        #[test]
        fn lock_fetches_every_hash() {
            let temp = TempDir::new().unwrap();
            write_log(temp.path());
            let config = write_config(
                temp.path(),
                r#"echo "Initialized empty Git repository" >&2
echo '{"url": "x", "sha256": "0ssi1wpaf7plaswqqjwigppsg5fyh99vdlb9kzl7c9lng89ndq1i"}'"#,
            );

            with_config(temp.path(), &config)
                .args(["lock", "--strict"])
                .assert()
                .success()
                .stdout(predicate::str::contains("2/2 hashes verified"));

            let lock = read_lock(temp.path());
            assert_eq!(
                lock["dependencies"]["widget"]["args"]["hash"],
                "sha256-R2l0SHViPQ=="
            );
            assert_eq!(
                lock["dependencies"]["repo"]["args"]["sha256"],
                "sha256-0ssi1wpaf7plaswqqjwigppsg5fyh99vdlb9kzl7c9lng89ndq1i"
            );

            // second run has nothing to do and leaves the file untouched
            let before = std::fs::read_to_string(temp.path().join("cmake-lock.json")).unwrap();
            with_config(temp.path(), &config)
                .arg("prefetch")
                .assert()
                .success()
                .stdout(predicate::str::contains("0 fetched, 2 already verified"));
            let after = std::fs::read_to_string(temp.path().join("cmake-lock.json")).unwrap();
            assert_eq!(before, after);
        }

        #[test]
        fn partial_failure_keeps_progress() {
            let temp = TempDir::new().unwrap();
            write_log(temp.path());
            let config = write_config(temp.path(), "echo 'fatal: repository not found' >&2\nexit 128");

            with_config(temp.path(), &config)
                .arg("discover")
                .assert()
                .success();

            // non-strict: failures are reported, exit is still zero
            with_config(temp.path(), &config)
                .arg("prefetch")
                .assert()
                .success()
                .stdout(predicate::str::contains("repo"))
                .stdout(predicate::str::contains("repository not found"))
                .stdout(predicate::str::contains("1/2 hashes verified"));

            let lock = read_lock(temp.path());
            assert_eq!(
                lock["dependencies"]["widget"]["args"]["hash"],
                "sha256-R2l0SHViPQ=="
            );
            assert_eq!(lock["dependencies"]["repo"]["args"]["sha256"], PLACEHOLDER);

            with_config(temp.path(), &config)
                .args(["prefetch", "--strict"])
                .assert()
                .failure()
                .stderr(predicate::str::contains("1/2 dependencies"));
        }
    }
}
