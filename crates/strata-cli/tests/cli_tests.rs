//! CLI integration tests
//!
//! Each test writes a small project into a temp directory and runs the
//! `strata` binary inside it.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// `strata` running in `dir`, isolated from the user's environment
fn strata_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("STRATA_PLATFORM")
        .env_remove("STRATA_CONFIGURATION")
        .env_remove("STRATA_TARGET_TYPE")
        .env_remove("STRATA_TOGGLES")
        .env_remove("STRATA_OUTPUT");
    cmd
}

fn sample_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write(
        root,
        "strata.toml",
        r#"
[project]
name = "Shooter"

[defaults]
platform = "Win64"
configuration = "Development"
target_type = "Game"

[[target]]
name = "ShooterServer"
type = "Server"
modules = ["Game"]
definitions = ["DEDICATED=1"]
"#,
    );
    write(
        root,
        "Core/Core.module.toml",
        "[module]\nname = \"Core\"\npublic_include_paths = [\"Public\"]\n",
    );
    write(
        root,
        "Engine/Engine.module.toml",
        r#"
[module]
name = "Engine"
public_dependencies = ["Core"]
public_include_paths = ["Public"]
private_include_paths = ["Private"]
"#,
    );
    write(
        root,
        "Game/Game.module.toml",
        r#"
[module]
name = "Game"
private_dependencies = ["Engine"]
dynamic_dependencies = ["Analytics"]

[[when]]
condition = "platform=Linux"
private_dependencies = ["LinuxAudio"]
"#,
    );
    write(
        root,
        "LinuxAudio/LinuxAudio.module.toml",
        "[module]\nname = \"LinuxAudio\"\navailable_when = \"platform=Linux\"\n",
    );

    temp_dir
}

mod help_messages {
    use super::*;

    #[test]
    fn test_main_help_shows_all_commands() {
        let temp_dir = TempDir::new().unwrap();
        strata_cmd(temp_dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("plan"))
            .stdout(predicate::str::contains("check"))
            .stdout(predicate::str::contains("explain"))
            .stdout(predicate::str::contains("targets"))
            .stdout(predicate::str::contains("completions"))
            .stdout(predicate::str::contains("STRATA_PLATFORM"));
    }

    #[test]
    fn test_plan_help_shows_axes() {
        let temp_dir = TempDir::new().unwrap();
        strata_cmd(temp_dir.path())
            .args(["plan", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--platform"))
            .stdout(predicate::str::contains("--configuration"))
            .stdout(predicate::str::contains("--toggle"))
            .stdout(predicate::str::contains("EXAMPLES"));
    }

    #[test]
    fn test_completions_bash() {
        let temp_dir = TempDir::new().unwrap();
        strata_cmd(temp_dir.path())
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("strata"));
    }
}

mod plan_command {
    use super::*;

    #[test]
    fn test_plan_default_context() {
        let project = sample_project();
        strata_cmd(project.path())
            .arg("plan")
            .assert()
            .success()
            .stdout(predicate::str::contains("Build plan for Win64/Game/Development"))
            .stdout(predicate::str::contains("1. Core"))
            .stdout(predicate::str::contains("2. Engine"))
            .stdout(predicate::str::contains("3. Game"))
            .stdout(predicate::str::contains("dynamic dependency 'Analytics' is not available"))
            .stdout(predicate::str::contains("Fingerprint:"));
    }

    #[test]
    fn test_plan_json_linux() {
        let project = sample_project();
        let output = strata_cmd(project.path())
            .args(["plan", "--json", "-p", "linux"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let names: Vec<&str> = plan["modules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Core", "Engine", "LinuxAudio", "Game"]);
        assert_eq!(plan["context"]["platform"], "Linux");
    }

    #[test]
    fn test_plan_output_env() {
        let project = sample_project();
        strata_cmd(project.path())
            .arg("plan")
            .env("STRATA_OUTPUT", "json")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("{"));
    }

    #[test]
    fn test_plan_target() {
        let project = sample_project();
        strata_cmd(project.path())
            .args(["plan", "--target", "shooterserver"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Win64/Server/Development"))
            .stdout(predicate::str::contains("(target ShooterServer)"));
    }

    #[test]
    fn test_plan_target_rejects_toggle() {
        let project = sample_project();
        strata_cmd(project.path())
            .args(["plan", "--target", "ShooterServer", "--toggle", "X"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be combined with --target"));
    }

    #[test]
    fn test_plan_unknown_target() {
        let project = sample_project();
        strata_cmd(project.path())
            .args(["plan", "--target", "Nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Target not found: Nope"));
    }

    #[test]
    fn test_plan_unauthorized_cycle() {
        let project = sample_project();
        write(
            project.path(),
            "A/A.module.toml",
            "[module]\nname = \"A\"\nprivate_dependencies = [\"B\"]\n",
        );
        write(
            project.path(),
            "B/B.module.toml",
            "[module]\nname = \"B\"\nprivate_dependencies = [\"A\"]\n",
        );

        strata_cmd(project.path())
            .arg("plan")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Circular dependency"))
            .stderr(predicate::str::contains("A, B"));
    }

    #[test]
    fn test_plan_authorized_cycle() {
        let project = sample_project();
        write(
            project.path(),
            "A/A.module.toml",
            "[module]\nname = \"A\"\nprivate_dependencies = [\"B\"]\ncircular_overrides = [\"B\"]\n",
        );
        write(
            project.path(),
            "B/B.module.toml",
            "[module]\nname = \"B\"\nprivate_dependencies = [\"A\"]\ncircular_overrides = [\"A\"]\n",
        );

        strata_cmd(project.path())
            .arg("plan")
            .assert()
            .success()
            .stdout(predicate::str::contains("[cycle: A, B]"));
    }

    #[test]
    fn test_invalid_platform_flag() {
        let project = sample_project();
        strata_cmd(project.path())
            .args(["plan", "-p", "Amiga"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown platform 'Amiga'"));
    }
}

mod check_command {
    use super::*;

    #[test]
    fn test_check_matrix() {
        let project = sample_project();
        strata_cmd(project.path())
            .args(["check", "-p", "Win64", "-p", "Linux", "-c", "Debug", "-c", "Shipping"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Linux/Game/Shipping"))
            .stdout(predicate::str::contains("All 4 contexts resolved"));
    }

    #[test]
    fn test_check_reports_failing_context() {
        let project = sample_project();
        write(
            project.path(),
            "Audio/Audio.module.toml",
            "[module]\nname = \"Audio\"\nprivate_dependencies = [\"LinuxAudio\"]\n",
        );

        strata_cmd(project.path())
            .args(["check", "-p", "Win64", "-p", "Linux"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("FAIL Win64/Game/Development"))
            .stdout(predicate::str::contains("LinuxAudio"))
            .stderr(predicate::str::contains("1 of 2 contexts failed"));
    }

    #[test]
    fn test_check_json() {
        let project = sample_project();
        let output = strata_cmd(project.path())
            .args(["check", "--json", "-c", "Debug", "-c", "Test"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let results = results.as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r["ok"] == true));
        assert!(results[0]["fingerprint"].as_str().unwrap().len() == 64);
    }
}

mod explain_command {
    use super::*;

    #[test]
    fn test_explain_groups_sources() {
        let project = sample_project();
        strata_cmd(project.path())
            .args(["explain", "engine"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Engine in Win64/Game/Development"))
            .stdout(predicate::str::contains("from own declaration"))
            .stdout(predicate::str::contains("-I Engine/Private"))
            .stdout(predicate::str::contains("from public dependency Core"))
            .stdout(predicate::str::contains("-I Core/Public"));
    }

    #[test]
    fn test_explain_json() {
        let project = sample_project();
        let output = strata_cmd(project.path())
            .args(["explain", "Game", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let explained: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(explained["module"], "Game");
        assert_eq!(explained["sources"][0]["from"], "private dependency Engine");
        assert_eq!(explained["include_paths"][0], "Engine/Public");
    }

    #[test]
    fn test_explain_unknown_module() {
        let project = sample_project();
        strata_cmd(project.path())
            .args(["explain", "Renderer"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Module not found: Renderer"));
    }

    #[test]
    fn test_explain_unavailable_module() {
        let project = sample_project();
        strata_cmd(project.path())
            .args(["explain", "LinuxAudio"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("is not available in Win64/Game/Development"));
    }
}

mod targets_command {
    use super::*;

    #[test]
    fn test_targets_listed() {
        let project = sample_project();
        strata_cmd(project.path())
            .arg("targets")
            .assert()
            .success()
            .stdout(predicate::str::contains("ShooterServer (Server)  modules: Game"))
            .stdout(predicate::str::contains("definitions: DEDICATED=1"));
    }

    #[test]
    fn test_no_targets() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "strata.toml", "[project]\nname = \"Empty\"\n");
        strata_cmd(temp_dir.path())
            .arg("targets")
            .assert()
            .success()
            .stdout(predicate::str::contains("No targets declared"));
    }
}
