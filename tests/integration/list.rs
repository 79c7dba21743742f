use predicates::prelude::*;

use crate::common::TestProject;

/// Primitives are grouped by kind, workflows included
#[test]
fn test_list_groups_by_kind() {
    let project = TestProject::with_default_primitives().unwrap();
    project.write_file(".awd/prompts/release.prompt.md", "# Cut a release\n\nTag and publish.\n").unwrap();

    let output = project.run_awd(&["list"]).unwrap();
    output
        .assert_success()
        .assert_stdout_contains("Chatmodes (1):")
        .assert_stdout_contains("default - Default engineering persona")
        .assert_stdout_contains("Instructions (1):")
        .assert_stdout_contains("a [**/*.py] - a rules")
        .assert_stdout_contains("Workflows (1):")
        .assert_stdout_contains("release - Cut a release");

    let chatmodes = output.stdout.find("Chatmodes").unwrap();
    let workflows = output.stdout.find("Workflows").unwrap();
    assert!(chatmodes < workflows);
}

/// `--kind` restricts the listing
#[test]
fn test_list_kind_filter() {
    let project = TestProject::with_default_primitives().unwrap();

    project
        .awd()
        .args(["list", "--kind", "instructions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Instructions (1):"))
        .stdout(predicate::str::contains("Chatmodes").not());
}

/// An unknown kind is an error
#[test]
fn test_list_unknown_kind() {
    let project = TestProject::new().unwrap();

    project
        .awd()
        .args(["list", "--kind", "agent"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown primitive kind: agent"));
}

/// Invalid files are shown after the valid ones
#[test]
fn test_list_shows_invalid_files() {
    let project = TestProject::with_default_primitives().unwrap();
    project.write_file(".awd/bad.chatmode.md", "No frontmatter\n").unwrap();

    project
        .run_awd(&["list"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("Invalid files (1):")
        .assert_stdout_contains("✗ .awd/bad.chatmode.md: missing required field 'description'");
}

/// JSON listing
#[test]
fn test_list_json() {
    let project = TestProject::with_default_primitives().unwrap();

    let output = project.run_awd(&["list", "--format", "json"]).unwrap();
    output.assert_success();

    let listing: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    let primitives = listing["primitives"].as_array().unwrap();
    assert_eq!(primitives.len(), 2);
    assert_eq!(primitives[0]["kind"], "chatmode");
    assert_eq!(primitives[1]["applyTo"], "**/*.py");
    assert_eq!(listing["errors"].as_array().unwrap().len(), 0);
}

/// Nothing to list
#[test]
fn test_list_empty_project() {
    let project = TestProject::new().unwrap();

    project
        .awd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No primitives found"));
}
