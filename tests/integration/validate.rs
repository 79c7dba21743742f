use predicates::prelude::*;

use crate::common::TestProject;

/// Every valid file gets a check mark and the command succeeds
#[test]
fn test_validate_valid_project() {
    let project = TestProject::with_default_primitives().unwrap();

    let output = project.run_awd(&["validate"]).unwrap();
    output
        .assert_success()
        .assert_stdout_contains("✓ .awd/chatmodes/default.chatmode.md (chatmode 'default')")
        .assert_stdout_contains("✓ .awd/instructions/a.instructions.md (instruction 'a')")
        .assert_stdout_contains("2 files checked: 2 valid, 0 invalid");

    assert!(!project.exists("AGENTS.md"), "validate must never write output");
}

/// Invalid files are listed with their reason and the command exits 1
#[test]
fn test_validate_reports_invalid_files() {
    let project = TestProject::with_default_primitives().unwrap();
    project.write_file(".awd/instructions/broken.instructions.md", "---\ndescription: x\n---\n\nBody\n").unwrap();
    project.write_file(".github/empty.context.md", "---\ndescription: nothing here\n---\n").unwrap();

    let output = project.run_awd(&["validate"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("✗ .awd/instructions/broken.instructions.md: missing required field 'applyTo'")
        .assert_stdout_contains("✗ .github/empty.context.md: missing required field 'body'")
        .assert_stdout_contains("4 files checked: 2 valid, 2 invalid")
        .assert_stderr_contains("Validation failed: 2 invalid primitive file(s)");
}

/// An invalid glob is reported against the applyTo field
#[test]
fn test_validate_rejects_invalid_glob() {
    let project = TestProject::new().unwrap();
    project.add_instruction("bad", "src/{a,b", "Rules").unwrap();

    project
        .awd()
        .arg("validate")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("✗ .awd/instructions/bad.instructions.md"))
        .stdout(predicate::str::contains("applyTo"));
}

/// JSON output is machine-readable
#[test]
fn test_validate_json() {
    let project = TestProject::with_default_primitives().unwrap();

    let output = project.run_awd(&["validate", "--format", "json"]).unwrap();
    output.assert_success();

    let report: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["total"], 2);
    assert_eq!(report["files"][0]["path"], ".awd/chatmodes/default.chatmode.md");
    assert_eq!(report["files"][0]["kind"], "chatmode");
}

/// An empty project is valid
#[test]
fn test_validate_empty_project() {
    let project = TestProject::new().unwrap();

    project
        .awd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("No primitive files found"));
}
