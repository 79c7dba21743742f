use predicates::prelude::*;

use crate::common::{TestProject, without_timestamp};

/// The two-primitive project compiles to exactly one chatmode and one instruction section
#[test]
fn test_compile_writes_agents_md() {
    let project = TestProject::with_default_primitives().unwrap();

    let output = project.run_awd(&["compile"]).unwrap();
    output.assert_success().assert_stdout_contains("✓ Compiled AGENTS.md (2 sections");

    let document = project.read_file("AGENTS.md").unwrap();
    assert!(document.starts_with("# AGENTS.md\n"));
    assert!(document.contains("## Development Approach\n\n*Default engineering persona*\n\nYou are a helpful engineer."));
    assert!(document.contains("## Development Guidelines\n\n### Files matching `**/*.py`\n\nUse type hints."));
    assert!(document.contains("<!-- Content checksum: sha256:"));
    assert!(document.ends_with("*To regenerate: `awd compile`*\n"));
}

/// Compiling twice without changes produces the same document apart from the timestamp
#[test]
fn test_compile_is_reproducible() {
    let project = TestProject::with_default_primitives().unwrap();
    project.write_file("src/app.py", "print('hello')\n").unwrap();

    project.run_awd(&["compile"]).unwrap().assert_success();
    let first = project.read_file("AGENTS.md").unwrap();
    project.run_awd(&["compile"]).unwrap().assert_success();
    let second = project.read_file("AGENTS.md").unwrap();

    assert_eq!(without_timestamp(&first), without_timestamp(&second));
}

/// Dry run prints the document and leaves the file system alone
#[test]
fn test_dry_run_prints_document() {
    let project = TestProject::with_default_primitives().unwrap();

    project
        .awd()
        .args(["compile", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# AGENTS.md"))
        .stdout(predicate::str::contains("Use type hints."));

    assert!(!project.exists("AGENTS.md"));
}

/// An unknown chatmode fails before anything is written
#[test]
fn test_unknown_chatmode_fails_without_writing() {
    let project = TestProject::with_default_primitives().unwrap();

    let output = project.run_awd(&["compile", "--chatmode", "ghost"]).unwrap();
    output
        .assert_failure()
        .assert_stderr_contains("Chatmode 'ghost' not found")
        .assert_stderr_contains("Available chatmodes: default");

    assert!(!project.exists("AGENTS.md"));
}

/// A near-miss chatmode name gets a suggestion
#[test]
fn test_chatmode_typo_suggests_name() {
    let project = TestProject::with_default_primitives().unwrap();

    project
        .awd()
        .args(["compile", "--chatmode", "defualt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Did you mean 'default'?"));
}

/// Invalid files are reported and skipped; the rest still compiles
#[test]
fn test_invalid_file_is_skipped() {
    let project = TestProject::with_default_primitives().unwrap();
    project
        .write_file(".awd/instructions/broken.instructions.md", "---\ndescription: no scope\n---\n\nBroken rule\n")
        .unwrap();

    let output = project.run_awd(&["compile"]).unwrap();
    output
        .assert_success()
        .assert_stderr_contains("Skipped .awd/instructions/broken.instructions.md: missing required field 'applyTo'");

    let document = project.read_file("AGENTS.md").unwrap();
    assert!(document.contains("Use type hints."));
    assert!(!document.contains("Broken rule"));
}

/// `--validate` reports problems, writes nothing and exits 1
#[test]
fn test_validate_flag_fails_on_invalid_files() {
    let project = TestProject::with_default_primitives().unwrap();
    project.write_file(".awd/bad.chatmode.md", "No frontmatter\n").unwrap();

    let output = project.run_awd(&["compile", "--validate"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("✗ .awd/bad.chatmode.md: missing required field 'description'")
        .assert_stderr_contains("Validation failed: 1 invalid primitive file(s)");

    assert!(!project.exists("AGENTS.md"));
}

/// Linked context files are inlined unless `--no-links` is given
#[test]
fn test_links_are_inlined_by_default() {
    let project = TestProject::with_default_primitives().unwrap();
    project.write_file(".awd/context/arch.context.md", "---\ndescription: arch\n---\n\nHexagonal layers.\n").unwrap();
    project.add_instruction("rust", "**/*.rs", "See [Architecture](../context/arch.context.md).").unwrap();

    project.run_awd(&["compile"]).unwrap().assert_success();
    let linked = project.read_file("AGENTS.md").unwrap();
    assert!(linked.contains("#### Architecture\n\nHexagonal layers."));

    project.run_awd(&["compile", "--no-links"]).unwrap().assert_success();
    let unlinked = project.read_file("AGENTS.md").unwrap();
    assert!(unlinked.contains("See [Architecture](../context/arch.context.md)."));
    assert!(!unlinked.contains("Hexagonal layers."));
}

/// Broken links are kept as written and reported
#[test]
fn test_broken_link_is_warning() {
    let project = TestProject::with_default_primitives().unwrap();
    project.add_instruction("rust", "**/*.rs", "See [Missing](../context/missing.md).").unwrap();

    let output = project.run_awd(&["compile"]).unwrap();
    output.assert_success().assert_stderr_contains("missing.md");

    assert!(project.read_file("AGENTS.md").unwrap().contains("See [Missing](../context/missing.md)."));
}

/// `--skip-unmatched` drops groups whose pattern matches nothing
#[test]
fn test_skip_unmatched_patterns() {
    let project = TestProject::with_default_primitives().unwrap();
    project.add_instruction("rust", "**/*.rs", "Prefer iterators.").unwrap();
    project.write_file("src/main.rs", "fn main() {}\n").unwrap();

    project.run_awd(&["compile", "--skip-unmatched"]).unwrap().assert_success();

    let document = project.read_file("AGENTS.md").unwrap();
    assert!(document.contains("Prefer iterators."));
    assert!(!document.contains("Use type hints."));
}

/// `--output` and `--root` work from outside the project
#[test]
fn test_custom_output_and_root() {
    let project = TestProject::with_default_primitives().unwrap();
    let root = project.path().to_str().unwrap().to_string();

    project
        .awd()
        .current_dir(std::env::temp_dir())
        .args(["compile", "--root", &root, "--output", "docs/AGENTS.md"])
        .assert()
        .success();

    assert!(project.exists("docs/AGENTS.md"));
    assert!(!project.exists("AGENTS.md"));
}

/// `awd.toml` supplies defaults that flags override
#[test]
fn test_config_file_defaults() {
    let project = TestProject::with_default_primitives().unwrap();
    project.add_chatmode("reviewer", "Strict reviewer", "Review everything twice.").unwrap();
    project.write_file("awd.toml", "[compile]\noutput = \"GUIDE.md\"\nchatmode = \"reviewer\"\n").unwrap();

    project.run_awd(&["compile"]).unwrap().assert_success();
    assert!(project.read_file("GUIDE.md").unwrap().contains("Review everything twice."));

    project.run_awd(&["compile", "--chatmode", "default"]).unwrap().assert_success();
    let document = project.read_file("GUIDE.md").unwrap();
    assert!(document.contains("You are a helpful engineer."));
    assert!(!document.contains("Review everything twice."));
}

/// A malformed configuration file is fatal
#[test]
fn test_malformed_config_fails() {
    let project = TestProject::with_default_primitives().unwrap();
    project.write_file("awd.toml", "[compile]\nunknown_key = true\n").unwrap();

    project
        .awd()
        .arg("compile")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"));

    assert!(!project.exists("AGENTS.md"));
}

/// JSON report carries stats and diagnostics
#[test]
fn test_json_report() {
    let project = TestProject::with_default_primitives().unwrap();

    let output = project.run_awd(&["compile", "--format", "json"]).unwrap();
    output.assert_success();

    let report: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(report["output"], "AGENTS.md");
    assert_eq!(report["written"], true);
    assert_eq!(report["stats"]["sections"], 2);
    assert_eq!(report["stats"]["chatmodes"], 1);
    assert_eq!(report["stats"]["instructions"], 1);
    assert!(report.get("content").is_none());
}

/// An empty project still produces a header-and-footer document
#[test]
fn test_empty_project_compiles() {
    let project = TestProject::new().unwrap();

    project.run_awd(&["compile"]).unwrap().assert_success();

    let document = project.read_file("AGENTS.md").unwrap();
    assert!(!document.contains("## Development"));
    assert!(document.contains("*This file was generated by AWD CLI. Do not edit manually.*"));
}

/// A missing root is a clear error
#[test]
fn test_missing_root_fails() {
    let project = TestProject::new().unwrap();
    let missing = project.path().join("nope");

    project
        .awd()
        .args(["compile", "--root", missing.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot read project root"));
}
