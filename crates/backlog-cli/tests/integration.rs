use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn backlog(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("backlog").unwrap();
    cmd.current_dir(dir.path()).env("BACKLOG_ROOT", dir.path());
    cmd
}

fn write_story(dir: &TempDir, filename: &str, content: &str) {
    let source = dir.path().join("stories/yaml-source");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join(filename), content).unwrap();
}

/// A story that passes all six INVEST criteria.
fn good_story(id: &str, epic: &str) -> String {
    format!(
        "\
id: {id}
title: Story {id}
persona: Shopper
story:
  as_a: shopper
  i_want: to track my order
  so_that: I know when to be home for the delivery
acceptance_criteria:
  - given: a shipped order
    when: the tracking page is opened
    then: the current location is shown
metadata:
  priority: high
  story_points: 3
  status: backlog
  epic: {epic}
dependencies:
  blocks: []
  blocked_by: []
"
    )
}

/// A bare story: no criteria, no estimate, no benefit. Scores 50.
fn bare_story(id: &str) -> String {
    format!(
        "\
id: {id}
title: Story {id}
metadata:
  priority: low
  status: backlog
"
    )
}

fn story_with_blockers(id: &str, blocked_by: &[&str]) -> String {
    let deps = blocked_by
        .iter()
        .map(|b| format!("    - {b}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "\
id: {id}
title: Story {id}
story:
  as_a: user
  i_want: something after its prerequisites
  so_that: the work lands in a sensible delivery order
acceptance_criteria:
  - given: a precondition
    when: an action happens
    then: an outcome holds
metadata:
  priority: medium
  story_points: 2
  status: backlog
dependencies:
  blocked_by:
{deps}
"
    )
}

// ---------------------------------------------------------------------------
// backlog validate
// ---------------------------------------------------------------------------

#[test]
fn validate_passing_story_exits_zero() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));

    backlog(&dir)
        .args(["validate", "--story-id", "US-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("score: 100/100"))
        .stdout(predicate::str::contains("PASS"));
}

#[test]
fn validate_failing_story_exits_one_with_issues() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &bare_story("US-0001"));

    backlog(&dir)
        .args(["validate", "--story-id", "US-0001"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("score: 50/100"))
        .stdout(predicate::str::contains("acceptance_criteria is empty"))
        .stdout(predicate::str::contains("story_points is not set"))
        .stdout(predicate::str::contains("FAIL"));
}

#[test]
fn validate_unknown_story_exits_two() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));

    backlog(&dir)
        .args(["validate", "--story-id", "US-9999"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("story not found"));
}

#[test]
fn validate_strict_requires_all_criteria() {
    let dir = TempDir::new().unwrap();
    // blocked_by fails Independent: 5/6 criteria, score 83
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    write_story(
        &dir,
        "US-0002.yaml",
        &story_with_blockers("US-0002", &["US-0001"]),
    );

    backlog(&dir)
        .args(["validate", "--story-id", "US-0002"])
        .assert()
        .success();

    backlog(&dir)
        .args(["validate", "--story-id", "US-0002", "--strict"])
        .assert()
        .code(1);
}

#[test]
fn validate_save_writes_validation_into_yaml() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &bare_story("US-0001"));

    backlog(&dir)
        .args(["validate", "--story-id", "US-0001", "--save"])
        .assert()
        .code(1);

    let content =
        std::fs::read_to_string(dir.path().join("stories/yaml-source/US-0001.yaml")).unwrap();
    assert!(content.contains("validation:"));
    assert!(content.contains("score: 50"));
    assert!(content.contains("testable: false"));
}

#[test]
fn validate_json_output_is_parseable() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));

    let output = backlog(&dir)
        .args(["validate", "--story-id", "US-0001", "--output", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["passed"], true);
    assert_eq!(value["validation"]["score"], 100);
}

#[test]
fn validate_batch_reports_pass_rate_and_frequency() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    write_story(&dir, "US-0002.yaml", &bare_story("US-0002"));
    write_story(&dir, "US-0003.yaml", &bare_story("US-0003"));

    backlog(&dir)
        .arg("validate")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("3 stories, 1 passed"))
        .stdout(predicate::str::contains("Most common issues:"))
        .stdout(predicate::str::contains("Failing stories:"));
}

#[test]
fn validate_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &bare_story("US-0001"));

    let first = backlog(&dir)
        .args(["validate", "--story-id", "US-0001"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let second = backlog(&dir)
        .args(["validate", "--story-id", "US-0001"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    assert_eq!(first, second);
}

#[test]
fn malformed_story_skipped_with_warning() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    write_story(&dir, "broken.yaml", "id: [unclosed");

    backlog(&dir)
        .args(["validate", "--story-id", "US-0001"])
        .assert()
        .success();
}

#[test]
fn malformed_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    std::fs::write(
        dir.path().join("stories/config.yaml"),
        "rubric:\n  pass_threshold: 150\n",
    )
    .unwrap();

    backlog(&dir)
        .args(["validate", "--story-id", "US-0001"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("pass_threshold"));
}

// ---------------------------------------------------------------------------
// backlog check-dependencies
// ---------------------------------------------------------------------------

#[test]
fn check_dependencies_clean_graph_exits_zero() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    write_story(
        &dir,
        "US-0002.yaml",
        &story_with_blockers("US-0002", &["US-0001"]),
    );

    backlog(&dir)
        .arg("check-dependencies")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cycles: none"))
        .stdout(predicate::str::contains("Ready to start: US-0001"));
}

#[test]
fn check_dependencies_cycle_exits_one() {
    let dir = TempDir::new().unwrap();
    write_story(
        &dir,
        "US-0001.yaml",
        &story_with_blockers("US-0001", &["US-0002"]),
    );
    write_story(
        &dir,
        "US-0002.yaml",
        &story_with_blockers("US-0002", &["US-0001"]),
    );

    backlog(&dir)
        .arg("check-dependencies")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("US-0001 -> US-0002"));
}

#[test]
fn check_dependencies_self_cycle_reported() {
    let dir = TempDir::new().unwrap();
    write_story(
        &dir,
        "US-0001.yaml",
        &story_with_blockers("US-0001", &["US-0001"]),
    );

    backlog(&dir)
        .arg("check-dependencies")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Cycles:\n  US-0001"));
}

#[test]
fn check_dependencies_dangling_exits_one() {
    let dir = TempDir::new().unwrap();
    write_story(
        &dir,
        "US-0001.yaml",
        &story_with_blockers("US-0001", &["US-0404"]),
    );

    backlog(&dir)
        .arg("check-dependencies")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("US-0001 -> US-0404 (missing)"));
}

#[test]
fn check_dependencies_writes_diagram() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    let diagram = dir.path().join("deps.mmd");

    backlog(&dir)
        .args([
            "check-dependencies",
            "--output-diagram",
            diagram.to_str().unwrap(),
        ])
        .assert()
        .success();

    let content = std::fs::read_to_string(&diagram).unwrap();
    assert!(content.starts_with("flowchart TD"));
    assert!(content.contains("US-0001"));
}

#[test]
fn check_dependencies_story_focus() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    write_story(
        &dir,
        "US-0002.yaml",
        &story_with_blockers("US-0002", &["US-0001"]),
    );

    backlog(&dir)
        .args(["check-dependencies", "--story-id", "US-0002"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ready to start: no"))
        .stdout(predicate::str::contains("blocked by: US-0001"));
}

#[test]
fn check_dependencies_unknown_story_exits_two() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));

    backlog(&dir)
        .args(["check-dependencies", "--story-id", "US-9999"])
        .assert()
        .code(2);
}

#[test]
fn check_dependencies_done_blocker_makes_ready() {
    let dir = TempDir::new().unwrap();
    let done = good_story("US-0001", "checkout").replace("status: backlog", "status: done");
    write_story(&dir, "US-0001.yaml", &done);
    write_story(
        &dir,
        "US-0002.yaml",
        &story_with_blockers("US-0002", &["US-0001"]),
    );

    backlog(&dir)
        .args(["check-dependencies", "--story-id", "US-0002"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ready to start: yes"));
}

// ---------------------------------------------------------------------------
// backlog story-map
// ---------------------------------------------------------------------------

#[test]
fn story_map_markdown_to_stdout() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    write_story(&dir, "US-0002.yaml", &bare_story("US-0002"));

    backlog(&dir)
        .args(["story-map"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Story Map"))
        .stdout(predicate::str::contains("## Epic: checkout"))
        .stdout(predicate::str::contains("## Unassigned"));
}

#[test]
fn story_map_is_deterministic() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0002.yaml", &good_story("US-0002", "checkout"));
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));

    let first = backlog(&dir)
        .args(["story-map"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let second = backlog(&dir)
        .args(["story-map"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(first, second);
}

#[test]
fn story_map_mermaid_format() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    write_story(
        &dir,
        "US-0002.yaml",
        &story_with_blockers("US-0002", &["US-0001"]),
    );

    backlog(&dir)
        .args(["story-map", "--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flowchart TD"))
        .stdout(predicate::str::contains("US-0001 --> US-0002"));
}

#[test]
fn story_map_epic_filter_and_output_file() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    write_story(&dir, "US-0002.yaml", &good_story("US-0002", "billing"));
    let out = dir.path().join("map.md");

    backlog(&dir)
        .args([
            "story-map",
            "--epic",
            "checkout",
            "--output",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.contains("Epic: checkout"));
    assert!(!content.contains("Epic: billing"));
}

// ---------------------------------------------------------------------------
// backlog generate
// ---------------------------------------------------------------------------

#[test]
fn generate_mirrors_source_filenames() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));
    write_story(&dir, "US-0002.yaml", &bare_story("US-0002"));

    backlog(&dir)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 documents written"));

    let doc = dir.path().join("stories/generated-docs/US-0001.md");
    let content = std::fs::read_to_string(&doc).unwrap();
    assert!(content.starts_with("# US-0001: Story US-0001"));
    assert!(dir.path().join("stories/generated-docs/US-0002.md").exists());
}

#[test]
fn generate_skips_existing_without_force() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &good_story("US-0001", "checkout"));

    backlog(&dir).arg("generate").assert().success();
    let doc = dir.path().join("stories/generated-docs/US-0001.md");
    std::fs::write(&doc, "hand-edited").unwrap();

    backlog(&dir)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 documents written, 1 skipped"));
    assert_eq!(std::fs::read_to_string(&doc).unwrap(), "hand-edited");

    backlog(&dir).args(["generate", "--force"]).assert().success();
    assert!(std::fs::read_to_string(&doc).unwrap().starts_with("# US-0001"));
}

// ---------------------------------------------------------------------------
// backlog list / next-id
// ---------------------------------------------------------------------------

#[test]
fn list_filters_by_status() {
    let dir = TempDir::new().unwrap();
    let done = good_story("US-0001", "checkout").replace("status: backlog", "status: done");
    write_story(&dir, "US-0001.yaml", &done);
    write_story(&dir, "US-0002.yaml", &bare_story("US-0002"));

    backlog(&dir)
        .args(["list", "--status", "done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("US-0001"))
        .stdout(predicate::str::contains("US-0002").not());
}

#[test]
fn list_rejects_unknown_status() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &bare_story("US-0001"));

    backlog(&dir)
        .args(["list", "--status", "doing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid --status"));
}

#[test]
fn next_id_counts_past_the_max() {
    let dir = TempDir::new().unwrap();
    write_story(&dir, "US-0001.yaml", &bare_story("US-0001"));
    write_story(&dir, "US-0007.yaml", &bare_story("US-0007"));

    backlog(&dir)
        .arg("next-id")
        .assert()
        .success()
        .stdout(predicate::str::diff("US-0008\n"));
}
