use assert_cmd::Command;
use predicates::prelude::*;

/// Helper to get a Command for the armguard binary.
#[allow(deprecated)]
fn armguard_cmd() -> Command {
    Command::cargo_bin("armguard").unwrap()
}

#[test]
fn help_works() {
    armguard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("explain"));
}

#[test]
fn explain_prints_decision_and_example() {
    armguard_cmd()
        .args(["explain", "VerifiableItemCount"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Example payload"))
        .stdout(predicate::str::contains("```json"));
}

#[test]
fn explain_unknown_kind_lists_known_kinds() {
    armguard_cmd()
        .args(["explain", "Arithmetic"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown match kind: Arithmetic"))
        .stderr(predicate::str::contains("  - StringMultiToken"));
}
