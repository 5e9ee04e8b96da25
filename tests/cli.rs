use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_sprite_config(tmp: &tempfile::TempDir) -> std::path::PathBuf {
    let config_path = tmp.path().join("config.yml");
    let contents = format!(
        "store:\n  icon_dir: {}\n  output_dir: {}\nbundle:\n  mode: sprite\n  public_base_url: http://cdn.example/uploads\n",
        tmp.path().join("icons").display(),
        tmp.path().join("out").display(),
    );
    fs::write(&config_path, contents).unwrap();
    config_path
}

#[test]
fn rebuild_subcommand_reports_success() {
    let tmp = tempdir().unwrap();
    let config_path = write_sprite_config(&tmp);

    Command::cargo_bin("icon-bundler")
        .unwrap()
        .args(["rebuild", "--config"])
        .arg(&config_path)
        .args(["--bundle-id", "smoke"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Regeneration starting..."))
        .stdout(predicate::str::contains("Regeneration complete."));

    assert!(tmp.path().join("out/sprites/smoke.svg").is_file());
    assert!(tmp.path().join("out/sprites/smoke.js").is_file());
    assert!(tmp.path().join("out/sprites/smoke.d.ts").is_file());
}

#[test]
fn add_subcommand_stores_the_icon_and_emits_json() {
    let tmp = tempdir().unwrap();
    let config_path = write_sprite_config(&tmp);
    let source = tmp.path().join("arrow.svg");
    fs::write(&source, "<svg viewBox=\"0 0 8 8\"><path d=\"M0 0h8\"/></svg>").unwrap();

    Command::cargo_bin("icon-bundler")
        .unwrap()
        .args(["add", "--config"])
        .arg(&config_path)
        .arg(&source)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Successfully uploaded 1 icon and regenerated sprite.",
        ))
        .stdout(predicate::str::contains("\"mode\": \"sprite\""))
        .stdout(predicate::str::contains(
            "http://cdn.example/uploads/sprites/",
        ));

    assert!(tmp.path().join("icons/arrow.svg").is_file());
    // The staged copy was consumed, the caller's file stays put.
    assert!(source.is_file());
}

#[test]
fn remove_of_a_missing_icon_fails_in_font_mode() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("config.yml");
    let contents = format!(
        "store:\n  icon_dir: {}\n  output_dir: {}\nbundle:\n  mode: font\nfont:\n  compiler: /usr/bin/false\n",
        tmp.path().join("icons").display(),
        tmp.path().join("out").display(),
    );
    fs::write(&config_path, contents).unwrap();

    Command::cargo_bin("icon-bundler")
        .unwrap()
        .args(["remove", "--config"])
        .arg(&config_path)
        .arg("ghost.svg")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Regeneration failed"))
        .stderr(predicate::str::contains("not found"));
}
