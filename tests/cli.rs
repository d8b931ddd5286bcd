use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn dcemirror() -> Command {
    Command::cargo_bin("dcemirror").unwrap()
}

#[test]
fn no_arguments_shows_help() {
    dcemirror()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn version_flag() {
    dcemirror()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn generate_config_writes_sample_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("dcemirror.toml");

    dcemirror()
        .arg("--generate-config")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated sample configuration"));

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[download]"));
}

#[test]
fn empty_input_directory_reports_no_input_files() {
    let dir = TempDir::new().unwrap();

    dcemirror()
        .arg("--input-dir")
        .arg(dir.path())
        .arg("--yes")
        .arg("--output-format")
        .arg("plain")
        .assert()
        .code(6)
        .stderr(predicate::str::contains("No input files matched"));
}

#[test]
fn dry_run_lists_links_without_output_folder() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("export.txt");
    fs::write(&input, "https://cdn.discordapp.com/a/b.png\n").unwrap();

    dcemirror()
        .arg("--input-file")
        .arg(&input)
        .arg("--dry-run")
        .arg("--yes")
        .arg("--output-format")
        .arg("plain")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 distinct CDN link(s)"));

    assert!(!dir.path().join("output-export.txt").exists());
}

#[test]
fn linkless_export_converts_without_network() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("export.txt");
    fs::write(&input, "just text, nothing to download\n").unwrap();

    dcemirror()
        .arg("--input-file")
        .arg(&input)
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--yes")
        .arg("--output-format")
        .arg("plain")
        .assert()
        .success();

    let root = dir.path().join("output-export.txt");
    assert!(root.join("attachments").is_dir());
    assert!(root.join("attachment_mapping_file.json").exists());
    assert_eq!(
        fs::read_to_string(root.join("export.offline.txt")).unwrap(),
        "just text, nothing to download\n"
    );
    assert!(!root.join("downloads_folder.lock").exists());
}

#[test]
fn locked_folder_is_skipped_without_force_unlock() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("export.txt");
    fs::write(&input, "no links\n").unwrap();

    let root = dir.path().join("output-export.txt");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("downloads_folder.lock"), "").unwrap();

    dcemirror()
        .arg("--input-file")
        .arg(&input)
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--yes")
        .arg("--output-format")
        .arg("plain")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("in use"));

    assert!(!root.join("export.offline.txt").exists());
}

#[test]
fn batch_continues_past_a_locked_folder() {
    let dir = TempDir::new().unwrap();
    let exports = dir.path().join("exports");
    fs::create_dir(&exports).unwrap();
    fs::write(exports.join("a.txt"), "no links\n").unwrap();
    fs::write(exports.join("b.txt"), "still no links\n").unwrap();

    let locked_root = dir.path().join("output-a.txt");
    fs::create_dir_all(&locked_root).unwrap();
    fs::write(locked_root.join("downloads_folder.lock"), "").unwrap();

    dcemirror()
        .arg("--input-dir")
        .arg(&exports)
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--yes")
        .arg("--output-format")
        .arg("plain")
        .assert()
        .code(2);

    // The locked file was skipped, the rest of the batch still ran.
    assert!(!locked_root.join("a.offline.txt").exists());
    assert!(dir
        .path()
        .join("output-b.txt")
        .join("b.offline.txt")
        .exists());
}

#[test]
fn force_unlock_recovers_a_stale_lock() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("export.txt");
    fs::write(&input, "no links\n").unwrap();

    let root = dir.path().join("output-export.txt");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("downloads_folder.lock"), "").unwrap();

    dcemirror()
        .arg("--input-file")
        .arg(&input)
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--force-unlock")
        .arg("--yes")
        .arg("--output-format")
        .arg("plain")
        .assert()
        .success();

    assert!(root.join("export.offline.txt").exists());
    assert!(!root.join("downloads_folder.lock").exists());
}

#[test]
fn quiet_conflicts_with_verbose() {
    dcemirror()
        .arg("--input-file")
        .arg("export.txt")
        .arg("--quiet")
        .arg("-v")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
