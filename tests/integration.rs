use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const PLACEHOLDER: &str = "This file is too small to generate meaningful documentation.";

fn scribe_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_scribe"))
}

/// Temp dir with a config (summarizer disabled) and a small source tree.
/// Files under 30 characters are documented with the placeholder, so no
/// model is needed.
fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let repo_dir = root.join("repo");
    fs::create_dir_all(repo_dir.join("src")).unwrap();
    fs::create_dir_all(repo_dir.join("node_modules/dep")).unwrap();
    fs::write(repo_dir.join("src/a.py"), "x = 1\n").unwrap();
    fs::write(repo_dir.join("src/b.js"), "let y = 2;\n").unwrap();
    fs::write(repo_dir.join("README.md"), "# not source\n").unwrap();
    fs::write(repo_dir.join("node_modules/dep/index.js"), "module.exports = 1;\n").unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/scribe.sqlite"

[chunking]
chunk_size = 2000
overlap = 200

[summarizer]
provider = "disabled"

[server]
bind = "127.0.0.1:7341"
"#,
        root.display()
    );

    let config_path = config_dir.join("scribe.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path, repo_dir)
}

fn run_scribe(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = scribe_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run scribe binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// init + import demo + generate demo.
fn setup_generated() -> (TempDir, PathBuf, PathBuf) {
    let (tmp, config, repo_dir) = setup_test_env();
    let (_, stderr, ok) = run_scribe(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    let (_, stderr, ok) = run_scribe(&config, &["import", "demo", repo_dir.to_str().unwrap()]);
    assert!(ok, "import failed: {}", stderr);
    let (_, stderr, ok) = run_scribe(&config, &["generate", "demo"]);
    assert!(ok, "generate failed: {}", stderr);
    (tmp, config, repo_dir)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config, _) = setup_test_env();
    let (stdout, _, ok) = run_scribe(&config, &["init"]);
    assert!(ok);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/scribe.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config, _) = setup_test_env();
    assert!(run_scribe(&config, &["init"]).2);
    let (_, stderr, ok) = run_scribe(&config, &["init"]);
    assert!(ok, "second init failed: {}", stderr);
}

#[test]
fn test_import_records_source_files_only() {
    let (_tmp, config, repo_dir) = setup_test_env();
    run_scribe(&config, &["init"]);
    let (stdout, stderr, ok) = run_scribe(&config, &["import", "demo", repo_dir.to_str().unwrap()]);
    assert!(ok, "import failed: {}", stderr);
    assert!(stdout.contains("files:  2"), "unexpected output: {}", stdout);

    let (stdout, _, ok) = run_scribe(&config, &["repos"]);
    assert!(ok);
    assert!(stdout.contains("demo"));
}

#[test]
fn test_generate_documents_small_files_with_placeholder() {
    let (_tmp, config, _) = setup_generated();

    let (stdout, stderr, ok) = run_scribe(&config, &["get", "demo", "src/a.py"]);
    assert!(ok, "get failed: {}", stderr);
    assert!(stdout.contains("version:      1"));
    assert!(stdout.contains(PLACEHOLDER));
}

#[test]
fn test_generate_twice_bumps_version() {
    let (_tmp, config, _) = setup_generated();
    let (stdout, _, ok) = run_scribe(&config, &["generate", "demo"]);
    assert!(ok);
    assert!(stdout.contains("processed:  2"), "unexpected output: {}", stdout);

    let (stdout, _, _) = run_scribe(&config, &["get", "demo", "src/b.js"]);
    assert!(stdout.contains("version:      2"));
}

#[test]
fn test_generate_skips_file_when_summarizer_disabled() {
    let (_tmp, config, repo_dir) = setup_test_env();
    fs::write(
        repo_dir.join("src/big.py"),
        "def handler(event):\n    return process_the_incoming_event(event)\n",
    )
    .unwrap();
    run_scribe(&config, &["init"]);
    run_scribe(&config, &["import", "demo", repo_dir.to_str().unwrap()]);

    let (stdout, stderr, ok) = run_scribe(&config, &["generate", "demo"]);
    assert!(ok, "generate failed: {}", stderr);
    assert!(stdout.contains("processed:  2"), "unexpected output: {}", stdout);

    let (_, stderr, ok) = run_scribe(&config, &["get", "demo", "src/big.py"]);
    assert!(!ok);
    assert!(stderr.contains("document not found"));
}

#[test]
fn test_generate_unknown_repository() {
    let (_tmp, config, _) = setup_test_env();
    run_scribe(&config, &["init"]);
    let (_, stderr, ok) = run_scribe(&config, &["generate", "nope"]);
    assert!(!ok);
    assert!(stderr.contains("repository not found"));
}

#[test]
fn test_apply_change_file() {
    let (tmp, config, _) = setup_generated();
    let changes = tmp.path().join("changes.json");
    fs::write(
        &changes,
        r#"{"changes": [
            {"path": "src/a.py", "action": "removed"},
            {"path": "src/c.py", "action": "added", "content": "z = 3\n"},
            {"path": "src/d.py", "action": "modified"}
        ]}"#,
    )
    .unwrap();

    let (stdout, stderr, ok) = run_scribe(&config, &["apply", "demo", changes.to_str().unwrap()]);
    assert!(ok, "apply failed: {}", stderr);
    assert!(stdout.contains("updated:      2 / 3"), "unexpected output: {}", stdout);
    assert!(stdout.contains("fingerprint:"));

    assert!(!run_scribe(&config, &["get", "demo", "src/a.py"]).2);
    let (stdout, _, ok) = run_scribe(&config, &["get", "demo", "src/c.py"]);
    assert!(ok);
    assert!(stdout.contains("version:      1"));
}

#[test]
fn test_apply_invalid_change_file() {
    let (tmp, config, _) = setup_generated();
    let changes = tmp.path().join("changes.json");
    fs::write(&changes, r#"[{"path": "a.py", "action": "renamed"}]"#).unwrap();

    let (_, stderr, ok) = run_scribe(&config, &["apply", "demo", changes.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("Invalid change file"));
}

#[test]
fn test_sync_applies_directory_changes() {
    let (_tmp, config, repo_dir) = setup_generated();
    fs::write(repo_dir.join("src/a.py"), "x = 42\n").unwrap();
    fs::remove_file(repo_dir.join("src/b.js")).unwrap();
    fs::write(repo_dir.join("src/new.go"), "package x\n").unwrap();

    let (stdout, stderr, ok) = run_scribe(&config, &["sync", "demo", repo_dir.to_str().unwrap()]);
    assert!(ok, "sync failed: {}", stderr);
    assert!(stdout.contains("updated:      3 / 3"), "unexpected output: {}", stdout);

    let (stdout, _, _) = run_scribe(&config, &["get", "demo", "src/a.py"]);
    assert!(stdout.contains("version:      2"));
    assert!(run_scribe(&config, &["get", "demo", "src/new.go"]).2);
    assert!(!run_scribe(&config, &["get", "demo", "src/b.js"]).2);

    let (stdout, _, ok) = run_scribe(&config, &["sync", "demo", repo_dir.to_str().unwrap()]);
    assert!(ok);
    assert!(stdout.contains("no changes"));
}

#[test]
fn test_sync_retries_files_left_undocumented() {
    let (_tmp, config, repo_dir) = setup_generated();
    fs::write(
        repo_dir.join("src/big.py"),
        "def handler(event):\n    return process(event)\n",
    )
    .unwrap();

    for _ in 0..2 {
        let (stdout, stderr, ok) =
            run_scribe(&config, &["sync", "demo", repo_dir.to_str().unwrap()]);
        assert!(ok, "sync failed: {}", stderr);
        assert!(stdout.contains("updated:      0 / 1"), "unexpected output: {}", stdout);
        assert!(stdout.contains("skipped:      src/big.py"), "unexpected output: {}", stdout);
        assert!(!stdout.contains("no changes"));
    }
    assert!(!run_scribe(&config, &["get", "demo", "src/big.py"]).2);

    fs::remove_file(repo_dir.join("src/big.py")).unwrap();
    let (stdout, _, ok) = run_scribe(&config, &["sync", "demo", repo_dir.to_str().unwrap()]);
    assert!(ok);
    assert!(stdout.contains("no changes"), "unexpected output: {}", stdout);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_scribe(&tmp.path().join("missing.toml"), &["init"]);
    assert!(!ok);
    assert!(stderr.contains("Failed to read config file"));
}
