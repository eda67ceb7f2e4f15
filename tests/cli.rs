use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn summa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("summa");
    path
}

fn run_summa(
    dir: &Path,
    config_path: &Path,
    args: &[&str],
    envs: &[(&str, &str)],
) -> (String, String, bool) {
    let binary = summa_binary();
    let mut cmd = Command::new(&binary);
    cmd.current_dir(dir)
        .env_remove("PORT")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GEMINI_MODEL")
        .arg("--config")
        .arg(config_path)
        .args(args);
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let output = cmd
        .output()
        .unwrap_or_else(|e| panic!("Failed to run summa binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_check_config_without_file_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let (stdout, stderr, ok) = run_summa(
        tmp.path(),
        &tmp.path().join("missing.toml"),
        &["check-config"],
        &[],
    );
    assert!(ok, "stderr: {}", stderr);
    assert!(stdout.contains("bind = \"0.0.0.0:5000\""));
    assert!(stdout.contains("api_key = <missing>"));
}

#[test]
fn test_check_config_applies_env_and_redacts_key() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("summa.toml");
    fs::write(
        &config_path,
        "[server]\nbind = \"127.0.0.1:7000\"\n\n[provider]\ntimeout_secs = 10\n",
    )
    .unwrap();

    let (stdout, stderr, ok) = run_summa(
        tmp.path(),
        &config_path,
        &["check-config"],
        &[("PORT", "7123"), ("GEMINI_API_KEY", "very-secret-key")],
    );
    assert!(ok, "stderr: {}", stderr);
    assert!(stdout.contains("127.0.0.1:7123"));
    assert!(stdout.contains("timeout_secs = 10"));
    assert!(stdout.contains("api_key = <set>"));
    assert!(!stdout.contains("very-secret-key"));
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("summa.toml");
    fs::write(&config_path, "[server]\nbind = \"not an address\"\n").unwrap();

    let (_, stderr, ok) = run_summa(tmp.path(), &config_path, &["check-config"], &[]);
    assert!(!ok);
    assert!(stderr.contains("server.bind"));
}
