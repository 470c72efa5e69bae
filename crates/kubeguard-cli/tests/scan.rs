use assert_cmd::Command;
use predicates::prelude::*;

/// Command with kubeconfig discovery pinned to the test environment so a
/// developer's real cluster config can never leak in.
#[allow(deprecated)]
fn kubeguard_cmd(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("kubeguard").unwrap();
    cmd.env_remove("KUBECONFIG").env("HOME", home);
    cmd
}

#[test]
fn missing_kubeconfig_fails_with_connect_error() {
    let home = tempfile::tempdir().unwrap();
    kubeguard_cmd(home.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to connect to cluster"));
}

#[test]
fn nonexistent_explicit_kubeconfig_fails() {
    let home = tempfile::tempdir().unwrap();
    kubeguard_cmd(home.path())
        .args(["--kubeconfig", "/no/such/kubeconfig"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to connect to cluster"));
}

#[test]
fn unreachable_api_server_fails() {
    let home = tempfile::tempdir().unwrap();
    let kubeconfig = home.path().join("config");
    std::fs::write(
        &kubeconfig,
        r#"
apiVersion: v1
kind: Config
current-context: test
clusters:
  - name: test-cluster
    cluster:
      server: http://127.0.0.1:1
      insecure-skip-tls-verify: true
users:
  - name: test-user
    user:
      token: sekret
contexts:
  - name: test
    context:
      cluster: test-cluster
      user: test-user
"#,
    )
    .unwrap();

    kubeguard_cmd(home.path())
        .args(["--kubeconfig", kubeconfig.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to connect to cluster"));
}

#[test]
fn file_flag_requires_json_output() {
    let home = tempfile::tempdir().unwrap();
    kubeguard_cmd(home.path())
        .args(["-f", "report.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--file requires --output json"));
}
