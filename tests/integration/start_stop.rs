use crate::common::*;
use predicates::prelude::*;
use std::time::Duration;

fn busybox_project(container: &str, port: u16) -> TestProject {
    TestProject::new(&format!(
        r#"
services:
  groucho-dev:
    image: busybox:1.36
    container_name: {container}
    command: ["sh", "-c", "echo 'server booted'; exec httpd -f -p 3000 -h /"]
    ports:
      - "{port}:3000"
"#
    ))
}

fn unique_container(test: &str) -> String {
    format!("groucho-test-{}-{}", test, std::process::id())
}

#[tokio::test]
async fn start_status_exec_logs_stop() {
    let port = free_port();
    let container = unique_container("lifecycle");
    let project = busybox_project(&container, port);
    let _guard = scopeguard::guard((), |_| docker_cleanup(&project, &container));

    let groucho = || {
        let mut cmd = project.groucho();
        cmd.env("GROUCHO_DEV_CONTAINER", &container)
            .env("GROUCHO_DEV_PORT", port.to_string())
            .timeout(Duration::from_secs(180));
        cmd
    };

    groucho().args(["start", "--dev"]).assert().success();
    assert!(
        wait_for_port(port, Duration::from_secs(30)).await,
        "game did not become reachable on port {port}"
    );

    // a second start is a no-op
    groucho()
        .args(["start", "--dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already running"));

    groucho()
        .args(["status", "--dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("running"))
        .stdout(predicate::str::contains(format!("http://localhost:{port}")));

    groucho()
        .args(["exec", "--dev", "--", "echo", "from inside"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from inside"));

    groucho()
        .args(["exec", "--dev", "--", "sh", "-c", "exit 7"])
        .assert()
        .code(7);

    groucho()
        .args(["logs", "--dev", "-n", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("server booted"));

    groucho().args(["stop", "--dev", "--remove"]).assert().success();

    let inspect = std::process::Command::new("docker")
        .args(["inspect", &container])
        .output()
        .unwrap();
    assert!(!inspect.status.success(), "container should be gone after stop --remove");

    groucho()
        .args(["stop", "--dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));
}

#[tokio::test]
async fn restart_of_missing_container_fails() {
    let container = unique_container("restart");
    let project = busybox_project(&container, free_port());

    project
        .groucho()
        .env("GROUCHO_DEV_CONTAINER", &container)
        .args(["restart", "--dev"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(&container));
}
