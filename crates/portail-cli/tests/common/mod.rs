use std::path::Path;
use std::process::{Child, Command, Output, Stdio};

fn command(store: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_portail"));
    cmd.arg("--store").arg(store);
    cmd.args(args);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Run the CLI binary against a store directory.
pub fn run_cli(store: &Path, args: &[&str]) -> Output {
    command(store, args)
        .output()
        .expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(store: &Path, args: &[&str]) -> String {
    let output = run_cli(store, args);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Start a long-running CLI command with piped stdout.
#[allow(dead_code)]
pub fn spawn_cli(store: &Path, args: &[&str]) -> Child {
    command(store, args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn CLI")
}
