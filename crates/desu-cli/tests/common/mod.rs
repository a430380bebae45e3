use std::path::Path;
use std::process::{Command, Output};

/// A `desu` command with colors off and an isolated client directory.
pub fn desu(data: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_desu"));
    cmd.env("NO_COLOR", "1");
    cmd.env("DESU_CLIENT_DATA", data);
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Run the CLI off the async runtime so an in-process server keeps serving.
pub async fn run_cli(args: &[&str], data: &Path) -> Output {
    let mut cmd = desu(data);
    cmd.args(args);
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute CLI"))
        .await
        .expect("CLI task panicked")
}

/// Run the CLI and expect success.
pub async fn run_cli_success(args: &[&str], data: &Path) -> String {
    let output = run_cli(args, data).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}
