use std::path::Path;

use tempfile::TempDir;
use tokio::sync::{mpsc, watch};
use wsrun_core::runner::RunEvent;
use wsrun_core::{LaunchSpec, OutputStream, RunnerKind, StreamingTask};

fn shell_spec(dir: &Path, body: &str) -> LaunchSpec {
    LaunchSpec {
        workspace: "@repo/test".to_string(),
        label: "test".to_string(),
        dir: dir.to_path_buf(),
        runner: RunnerKind::Shell,
        script_name: "build".to_string(),
        script_body: body.to_string(),
        args: Vec::new(),
        force_color: "3".to_string(),
    }
}

fn collect_lines(rx: &mut mpsc::UnboundedReceiver<RunEvent>) -> Vec<(String, OutputStream)> {
    let mut lines = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RunEvent::Line(line) = event {
            lines.push((line.line, line.stream));
        }
    }
    lines
}

#[tokio::test]
async fn test_streaming_task_output() {
    let temp_dir = TempDir::new().unwrap();
    let task = StreamingTask::spawn(&shell_spec(temp_dir.path(), "echo out; echo err >&2")).unwrap();
    assert_eq!(task.workspace(), "@repo/test");
    assert_eq!(task.task_name(), "build");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (_done_tx, done_rx) = watch::channel(false);
    let status = task.stream_output(tx, done_rx).await.unwrap();

    assert!(status.success());
    let lines = collect_lines(&mut rx);
    assert!(lines.contains(&("out".to_string(), OutputStream::Stdout)));
    assert!(lines.contains(&("err".to_string(), OutputStream::Stderr)));
}

#[tokio::test]
async fn test_streaming_task_runs_in_workspace_dir() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("marker.txt"), "here").unwrap();
    let task = StreamingTask::spawn(&shell_spec(temp_dir.path(), "cat marker.txt")).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (_done_tx, done_rx) = watch::channel(false);
    task.stream_output(tx, done_rx).await.unwrap();

    assert_eq!(
        collect_lines(&mut rx),
        vec![("here".to_string(), OutputStream::Stdout)]
    );
}

#[tokio::test]
async fn test_settled_run_kills_live_child() {
    let temp_dir = TempDir::new().unwrap();
    let task = StreamingTask::spawn(&shell_spec(temp_dir.path(), "exec sleep 30")).unwrap();

    let (tx, _rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = watch::channel(false);
    done_tx.send(true).unwrap();

    let status = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        task.stream_output(tx, done_rx),
    )
    .await
    .expect("child was not terminated")
    .unwrap();

    assert!(!status.success());
}

#[tokio::test]
async fn test_spawn_failure_in_missing_dir() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist");
    assert!(StreamingTask::spawn(&shell_spec(&missing, "true")).is_err());
}

#[tokio::test]
async fn test_exit_resolves_while_background_process_holds_pipes() {
    let temp_dir = TempDir::new().unwrap();
    let task = StreamingTask::spawn(&shell_spec(temp_dir.path(), "sleep 3 & echo hi")).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (_done_tx, done_rx) = watch::channel(false);
    let exited = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        task.wait_for_exit(tx, done_rx),
    )
    .await
    .expect("exit was not observed")
    .unwrap();
    assert!(exited.status.success());

    tokio::time::timeout(
        std::time::Duration::from_secs(2),
        exited.drain(std::time::Duration::from_millis(300)),
    )
    .await
    .expect("drain was not bounded");

    assert_eq!(
        collect_lines(&mut rx),
        vec![("hi".to_string(), OutputStream::Stdout)]
    );
}
