//! Tests for the file and log helpers

#![cfg(unix)]

mod common;

use common::MemorySink;
use exec_capture::{CapturedProcess, Command, Error, NoOpSink, run, stderr_path};
use tracing::Level;

fn sh(script: &str) -> CapturedProcess {
    CapturedProcess::new(Command::builder("sh").arg("-c").arg(script).build())
}

#[test]
fn test_run_to_file_without_stderr() {
    futures::executor::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");

        let report = sh("echo hello").run_to_file(&path).await.unwrap();

        assert!(report.persisted.stderr.is_none());
        assert_eq!(report.into_result().unwrap().code, Some(0));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        assert!(!stderr_path(&path).exists());
    });
}

#[test]
fn test_run_to_file_with_stderr() {
    futures::executor::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");

        let report = sh("echo out; echo '  oops  ' >&2; exit 1")
            .run_to_file(&path)
            .await
            .unwrap();

        assert_eq!(report.status.as_ref().unwrap().code, Some(1));
        assert!(report.persisted.stdout.is_ok());
        assert!(matches!(report.persisted.stderr, Some(Ok(()))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "out\n");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("run.log.err")).unwrap(),
            "oops\n"
        );
    });
}

#[test]
fn test_stderr_written_when_stdout_write_fails() {
    futures::executor::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending, but `<dir>.err` is a plain file path.
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();

        let report = sh("echo out; echo err >&2").run_to_file(&path).await.unwrap();

        assert!(matches!(report.persisted.stdout, Err(Error::WriteFailed { .. })));
        assert!(matches!(report.persisted.stderr, Some(Ok(()))));
        assert_eq!(std::fs::read_to_string(stderr_path(&path)).unwrap(), "err\n");
        assert!(report.into_result().is_err());
    });
}

#[test]
fn test_run_to_file_launch_failure_writes_nothing() {
    futures::executor::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.log");
        let process = CapturedProcess::new(Command::new("this_command_does_not_exist_12345"));

        assert!(process.run_to_file(&path).await.is_err());
        assert!(!path.exists());
    });
}

#[test]
fn test_run_to_log_records_outcome() {
    futures::executor::block_on(async {
        let sink = MemorySink::default();
        let process = CapturedProcess::new(
            Command::builder("sh")
                .arg("-c")
                .arg("echo logged; echo warned >&2; exit 4")
                .build(),
        );

        let status = process.run_to_log(&sink, Level::INFO, "ran script").await.unwrap();
        assert_eq!(status.code, Some(4));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let (level, message, record) = &records[0];
        assert_eq!(*level, Level::INFO);
        assert_eq!(message, "ran script");
        assert_eq!(record.path, "sh");
        assert_eq!(record.args, "-c |: echo logged; echo warned >&2; exit 4");
        assert_eq!(record.exit_code, Some(4));
        assert_eq!(record.stdout.as_deref(), Some("logged"));
        assert_eq!(record.stderr.as_deref(), Some("warned"));
        assert_eq!(record.internal_error, None);
    });
}

#[test]
fn test_start_to_log_records_launch_failure() {
    let sink = MemorySink::default();

    let result = run::start_to_log(
        false,
        &sink,
        Level::ERROR,
        "launch",
        "this_command_does_not_exist_12345",
        ["x"],
    );

    assert!(result.is_err());
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].2.internal_error.as_deref().unwrap().contains("not found"));
    assert_eq!(records[0].2.exit_code, None);
}

#[test]
fn test_run_to_file_log_logs_and_writes() {
    futures::executor::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("both.log");
        let sink = MemorySink::default();

        let (process, report) =
            run::run_to_file_log(true, &path, &sink, Level::DEBUG, "both", "echo", ["hi"]).await;

        assert!(process.command().is_hidden());
        assert!(report.into_result().is_ok());
        assert_eq!(sink.records().len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi\n");
    });
}

#[test]
fn test_free_functions() {
    futures::executor::block_on(async {
        let (process, status) = run::run(false, "echo", ["free", "run"]).await;
        assert!(status.unwrap().success());
        assert_eq!(process.stdout().snapshot(), "free run");

        let process = run::start(false, "sh", ["-c", "exit 2"]).unwrap();
        assert_eq!(process.wait().await.unwrap().code, Some(2));

        let (process, status) =
            run::run_to_log(false, &NoOpSink, Level::INFO, "quiet", "true", Vec::<&str>::new()).await;
        assert_eq!(status.unwrap().code, Some(0));
        assert_eq!(process.exit_code(), 0);

        let dir = tempfile::tempdir().unwrap();
        let (process, report) = run::run_to_file(false, dir.path().join("f"), "echo", ["x"])
            .await
            .unwrap();
        assert!(report.into_result().is_ok());
        assert!(process.is_finished());
    });
}

#[test]
fn test_run_keeps_handle_on_failure() {
    futures::executor::block_on(async {
        let (process, status) = run::run(false, "this_command_does_not_exist_12345", ["x"]).await;
        assert!(matches!(status, Err(Error::CommandNotFound { .. })));
        assert_eq!(process.command().get_args().len(), 1);
        assert_eq!(process.exit_code(), -1);

        let sink = MemorySink::default();
        let (process, status) = run::run_to_log(
            false,
            &sink,
            Level::WARN,
            "missing",
            "this_command_does_not_exist_12345",
            Vec::<&str>::new(),
        )
        .await;
        assert!(status.is_err());
        assert_eq!(process.stdout().snapshot(), "");
        assert!(sink.records()[0].2.internal_error.is_some());
    });
}
