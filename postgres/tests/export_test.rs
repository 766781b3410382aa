//! Export pipeline tests against a recording fake runner.
//! No external programs are started here; see `stub_tools_test.rs` for that.

use chrono::{DateTime, Utc};
use postgres::wrapper::CommandError;
use postgres::{
    CommandRunner, ExportError, ExportTools, Exporter, PostgresConfig, PostgresExporter,
    ARCHIVE_MIME,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
struct Invocation {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

/// Records every invocation and answers with queued responses, succeeding
/// with empty output once the queue is drained.
#[derive(Default)]
struct FakeRunner {
    calls: RefCell<Vec<Invocation>>,
    responses: RefCell<VecDeque<Result<String, CommandError>>>,
}

impl FakeRunner {
    fn respond(self, response: Result<String, CommandError>) -> Self {
        self.responses.borrow_mut().push_back(response);
        self
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<String, CommandError> {
        self.calls.borrow_mut().push(Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            working_dir: working_dir.map(Path::to_path_buf),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

fn exit_error(program: &str, output: &str) -> CommandError {
    CommandError::Exit {
        program: program.to_string(),
        status: "exit status: 1".to_string(),
        code: Some(1),
        output: output.to_string(),
    }
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

fn full_config() -> PostgresConfig {
    PostgresConfig {
        host: "h".to_string(),
        port: "5432".to_string(),
        database: "d".to_string(),
        username: "u".to_string(),
        options: vec!["--inserts".to_string()],
    }
}

fn db_config(database: &str) -> PostgresConfig {
    PostgresConfig {
        database: database.to_string(),
        ..Default::default()
    }
}

#[test]
fn successful_export_dumps_then_archives() {
    let runner = FakeRunner::default();
    let exporter = PostgresExporter::with_runner(db_config("mydb"), &runner);

    let result = exporter.export_at(at(1_700_000_000));

    assert!(result.is_success());
    assert!(result.error().is_none());
    assert_eq!(result.mime(), ARCHIVE_MIME);
    assert_eq!(result.path(), Some(Path::new("mydb_1700000000.sql.tar.gz")));

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].program, "pg_dump");
    assert_eq!(calls[0].args, vec!["-Fp", "-fmydb_1700000000.sql", "-dmydb"]);
    assert_eq!(calls[1].program, "tar");
    assert_eq!(
        calls[1].args,
        vec!["-czf", "mydb_1700000000.sql.tar.gz", "mydb_1700000000.sql"]
    );
    assert!(calls.iter().all(|call| call.working_dir.is_none()));
}

#[test]
fn dump_arguments_follow_fixed_order() {
    let runner = FakeRunner::default();
    let exporter = PostgresExporter::with_runner(full_config(), &runner);

    exporter.export_at(at(1_700_000_000));

    assert_eq!(
        runner.calls()[0].args,
        vec![
            "--inserts",
            "-Fp",
            "-fd_1700000000.sql",
            "-dd",
            "-hh",
            "-p5432",
            "-Uu",
        ]
    );
}

#[test]
fn empty_fields_are_not_passed_to_pg_dump() {
    let runner = FakeRunner::default();
    let config = PostgresConfig {
        host: "db".to_string(),
        ..Default::default()
    };
    let exporter = PostgresExporter::with_runner(config, &runner);

    exporter.export_at(at(5));

    let args = &runner.calls()[0].args;
    assert_eq!(args, &vec!["-Fp", "-f_5.sql", "-hdb"]);
    assert!(!args.iter().any(|arg| arg == "-d" || arg == "-p" || arg == "-U"));
}

#[test]
fn dump_failure_skips_archive_step() {
    let runner = FakeRunner::default().respond(Err(exit_error(
        "pg_dump",
        "pg_dump: error: connection to server failed\n",
    )));
    let exporter = PostgresExporter::with_runner(db_config("mydb"), &runner);

    let result = exporter.export_at(at(1_700_000_000));

    assert!(!result.is_success());
    assert!(result.path().is_none());
    assert_eq!(result.mime(), ARCHIVE_MIME);
    let error = result.error().unwrap();
    assert!(matches!(error, ExportError::Dump(_)));
    assert!(error.output().contains("connection to server failed"));

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "pg_dump");
}

#[test]
fn dump_spawn_failure_is_reported() {
    let runner = FakeRunner::default().respond(Err(CommandError::Spawn {
        program: "pg_dump".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    }));
    let exporter = PostgresExporter::with_runner(db_config("mydb"), &runner);

    let error = exporter.export_at(at(1)).into_result().unwrap_err();

    assert!(matches!(
        error,
        ExportError::Dump(CommandError::Spawn { .. })
    ));
    assert_eq!(error.output(), "");
    assert_eq!(runner.calls().len(), 1);
}

// Archive failures carry tar's own output, not pg_dump's.
#[test]
fn archive_failure_reports_tar_output() {
    let runner = FakeRunner::default()
        .respond(Ok("pg_dump: dumping contents\n".to_string()))
        .respond(Err(exit_error("tar", "tar: mydb_1.sql: Cannot stat\n")));
    let exporter = PostgresExporter::with_runner(db_config("mydb"), &runner);

    let result = exporter.export_at(at(1));

    assert!(result.path().is_none());
    let error = result.error().unwrap();
    assert!(matches!(error, ExportError::Archive(_)));
    assert_eq!(error.command_error().program(), "tar");
    assert!(error.output().contains("Cannot stat"));
    assert!(!error.output().contains("dumping contents"));
    assert_eq!(runner.calls().len(), 2);
}

#[test]
fn configured_tool_paths_are_used() {
    let runner = FakeRunner::default();
    let exporter = PostgresExporter::with_runner(db_config("app"), &runner).tools(ExportTools {
        pg_dump: "/usr/lib/postgresql/16/bin/pg_dump".to_string(),
        tar: "/usr/bin/bsdtar".to_string(),
    });

    exporter.export_at(at(10));

    let programs: Vec<_> = runner.calls().into_iter().map(|c| c.program).collect();
    assert_eq!(
        programs,
        vec!["/usr/lib/postgresql/16/bin/pg_dump", "/usr/bin/bsdtar"]
    );
}

#[test]
fn output_dir_is_working_dir_and_path_prefix() {
    let runner = FakeRunner::default();
    let exporter =
        PostgresExporter::with_runner(db_config("app"), &runner).output_dir("/var/backups");

    let result = exporter.export_at(at(10));

    assert_eq!(
        result.path(),
        Some(Path::new("/var/backups/app_10.sql.tar.gz"))
    );
    for call in runner.calls() {
        assert_eq!(call.working_dir, Some(PathBuf::from("/var/backups")));
    }
    // Archive members stay relative to the output directory.
    assert_eq!(runner.calls()[1].args[2], "app_10.sql");
}

#[test]
fn exports_one_second_apart_get_distinct_names() {
    let runner = FakeRunner::default();
    let exporter = PostgresExporter::with_runner(db_config("mydb"), &runner);

    let first = exporter.export_at(at(1_700_000_000)).into_result().unwrap();
    let second = exporter.export_at(at(1_700_000_001)).into_result().unwrap();

    assert_ne!(first, second);
}

// Known limitation: names only have second granularity, so two exports of
// the same database within one second collide on the same files.
#[test]
fn exports_within_the_same_second_collide() {
    let runner = FakeRunner::default();
    let exporter = PostgresExporter::with_runner(db_config("mydb"), &runner);
    let t = at(1_700_000_000);

    let first = exporter.export_at(t).into_result().unwrap();
    let second = exporter
        .export_at(t + chrono::Duration::milliseconds(500))
        .into_result()
        .unwrap();

    assert_eq!(first, second);
    let calls = runner.calls();
    assert_eq!(calls[0].args, calls[2].args);
}

#[test]
fn export_uses_current_time() {
    let runner = FakeRunner::default();
    let exporter = PostgresExporter::with_runner(db_config("mydb"), &runner);

    let before = Utc::now().timestamp();
    let path = exporter.export().into_result().unwrap();
    let after = Utc::now().timestamp();

    let name = path.to_str().unwrap();
    let stamp: i64 = name
        .strip_prefix("mydb_")
        .and_then(|rest| rest.strip_suffix(".sql.tar.gz"))
        .unwrap()
        .parse()
        .unwrap();
    assert!(before <= stamp && stamp <= after);
}
