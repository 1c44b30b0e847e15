//! Destination reached by shelling out to `psql` inside a running container.
//!
//! Every statement is a separate `docker exec -i … psql -f -` invocation with
//! the SQL on stdin, so statements are rendered to literal SQL and nothing
//! spans more than one statement. Payload size is not limited by the
//! argument list. Kept for hosts where PostgreSQL is only reachable through the
//! container runtime.

use std::process::Stdio;

use aedelore_migrate_core::constants::{
    DEFAULT_CONTAINER, DEFAULT_DB_NAME, DEFAULT_DB_USER, DEFAULT_DOCKER_BIN,
};
use aedelore_migrate_core::{
    literal, sequence_fix_template, Record, RowOutcome, SqlValue, Table, TableReport,
};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::StorageError;
use crate::psql;
use crate::traits::Destination;

/// Captured result of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs. Swapped out in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` to completion, feeding it `stdin` when given.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, StorageError>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, StorageError> {
        let command_error = |source| StorageError::Command { program: program.to_owned(), source };
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(command_error)?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            match pipe.write_all(input.as_bytes()).await {
                Ok(()) => {},
                // The program quit without reading everything; its exit
                // status says whether that was a failure.
                Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!(program, "stdin closed before the statement was fully written");
                },
                Err(err) => return Err(command_error(err)),
            }
        }

        let output = child.wait_with_output().await.map_err(command_error)?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    pub docker_bin: String,
    pub container: String,
    pub user: String,
    pub database: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            docker_bin: DEFAULT_DOCKER_BIN.to_owned(),
            container: DEFAULT_CONTAINER.to_owned(),
            user: DEFAULT_DB_USER.to_owned(),
            database: DEFAULT_DB_NAME.to_owned(),
        }
    }
}

/// Successful outcome of [`ContainerDestination::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOutcome {
    /// Ran; `rows` is the count from an `INSERT` command tag when there was one.
    Applied { rows: Option<u64> },
    /// Failed only because the object already exists.
    AlreadyExists,
}

#[derive(Debug, Clone)]
pub struct ContainerDestination<R = ProcessRunner> {
    config: ContainerConfig,
    runner: R,
}

impl ContainerDestination<ProcessRunner> {
    #[must_use]
    pub const fn new(config: ContainerConfig) -> Self {
        Self { config, runner: ProcessRunner }
    }
}

impl<R: CommandRunner> ContainerDestination<R> {
    pub const fn with_runner(config: ContainerConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub const fn runner(&self) -> &R {
        &self.runner
    }

    fn psql_args(&self) -> Vec<String> {
        vec![
            "exec".to_owned(),
            "-i".to_owned(),
            self.config.container.clone(),
            "psql".to_owned(),
            "-U".to_owned(),
            self.config.user.clone(),
            "-d".to_owned(),
            self.config.database.clone(),
            "-v".to_owned(),
            "VERBOSITY=verbose".to_owned(),
            "-v".to_owned(),
            "ON_ERROR_STOP=1".to_owned(),
            "-f".to_owned(),
            "-".to_owned(),
        ]
    }

    /// Fill `template`'s `$n` markers with `values` as literals and run it.
    ///
    /// "Already exists" failures come back as [`StatementOutcome::AlreadyExists`];
    /// unique violations as [`StorageError::Duplicate`]; anything else as
    /// [`StorageError::Statement`].
    pub async fn execute(
        &self,
        template: &str,
        values: &[SqlValue],
    ) -> Result<StatementOutcome, StorageError> {
        let mut sql = literal::fill_template(template, values);
        sql.push_str(";\n");
        let output = self.runner.run(&self.config.docker_bin, &self.psql_args(), Some(&sql)).await?;
        if output.success {
            return Ok(StatementOutcome::Applied { rows: psql::inserted_rows(&output.stdout) });
        }

        let message = psql::error_message(&output.stderr);
        match psql::sqlstate(&output.stderr) {
            Some(code) => match StorageError::from_sqlstate(Some(code), message) {
                StorageError::AlreadyExists(_) => Ok(StatementOutcome::AlreadyExists),
                err => Err(err),
            },
            // No SQLSTATE (terse verbosity or a client-side failure).
            None if output.stderr.contains("already exists") => Ok(StatementOutcome::AlreadyExists),
            None => Err(StorageError::Statement { code: None, message }),
        }
    }

    async fn insert_row(&self, record: &Record) -> Result<RowOutcome, StorageError> {
        let (template, values) = record.to_insert().templated();
        let outcome = match self.execute(&template, &values).await {
            Ok(StatementOutcome::Applied { rows: Some(0) }) => RowOutcome::Skipped,
            Ok(StatementOutcome::Applied { .. }) => RowOutcome::Inserted,
            Ok(StatementOutcome::AlreadyExists) => RowOutcome::Skipped,
            Err(StorageError::Duplicate(message)) => {
                tracing::warn!(table = %record.table(), id = record.id(), %message, "unique constraint rejected row");
                RowOutcome::Conflict
            },
            Err(err @ StorageError::Statement { .. }) => {
                tracing::warn!(table = %record.table(), id = record.id(), error = %err, "SQL error");
                RowOutcome::Failed
            },
            // A missing program fails every row alike; anything else is
            // specific to this statement.
            Err(StorageError::Command { program, source })
                if source.kind() != std::io::ErrorKind::NotFound =>
            {
                tracing::warn!(table = %record.table(), id = record.id(), %program, error = %source, "failed to run psql");
                RowOutcome::Failed
            },
            Err(err) => return Err(err),
        };
        Ok(outcome)
    }
}

#[async_trait]
impl<R: CommandRunner> Destination for ContainerDestination<R> {
    fn name(&self) -> &'static str {
        "container"
    }

    async fn probe(&self) -> Result<bool, StorageError> {
        let args = vec![
            "exec".to_owned(),
            self.config.container.clone(),
            "pg_isready".to_owned(),
            "-U".to_owned(),
            self.config.user.clone(),
        ];
        let output = self.runner.run(&self.config.docker_bin, &args, None).await?;
        if !output.success {
            tracing::debug!(stdout = %output.stdout.trim(), stderr = %output.stderr.trim(), "pg_isready not ready");
        }
        Ok(output.success)
    }

    async fn write_table(
        &self,
        table: Table,
        records: &[Record],
    ) -> Result<TableReport, StorageError> {
        let mut report = TableReport::new(table);
        for record in records {
            let outcome = self.insert_row(record).await?;
            report.record(record.id(), outcome);
        }

        if let Some(max_id) = report.max_id {
            match self.execute(&sequence_fix_template(table), &[SqlValue::Int(max_id)]).await {
                Ok(_) => report.sequence_adjusted = true,
                Err(err) => {
                    tracing::warn!(table = %table, max_id, error = %err, "failed to adjust sequence");
                },
            }
        }
        Ok(report)
    }
}
