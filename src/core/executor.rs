use crate::domain::model::{Invocation, Step, StepLog};
use crate::domain::ports::Executor;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::process::Command;

/// Runs steps as child processes, capturing both output streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, step: &Step) -> Result<StepLog> {
        let invocation = &step.invocation;
        let command = invocation.render();
        tracing::debug!("[{}] {}", step.stage, command);

        let mut command_line = Command::new(&invocation.program);
        command_line.envs(&invocation.env);
        push_args(&mut command_line, invocation);

        let output = tokio::process::Command::from(command_line)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(StepLog {
            stage: step.stage,
            command,
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(windows)]
fn push_args(command: &mut Command, invocation: &Invocation) {
    use std::os::windows::process::CommandExt;

    if invocation.verbatim {
        for arg in &invocation.args {
            command.raw_arg(arg);
        }
    } else {
        command.args(&invocation.args);
    }
}

#[cfg(not(windows))]
fn push_args(command: &mut Command, invocation: &Invocation) {
    command.args(&invocation.args);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::model::Stage;

    fn step(invocation: Invocation) -> Step {
        Step {
            stage: Stage::Link,
            invocation,
            outputs: vec![],
        }
    }

    #[tokio::test]
    async fn captures_status_and_streams() {
        let step = step(
            Invocation::new("sh")
                .arg("-c")
                .arg("echo out; echo err >&2; exit 3"),
        );
        let log = ProcessExecutor::new().execute(&step).await.unwrap();
        assert_eq!(log.status, 3);
        assert_eq!(log.stdout, "out\n");
        assert_eq!(log.stderr, "err\n");
        assert!(!log.succeeded());
    }

    #[tokio::test]
    async fn passes_environment() {
        let step = step(
            Invocation::new("sh")
                .arg("-c")
                .arg("printf %s \"$OPIFEX_MARKER\"")
                .env("OPIFEX_MARKER", "marker"),
        );
        let log = ProcessExecutor::new().execute(&step).await.unwrap();
        assert!(log.succeeded());
        assert_eq!(log.stdout, "marker");
    }

    #[tokio::test]
    async fn missing_program_is_an_io_error() {
        let step = step(Invocation::new("/no/such/compiler"));
        let err = ProcessExecutor::new().execute(&step).await.unwrap_err();
        assert!(matches!(err, crate::OpifexError::IoError(_)));
    }
}
