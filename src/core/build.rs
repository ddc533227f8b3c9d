use crate::core::executor::ProcessExecutor;
use crate::domain::model::BuildReport;
use crate::domain::ports::{Executor, Toolchain};
use crate::utils::error::{OpifexError, Result};
use chrono::Utc;
use std::path::PathBuf;

pub struct BuildEngine<T: Toolchain, E: Executor = ProcessExecutor> {
    toolchain: T,
    executor: E,
}

impl<T: Toolchain> BuildEngine<T> {
    pub fn new(toolchain: T) -> Self {
        Self::with_executor(toolchain, ProcessExecutor::new())
    }
}

impl<T: Toolchain, E: Executor> BuildEngine<T, E> {
    pub fn with_executor(toolchain: T, executor: E) -> Self {
        Self {
            toolchain,
            executor,
        }
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Command lines the build would run, in order.
    pub fn dry_run(&self, sources: &[PathBuf]) -> Result<Vec<String>> {
        let plan = self.toolchain.plan(sources)?;
        Ok(plan
            .steps
            .iter()
            .map(|step| format!("[{}] {}", step.stage, step.invocation.render()))
            .collect())
    }

    /// Plans and runs every step in order, stopping after the first one that
    /// exits non-zero. A failing compiler is reported in the returned report,
    /// not as an `Err`.
    pub async fn run(&self, sources: &[PathBuf]) -> Result<BuildReport> {
        let started_at = Utc::now();
        let plan = self.toolchain.plan(sources)?;
        tracing::info!(
            "Building {} source(s) with {} ({} step(s))",
            sources.len(),
            self.toolchain.name(),
            plan.steps.len()
        );

        tokio::fs::create_dir_all(self.toolchain.build_dir()).await?;
        for dir in plan.output_dirs() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut logs = Vec::with_capacity(plan.steps.len());
        let mut succeeded = true;
        for step in &plan.steps {
            let log = self.executor.execute(step).await?;
            if log.succeeded() {
                tracing::debug!("[{}] ok", step.stage);
            } else {
                tracing::warn!("[{}] exited with status {}", step.stage, log.status);
                succeeded = false;
            }
            logs.push(log);
            if !succeeded {
                break;
            }
        }

        let artifacts = if succeeded { plan.artifacts } else { Vec::new() };
        if succeeded {
            tracing::info!("Build finished, {} artifact(s)", artifacts.len());
        }

        Ok(BuildReport {
            toolchain: self.toolchain.name().to_string(),
            succeeded,
            artifacts,
            logs,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Blocking variant of [`run`](Self::run) on a private current-thread
    /// runtime. Must not be called from inside a tokio runtime.
    pub fn run_blocking(&self, sources: &[PathBuf]) -> Result<BuildReport> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OpifexError::TaskError {
                message: format!("cannot start runtime: {}", e),
            })?;
        runtime.block_on(self.run(sources))
    }
}
