use crate::domain::model::{BuildPlan, Step, StepLog};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Toolchain: Send + Sync {
    fn name(&self) -> &str;
    fn build_dir(&self) -> &Path;
    fn plan(&self, sources: &[PathBuf]) -> Result<BuildPlan>;
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, step: &Step) -> Result<StepLog>;
}

impl<T: Toolchain + ?Sized> Toolchain for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn build_dir(&self) -> &Path {
        (**self).build_dir()
    }

    fn plan(&self, sources: &[PathBuf]) -> Result<BuildPlan> {
        (**self).plan(sources)
    }
}
