pub mod build;
pub mod executor;

pub use crate::domain::model::{BuildPlan, BuildReport, Invocation, Stage, Stages, Step, StepLog};
pub use crate::domain::ports::{Executor, Toolchain};
pub use crate::utils::error::Result;
