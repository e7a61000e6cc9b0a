// src/pipeline.rs
//! Pipeline capability traits — abstract the three stages of the
//! spec-to-workspace pipeline.
//!
//! Each trait describes a single capability, enabling testing each stage
//! in isolation.

use crate::deploy::DeployedWorkspace;
use crate::error::AppError;
use crate::model::{SpecReport, WorkspaceSpec};

/// Produces a workspace spec from wherever it lives.
pub trait SpecSource {
    fn load(&self) -> Result<WorkspaceSpec, AppError>;
}

/// Statically checks a spec against the target API's limits.
pub trait SpecGate {
    fn check(&self, spec: &WorkspaceSpec) -> SpecReport;
}

/// Deploys a validated spec into a workspace.
#[async_trait::async_trait]
pub trait WorkspaceSink {
    async fn deploy(&self, spec: &WorkspaceSpec) -> Result<DeployedWorkspace, AppError>;
}
