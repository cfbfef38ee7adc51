//! Import target policy port
//!
//! Decides which project newly imported resources are attributed to.

use async_trait::async_trait;
use domain::{Calendar, ProjectId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for resolving the project of imported resources
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ImportTargetPolicy: Send + Sync {
    /// Pick the project for resources created in `calendar`
    async fn resolve_project(&self, calendar: &Calendar) -> Result<ProjectId, ApplicationError>;
}
