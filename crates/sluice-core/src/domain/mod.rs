//! Domain layer for the Sluice workflow engine
//!
//! Execution state owned by the workflow engine while a workflow runs,
//! plus the persistence interface storage backends implement.

/// Events and event subscriptions
pub mod event;

/// Persistence provider interface
pub mod provider;

/// Workflow instances and their execution pointers
pub mod workflow;
