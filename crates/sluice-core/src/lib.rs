//!
//! Sluice Core - domain model for the Sluice workflow engine
//!
//! This crate defines the execution-state domain model (workflow instances,
//! execution pointers, events, subscriptions), the opaque payload value
//! type, and the persistence interface that storage backends implement.
//! It is the foundation for the other crates in the platform.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - core business models, entities, and rules
pub mod domain;

/// Error types
pub mod error;

/// Opaque payload values carried by workflow state
pub mod payload;

// Re-export key types
pub use error::CoreError;
pub use payload::{Payload, PayloadData};

// Re-export main API types for easy use
pub use domain::event::{Event, EventId, EventSubscription, SubscriptionId};
pub use domain::provider::PersistenceProvider;
pub use domain::workflow::{
    ErrorId, ExecutionError, ExecutionPointer, InstanceId, PointerId, WorkflowInstance,
    WorkflowStatus,
};
