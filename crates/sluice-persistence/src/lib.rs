//!
//! Sluice Persistence - mapping core between domain and persisted state
//!
//! This crate converts the in-memory execution state of a workflow
//! instance into its durable persisted representation and back. Saving is
//! reconciliation-aware: an existing persisted record is updated in place,
//! nested collections are merged by key instead of replaced, and nothing
//! already persisted is ever removed. Loading always rebuilds a fresh
//! domain object.
//!
//! The mapping functions are synchronous and perform no I/O; storage
//! backends drive them from their own load/save operations.

pub mod codec;
pub mod error;
pub mod identity;
pub mod mapper;
pub mod model;
pub mod reconcile;

pub use codec::{EncodedPayload, PayloadCodec, PayloadRegistry};
pub use error::PersistenceError;
pub use identity::{IdGenerator, UuidGenerator};
pub use mapper::WorkflowMapper;
pub use model::{
    PersistedEvent, PersistedExecutionError, PersistedExecutionPointer,
    PersistedExtensionAttribute, PersistedSubscription, PersistedWorkflow,
};
