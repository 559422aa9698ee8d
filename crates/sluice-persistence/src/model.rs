//! Persisted representation of workflow execution state
//!
//! These records are what a storage backend writes. They are owned by the
//! backend's unit of work and only mutated by the mapper during a save.
//! Identifiers are native 128-bit UUIDs; opaque domain payloads are held
//! as encoded blobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sluice_core::WorkflowStatus;

use crate::codec::EncodedPayload;

/// Persisted workflow instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedWorkflow {
    /// Unique identifier
    pub instance_id: Uuid,

    /// Workflow definition the instance executes
    pub workflow_definition_id: String,

    /// Definition version the instance was started against
    pub version: i32,

    /// Free-text description carried from the definition
    pub description: Option<String>,

    /// Current status, mirrored from the domain object
    pub status: WorkflowStatus,

    /// Encoded caller-defined workflow data
    pub data: EncodedPayload,

    /// Creation timestamp
    pub create_time: DateTime<Utc>,

    /// Completion timestamp
    pub complete_time: Option<DateTime<Utc>>,

    /// When the instance is next due for execution
    pub next_execution: Option<DateTime<Utc>>,

    /// Execution pointers, merged by key on every save and never removed
    pub execution_pointers: Vec<PersistedExecutionPointer>,
}

/// Persisted execution pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedExecutionPointer {
    /// Unique identifier within the owning instance
    pub id: Uuid,

    /// Definition step the pointer sits on
    pub step_id: i32,

    /// Display name of the step
    pub step_name: Option<String>,

    /// Whether the pointer is still eligible for execution
    pub active: bool,

    /// Do not execute before this time
    pub sleep_until: Option<DateTime<Utc>>,

    /// When the step started executing
    pub start_time: Option<DateTime<Utc>>,

    /// When the step finished executing
    pub end_time: Option<DateTime<Utc>>,

    /// Name of the event the pointer is waiting on
    pub event_name: Option<String>,

    /// Key of the event the pointer is waiting on
    pub event_key: Option<String>,

    /// Whether the awaited event has been published to this pointer
    pub event_published: bool,

    /// Whether the pointer was spawned by a concurrent fork
    pub concurrent_fork: bool,

    /// Whether the pointer terminates its path
    pub path_terminator: bool,

    /// Encoded step-private state
    pub persistence_data: EncodedPayload,

    /// Encoded payload of the published event
    pub event_data: EncodedPayload,

    /// Keyed annotations; values are overwritten on merge
    pub extension_attributes: Vec<PersistedExtensionAttribute>,

    /// Recorded errors; append-only
    pub errors: Vec<PersistedExecutionError>,
}

impl PersistedExecutionPointer {
    /// Allocate an empty pointer record for the given identifier
    ///
    /// Every field is overwritten by the mapper immediately after
    /// allocation; the defaults here are never persisted as-is.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            step_id: 0,
            step_name: None,
            active: false,
            sleep_until: None,
            start_time: None,
            end_time: None,
            event_name: None,
            event_key: None,
            event_published: false,
            concurrent_fork: false,
            path_terminator: false,
            persistence_data: EncodedPayload::absent(),
            event_data: EncodedPayload::absent(),
            extension_attributes: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Persisted extension attribute on an execution pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedExtensionAttribute {
    /// Attribute key, unique within the owning pointer
    pub attribute_key: String,

    /// Encoded attribute value
    pub attribute_value: EncodedPayload,
}

/// Persisted execution error
///
/// Immutable once written: reconciliation appends new errors and never
/// touches existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedExecutionError {
    /// Unique identifier
    pub id: Uuid,

    /// When the error occurred
    pub error_time: DateTime<Utc>,

    /// Human-readable message
    pub message: String,
}

/// Persisted event subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSubscription {
    /// Unique identifier
    pub subscription_id: Uuid,

    /// Key the subscription matches on
    pub event_key: String,

    /// Name the subscription matches on
    pub event_name: String,

    /// Definition step that is waiting
    pub step_id: i32,

    /// Workflow instance that owns the waiting step
    pub workflow_id: String,

    /// Events published before this time are not delivered
    pub subscribe_as_of: DateTime<Utc>,
}

/// Persisted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEvent {
    /// Unique identifier
    pub event_id: Uuid,

    /// Key the event was published under
    pub event_key: String,

    /// Name the event was published under
    pub event_name: String,

    /// When the event was published
    pub event_time: DateTime<Utc>,

    /// Whether the engine has delivered the event to its subscribers
    pub is_processed: bool,

    /// Encoded caller-defined event payload
    pub event_data: EncodedPayload,
}
