use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::payload::Payload;

/// Workflow instance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStatus {
    /// Instance has runnable pointers
    Runnable,

    /// Instance is paused and will not be scheduled
    Suspended,

    /// Instance ran to completion
    Complete,

    /// Instance was terminated before completing
    Terminated,
}

/// Value object: workflow instance ID
///
/// Opaque at the domain boundary; backends store it in their native
/// fixed-width form. Absent until the instance is first persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

/// Value object: execution pointer ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub String);

/// Value object: execution error ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorId(pub String);

macro_rules! id_conversions {
    ($($name:ident),*) => {
        $(
            impl From<String> for $name {
                fn from(raw: String) -> Self {
                    Self(raw)
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }
        )*
    };
}

id_conversions!(InstanceId, PointerId, ErrorId);

/// Aggregate: a single running (or completed) execution of a workflow
/// definition, holding all its state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Unique identifier, assigned on first persist
    pub id: Option<InstanceId>,

    /// Workflow definition this instance executes
    pub workflow_definition_id: String,

    /// Definition version the instance was started against
    pub version: i32,

    /// Free-text description carried from the definition
    pub description: Option<String>,

    /// Current status
    pub status: WorkflowStatus,

    /// Caller-defined workflow data
    pub data: Payload,

    /// Creation timestamp
    pub create_time: DateTime<Utc>,

    /// Completion timestamp, set when the instance finishes
    pub complete_time: Option<DateTime<Utc>>,

    /// When the instance is next due for execution
    pub next_execution: Option<DateTime<Utc>>,

    /// Cursors tracking progress through the execution graph
    pub execution_pointers: Vec<ExecutionPointer>,
}

impl WorkflowInstance {
    /// Create a new, not-yet-persisted instance
    pub fn new(workflow_definition_id: impl Into<String>, version: i32, data: Payload) -> Self {
        Self {
            id: None,
            workflow_definition_id: workflow_definition_id.into(),
            version,
            description: None,
            status: WorkflowStatus::Runnable,
            data,
            create_time: Utc::now(),
            complete_time: None,
            next_execution: None,
            execution_pointers: Vec::new(),
        }
    }
}

/// A cursor tracking progress through one branch of a workflow instance's
/// execution graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPointer {
    /// Unique identifier within the owning instance, assigned on first
    /// persist
    pub id: Option<PointerId>,

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

    /// Step-private state carried between executions
    pub persistence_data: Payload,

    /// Payload of the published event, once received
    pub event_data: Payload,

    /// Arbitrary key/value annotations attached by step middleware
    pub extension_attributes: HashMap<String, Payload>,

    /// Errors recorded while executing this pointer
    pub errors: Vec<ExecutionError>,
}

impl ExecutionPointer {
    /// Create a new active pointer on the given definition step
    pub fn new(step_id: i32) -> Self {
        Self {
            id: None,
            step_id,
            step_name: None,
            active: true,
            sleep_until: None,
            start_time: None,
            end_time: None,
            event_name: None,
            event_key: None,
            event_published: false,
            concurrent_fork: false,
            path_terminator: false,
            persistence_data: Payload::none(),
            event_data: Payload::none(),
            extension_attributes: HashMap::new(),
            errors: Vec::new(),
        }
    }
}

/// An error recorded against an execution pointer
///
/// Errors are an audit trail: once persisted they are never updated or
/// removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Unique identifier, assigned on first persist
    pub id: Option<ErrorId>,

    /// When the error occurred
    pub error_time: DateTime<Utc>,

    /// Human-readable message
    pub message: String,
}

impl ExecutionError {
    /// Record an error that occurred now
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: None,
            error_time: Utc::now(),
            message: message.into(),
        }
    }
}
