use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::payload::Payload;

/// Value object: event subscription ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

/// Value object: event ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl From<String> for SubscriptionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for SubscriptionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EventId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registration indicating a workflow step is waiting for a named
/// external event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSubscription {
    /// Unique identifier, assigned on first persist
    pub id: Option<SubscriptionId>,

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

impl EventSubscription {
    /// Create a subscription effective as of now
    pub fn new(
        workflow_id: impl Into<String>,
        step_id: i32,
        event_name: impl Into<String>,
        event_key: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            event_key: event_key.into(),
            event_name: event_name.into(),
            step_id,
            workflow_id: workflow_id.into(),
            subscribe_as_of: Utc::now(),
        }
    }
}

/// An external event published into the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier, assigned on first persist
    pub id: Option<EventId>,

    /// Key the event was published under
    pub event_key: String,

    /// Name the event was published under
    pub event_name: String,

    /// When the event was published
    pub event_time: DateTime<Utc>,

    /// Whether the engine has delivered the event to its subscribers
    pub is_processed: bool,

    /// Caller-defined event payload
    pub event_data: Payload,
}

impl Event {
    /// Create an unprocessed event published now
    pub fn new(
        event_name: impl Into<String>,
        event_key: impl Into<String>,
        event_data: Payload,
    ) -> Self {
        Self {
            id: None,
            event_key: event_key.into(),
            event_name: event_name.into(),
            event_time: Utc::now(),
            is_processed: false,
            event_data,
        }
    }
}
