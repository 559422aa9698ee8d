//! Persistence provider interface
//!
//! This module defines the storage interface the Sluice runtime persists
//! through. External crates implement this trait to provide different
//! persistence mechanisms; the runtime only ever sees domain objects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::event::{Event, EventId, EventSubscription, SubscriptionId};
use super::workflow::{InstanceId, WorkflowInstance};
use crate::CoreError;

/// Storage backend for workflow execution state
///
/// Implementations translate between the domain model and their persisted
/// representation on every call. Identifier generation is a save-side
/// effect: a domain object persisted without an identifier comes back from
/// the call with one assigned.
#[async_trait]
pub trait PersistenceProvider: Send + Sync {
    /// Persist a brand new workflow instance and assign its identifier
    async fn create_new_workflow(
        &self,
        instance: &mut WorkflowInstance,
    ) -> Result<InstanceId, CoreError>;

    /// Persist the current state of an existing workflow instance
    async fn persist_workflow(&self, instance: &mut WorkflowInstance) -> Result<(), CoreError>;

    /// Load a workflow instance by ID
    async fn get_workflow_instance(
        &self,
        id: &InstanceId,
    ) -> Result<Option<WorkflowInstance>, CoreError>;

    /// IDs of runnable instances due for execution at the given time
    async fn get_runnable_instances(
        &self,
        as_at: DateTime<Utc>,
    ) -> Result<Vec<InstanceId>, CoreError>;

    /// Persist a new event subscription and assign its identifier
    async fn create_event_subscription(
        &self,
        subscription: &mut EventSubscription,
    ) -> Result<SubscriptionId, CoreError>;

    /// Subscriptions matching an event name and key, effective at the
    /// given time
    async fn get_subscriptions(
        &self,
        event_name: &str,
        event_key: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<EventSubscription>, CoreError>;

    /// Remove a subscription once its step has been woken
    async fn terminate_subscription(&self, id: &SubscriptionId) -> Result<(), CoreError>;

    /// Persist a newly published event and assign its identifier
    async fn create_event(&self, event: &mut Event) -> Result<EventId, CoreError>;

    /// Load an event by ID
    async fn get_event(&self, id: &EventId) -> Result<Option<Event>, CoreError>;

    /// IDs of unprocessed events published at or before the given time
    async fn get_runnable_events(&self, as_at: DateTime<Utc>) -> Result<Vec<EventId>, CoreError>;

    /// Mark an event as delivered to its subscribers
    async fn mark_event_processed(&self, id: &EventId) -> Result<(), CoreError>;

    /// Return an event to the undelivered pool
    async fn mark_event_unprocessed(&self, id: &EventId) -> Result<(), CoreError>;
}
