use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use sluice_core::{
    CoreError, Event, EventId, EventSubscription, InstanceId, PersistenceProvider, SubscriptionId,
    WorkflowInstance, WorkflowStatus,
};
use sluice_persistence::{
    identity, PayloadCodec, PersistedEvent, PersistedSubscription, PersistedWorkflow,
    PersistenceError, WorkflowMapper,
};

fn mapping_error(err: PersistenceError) -> CoreError {
    CoreError::Mapping(err.to_string())
}

/// In-memory implementation of the `PersistenceProvider`
///
/// Records are held in concurrent maps keyed by their storage identifier.
/// Saves run the load-map-store cycle under the map's per-key entry lock,
/// which serializes conversions against the same persisted record.
pub struct InMemoryPersistenceProvider {
    workflows: DashMap<Uuid, PersistedWorkflow>,
    subscriptions: DashMap<Uuid, PersistedSubscription>,
    events: DashMap<Uuid, PersistedEvent>,
    mapper: WorkflowMapper,
}

impl InMemoryPersistenceProvider {
    /// Create a provider mapping payloads through the given codec
    pub fn new(codec: Arc<PayloadCodec>) -> Self {
        Self::with_mapper(WorkflowMapper::new(codec))
    }

    /// Create a provider over an explicit mapper (e.g. with a
    /// deterministic identifier generator)
    pub fn with_mapper(mapper: WorkflowMapper) -> Self {
        Self {
            workflows: DashMap::new(),
            subscriptions: DashMap::new(),
            events: DashMap::new(),
            mapper,
        }
    }
}

#[async_trait]
impl PersistenceProvider for InMemoryPersistenceProvider {
    async fn create_new_workflow(
        &self,
        instance: &mut WorkflowInstance,
    ) -> Result<InstanceId, CoreError> {
        let record = self
            .mapper
            .to_persisted(instance, None)
            .map_err(mapping_error)?;
        let id = identity::to_domain_id(record.instance_id);

        match self.workflows.entry(record.instance_id) {
            Entry::Occupied(_) => Err(CoreError::Conflict(record.instance_id.to_string())),
            Entry::Vacant(vacant) => {
                debug!("Created workflow instance {}", record.instance_id);
                vacant.insert(record);
                Ok(id)
            }
        }
    }

    async fn persist_workflow(&self, instance: &mut WorkflowInstance) -> Result<(), CoreError> {
        let Some(id) = instance.id.clone() else {
            return Err(CoreError::WorkflowNotFound(
                "instance has no identifier".to_string(),
            ));
        };
        let key = identity::parse_id(id.as_ref()).map_err(mapping_error)?;

        let mut entry = self
            .workflows
            .get_mut(&key)
            .ok_or_else(|| CoreError::WorkflowNotFound(id.to_string()))?;

        let updated = self
            .mapper
            .to_persisted(instance, Some(entry.clone()))
            .map_err(mapping_error)?;
        *entry = updated;

        debug!("Persisted workflow instance {}", key);
        Ok(())
    }

    async fn get_workflow_instance(
        &self,
        id: &InstanceId,
    ) -> Result<Option<WorkflowInstance>, CoreError> {
        let key = identity::parse_id(id.as_ref()).map_err(mapping_error)?;

        match self.workflows.get(&key) {
            Some(record) => {
                let instance = self
                    .mapper
                    .to_workflow_instance(&record)
                    .map_err(mapping_error)?;
                Ok(Some(instance))
            }
            None => Ok(None),
        }
    }

    async fn get_runnable_instances(
        &self,
        as_at: DateTime<Utc>,
    ) -> Result<Vec<InstanceId>, CoreError> {
        let mut due = Vec::new();
        for record in self.workflows.iter() {
            if record.status != WorkflowStatus::Runnable {
                continue;
            }
            if let Some(next_execution) = record.next_execution {
                if next_execution <= as_at {
                    due.push(identity::to_domain_id(record.instance_id));
                }
            }
        }
        Ok(due)
    }

    async fn create_event_subscription(
        &self,
        subscription: &mut EventSubscription,
    ) -> Result<SubscriptionId, CoreError> {
        let record = self
            .mapper
            .to_persisted_subscription(subscription)
            .map_err(mapping_error)?;
        let id = identity::to_domain_id(record.subscription_id);

        match self.subscriptions.entry(record.subscription_id) {
            Entry::Occupied(_) => Err(CoreError::Conflict(record.subscription_id.to_string())),
            Entry::Vacant(vacant) => {
                debug!("Created event subscription {}", record.subscription_id);
                vacant.insert(record);
                Ok(id)
            }
        }
    }

    async fn get_subscriptions(
        &self,
        event_name: &str,
        event_key: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<EventSubscription>, CoreError> {
        let mut matching = Vec::new();
        for record in self.subscriptions.iter() {
            if record.event_name == event_name
                && record.event_key == event_key
                && record.subscribe_as_of <= as_of
            {
                matching.push(self.mapper.to_event_subscription(&record));
            }
        }
        Ok(matching)
    }

    async fn terminate_subscription(&self, id: &SubscriptionId) -> Result<(), CoreError> {
        let key = identity::parse_id(id.as_ref()).map_err(mapping_error)?;

        if self.subscriptions.remove(&key).is_none() {
            return Err(CoreError::SubscriptionNotFound(id.to_string()));
        }
        debug!("Terminated event subscription {}", key);
        Ok(())
    }

    async fn create_event(&self, event: &mut Event) -> Result<EventId, CoreError> {
        let record = self
            .mapper
            .to_persisted_event(event)
            .map_err(mapping_error)?;
        let id = identity::to_domain_id(record.event_id);

        match self.events.entry(record.event_id) {
            Entry::Occupied(_) => Err(CoreError::Conflict(record.event_id.to_string())),
            Entry::Vacant(vacant) => {
                debug!("Created event {}", record.event_id);
                vacant.insert(record);
                Ok(id)
            }
        }
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>, CoreError> {
        let key = identity::parse_id(id.as_ref()).map_err(mapping_error)?;

        match self.events.get(&key) {
            Some(record) => {
                let event = self.mapper.to_event(&record).map_err(mapping_error)?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    async fn get_runnable_events(&self, as_at: DateTime<Utc>) -> Result<Vec<EventId>, CoreError> {
        let mut runnable = Vec::new();
        for record in self.events.iter() {
            if !record.is_processed && record.event_time <= as_at {
                runnable.push(identity::to_domain_id(record.event_id));
            }
        }
        Ok(runnable)
    }

    async fn mark_event_processed(&self, id: &EventId) -> Result<(), CoreError> {
        let key = identity::parse_id(id.as_ref()).map_err(mapping_error)?;

        let mut record = self
            .events
            .get_mut(&key)
            .ok_or_else(|| CoreError::EventNotFound(id.to_string()))?;
        record.is_processed = true;
        Ok(())
    }

    async fn mark_event_unprocessed(&self, id: &EventId) -> Result<(), CoreError> {
        let key = identity::parse_id(id.as_ref()).map_err(mapping_error)?;

        let mut record = self
            .events
            .get_mut(&key)
            .ok_or_else(|| CoreError::EventNotFound(id.to_string()))?;
        record.is_processed = false;
        Ok(())
    }
}
