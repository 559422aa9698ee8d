//! Entity mappers between domain objects and persisted records
//!
//! Saving converts a domain object into a persisted record, reusing an
//! existing record when one is supplied: scalar fields are fully
//! overwritten, nested collections are reconciled by key, and identifiers
//! missing on the domain side are generated and written back. Loading is
//! always a full rebuild of a fresh domain object.

use std::collections::HashMap;
use std::sync::Arc;

use sluice_core::{
    Event, EventSubscription, ExecutionError, ExecutionPointer, Payload, WorkflowInstance,
};

use crate::codec::PayloadCodec;
use crate::error::PersistenceError;
use crate::identity::{self, IdGenerator, UuidGenerator};
use crate::model::{
    PersistedEvent, PersistedExecutionError, PersistedExecutionPointer,
    PersistedExtensionAttribute, PersistedSubscription, PersistedWorkflow,
};
use crate::reconcile;

/// Converts workflow entities between their domain and persisted forms
///
/// The mapper is synchronous and performs no I/O. It is not internally
/// synchronized: callers must not run two conversions against the same
/// persisted record concurrently (storage backends typically hold a
/// per-record lock around the load-map-store cycle).
pub struct WorkflowMapper {
    codec: Arc<PayloadCodec>,
    ids: Arc<dyn IdGenerator>,
}

impl WorkflowMapper {
    /// Create a mapper over the given codec, generating random v4
    /// identifiers
    pub fn new(codec: Arc<PayloadCodec>) -> Self {
        Self::with_id_generator(codec, Arc::new(UuidGenerator))
    }

    /// Create a mapper with an explicit identifier generator
    pub fn with_id_generator(codec: Arc<PayloadCodec>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { codec, ids }
    }

    /// Convert a workflow instance to its persisted form
    ///
    /// With `existing` supplied, its execution pointer collection is
    /// carried over and reconciled against the instance's pointers;
    /// persisted pointers absent from the instance survive untouched.
    /// Without it a new record is allocated. An instance persisted for
    /// the first time (and any pointer or error without an identifier)
    /// gets a generated identifier written back into the domain object.
    pub fn to_persisted(
        &self,
        instance: &mut WorkflowInstance,
        existing: Option<PersistedWorkflow>,
    ) -> Result<PersistedWorkflow, PersistenceError> {
        let instance_id = identity::to_storage_id(&mut instance.id, self.ids.as_ref())?;

        let mut pointers = existing
            .map(|record| record.execution_pointers)
            .unwrap_or_default();
        self.merge_pointers(&mut pointers, &mut instance.execution_pointers)?;

        Ok(PersistedWorkflow {
            instance_id,
            workflow_definition_id: instance.workflow_definition_id.clone(),
            version: instance.version,
            description: instance.description.clone(),
            status: instance.status,
            data: self.codec.encode(&instance.data)?,
            create_time: instance.create_time,
            complete_time: instance.complete_time,
            next_execution: instance.next_execution,
            execution_pointers: pointers,
        })
    }

    /// Rebuild a workflow instance from its persisted form
    pub fn to_workflow_instance(
        &self,
        record: &PersistedWorkflow,
    ) -> Result<WorkflowInstance, PersistenceError> {
        let mut pointers = Vec::with_capacity(record.execution_pointers.len());
        for persisted in &record.execution_pointers {
            pointers.push(self.hydrate_pointer(persisted)?);
        }

        Ok(WorkflowInstance {
            id: Some(identity::to_domain_id(record.instance_id)),
            workflow_definition_id: record.workflow_definition_id.clone(),
            version: record.version,
            description: record.description.clone(),
            status: record.status,
            data: self.codec.decode(&record.data)?,
            create_time: record.create_time,
            complete_time: record.complete_time,
            next_execution: record.next_execution,
            execution_pointers: pointers,
        })
    }

    /// Convert an event subscription to its persisted form
    pub fn to_persisted_subscription(
        &self,
        subscription: &mut EventSubscription,
    ) -> Result<PersistedSubscription, PersistenceError> {
        Ok(PersistedSubscription {
            subscription_id: identity::to_storage_id(&mut subscription.id, self.ids.as_ref())?,
            event_key: subscription.event_key.clone(),
            event_name: subscription.event_name.clone(),
            step_id: subscription.step_id,
            workflow_id: subscription.workflow_id.clone(),
            subscribe_as_of: subscription.subscribe_as_of,
        })
    }

    /// Rebuild an event subscription from its persisted form
    pub fn to_event_subscription(&self, record: &PersistedSubscription) -> EventSubscription {
        EventSubscription {
            id: Some(identity::to_domain_id(record.subscription_id)),
            event_key: record.event_key.clone(),
            event_name: record.event_name.clone(),
            step_id: record.step_id,
            workflow_id: record.workflow_id.clone(),
            subscribe_as_of: record.subscribe_as_of,
        }
    }

    /// Convert an event to its persisted form
    pub fn to_persisted_event(&self, event: &mut Event) -> Result<PersistedEvent, PersistenceError> {
        Ok(PersistedEvent {
            event_id: identity::to_storage_id(&mut event.id, self.ids.as_ref())?,
            event_key: event.event_key.clone(),
            event_name: event.event_name.clone(),
            event_time: event.event_time,
            is_processed: event.is_processed,
            event_data: self.codec.encode(&event.event_data)?,
        })
    }

    /// Rebuild an event from its persisted form
    pub fn to_event(&self, record: &PersistedEvent) -> Result<Event, PersistenceError> {
        Ok(Event {
            id: Some(identity::to_domain_id(record.event_id)),
            event_key: record.event_key.clone(),
            event_name: record.event_name.clone(),
            event_time: record.event_time,
            is_processed: record.is_processed,
            event_data: self.codec.decode(&record.event_data)?,
        })
    }

    fn merge_pointers(
        &self,
        existing: &mut Vec<PersistedExecutionPointer>,
        incoming: &mut [ExecutionPointer],
    ) -> Result<(), PersistenceError> {
        reconcile::merge_keyed(
            existing,
            incoming.iter_mut(),
            |slot| slot.id,
            |pointer| identity::to_storage_id(&mut pointer.id, self.ids.as_ref()),
            |slot, pointer| self.apply_pointer(slot, pointer),
            |id, pointer| {
                let mut slot = PersistedExecutionPointer::new(id);
                self.apply_pointer(&mut slot, pointer)?;
                Ok(slot)
            },
        )
    }

    /// Overwrite a persisted pointer's scalars and reconcile its nested
    /// collections from the domain pointer
    fn apply_pointer(
        &self,
        slot: &mut PersistedExecutionPointer,
        pointer: &mut ExecutionPointer,
    ) -> Result<(), PersistenceError> {
        slot.step_id = pointer.step_id;
        slot.step_name = pointer.step_name.clone();
        slot.active = pointer.active;
        slot.sleep_until = pointer.sleep_until;
        slot.start_time = pointer.start_time;
        slot.end_time = pointer.end_time;
        slot.event_name = pointer.event_name.clone();
        slot.event_key = pointer.event_key.clone();
        slot.event_published = pointer.event_published;
        slot.concurrent_fork = pointer.concurrent_fork;
        slot.path_terminator = pointer.path_terminator;
        slot.persistence_data = self.codec.encode(&pointer.persistence_data)?;
        slot.event_data = self.codec.encode(&pointer.event_data)?;

        self.merge_attributes(&mut slot.extension_attributes, &pointer.extension_attributes)?;
        self.merge_errors(&mut slot.errors, &mut pointer.errors)?;

        Ok(())
    }

    fn merge_attributes(
        &self,
        existing: &mut Vec<PersistedExtensionAttribute>,
        incoming: &HashMap<String, Payload>,
    ) -> Result<(), PersistenceError> {
        reconcile::merge_keyed(
            existing,
            incoming.iter(),
            |slot| slot.attribute_key.clone(),
            |(key, _)| Ok(key.to_string()),
            |slot, (_, value)| {
                slot.attribute_value = self.codec.encode(value)?;
                Ok(())
            },
            |key, (_, value)| {
                Ok(PersistedExtensionAttribute {
                    attribute_key: key,
                    attribute_value: self.codec.encode(value)?,
                })
            },
        )
    }

    fn merge_errors(
        &self,
        existing: &mut Vec<PersistedExecutionError>,
        incoming: &mut [ExecutionError],
    ) -> Result<(), PersistenceError> {
        // Persisted errors are an immutable audit trail: a match is left
        // untouched, only unseen errors are appended.
        reconcile::merge_keyed(
            existing,
            incoming.iter_mut(),
            |slot| slot.id,
            |error| identity::to_storage_id(&mut error.id, self.ids.as_ref()),
            |_slot, _error| Ok(()),
            |id, error| {
                Ok(PersistedExecutionError {
                    id,
                    error_time: error.error_time,
                    message: error.message.clone(),
                })
            },
        )
    }

    fn hydrate_pointer(
        &self,
        persisted: &PersistedExecutionPointer,
    ) -> Result<ExecutionPointer, PersistenceError> {
        let mut extension_attributes = HashMap::with_capacity(persisted.extension_attributes.len());
        for attribute in &persisted.extension_attributes {
            extension_attributes.insert(
                attribute.attribute_key.clone(),
                self.codec.decode(&attribute.attribute_value)?,
            );
        }

        let errors = persisted
            .errors
            .iter()
            .map(|error| ExecutionError {
                id: Some(identity::to_domain_id(error.id)),
                error_time: error.error_time,
                message: error.message.clone(),
            })
            .collect();

        Ok(ExecutionPointer {
            id: Some(identity::to_domain_id(persisted.id)),
            step_id: persisted.step_id,
            step_name: persisted.step_name.clone(),
            active: persisted.active,
            sleep_until: persisted.sleep_until,
            start_time: persisted.start_time,
            end_time: persisted.end_time,
            event_name: persisted.event_name.clone(),
            event_key: persisted.event_key.clone(),
            event_published: persisted.event_published,
            concurrent_fork: persisted.concurrent_fork,
            path_terminator: persisted.path_terminator,
            persistence_data: self.codec.decode(&persisted.persistence_data)?,
            event_data: self.codec.decode(&persisted.event_data)?,
            extension_attributes,
            errors,
        })
    }
}
