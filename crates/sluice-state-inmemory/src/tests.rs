use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

use sluice_core::{
    CoreError, Event, EventSubscription, ExecutionError, ExecutionPointer, InstanceId, Payload,
    PayloadData, PersistenceProvider, WorkflowInstance, WorkflowStatus,
};
use sluice_persistence::{PayloadCodec, PayloadRegistry};

use crate::InMemoryPersistenceProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OrderData {
    order_id: u64,
    total: i64,
}

impl PayloadData for OrderData {
    const TYPE_NAME: &'static str = "tests.OrderData";
}

fn provider() -> InMemoryPersistenceProvider {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut registry = PayloadRegistry::new();
    registry.register::<OrderData>();
    InMemoryPersistenceProvider::new(Arc::new(PayloadCodec::new(registry)))
}

fn sample_instance() -> WorkflowInstance {
    let mut instance = WorkflowInstance::new(
        "order-flow",
        1,
        Payload::of(&OrderData {
            order_id: 42,
            total: 1999,
        })
        .unwrap(),
    );
    let mut pointer = ExecutionPointer::new(0);
    pointer.step_name = Some("reserve-stock".to_string());
    instance.execution_pointers.push(pointer);
    instance
}

#[tokio::test]
async fn test_create_and_get_workflow_instance() -> Result<(), CoreError> {
    let provider = provider();
    let mut instance = sample_instance();

    let id = provider.create_new_workflow(&mut instance).await?;
    assert_eq!(instance.id.as_ref(), Some(&id));

    let loaded = provider.get_workflow_instance(&id).await?;
    assert_eq!(loaded, Some(instance));

    Ok(())
}

#[tokio::test]
async fn test_get_unknown_instance_returns_none() -> Result<(), CoreError> {
    let provider = provider();
    let id = InstanceId("00000000-0000-0000-0000-00000000beef".to_string());

    assert!(provider.get_workflow_instance(&id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_get_with_malformed_id_fails() {
    let provider = provider();
    let id = InstanceId("definitely-not-a-uuid".to_string());

    match provider.get_workflow_instance(&id).await {
        Err(CoreError::Mapping(msg)) => assert!(msg.contains("Invalid identifier")),
        other => panic!("Expected Mapping error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_duplicate_workflow_conflicts() -> Result<(), CoreError> {
    let provider = provider();
    let mut instance = sample_instance();

    provider.create_new_workflow(&mut instance).await?;

    // Second create with the now-assigned identifier collides
    let result = provider.create_new_workflow(&mut instance).await;
    assert!(matches!(result, Err(CoreError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn test_persist_reconciles_into_stored_record() -> Result<(), CoreError> {
    let provider = provider();
    let mut instance = sample_instance();

    let id = provider.create_new_workflow(&mut instance).await?;

    // Progress the workflow: finish the first step, record an error on it,
    // open a second pointer
    instance.status = WorkflowStatus::Suspended;
    instance.execution_pointers[0].active = false;
    instance.execution_pointers[0]
        .errors
        .push(ExecutionError::new("transient failure"));
    instance.execution_pointers.push(ExecutionPointer::new(1));

    provider.persist_workflow(&mut instance).await?;

    let loaded = provider.get_workflow_instance(&id).await?.unwrap();
    assert_eq!(loaded, instance);

    // A later save that no longer carries the first pointer leaves it in
    // the stored record
    instance.execution_pointers.remove(0);
    provider.persist_workflow(&mut instance).await?;

    let retained = provider.get_workflow_instance(&id).await?.unwrap();
    assert_eq!(retained.execution_pointers.len(), 2);
    assert_eq!(retained.execution_pointers[0].errors.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_persist_unknown_instance_fails() {
    let provider = provider();
    let mut instance = sample_instance();
    instance.id = Some(InstanceId(
        "00000000-0000-0000-0000-00000000dead".to_string(),
    ));

    let result = provider.persist_workflow(&mut instance).await;
    assert!(matches!(result, Err(CoreError::WorkflowNotFound(_))));
}

#[tokio::test]
async fn test_runnable_instances_respect_due_time() -> Result<(), CoreError> {
    let provider = provider();
    let now = Utc::now();

    let mut due = sample_instance();
    due.next_execution = Some(now - Duration::minutes(1));
    let due_id = provider.create_new_workflow(&mut due).await?;

    let mut later = sample_instance();
    later.next_execution = Some(now + Duration::hours(1));
    provider.create_new_workflow(&mut later).await?;

    let mut complete = sample_instance();
    complete.status = WorkflowStatus::Complete;
    complete.next_execution = Some(now - Duration::minutes(1));
    provider.create_new_workflow(&mut complete).await?;

    let runnable = provider.get_runnable_instances(now).await?;
    assert_eq!(runnable, vec![due_id]);

    Ok(())
}

#[tokio::test]
async fn test_subscription_lifecycle() -> Result<(), CoreError> {
    let provider = provider();
    let now = Utc::now();

    let mut subscription = EventSubscription::new("wf-1", 2, "payment_received", "order-42");
    let id = provider.create_event_subscription(&mut subscription).await?;

    let found = provider
        .get_subscriptions("payment_received", "order-42", now + Duration::seconds(1))
        .await?;
    assert_eq!(found, vec![subscription.clone()]);

    // Wrong key, wrong name, or an as-of before the subscription all miss
    assert!(provider
        .get_subscriptions("payment_received", "order-43", now)
        .await?
        .is_empty());
    assert!(provider
        .get_subscriptions("order_shipped", "order-42", now)
        .await?
        .is_empty());
    assert!(provider
        .get_subscriptions(
            "payment_received",
            "order-42",
            subscription.subscribe_as_of - Duration::seconds(1)
        )
        .await?
        .is_empty());

    provider.terminate_subscription(&id).await?;
    assert!(provider
        .get_subscriptions("payment_received", "order-42", now + Duration::seconds(1))
        .await?
        .is_empty());

    let result = provider.terminate_subscription(&id).await;
    assert!(matches!(result, Err(CoreError::SubscriptionNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_event_lifecycle() -> Result<(), CoreError> {
    let provider = provider();
    let now = Utc::now();

    let mut event = Event::new(
        "payment_received",
        "order-42",
        Payload::of(&OrderData {
            order_id: 42,
            total: 1999,
        })
        .unwrap(),
    );
    let id = provider.create_event(&mut event).await?;

    let loaded = provider.get_event(&id).await?;
    assert_eq!(loaded, Some(event));

    let runnable = provider
        .get_runnable_events(now + Duration::seconds(1))
        .await?;
    assert_eq!(runnable, vec![id.clone()]);

    provider.mark_event_processed(&id).await?;
    assert!(provider
        .get_runnable_events(now + Duration::seconds(1))
        .await?
        .is_empty());

    provider.mark_event_unprocessed(&id).await?;
    let runnable = provider
        .get_runnable_events(now + Duration::seconds(1))
        .await?;
    assert_eq!(runnable, vec![id]);

    Ok(())
}
