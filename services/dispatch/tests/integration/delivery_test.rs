use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;

use courier_dispatch::domain::types::ChannelError;
use courier_dispatch::error::DispatchError;
use courier_dispatch::usecase::delivery::SendMessageUseCase;
use courier_dispatch::usecase::message::{
    CreateMessageInput, CreateMessageUseCase, ScheduleMessageUseCase,
};
use courier_domain::id::{MessageId, TenantId};
use courier_domain::message::MessageStatus;

use crate::helpers::{
    GatewayCall, MockGateway, MockMessageStore, MockTransactionManager, provider_error,
    test_message,
};

fn sender(
    store: &MockMessageStore,
    gateway: &MockGateway,
) -> SendMessageUseCase<MockTransactionManager, MockGateway> {
    SendMessageUseCase {
        tx: MockTransactionManager::new(store.clone()),
        gateway: gateway.clone(),
    }
}

// ── SendMessageUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_mark_sent_and_commit_when_push_succeeds() {
    let tenant = TenantId::new();
    let message = test_message(tenant, "Clinic closed Friday", MessageStatus::Draft);
    let store = MockMessageStore::new(vec![message.clone()]);
    let gateway = MockGateway::new();
    let usecase = sender(&store, &gateway);

    usecase
        .execute(message.id, &CancellationToken::new())
        .await
        .unwrap();

    let stored = store.get(message.id).unwrap();
    assert_eq!(stored.status, MessageStatus::Sent);
    assert!(stored.sent_at.is_some());
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::Push("Clinic closed Friday\n\nSee you soon".into())]
    );
    assert_eq!(usecase.tx.commit_count(), 1);
    assert_eq!(usecase.tx.rollback_count(), 0);
}

#[tokio::test]
async fn should_commit_failed_status_when_push_fails() {
    let tenant = TenantId::new();
    let message = test_message(tenant, "Flu shots", MessageStatus::Scheduled);
    let store = MockMessageStore::new(vec![message.clone()]);
    let gateway = MockGateway::new().fail_on("Flu", provider_error());
    let usecase = sender(&store, &gateway);

    let result = usecase.execute(message.id, &CancellationToken::new()).await;

    assert!(
        matches!(result, Err(DispatchError::Channel(ChannelError::Provider { status: 500, .. }))),
        "expected Channel(Provider), got {result:?}"
    );
    let stored = store.get(message.id).unwrap();
    assert_eq!(stored.status, MessageStatus::Failed);
    assert!(stored.sent_at.is_none());
    assert_eq!(usecase.tx.commit_count(), 1);
    assert_eq!(usecase.tx.rollback_count(), 0);
}

#[tokio::test]
async fn should_resend_previously_failed_message() {
    let tenant = TenantId::new();
    let message = test_message(tenant, "Reminder", MessageStatus::Failed);
    let store = MockMessageStore::new(vec![message.clone()]);
    let gateway = MockGateway::new();

    sender(&store, &gateway)
        .execute(message.id, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(store.get(message.id).unwrap().status, MessageStatus::Sent);
}

#[tokio::test]
async fn should_reject_already_sent_message_without_calling_gateway() {
    let tenant = TenantId::new();
    let mut message = test_message(tenant, "Done", MessageStatus::Draft);
    message.mark_as_sent(Utc::now() - Duration::hours(1));
    let sent_at = message.sent_at;
    let store = MockMessageStore::new(vec![message.clone()]);
    let gateway = MockGateway::new();
    let usecase = sender(&store, &gateway);

    let result = usecase.execute(message.id, &CancellationToken::new()).await;

    assert!(
        matches!(result, Err(DispatchError::CannotSend)),
        "expected CannotSend, got {result:?}"
    );
    assert!(gateway.calls().is_empty());
    assert_eq!(store.get(message.id).unwrap().sent_at, sent_at);
    assert_eq!(usecase.tx.rollback_count(), 1);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_message() {
    let store = MockMessageStore::default();
    let gateway = MockGateway::new();

    let result = sender(&store, &gateway)
        .execute(MessageId::new(), &CancellationToken::new())
        .await;

    assert!(
        matches!(result, Err(DispatchError::MessageNotFound)),
        "expected MessageNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_hide_message_owned_by_another_tenant() {
    let owner = TenantId::new();
    let message = test_message(owner, "Private", MessageStatus::Draft);
    let store = MockMessageStore::new(vec![message.clone()]);
    let gateway = MockGateway::new();

    let result = sender(&store, &gateway)
        .execute_for_tenant(TenantId::new(), message.id, &CancellationToken::new())
        .await;

    assert!(
        matches!(result, Err(DispatchError::MessageNotFound)),
        "expected MessageNotFound, got {result:?}"
    );
    assert!(gateway.calls().is_empty());
    assert_eq!(store.get(message.id).unwrap().status, MessageStatus::Draft);
}

#[tokio::test]
async fn should_roll_back_and_keep_status_when_cancelled() {
    let tenant = TenantId::new();
    let message = test_message(tenant, "Late", MessageStatus::Scheduled);
    let store = MockMessageStore::new(vec![message.clone()]);
    let gateway = MockGateway::new();
    let usecase = sender(&store, &gateway);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = usecase.execute(message.id, &cancel).await;

    assert!(
        matches!(result, Err(DispatchError::Cancelled)),
        "expected Cancelled, got {result:?}"
    );
    assert_eq!(store.get(message.id).unwrap().status, MessageStatus::Scheduled);
    assert_eq!(usecase.tx.commit_count(), 0);
    assert_eq!(usecase.tx.rollback_count(), 1);
}

#[tokio::test]
async fn should_roll_back_when_sent_status_cannot_be_written() {
    let tenant = TenantId::new();
    let message = test_message(tenant, "Clinic closed Friday", MessageStatus::Draft);
    let store = MockMessageStore::new(vec![message.clone()]);
    let gateway = MockGateway::new();
    let usecase = SendMessageUseCase {
        tx: MockTransactionManager::new(store.clone()).failing_updates(),
        gateway: gateway.clone(),
    };

    let result = usecase.execute(message.id, &CancellationToken::new()).await;

    assert!(
        matches!(result, Err(DispatchError::Internal(_))),
        "expected Internal, got {result:?}"
    );
    assert_eq!(gateway.calls().len(), 1);
    assert_eq!(store.get(message.id).unwrap().status, MessageStatus::Draft);
    assert_eq!(usecase.tx.commit_count(), 0);
    assert_eq!(usecase.tx.rollback_count(), 1);
}

#[tokio::test]
async fn should_roll_back_when_failed_status_cannot_be_written() {
    let tenant = TenantId::new();
    let message = test_message(tenant, "Flu shots", MessageStatus::Scheduled);
    let store = MockMessageStore::new(vec![message.clone()]);
    let gateway = MockGateway::new().fail_on("Flu", provider_error());
    let usecase = SendMessageUseCase {
        tx: MockTransactionManager::new(store.clone()).failing_updates(),
        gateway: gateway.clone(),
    };

    let result = usecase.execute(message.id, &CancellationToken::new()).await;

    assert!(
        matches!(result, Err(DispatchError::Internal(_))),
        "expected Internal, got {result:?}"
    );
    assert_eq!(store.get(message.id).unwrap().status, MessageStatus::Scheduled);
    assert_eq!(usecase.tx.commit_count(), 0);
    assert_eq!(usecase.tx.rollback_count(), 1);
}

// ── CreateMessageUseCase / ScheduleMessageUseCase ────────────────────────────

#[tokio::test]
async fn should_create_draft_message() {
    let tenant = TenantId::new();
    let store = MockMessageStore::default();
    let usecase = CreateMessageUseCase {
        repo: store.clone(),
    };

    let created = usecase
        .execute(
            tenant,
            CreateMessageInput {
                title: "Welcome".into(),
                body: "Hello".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(created.status, MessageStatus::Draft);
    assert_eq!(store.get(created.id).unwrap().tenant_id, tenant);
}

#[tokio::test]
async fn should_reject_blank_title() {
    let usecase = CreateMessageUseCase {
        repo: MockMessageStore::default(),
    };

    let result = usecase
        .execute(
            TenantId::new(),
            CreateMessageInput {
                title: "   ".into(),
                body: "Hello".into(),
            },
        )
        .await;

    assert!(
        matches!(result, Err(DispatchError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

#[tokio::test]
async fn should_schedule_draft_and_commit() {
    let tenant = TenantId::new();
    let message = test_message(tenant, "Tomorrow", MessageStatus::Draft);
    let store = MockMessageStore::new(vec![message.clone()]);
    let usecase = ScheduleMessageUseCase {
        tx: MockTransactionManager::new(store.clone()),
    };
    let at = Utc::now() + Duration::days(1);

    let scheduled = usecase.execute(tenant, message.id, at).await.unwrap();

    assert_eq!(scheduled.status, MessageStatus::Scheduled);
    let stored = store.get(message.id).unwrap();
    assert_eq!(stored.status, MessageStatus::Scheduled);
    assert_eq!(stored.scheduled_at, Some(at));
    assert_eq!(usecase.tx.commit_count(), 1);
}

#[tokio::test]
async fn should_refuse_to_schedule_sent_message() {
    let tenant = TenantId::new();
    let message = test_message(tenant, "Old news", MessageStatus::Sent);
    let store = MockMessageStore::new(vec![message.clone()]);
    let usecase = ScheduleMessageUseCase {
        tx: MockTransactionManager::new(store.clone()),
    };

    let result = usecase.execute(tenant, message.id, Utc::now()).await;

    assert!(
        matches!(result, Err(DispatchError::CannotSend)),
        "expected CannotSend, got {result:?}"
    );
    assert_eq!(store.get(message.id).unwrap().status, MessageStatus::Sent);
    assert_eq!(usecase.tx.rollback_count(), 1);
}
