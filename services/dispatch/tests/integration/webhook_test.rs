use tokio_util::sync::CancellationToken;

use courier_dispatch::domain::types::WebhookSummary;
use courier_dispatch::error::DispatchError;
use courier_dispatch::usecase::auto_reply::{
    CreateRuleUseCase, DeleteRuleUseCase, ListRulesUseCase, UpdateRuleUseCase,
};
use courier_dispatch::usecase::signature::WebhookVerifier;
use courier_dispatch::usecase::webhook::ProcessWebhookUseCase;
use courier_domain::auto_reply::{MatchMode, NewRule, RuleKind, RuleUpdate};
use courier_domain::id::TenantId;
use courier_testing::fixture::Fixture;
use courier_testing::signature::sign_body;

use crate::helpers::{
    GatewayCall, MockGateway, MockRuleRepo, MockTenantDirectory, TEST_CHANNEL_SECRET,
    follow_rule, keyword_rule, provider_error, test_tenant,
};

type Processor = ProcessWebhookUseCase<MockTenantDirectory, MockRuleRepo, MockGateway>;

fn processor(tenant_id: TenantId, rules: MockRuleRepo, gateway: &MockGateway) -> Processor {
    let mut tenant = test_tenant();
    tenant.id = tenant_id;
    ProcessWebhookUseCase {
        verifier: WebhookVerifier::new(Some(TEST_CHANNEL_SECRET.into())),
        tenants: MockTenantDirectory {
            tenants: vec![tenant],
        },
        rules,
        gateway: gateway.clone(),
    }
}

async fn deliver(processor: &Processor, body: &[u8]) -> Result<WebhookSummary, DispatchError> {
    let signature = sign_body(TEST_CHANNEL_SECRET, body);
    processor
        .execute(Some(&signature), body, &CancellationToken::new())
        .await
}

// ── ProcessWebhookUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_reply_to_follow_with_first_follow_rule() {
    let tenant = TenantId::new();
    let rules = MockRuleRepo::new(vec![
        follow_rule(tenant, 2, "second welcome"),
        follow_rule(tenant, 1, "welcome aboard"),
    ]);
    let gateway = MockGateway::new();
    let body = Fixture::bytes("contracts/webhook/follow.json");

    let summary = deliver(&processor(tenant, rules, &gateway), &body)
        .await
        .unwrap();

    assert_eq!(summary.replied, 1);
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::Reply {
            token: "nHuyWiB7yP5Zw52FIkcQobQuGDXCTA".into(),
            text: "welcome aboard".into(),
        }]
    );
}

#[tokio::test]
async fn should_pick_lowest_priority_keyword_rule() {
    let tenant = TenantId::new();
    let rules = MockRuleRepo::new(vec![
        keyword_rule(tenant, 3, &["fee"], MatchMode::Exact, "reply-3"),
        keyword_rule(tenant, 1, &["fee"], MatchMode::Exact, "reply-1"),
        keyword_rule(tenant, 2, &["fee"], MatchMode::Exact, "reply-2"),
    ]);
    let gateway = MockGateway::new();
    let body = Fixture::bytes("contracts/webhook/text_message.json");

    deliver(&processor(tenant, rules, &gateway), &body)
        .await
        .unwrap();

    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::Reply {
            token: "0f3779fba3b349968c5d07db31eab56f".into(),
            text: "reply-1".into(),
        }]
    );
}

#[tokio::test]
async fn should_not_reply_when_exact_rule_sees_longer_text() {
    let tenant = TenantId::new();
    let exact = MockRuleRepo::new(vec![keyword_rule(
        tenant,
        1,
        &["fee"],
        MatchMode::Exact,
        "prices",
    )]);
    let gateway = MockGateway::new();
    let body = Fixture::bytes("contracts/webhook/mixed_batch.json");

    let summary = deliver(&processor(tenant, exact, &gateway), &body)
        .await
        .unwrap();

    assert_eq!(summary.replied, 0);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn should_skip_bad_events_and_answer_the_rest() {
    let tenant = TenantId::new();
    let rules = MockRuleRepo::new(vec![keyword_rule(
        tenant,
        1,
        &["fee"],
        MatchMode::Partial,
        "see our price list",
    )]);
    let gateway = MockGateway::new();
    let body = Fixture::bytes("contracts/webhook/mixed_batch.json");

    let summary = deliver(&processor(tenant, rules, &gateway), &body)
        .await
        .unwrap();

    assert_eq!(
        summary,
        WebhookSummary {
            events: 4,
            replied: 1,
            ignored: 2,
            failed: 1,
        }
    );
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::Reply {
            token: "c8d2b4d3e1fa5b6f9f1e5dac2b3f4f5e".into(),
            text: "see our price list".into(),
        }]
    );
}

#[tokio::test]
async fn should_count_failed_reply_without_failing_callback() {
    let tenant = TenantId::new();
    let rules = MockRuleRepo::new(vec![follow_rule(tenant, 1, "welcome")]);
    let gateway = MockGateway::new().fail_on("welcome", provider_error());
    let body = Fixture::bytes("contracts/webhook/follow.json");

    let summary = deliver(&processor(tenant, rules, &gateway), &body)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.replied, 0);
}

#[tokio::test]
async fn should_reject_signature_from_wrong_secret() {
    let tenant = TenantId::new();
    let gateway = MockGateway::new();
    let body = Fixture::bytes("contracts/webhook/follow.json");
    let signature = sign_body("not-the-secret", &body);

    let result = processor(tenant, MockRuleRepo::default(), &gateway)
        .execute(Some(&signature), &body, &CancellationToken::new())
        .await;

    assert!(
        matches!(result, Err(DispatchError::InvalidSignature)),
        "expected InvalidSignature, got {result:?}"
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn should_reject_missing_signature_when_secret_configured() {
    let tenant = TenantId::new();
    let body = Fixture::bytes("contracts/webhook/follow.json");

    let result = processor(tenant, MockRuleRepo::default(), &MockGateway::new())
        .execute(None, &body, &CancellationToken::new())
        .await;

    assert!(
        matches!(result, Err(DispatchError::InvalidSignature)),
        "expected InvalidSignature, got {result:?}"
    );
}

#[tokio::test]
async fn should_accept_unsigned_callback_without_secret() {
    let tenant = TenantId::new();
    let gateway = MockGateway::new();
    let mut usecase = processor(
        tenant,
        MockRuleRepo::new(vec![follow_rule(tenant, 1, "hi")]),
        &gateway,
    );
    usecase.verifier = WebhookVerifier::new(None);
    let body = Fixture::bytes("contracts/webhook/follow.json");

    let summary = usecase
        .execute(None, &body, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.replied, 1);
}

#[tokio::test]
async fn should_reject_unknown_destination() {
    let gateway = MockGateway::new();
    let usecase = ProcessWebhookUseCase {
        verifier: WebhookVerifier::new(Some(TEST_CHANNEL_SECRET.into())),
        tenants: MockTenantDirectory { tenants: vec![] },
        rules: MockRuleRepo::default(),
        gateway: gateway.clone(),
    };
    let body = Fixture::bytes("contracts/webhook/follow.json");

    let result = deliver(&usecase, &body).await;

    assert!(
        matches!(result, Err(DispatchError::TenantNotFound)),
        "expected TenantNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_malformed_body() {
    let tenant = TenantId::new();
    let body = br#"{"events": "#;

    let result = deliver(
        &processor(tenant, MockRuleRepo::default(), &MockGateway::new()),
        body,
    )
    .await;

    assert!(
        matches!(result, Err(DispatchError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

#[tokio::test]
async fn should_accept_null_events_as_empty_batch() {
    let tenant = TenantId::new();
    let body = br#"{"destination":"U0channel0000000000000000000000001","events":null}"#;
    let gateway = MockGateway::new();

    let result = deliver(
        &processor(tenant, MockRuleRepo::new(vec![follow_rule(tenant, 1, "hi")]), &gateway),
        body,
    )
    .await;

    assert!(
        matches!(result, Ok(WebhookSummary { events: 0, replied: 0, failed: 0, .. })),
        "expected empty summary, got {result:?}"
    );
    assert!(gateway.calls().is_empty());
}

// ── CreateRuleUseCase / ListRulesUseCase ─────────────────────────────────────

#[tokio::test]
async fn should_list_created_rules_by_priority() {
    let tenant = TenantId::new();
    let repo = MockRuleRepo::default();
    let create = CreateRuleUseCase { repo: repo.clone() };
    for (name, priority) in [("late", 5), ("early", 1)] {
        create
            .execute(
                tenant,
                NewRule {
                    kind: RuleKind::Keyword,
                    name: name.into(),
                    keywords: vec!["hours".into()],
                    match_mode: None,
                    reply_message: "9 to 5".into(),
                    priority,
                },
            )
            .await
            .unwrap();
    }

    let rules = ListRulesUseCase { repo }.execute(tenant).await.unwrap();

    let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["early", "late"]);
    assert!(rules.iter().all(|r| r.match_mode == Some(MatchMode::Exact)));
}

#[tokio::test]
async fn should_reject_keyword_rule_without_keywords() {
    let create = CreateRuleUseCase {
        repo: MockRuleRepo::default(),
    };

    let result = create
        .execute(
            TenantId::new(),
            NewRule {
                kind: RuleKind::Keyword,
                name: "empty".into(),
                keywords: vec![],
                match_mode: Some(MatchMode::Partial),
                reply_message: "never".into(),
                priority: 0,
            },
        )
        .await;

    assert!(
        matches!(result, Err(DispatchError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

// ── UpdateRuleUseCase / DeleteRuleUseCase ────────────────────────────────────

#[tokio::test]
async fn should_stop_replying_once_rule_disabled() {
    let tenant = TenantId::new();
    let rule = keyword_rule(tenant, 1, &["fee"], MatchMode::Exact, "see our price list");
    let rule_id = rule.id;
    let rules = MockRuleRepo::new(vec![rule]);
    let body = Fixture::bytes("contracts/webhook/text_message.json");

    let updated = UpdateRuleUseCase {
        repo: rules.clone(),
    }
    .execute(
        tenant,
        rule_id,
        RuleUpdate {
            is_enabled: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(!updated.is_enabled);

    let gateway = MockGateway::new();
    let summary = deliver(&processor(tenant, rules, &gateway), &body)
        .await
        .unwrap();

    assert_eq!(summary.replied, 0);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn should_reply_with_edited_keywords_and_message() {
    let tenant = TenantId::new();
    let rule = keyword_rule(tenant, 1, &["price"], MatchMode::Exact, "old reply");
    let rule_id = rule.id;
    let rules = MockRuleRepo::new(vec![rule]);

    UpdateRuleUseCase {
        repo: rules.clone(),
    }
    .execute(
        tenant,
        rule_id,
        RuleUpdate {
            keywords: Some(vec!["fee".into()]),
            reply_message: Some("new reply".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let gateway = MockGateway::new();
    let body = Fixture::bytes("contracts/webhook/text_message.json");
    deliver(&processor(tenant, rules, &gateway), &body)
        .await
        .unwrap();

    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::Reply {
            token: "0f3779fba3b349968c5d07db31eab56f".into(),
            text: "new reply".into(),
        }]
    );
}

#[tokio::test]
async fn should_keep_rule_when_update_empties_keywords() {
    let tenant = TenantId::new();
    let rule = keyword_rule(tenant, 1, &["fee"], MatchMode::Exact, "see our price list");
    let rule_id = rule.id;
    let repo = MockRuleRepo::new(vec![rule.clone()]);

    let result = UpdateRuleUseCase { repo: repo.clone() }
        .execute(
            tenant,
            rule_id,
            RuleUpdate {
                keywords: Some(vec!["  ".into()]),
                ..Default::default()
            },
        )
        .await;

    assert!(
        matches!(result, Err(DispatchError::Validation(_))),
        "expected Validation, got {result:?}"
    );
    assert_eq!(repo.rules.lock().unwrap()[0], rule);
}

#[tokio::test]
async fn should_hide_other_tenants_rule_from_update_and_delete() {
    let owner = TenantId::new();
    let rule = follow_rule(owner, 1, "welcome");
    let rule_id = rule.id;
    let repo = MockRuleRepo::new(vec![rule]);
    let intruder = TenantId::new();

    let result = UpdateRuleUseCase { repo: repo.clone() }
        .execute(
            intruder,
            rule_id,
            RuleUpdate {
                name: Some("hijacked".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(
        matches!(result, Err(DispatchError::RuleNotFound)),
        "expected RuleNotFound, got {result:?}"
    );

    let result = DeleteRuleUseCase { repo: repo.clone() }
        .execute(intruder, rule_id)
        .await;
    assert!(
        matches!(result, Err(DispatchError::RuleNotFound)),
        "expected RuleNotFound, got {result:?}"
    );
    assert_eq!(repo.rules.lock().unwrap()[0].name, "follow-1");
}

#[tokio::test]
async fn should_delete_rule_and_stop_replying() {
    let tenant = TenantId::new();
    let rule = follow_rule(tenant, 1, "welcome");
    let rule_id = rule.id;
    let rules = MockRuleRepo::new(vec![rule]);
    let delete = DeleteRuleUseCase {
        repo: rules.clone(),
    };

    delete.execute(tenant, rule_id).await.unwrap();
    let again = delete.execute(tenant, rule_id).await;
    assert!(
        matches!(again, Err(DispatchError::RuleNotFound)),
        "expected RuleNotFound, got {again:?}"
    );

    let gateway = MockGateway::new();
    let body = Fixture::bytes("contracts/webhook/follow.json");
    let summary = deliver(&processor(tenant, rules, &gateway), &body)
        .await
        .unwrap();
    assert_eq!(summary.replied, 0);
    assert!(gateway.calls().is_empty());
}
