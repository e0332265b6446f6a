use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use courier_core::identity::TenantIdentity;
use courier_domain::auto_reply::{AutoReplyRule, MatchMode, NewRule, RuleKind, RuleUpdate};
use courier_domain::id::RuleId;

use crate::error::DispatchError;
use crate::state::AppState;
use crate::usecase::auto_reply::{
    CreateRuleUseCase, DeleteRuleUseCase, ListRulesUseCase, UpdateRuleUseCase,
};

#[derive(Serialize)]
pub struct RuleResponse {
    pub id: String,
    pub rule_type: RuleKind,
    pub name: String,
    pub keywords: Vec<String>,
    pub match_type: Option<MatchMode>,
    pub reply_message: String,
    pub is_enabled: bool,
    pub priority: i32,
    #[serde(serialize_with = "courier_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "courier_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<AutoReplyRule> for RuleResponse {
    fn from(r: AutoReplyRule) -> Self {
        Self {
            id: r.id.to_string(),
            rule_type: r.kind,
            name: r.name,
            keywords: r.keywords,
            match_type: r.match_mode,
            reply_message: r.reply_message,
            is_enabled: r.is_enabled,
            priority: r.priority,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// ── POST /auto-reply/rules ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub rule_type: RuleKind,
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub match_type: Option<MatchMode>,
    pub reply_message: String,
    #[serde(default)]
    pub priority: i32,
}

pub async fn create_rule(
    identity: TenantIdentity,
    State(state): State<AppState>,
    Json(body): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<RuleResponse>), DispatchError> {
    let usecase = CreateRuleUseCase {
        repo: state.rule_repo(),
    };
    let rule = usecase
        .execute(
            identity.tenant_id,
            NewRule {
                kind: body.rule_type,
                name: body.name,
                keywords: body.keywords,
                match_mode: body.match_type,
                reply_message: body.reply_message,
                priority: body.priority,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(rule.into())))
}

// ── GET /auto-reply/rules ────────────────────────────────────────────────────

pub async fn list_rules(
    identity: TenantIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<RuleResponse>>, DispatchError> {
    let usecase = ListRulesUseCase {
        repo: state.rule_repo(),
    };
    let rules = usecase.execute(identity.tenant_id).await?;
    Ok(Json(rules.into_iter().map(Into::into).collect()))
}

// ── PATCH /auto-reply/rules/{id} ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub name: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub match_type: Option<MatchMode>,
    pub reply_message: Option<String>,
    pub is_enabled: Option<bool>,
    pub priority: Option<i32>,
}

pub async fn update_rule(
    identity: TenantIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRuleRequest>,
) -> Result<Json<RuleResponse>, DispatchError> {
    let usecase = UpdateRuleUseCase {
        repo: state.rule_repo(),
    };
    let rule = usecase
        .execute(
            identity.tenant_id,
            RuleId(id),
            RuleUpdate {
                name: body.name,
                keywords: body.keywords,
                match_mode: body.match_type,
                reply_message: body.reply_message,
                is_enabled: body.is_enabled,
                priority: body.priority,
            },
        )
        .await?;
    Ok(Json(rule.into()))
}

// ── DELETE /auto-reply/rules/{id} ────────────────────────────────────────────

pub async fn delete_rule(
    identity: TenantIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DispatchError> {
    let usecase = DeleteRuleUseCase {
        repo: state.rule_repo(),
    };
    usecase.execute(identity.tenant_id, RuleId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
