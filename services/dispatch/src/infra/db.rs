use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use courier_dispatch_schema::{auto_reply_rules, messages, tenants};
use courier_domain::auto_reply::{AutoReplyRule, MatchMode, RuleKind};
use courier_domain::id::{MessageId, RuleId, TenantId};
use courier_domain::message::{Message, MessageStatus};
use courier_domain::pagination::PageRequest;

use crate::domain::repository::{
    AutoReplyRuleRepository, MessageRepository, TenantDirectory, TransactionManager,
    TransactionScope,
};
use crate::domain::types::Tenant;
use crate::error::DispatchError;

// ── Message repository ───────────────────────────────────────────────────────

/// Message repository over a connection or an open transaction.
#[derive(Clone)]
pub struct DbMessageRepository<C = DatabaseConnection> {
    pub conn: C,
}

impl<C: ConnectionTrait + Send + Sync> MessageRepository for DbMessageRepository<C> {
    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, DispatchError> {
        let model = messages::Entity::find_by_id(id.0)
            .one(&self.conn)
            .await
            .context("find message by id")?;
        Ok(model.map(message_from_model).transpose()?)
    }

    async fn find_by_id_for_update(
        &self,
        id: MessageId,
    ) -> Result<Option<Message>, DispatchError> {
        let model = messages::Entity::find_by_id(id.0)
            .lock_exclusive()
            .one(&self.conn)
            .await
            .context("lock message by id")?;
        Ok(model.map(message_from_model).transpose()?)
    }

    async fn create(&self, message: &Message) -> Result<(), DispatchError> {
        messages::ActiveModel {
            id: Set(message.id.0),
            tenant_id: Set(message.tenant_id.0),
            title: Set(message.title.clone()),
            body: Set(message.body.clone()),
            status: Set(message.status.as_str().to_owned()),
            scheduled_at: Set(message.scheduled_at),
            sent_at: Set(message.sent_at),
            created_at: Set(message.created_at),
            updated_at: Set(message.updated_at),
        }
        .insert(&self.conn)
        .await
        .context("create message")?;
        Ok(())
    }

    async fn update(&self, message: &Message) -> Result<(), DispatchError> {
        messages::ActiveModel {
            id: Set(message.id.0),
            title: Set(message.title.clone()),
            body: Set(message.body.clone()),
            status: Set(message.status.as_str().to_owned()),
            scheduled_at: Set(message.scheduled_at),
            sent_at: Set(message.sent_at),
            updated_at: Set(message.updated_at),
            ..Default::default()
        }
        .update(&self.conn)
        .await
        .context("update message")?;
        Ok(())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        page: PageRequest,
    ) -> Result<Vec<Message>, DispatchError> {
        let page = page.clamped();
        let models = messages::Entity::find()
            .filter(messages::Column::TenantId.eq(tenant_id.0))
            .order_by_desc(messages::Column::CreatedAt)
            .offset(page.offset())
            .limit(u64::from(page.per_page))
            .all(&self.conn)
            .await
            .context("list messages")?;
        Ok(models
            .into_iter()
            .map(message_from_model)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Message>, DispatchError> {
        let models = messages::Entity::find()
            .filter(messages::Column::Status.eq(MessageStatus::Scheduled.as_str()))
            .filter(messages::Column::ScheduledAt.lte(now))
            .order_by_asc(messages::Column::ScheduledAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("find due messages")?;
        Ok(models
            .into_iter()
            .map(message_from_model)
            .collect::<anyhow::Result<_>>()?)
    }
}

fn message_from_model(model: messages::Model) -> anyhow::Result<Message> {
    let status = model
        .status
        .parse::<MessageStatus>()
        .with_context(|| format!("message {}", model.id))?;
    Ok(Message {
        id: MessageId(model.id),
        tenant_id: TenantId(model.tenant_id),
        title: model.title,
        body: model.body,
        status,
        scheduled_at: model.scheduled_at,
        sent_at: model.sent_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Transactions ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTransactionManager {
    pub db: DatabaseConnection,
}

impl TransactionManager for DbTransactionManager {
    type Tx = DbMessageRepository<DatabaseTransaction>;

    async fn begin(&self) -> Result<Self::Tx, DispatchError> {
        let conn = self.db.begin().await.context("begin transaction")?;
        Ok(DbMessageRepository { conn })
    }
}

impl TransactionScope for DbMessageRepository<DatabaseTransaction> {
    async fn commit(self) -> Result<(), DispatchError> {
        self.conn.commit().await.context("commit transaction")?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), DispatchError> {
        self.conn.rollback().await.context("rollback transaction")?;
        Ok(())
    }
}

// ── Auto-reply rule repository ───────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAutoReplyRuleRepository {
    pub db: DatabaseConnection,
}

impl AutoReplyRuleRepository for DbAutoReplyRuleRepository {
    async fn find_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<AutoReplyRule>, DispatchError> {
        let models = auto_reply_rules::Entity::find()
            .filter(auto_reply_rules::Column::TenantId.eq(tenant_id.0))
            .order_by_asc(auto_reply_rules::Column::Priority)
            .order_by_asc(auto_reply_rules::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("find auto-reply rules by tenant")?;
        Ok(models
            .into_iter()
            .map(rule_from_model)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn create(&self, rule: &AutoReplyRule) -> Result<(), DispatchError> {
        auto_reply_rules::ActiveModel {
            id: Set(rule.id.0),
            tenant_id: Set(rule.tenant_id.0),
            rule_type: Set(rule.kind.as_str().to_owned()),
            name: Set(rule.name.clone()),
            keywords: Set(rule.keywords.clone()),
            match_type: Set(rule.match_mode.map(|m| m.as_str().to_owned())),
            reply_message: Set(rule.reply_message.clone()),
            is_enabled: Set(rule.is_enabled),
            priority: Set(rule.priority),
            created_at: Set(rule.created_at),
            updated_at: Set(rule.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create auto-reply rule")?;
        Ok(())
    }

    async fn find_by_id(&self, id: RuleId) -> Result<Option<AutoReplyRule>, DispatchError> {
        let model = auto_reply_rules::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find auto-reply rule by id")?;
        Ok(model.map(rule_from_model).transpose()?)
    }

    async fn update(&self, rule: &AutoReplyRule) -> Result<(), DispatchError> {
        auto_reply_rules::ActiveModel {
            id: Set(rule.id.0),
            name: Set(rule.name.clone()),
            keywords: Set(rule.keywords.clone()),
            match_type: Set(rule.match_mode.map(|m| m.as_str().to_owned())),
            reply_message: Set(rule.reply_message.clone()),
            is_enabled: Set(rule.is_enabled),
            priority: Set(rule.priority),
            updated_at: Set(rule.updated_at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update auto-reply rule")?;
        Ok(())
    }

    async fn delete(&self, id: RuleId) -> Result<bool, DispatchError> {
        let result = auto_reply_rules::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .context("delete auto-reply rule")?;
        Ok(result.rows_affected > 0)
    }
}

fn rule_from_model(model: auto_reply_rules::Model) -> anyhow::Result<AutoReplyRule> {
    let kind = model
        .rule_type
        .parse::<RuleKind>()
        .with_context(|| format!("rule {}", model.id))?;
    let match_mode = model
        .match_type
        .as_deref()
        .map(str::parse::<MatchMode>)
        .transpose()
        .with_context(|| format!("rule {}", model.id))?;
    Ok(AutoReplyRule {
        id: RuleId(model.id),
        tenant_id: TenantId(model.tenant_id),
        kind,
        name: model.name,
        keywords: model.keywords,
        match_mode,
        reply_message: model.reply_message,
        is_enabled: model.is_enabled,
        priority: model.priority,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Tenant directory ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTenantDirectory {
    pub db: DatabaseConnection,
}

impl TenantDirectory for DbTenantDirectory {
    async fn find_by_destination(
        &self,
        destination: &str,
    ) -> Result<Option<Tenant>, DispatchError> {
        let model = tenants::Entity::find()
            .filter(tenants::Column::ChannelDestination.eq(destination))
            .one(&self.db)
            .await
            .context("find tenant by destination")?;
        Ok(model.map(|m| Tenant {
            id: TenantId(m.id),
            name: m.name,
            channel_destination: m.channel_destination,
            created_at: m.created_at,
        }))
    }
}

/// Readiness probe: a trivial round-trip to the database.
pub async fn ping(db: &DatabaseConnection) -> anyhow::Result<()> {
    db.ping().await.context("ping database")
}
