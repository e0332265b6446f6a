use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::infra::channel::HttpChannelGateway;
use crate::infra::db::{
    DbAutoReplyRuleRepository, DbMessageRepository, DbTenantDirectory, DbTransactionManager,
};
use crate::usecase::signature::WebhookVerifier;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub gateway: HttpChannelGateway,
    pub verifier: WebhookVerifier,
    pub scheduler_secret: Option<String>,
    pub scheduler_deadline: Duration,
}

impl AppState {
    pub fn message_repo(&self) -> DbMessageRepository {
        DbMessageRepository {
            conn: self.db.clone(),
        }
    }

    pub fn tx_manager(&self) -> DbTransactionManager {
        DbTransactionManager {
            db: self.db.clone(),
        }
    }

    pub fn rule_repo(&self) -> DbAutoReplyRuleRepository {
        DbAutoReplyRuleRepository {
            db: self.db.clone(),
        }
    }

    pub fn tenant_directory(&self) -> DbTenantDirectory {
        DbTenantDirectory {
            db: self.db.clone(),
        }
    }

    pub fn gateway(&self) -> HttpChannelGateway {
        self.gateway.clone()
    }
}
