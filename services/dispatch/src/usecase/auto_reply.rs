use chrono::Utc;

use courier_domain::auto_reply::{AutoReplyRule, NewRule, RuleUpdate};
use courier_domain::id::{RuleId, TenantId};

use crate::domain::repository::AutoReplyRuleRepository;
use crate::error::DispatchError;

// ── CreateRule ───────────────────────────────────────────────────────────────

pub struct CreateRuleUseCase<R: AutoReplyRuleRepository> {
    pub repo: R,
}

impl<R: AutoReplyRuleRepository> CreateRuleUseCase<R> {
    pub async fn execute(
        &self,
        tenant_id: TenantId,
        input: NewRule,
    ) -> Result<AutoReplyRule, DispatchError> {
        let rule = input
            .into_rule(tenant_id, Utc::now())
            .map_err(|e| DispatchError::Validation(e.to_string()))?;
        self.repo.create(&rule).await?;
        Ok(rule)
    }
}

// ── ListRules ────────────────────────────────────────────────────────────────

pub struct ListRulesUseCase<R: AutoReplyRuleRepository> {
    pub repo: R,
}

impl<R: AutoReplyRuleRepository> ListRulesUseCase<R> {
    pub async fn execute(&self, tenant_id: TenantId) -> Result<Vec<AutoReplyRule>, DispatchError> {
        let mut rules = self.repo.find_by_tenant(tenant_id).await?;
        rules.sort_by_key(|rule| rule.priority);
        Ok(rules)
    }
}

// ── UpdateRule ───────────────────────────────────────────────────────────────

pub struct UpdateRuleUseCase<R: AutoReplyRuleRepository> {
    pub repo: R,
}

impl<R: AutoReplyRuleRepository> UpdateRuleUseCase<R> {
    /// Another tenant's rule is reported as missing.
    pub async fn execute(
        &self,
        tenant_id: TenantId,
        id: RuleId,
        update: RuleUpdate,
    ) -> Result<AutoReplyRule, DispatchError> {
        let mut rule = self
            .repo
            .find_by_id(id)
            .await?
            .filter(|r| r.tenant_id == tenant_id)
            .ok_or(DispatchError::RuleNotFound)?;
        rule.apply(update, Utc::now())
            .map_err(|e| DispatchError::Validation(e.to_string()))?;
        self.repo.update(&rule).await?;
        Ok(rule)
    }
}

// ── DeleteRule ───────────────────────────────────────────────────────────────

pub struct DeleteRuleUseCase<R: AutoReplyRuleRepository> {
    pub repo: R,
}

impl<R: AutoReplyRuleRepository> DeleteRuleUseCase<R> {
    pub async fn execute(&self, tenant_id: TenantId, id: RuleId) -> Result<(), DispatchError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|r| r.tenant_id == tenant_id)
            .ok_or(DispatchError::RuleNotFound)?;
        if !self.repo.delete(id).await? {
            return Err(DispatchError::RuleNotFound);
        }
        Ok(())
    }
}
