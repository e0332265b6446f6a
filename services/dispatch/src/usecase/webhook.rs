//! Inbound webhook processing: verify, resolve tenant, route events to rules.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use courier_domain::auto_reply::{AutoReplyRule, RuleSet};

use crate::domain::repository::{AutoReplyRuleRepository, ChannelGateway, TenantDirectory};
use crate::domain::types::{
    ChannelError, InboundEvent, MessageContent, WebhookBody, WebhookSummary,
};
use crate::error::DispatchError;
use crate::usecase::signature::WebhookVerifier;

/// Pick the rule that answers `event`, with the token to reply on.
///
/// Follow events take the first enabled follow rule; text messages take the
/// first enabled keyword rule whose keywords match. Everything else gets
/// no reply.
pub fn match_rule<'a, 'e>(
    rules: &'a RuleSet,
    event: &'e InboundEvent,
) -> Option<(&'e str, &'a AutoReplyRule)> {
    match event {
        InboundEvent::Follow { reply_token } => {
            rules.follow_rule().map(|rule| (reply_token.as_str(), rule))
        }
        InboundEvent::Message {
            reply_token,
            content: MessageContent::Text(text),
        } => rules
            .keyword_rule(text)
            .map(|rule| (reply_token.as_str(), rule)),
        InboundEvent::Message {
            content: MessageContent::Other(_),
            ..
        }
        | InboundEvent::Unsupported { .. } => None,
    }
}

// ── ProcessWebhook ───────────────────────────────────────────────────────────

pub struct ProcessWebhookUseCase<D, R, G>
where
    D: TenantDirectory,
    R: AutoReplyRuleRepository,
    G: ChannelGateway,
{
    pub verifier: WebhookVerifier,
    pub tenants: D,
    pub rules: R,
    pub gateway: G,
}

impl<D, R, G> ProcessWebhookUseCase<D, R, G>
where
    D: TenantDirectory,
    R: AutoReplyRuleRepository,
    G: ChannelGateway,
{
    /// Signature and body failures reject the whole callback, as does an
    /// unknown destination. Individual events that fail are logged and skipped.
    pub async fn execute(
        &self,
        signature: Option<&str>,
        body: &[u8],
        cancel: &CancellationToken,
    ) -> Result<WebhookSummary, DispatchError> {
        self.verifier.verify(body, signature)?;

        let payload: WebhookBody = serde_json::from_slice(body)
            .map_err(|e| DispatchError::Validation(format!("malformed webhook body: {e}")))?;

        let tenant = self
            .tenants
            .find_by_destination(&payload.destination)
            .await?
            .ok_or(DispatchError::TenantNotFound)?;

        let rules = RuleSet::new(self.rules.find_by_tenant(tenant.id).await?);
        let mut summary = WebhookSummary {
            events: payload.events.len(),
            ..WebhookSummary::default()
        };

        for (index, raw) in payload.events.into_iter().enumerate() {
            let event = match InboundEvent::parse(raw) {
                Ok(event) => event,
                Err(e) => {
                    warn!(tenant_id = %tenant.id, index, error = %e, "skipping malformed event");
                    summary.failed += 1;
                    continue;
                }
            };
            match self.handle_event(&rules, &event, cancel).await {
                Ok(true) => summary.replied += 1,
                Ok(false) => summary.ignored += 1,
                Err(e) => {
                    warn!(
                        tenant_id = %tenant.id,
                        index,
                        event_type = event.kind(),
                        error = %e,
                        "event handling failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            tenant_id = %tenant.id,
            events = summary.events,
            replied = summary.replied,
            ignored = summary.ignored,
            failed = summary.failed,
            "webhook processed"
        );
        Ok(summary)
    }

    /// Returns whether a reply was sent.
    async fn handle_event(
        &self,
        rules: &RuleSet,
        event: &InboundEvent,
        cancel: &CancellationToken,
    ) -> Result<bool, ChannelError> {
        if let InboundEvent::Unsupported { kind } = event {
            info!(event_type = %kind, "unsupported event type ignored");
            return Ok(false);
        }
        let Some((reply_token, rule)) = match_rule(rules, event) else {
            debug!(event_type = event.kind(), "no matching rule");
            return Ok(false);
        };
        self.gateway
            .reply(reply_token, &rule.reply_message, cancel)
            .await?;
        debug!(event_type = event.kind(), rule_id = %rule.id, "auto-reply sent");
        Ok(true)
    }
}
