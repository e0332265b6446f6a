//! Auto-reply rules and priority-ordered rule resolution.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{RuleId, TenantId};

/// What triggers a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Follow,
    Keyword,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Keyword => "keyword",
        }
    }
}

/// How a keyword is compared against inbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Whole text equals the keyword.
    Exact,
    /// Text contains the keyword.
    Partial,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Partial => "partial",
        }
    }

    pub fn matches(self, text: &str, keyword: &str) -> bool {
        match self {
            Self::Exact => text == keyword,
            Self::Partial => text.contains(keyword),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field}: {value}")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl FromStr for RuleKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(Self::Follow),
            "keyword" => Ok(Self::Keyword),
            other => Err(UnknownVariant {
                field: "rule kind",
                value: other.to_owned(),
            }),
        }
    }
}

impl FromStr for MatchMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "partial" => Ok(Self::Partial),
            other => Err(UnknownVariant {
                field: "match mode",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tenant-configured trigger/response pair for inbound events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoReplyRule {
    pub id: RuleId,
    pub tenant_id: TenantId,
    pub kind: RuleKind,
    pub name: String,
    pub keywords: Vec<String>,
    /// Only meaningful for [`RuleKind::Keyword`]. A keyword rule without a
    /// mode never matches.
    pub match_mode: Option<MatchMode>,
    pub reply_message: String,
    pub is_enabled: bool,
    /// Lower is evaluated first.
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AutoReplyRule {
    /// True when any configured keyword matches `text` under this rule's mode.
    pub fn matches_text(&self, text: &str) -> bool {
        let Some(mode) = self.match_mode else {
            return false;
        };
        self.keywords.iter().any(|keyword| mode.matches(text, keyword))
    }
}

/// Input for creating a rule.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub kind: RuleKind,
    pub name: String,
    pub keywords: Vec<String>,
    pub match_mode: Option<MatchMode>,
    pub reply_message: String,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleValidationError {
    #[error("rule name is required")]
    MissingName,
    #[error("reply message is required")]
    MissingReplyMessage,
    #[error("keyword rules need at least one keyword")]
    MissingKeywords,
}

impl NewRule {
    /// Validate and build an enabled rule.
    ///
    /// Blank keywords are dropped before the keyword check; a keyword rule
    /// with no match mode is created as [`MatchMode::Exact`].
    pub fn into_rule(
        self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<AutoReplyRule, RuleValidationError> {
        if self.name.trim().is_empty() {
            return Err(RuleValidationError::MissingName);
        }
        if self.reply_message.trim().is_empty() {
            return Err(RuleValidationError::MissingReplyMessage);
        }
        let keywords: Vec<String> = self
            .keywords
            .into_iter()
            .filter(|k| !k.trim().is_empty())
            .collect();
        let match_mode = match self.kind {
            RuleKind::Keyword if keywords.is_empty() => {
                return Err(RuleValidationError::MissingKeywords);
            }
            RuleKind::Keyword => Some(self.match_mode.unwrap_or(MatchMode::Exact)),
            RuleKind::Follow => self.match_mode,
        };
        Ok(AutoReplyRule {
            id: RuleId::new(),
            tenant_id,
            kind: self.kind,
            name: self.name,
            keywords,
            match_mode,
            reply_message: self.reply_message,
            is_enabled: true,
            priority: self.priority,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial edit of an existing rule. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub match_mode: Option<MatchMode>,
    pub reply_message: Option<String>,
    pub is_enabled: Option<bool>,
    pub priority: Option<i32>,
}

impl AutoReplyRule {
    /// Apply `update` and bump `updated_at`.
    ///
    /// The same checks as creation hold afterwards; on error the rule is left
    /// untouched.
    pub fn apply(
        &mut self,
        update: RuleUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), RuleValidationError> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(RuleValidationError::MissingName);
        }
        if update
            .reply_message
            .as_deref()
            .is_some_and(|r| r.trim().is_empty())
        {
            return Err(RuleValidationError::MissingReplyMessage);
        }
        let keywords = update.keywords.map(|keywords| {
            keywords
                .into_iter()
                .filter(|k| !k.trim().is_empty())
                .collect::<Vec<_>>()
        });
        if self.kind == RuleKind::Keyword && keywords.as_ref().is_some_and(Vec::is_empty) {
            return Err(RuleValidationError::MissingKeywords);
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(keywords) = keywords {
            self.keywords = keywords;
        }
        if let Some(mode) = update.match_mode {
            self.match_mode = Some(mode);
        }
        if let Some(reply) = update.reply_message {
            self.reply_message = reply;
        }
        if let Some(enabled) = update.is_enabled {
            self.is_enabled = enabled;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// A tenant's rules in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<AutoReplyRule>,
}

impl RuleSet {
    /// Stable sort by priority, so equal priorities keep storage order.
    pub fn new(mut rules: Vec<AutoReplyRule>) -> Self {
        rules.sort_by_key(|rule| rule.priority);
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AutoReplyRule> {
        self.rules.iter()
    }

    fn enabled(&self, kind: RuleKind) -> impl Iterator<Item = &AutoReplyRule> {
        self.rules
            .iter()
            .filter(move |rule| rule.is_enabled && rule.kind == kind)
    }

    /// First enabled follow rule.
    pub fn follow_rule(&self) -> Option<&AutoReplyRule> {
        self.enabled(RuleKind::Follow).next()
    }

    /// First enabled keyword rule whose keywords match `text`.
    pub fn keyword_rule(&self, text: &str) -> Option<&AutoReplyRule> {
        self.enabled(RuleKind::Keyword)
            .find(|rule| rule.matches_text(text))
    }
}

impl FromIterator<AutoReplyRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = AutoReplyRule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
