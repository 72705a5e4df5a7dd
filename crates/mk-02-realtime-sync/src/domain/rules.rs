//! # Invalidation Rules
//!
//! A rule maps a changed resource family to the cached query families it
//! affects, and says which id scopes each of them.
//!
//! | Resource | Invalidated queries |
//! |----------|---------------------|
//! | orders | `orders`, `recent_orders`, `vendor_stats` (owner); `order` (row) |
//! | products | `products` (owner); `product` (row) |
//! | messages | `messages` (owner); `conversations`, `unread_messages` (any) |
//! | conversations | `conversations`, `unread_messages` (any) |
//! | notifications | `notifications`, `unread_count` (owner) |

use serde::{Deserialize, Serialize};
use shared_types::{ChangeNotification, QueryKey, ResourceKind};

/// Which id a target query is scoped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetScope {
    /// The subscription owner (vendor, user, conversation).
    Owner,
    /// The changed row itself.
    Resource,
    /// Every cached key of that query family.
    Any,
}

/// One query family invalidated by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTarget {
    pub query: String,
    pub scope: TargetScope,
}

impl RuleTarget {
    pub fn owner(query: &str) -> Self {
        Self {
            query: query.to_string(),
            scope: TargetScope::Owner,
        }
    }

    pub fn resource(query: &str) -> Self {
        Self {
            query: query.to_string(),
            scope: TargetScope::Resource,
        }
    }

    pub fn any(query: &str) -> Self {
        Self {
            query: query.to_string(),
            scope: TargetScope::Any,
        }
    }

    /// Whether cached `key` is covered by this target for `change`.
    ///
    /// Unscoped cached keys of the same family are always covered.
    #[must_use]
    pub fn covers(&self, key: &QueryKey, change: &ChangeNotification) -> bool {
        if key.name != self.query {
            return false;
        }
        let Some(key_scope) = key.scope.as_deref() else {
            return true;
        };
        match self.scope {
            TargetScope::Any => true,
            TargetScope::Resource => key_scope == change.resource_id,
            TargetScope::Owner => change.scope.owner.id() == Some(key_scope),
        }
    }
}

/// Fan-out rule for one resource family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationRule {
    pub resource: ResourceKind,
    pub targets: Vec<RuleTarget>,
}

/// Ordered rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationRules {
    rules: Vec<InvalidationRule>,
}

impl InvalidationRules {
    pub fn new(rules: Vec<InvalidationRule>) -> Self {
        Self { rules }
    }

    /// Cached keys among `cached` that `change` makes stale.
    #[must_use]
    pub fn affected_keys(&self, change: &ChangeNotification, cached: &[QueryKey]) -> Vec<QueryKey> {
        let targets: Vec<&RuleTarget> = self
            .rules
            .iter()
            .filter(|rule| rule.resource == change.resource)
            .flat_map(|rule| rule.targets.iter())
            .collect();

        cached
            .iter()
            .filter(|key| targets.iter().any(|target| target.covers(key, change)))
            .cloned()
            .collect()
    }
}

impl Default for InvalidationRules {
    fn default() -> Self {
        Self::new(vec![
            InvalidationRule {
                resource: ResourceKind::Orders,
                targets: vec![
                    RuleTarget::owner("orders"),
                    RuleTarget::owner("recent_orders"),
                    RuleTarget::owner("vendor_stats"),
                    RuleTarget::resource("order"),
                ],
            },
            InvalidationRule {
                resource: ResourceKind::Products,
                targets: vec![RuleTarget::owner("products"), RuleTarget::resource("product")],
            },
            InvalidationRule {
                resource: ResourceKind::Messages,
                targets: vec![
                    RuleTarget::owner("messages"),
                    RuleTarget::any("conversations"),
                    RuleTarget::any("unread_messages"),
                ],
            },
            InvalidationRule {
                resource: ResourceKind::Conversations,
                targets: vec![RuleTarget::any("conversations"), RuleTarget::any("unread_messages")],
            },
            InvalidationRule {
                resource: ResourceKind::Notifications,
                targets: vec![
                    RuleTarget::owner("notifications"),
                    RuleTarget::owner("unread_count"),
                ],
            },
        ])
    }
}
