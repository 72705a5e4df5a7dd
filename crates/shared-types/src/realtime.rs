//! # Realtime Vocabulary
//!
//! Data types exchanged between the push channel, the connection manager,
//! the invalidation router and the query layer. Behaviour lives in
//! `mk-02-realtime-sync`; this module only fixes the shapes so the event bus
//! can carry them.

use crate::ids::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend resource families that can be pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Orders,
    Messages,
    Conversations,
    Notifications,
    Products,
}

impl ResourceKind {
    /// Table/topic name used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Messages => "messages",
            Self::Conversations => "conversations",
            Self::Notifications => "notifications",
            Self::Products => "products",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rows of a resource family a subscription covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "by", content = "id", rename_all = "snake_case")]
pub enum ScopeOwner {
    /// Every row (admin views).
    All,
    /// Rows belonging to one vendor.
    Vendor(String),
    /// Rows belonging to one user.
    User(String),
    /// Rows of one conversation thread.
    Conversation(String),
    /// A single row.
    Record(String),
}

impl ScopeOwner {
    /// Owner id, if the scope is narrower than `All`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Vendor(id) | Self::User(id) | Self::Conversation(id) | Self::Record(id) => {
                Some(id)
            }
        }
    }
}

/// A subscribable slice of backend data, e.g. "orders of vendor V1".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceScope {
    pub kind: ResourceKind,
    pub owner: ScopeOwner,
}

impl ResourceScope {
    #[must_use]
    pub fn new(kind: ResourceKind, owner: ScopeOwner) -> Self {
        Self { kind, owner }
    }

    #[must_use]
    pub fn vendor(kind: ResourceKind, vendor_id: impl Into<String>) -> Self {
        Self::new(kind, ScopeOwner::Vendor(vendor_id.into()))
    }

    #[must_use]
    pub fn user(kind: ResourceKind, user_id: impl Into<String>) -> Self {
        Self::new(kind, ScopeOwner::User(user_id.into()))
    }

    #[must_use]
    pub fn conversation(conversation_id: impl Into<String>) -> Self {
        Self::new(
            ResourceKind::Messages,
            ScopeOwner::Conversation(conversation_id.into()),
        )
    }

    #[must_use]
    pub fn record(kind: ResourceKind, record_id: impl Into<String>) -> Self {
        Self::new(kind, ScopeOwner::Record(record_id.into()))
    }
}

impl fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            ScopeOwner::All => write!(f, "{}:all", self.kind),
            ScopeOwner::Vendor(id) => write!(f, "{}:vendor={}", self.kind, id),
            ScopeOwner::User(id) => write!(f, "{}:user={}", self.kind, id),
            ScopeOwner::Conversation(id) => write!(f, "{}:conversation={}", self.kind, id),
            ScopeOwner::Record(id) => write!(f, "{}:id={}", self.kind, id),
        }
    }
}

/// Row-level change kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A push notification: "resource R changed". Carries no row payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeNotification {
    /// Actor whose subscription received the change.
    pub actor: ActorId,
    /// Subscription scope the change arrived on.
    pub scope: ResourceScope,
    /// Resource family of the changed row.
    pub resource: ResourceKind,
    /// Id of the changed row.
    pub resource_id: String,
    pub kind: ChangeKind,
}

/// Push connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
}

impl ConnectionStatus {
    /// Whether `self → next` is an edge of the connection state machine.
    ///
    /// ```text
    /// Connecting ──→ Connected ──→ Disconnected ──→ Reconnecting ──→ Connected
    ///     │              │              │                 │
    ///     └→ Disconnected└→ Reconnecting└→ Connecting     └→ Disconnected
    /// ```
    #[must_use]
    pub fn can_transition_to(self, next: ConnectionStatus) -> bool {
        use ConnectionStatus::{Connected, Connecting, Disconnected, Reconnecting};
        matches!(
            (self, next),
            (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
                | (Connected, Reconnecting)
                | (Disconnected, Reconnecting)
                | (Disconnected, Connecting)
                | (Reconnecting, Connected)
                | (Reconnecting, Disconnected)
        )
    }

    #[must_use]
    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Reconnecting => "reconnecting",
        };
        f.write_str(s)
    }
}

/// Structured key of a cached read query, e.g. `orders:V1` or `notifications`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey {
    /// Query family (`orders`, `recent_orders`, `order`, `unread_count`, ...).
    pub name: String,
    /// Scope id; `None` for unscoped queries.
    pub scope: Option<String>,
}

impl QueryKey {
    #[must_use]
    pub fn scoped(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Some(scope.into()),
        }
    }

    #[must_use]
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: None,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{}", self.name, scope),
            None => f.write_str(&self.name),
        }
    }
}
