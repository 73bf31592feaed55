//! Broadcast registry: tenant -> subscribed sessions.
//!
//! Routes each published [`ProgressEvent`] to exactly the sessions currently
//! subscribed to its tenant, and nothing else. Membership is keyed per tenant
//! in a sharded concurrent map, so join/leave/publish on unrelated tenants
//! never contend on a global lock.
//!
//! Publishing is best-effort and fire-and-forget relative to the provisioning
//! engine: a dead subscriber is pruned and never blocks delivery to the rest,
//! and no registry error ever propagates back into the workflow.

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::event::ProgressEvent;

/// Identifier of one connected client session.
pub type SessionId = Uuid;

#[derive(Default)]
struct TenantEntry {
    subscribers: HashMap<SessionId, UnboundedSender<ProgressEvent>>,
    /// Retained for replay to late joiners (terminal-state recovery).
    last_event: Option<ProgressEvent>,
}

/// Shared tenant -> subscriber routing table.
#[derive(Default)]
pub struct BroadcastRegistry {
    tenants: DashMap<String, TenantEntry>,
    /// Reverse index for cleanup on abrupt disconnect.
    sessions: DashMap<SessionId, HashSet<String>>,
}

impl BroadcastRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a session to a tenant's stream. Idempotent: joining twice
    /// keeps the first registration.
    ///
    /// Returns the tenant's last known event, if any, so the caller can
    /// replay it to the new subscriber immediately.
    pub fn join(
        &self,
        session_id: SessionId,
        tenant_id: &str,
        sender: UnboundedSender<ProgressEvent>,
    ) -> Option<ProgressEvent> {
        let last_event = {
            let mut entry = self.tenants.entry(tenant_id.to_string()).or_default();
            entry.subscribers.entry(session_id).or_insert(sender);
            entry.last_event.clone()
        };
        self.sessions
            .entry(session_id)
            .or_default()
            .insert(tenant_id.to_string());
        debug!(session = %session_id, tenant = %tenant_id, "session joined tenant group");
        last_event
    }

    /// Remove a membership. Safe to call when the membership is absent.
    pub fn leave(&self, session_id: SessionId, tenant_id: &str) {
        if let Some(mut entry) = self.tenants.get_mut(tenant_id) {
            entry.subscribers.remove(&session_id);
        }
        if let Some(mut tenants) = self.sessions.get_mut(&session_id) {
            tenants.remove(tenant_id);
        }
        debug!(session = %session_id, tenant = %tenant_id, "session left tenant group");
    }

    /// Fan an event out to the tenant's current subscriber set, best-effort.
    ///
    /// Returns the number of sessions the event was delivered to. Subscribers
    /// whose channel is closed are pruned in passing.
    pub fn publish(&self, event: &ProgressEvent) -> usize {
        let mut dead: Vec<SessionId> = Vec::new();
        let delivered = {
            let mut entry = self.tenants.entry(event.tenant_id.clone()).or_default();
            entry.last_event = Some(event.clone());

            let mut delivered = 0;
            for (session_id, sender) in &entry.subscribers {
                if sender.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(*session_id);
                }
            }
            for session_id in &dead {
                entry.subscribers.remove(session_id);
            }
            delivered
        };

        for session_id in dead {
            warn!(session = %session_id, tenant = %event.tenant_id, "pruned dead subscriber");
            if let Some(mut tenants) = self.sessions.get_mut(&session_id) {
                tenants.remove(&event.tenant_id);
            }
        }

        debug!(
            tenant = %event.tenant_id,
            step = event.step,
            delivered,
            "published progress event"
        );
        delivered
    }

    /// Drop every membership of a session (cleanup on abrupt disconnect).
    pub fn on_session_closed(&self, session_id: SessionId) {
        let Some((_, tenants)) = self.sessions.remove(&session_id) else {
            return;
        };
        for tenant_id in tenants {
            if let Some(mut entry) = self.tenants.get_mut(&tenant_id) {
                entry.subscribers.remove(&session_id);
            }
        }
        debug!(session = %session_id, "session closed, memberships removed");
    }

    /// Last event published for a tenant, if any.
    #[must_use]
    pub fn last_event(&self, tenant_id: &str) -> Option<ProgressEvent> {
        self.tenants
            .get(tenant_id)
            .and_then(|entry| entry.last_event.clone())
    }

    /// Current subscriber count for one tenant.
    #[must_use]
    pub fn subscriber_count(&self, tenant_id: &str) -> usize {
        self.tenants
            .get(tenant_id)
            .map_or(0, |entry| entry.subscribers.len())
    }

    /// Number of tenants with registry state (subscribers or a retained event).
    #[must_use]
    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    /// Number of sessions with at least one membership.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests;
