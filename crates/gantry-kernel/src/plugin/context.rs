//! Request-scoped context.
//!
//! [`RequestContext`] is created by the dispatcher for each inbound request
//! and passed by `&mut` through every phase.  It owns the per-request plugin
//! memo, so nothing about a request's plugin resolution lives in
//! process-wide state.

use super::types::{ApiId, ConsumerId, PluginConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────────────────────────

/// The API a request was routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    pub id: ApiId,
    pub name: String,
}

impl Api {
    pub fn new(id: impl Into<ApiId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The Consumer authenticated for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    pub id: ConsumerId,
    pub username: Option<String>,
}

impl Consumer {
    pub fn new(id: impl Into<ConsumerId>) -> Self {
        Self {
            id: id.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Phases
// ─────────────────────────────────────────────────────────────────────────────

/// Request-processing phases that run the plugin pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestPhase {
    /// Authoritative phase: resolves configurations against cache/datastore.
    Access,
    HeaderFilter,
    BodyFilter,
    Log,
}

impl RequestPhase {
    /// Whether this phase may resolve configurations.  Later phases only
    /// replay what the early phase stored for the request.
    pub fn is_early(&self) -> bool {
        matches!(self, RequestPhase::Access)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPhase::Access => "access",
            RequestPhase::HeaderFilter => "header_filter",
            RequestPhase::BodyFilter => "body_filter",
            RequestPhase::Log => "log",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-request memo
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of plugin resolution for one request, keyed by plugin name.
///
/// `None` values record that a plugin resolved to "absent", which is distinct
/// from a plugin that was never resolved (no entry).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginsForRequest {
    entries: HashMap<String, Option<PluginConfig>>,
}

impl PluginsForRequest {
    /// Record the outcome for `name`, replacing any previous outcome.
    pub fn insert(&mut self, name: impl Into<String>, outcome: Option<PluginConfig>) {
        self.entries.insert(name.into(), outcome);
    }

    /// The stored configuration of `name`; `None` when absent or never
    /// resolved.
    pub fn config(&self, name: &str) -> Option<&PluginConfig> {
        self.entries.get(name).and_then(Option::as_ref)
    }

    /// Whether an outcome (configured or absent) was recorded for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request context
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable context that lives for the whole lifecycle of one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for correlating this request across logs.
    pub request_id: String,
    /// Routed API; `None` when the request matched no API (global scope).
    pub api: Option<Api>,
    /// Consumer resolved by authentication; `None` if unauthenticated.
    pub authenticated_consumer: Option<Consumer>,
    /// Whether the dispatcher may defer its response.  Cleared when plugin
    /// resolution aborts the request.
    pub delay_response: bool,
    plugins_for_request: Option<PluginsForRequest>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            api: None,
            authenticated_consumer: None,
            delay_response: false,
            plugins_for_request: None,
        }
    }

    /// Builder helper: set the routed API.
    pub fn with_api(mut self, api: Api) -> Self {
        self.api = Some(api);
        self
    }

    /// Builder helper: set the authenticated consumer.
    pub fn with_consumer(mut self, consumer: Consumer) -> Self {
        self.authenticated_consumer = Some(consumer);
        self
    }

    /// Builder helper: set the delayed-response flag.
    pub fn with_delay_response(mut self, delay: bool) -> Self {
        self.delay_response = delay;
        self
    }

    pub fn api_id(&self) -> Option<&ApiId> {
        self.api.as_ref().map(|a| &a.id)
    }

    pub fn consumer_id(&self) -> Option<&ConsumerId> {
        self.authenticated_consumer.as_ref().map(|c| &c.id)
    }

    /// The per-request plugin memo, created on first access.
    pub fn plugins_for_request(&mut self) -> &mut PluginsForRequest {
        self.plugins_for_request.get_or_insert_with(PluginsForRequest::default)
    }

    /// Read-only view of the memo; `None` until it was first created.
    pub fn resolved_plugins(&self) -> Option<&PluginsForRequest> {
        self.plugins_for_request.as_ref()
    }
}
