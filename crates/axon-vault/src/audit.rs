//! Append-only, in-process audit ledger

use std::sync::{PoisonError, RwLock};

use axon_core::types::MAX_REDACT_PREFIX_LEN;
use axon_core::{AuditAction, AuditEvent, Metadata, VaultResult};
use chrono::Utc;

use crate::id::DataId;

/// Chronological record of every vault operation.
///
/// Events are only ever appended. Data ids are redacted before they reach the
/// ledger; the full id is never stored.
#[derive(Debug)]
pub struct AuditLedger {
    events: RwLock<Vec<AuditEvent>>,
    origin: String,
    redact_prefix_len: usize,
}

impl AuditLedger {
    /// `redact_prefix_len` is capped at [`MAX_REDACT_PREFIX_LEN`].
    pub fn new(origin: impl Into<String>, redact_prefix_len: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            origin: origin.into(),
            redact_prefix_len: redact_prefix_len.min(MAX_REDACT_PREFIX_LEN),
        }
    }

    /// Append one event stamped with the current time.
    pub fn record(&self, action: AuditAction, data_id: &DataId, metadata: Option<Metadata>) {
        let redacted = data_id.redacted(self.redact_prefix_len);
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        // Stamp under the lock so timestamps follow append order.
        let event = AuditEvent {
            timestamp: Utc::now(),
            action,
            data_id: redacted,
            metadata,
            origin: self.origin.clone(),
        };
        tracing::debug!(action = %event.action, data_id = %event.data_id, "audit event recorded");
        events.push(event);
    }

    /// The most recent `limit` events, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        let start = events.len().saturating_sub(limit);
        events[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn redact_prefix_len(&self) -> usize {
        self.redact_prefix_len
    }

    /// Every event as newline-delimited JSON, oldest first.
    pub fn export_json_lines(&self) -> VaultResult<String> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = String::new();
        for event in events.iter() {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}
