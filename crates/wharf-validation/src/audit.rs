//! Structured audit trail for envelope decodes.
//!
//! The fallback path fires exactly when a row written by a newer deployment
//! reaches an older reader, and a malformed payload points at a corrupted
//! row. Both are worth surfacing. Events are serde records with stable keys,
//! accumulated in the owning log and drained by the caller. Raw payloads are
//! never logged; events carry their SHA-256 digest instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::taxonomy::{RawCode, TaxonomyError, TaxonomyRegistry, TaxonomyVariant};

// ---------------------------------------------------------------------------
// Context and errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditError {
    InvalidContext { field: String },
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidContext { field } => write!(f, "invalid audit context field: {field}"),
        }
    }
}

impl std::error::Error for AuditError {}

/// Canonical context carried into audited operations.
///
/// Field names intentionally match the structured log keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub trace_id: String,
    pub component: String,
}

impl AuditContext {
    /// Build a validated operation context.
    pub fn new(
        trace_id: impl Into<String>,
        component: impl Into<String>,
    ) -> Result<Self, AuditError> {
        let trace_id = trace_id.into();
        let component = component.into();
        if trace_id.trim().is_empty() {
            return Err(AuditError::InvalidContext {
                field: "trace_id".to_string(),
            });
        }
        if component.trim().is_empty() {
            return Err(AuditError::InvalidContext {
                field: "component".to_string(),
            });
        }
        Ok(Self {
            trace_id,
            component,
        })
    }
}

// ---------------------------------------------------------------------------
// Outcome classification
// ---------------------------------------------------------------------------

/// How a single envelope decode went, from the reader's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeOutcome {
    /// The code was recognized and its payload validated.
    Decoded,
    /// The code was not recognized; the family fallback was returned.
    UnknownCode,
    /// The code was recognized but the payload failed to parse.
    MalformedPayload,
    /// The code was recognized but a mandatory payload field was absent.
    MissingRequiredField,
}

impl DecodeOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decoded => "decoded",
            Self::UnknownCode => "unknown_code",
            Self::MalformedPayload => "malformed_payload",
            Self::MissingRequiredField => "missing_required_field",
        }
    }

    /// Classify a registry decode result for the event stream.
    pub fn classify<V: TaxonomyVariant>(
        code: RawCode,
        result: &Result<V, TaxonomyError>,
    ) -> Self {
        match result {
            Ok(value) if value.raw_code() == code => Self::Decoded,
            Ok(_) => Self::UnknownCode,
            Err(TaxonomyError::MissingRequiredField { .. }) => Self::MissingRequiredField,
            Err(_) => Self::MalformedPayload,
        }
    }
}

impl fmt::Display for DecodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SHA-256 of a payload string, lowercase hex.
pub fn payload_digest(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// Canonical structured event emitted for each audited decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeEvent {
    pub trace_id: String,
    pub component: String,
    pub family: String,
    pub code: RawCode,
    pub outcome: DecodeOutcome,
    pub payload_digest: String,
}

/// Accumulates decode events until the caller drains them.
#[derive(Debug, Clone, Default)]
pub struct DecodeAuditLog {
    events: Vec<DecodeEvent>,
    /// Counters by `family.outcome`.
    event_counts: BTreeMap<String, u64>,
}

impl DecodeAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one decode outcome. The payload is digested, not stored.
    pub fn record(
        &mut self,
        context: &AuditContext,
        family: &str,
        code: RawCode,
        outcome: DecodeOutcome,
        payload: &str,
    ) {
        self.events.push(DecodeEvent {
            trace_id: context.trace_id.clone(),
            component: context.component.clone(),
            family: family.to_string(),
            code,
            outcome,
            payload_digest: payload_digest(payload),
        });
        let key = format!("{family}.{outcome}");
        *self.event_counts.entry(key).or_insert(0) += 1;
    }

    /// Drain accumulated audit events.
    pub fn drain_events(&mut self) -> Vec<DecodeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Per-`family.outcome` counters (deterministic ordering).
    pub fn event_counts(&self) -> &BTreeMap<String, u64> {
        &self.event_counts
    }
}

/// Decode an envelope's fields against a registry and log the outcome.
pub fn audited_decode<V: TaxonomyVariant>(
    registry: &TaxonomyRegistry<V>,
    log: &mut DecodeAuditLog,
    context: &AuditContext,
    code: RawCode,
    payload: &str,
) -> Result<V, TaxonomyError> {
    let result = registry.decode(code, payload);
    let outcome = DecodeOutcome::classify(code, &result);
    log.record(context, registry.family(), code, outcome, payload);
    result
}
