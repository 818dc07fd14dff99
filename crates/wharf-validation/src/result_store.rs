//! Persistence seam for validation outcomes.
//!
//! The registry's durable store lives elsewhere; this trait is the shape the
//! validation pipeline writes through. A record carries the envelope exactly
//! as sealed plus a SHA-256 digest of its payload, so readers can detect
//! rows altered after the fact. The in-memory implementation backs tests and
//! local tooling.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditContext, payload_digest};
use crate::envelope::ValidationEnvelope;

const ERROR_EMPTY_PACKAGE_ID: &str = "WV-STOR-0001";
const ERROR_EMPTY_PACKAGE_VERSION: &str = "WV-STOR-0002";
const ERROR_INVALID_TIMESTAMP: &str = "WV-STOR-0003";
const ERROR_DIGEST_MISMATCH: &str = "WV-STOR-0004";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("package id must not be blank")]
    EmptyPackageId,
    #[error("package version must not be blank")]
    EmptyPackageVersion,
    #[error("invalid timestamp `{value}`: expected RFC3339 UTC")]
    InvalidTimestamp { value: String },
    #[error(
        "digest mismatch for {package_id} {package_version}: expected {expected}, found {found}"
    )]
    DigestMismatch {
        package_id: String,
        package_version: String,
        expected: String,
        found: String,
    },
}

impl StoreError {
    pub fn stable_code(&self) -> &'static str {
        match self {
            Self::EmptyPackageId => ERROR_EMPTY_PACKAGE_ID,
            Self::EmptyPackageVersion => ERROR_EMPTY_PACKAGE_VERSION,
            Self::InvalidTimestamp { .. } => ERROR_INVALID_TIMESTAMP,
            Self::DigestMismatch { .. } => ERROR_DIGEST_MISMATCH,
        }
    }
}

// ---------------------------------------------------------------------------
// Records and events
// ---------------------------------------------------------------------------

/// One persisted validation outcome for a package version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub package_id: String,
    pub package_version: String,
    pub envelope: ValidationEnvelope,
    /// RFC 3339 UTC, seconds precision.
    pub recorded_at: String,
    /// SHA-256 hex of `envelope.data`, fixed when the record is built.
    pub data_digest: String,
}

impl ValidationRecord {
    /// Build a validated record. The timestamp is normalized to UTC and the
    /// payload digest is computed here.
    pub fn new(
        package_id: impl Into<String>,
        package_version: impl Into<String>,
        envelope: ValidationEnvelope,
        recorded_at: &str,
    ) -> Result<Self, StoreError> {
        let package_id = package_id.into();
        let package_version = package_version.into();
        if package_id.trim().is_empty() {
            return Err(StoreError::EmptyPackageId);
        }
        if package_version.trim().is_empty() {
            return Err(StoreError::EmptyPackageVersion);
        }
        let recorded_at = normalize_utc_timestamp(recorded_at)?;
        let data_digest = payload_digest(&envelope.data);
        Ok(Self {
            package_id,
            package_version,
            envelope,
            recorded_at,
            data_digest,
        })
    }
}

fn normalize_utc_timestamp(value: &str) -> Result<String, StoreError> {
    let parsed =
        DateTime::parse_from_rfc3339(value).map_err(|_| StoreError::InvalidTimestamp {
            value: value.to_string(),
        })?;
    Ok(parsed
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Canonical structured event emitted by store operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEvent {
    pub trace_id: String,
    pub component: String,
    pub package_id: String,
    pub package_version: String,
    pub event: String,
    pub outcome: String,
    pub error_code: Option<String>,
}

// ---------------------------------------------------------------------------
// Store trait and in-memory implementation
// ---------------------------------------------------------------------------

/// Where sealed validation outcomes get written.
pub trait ResultStore {
    /// Append one record. Records are re-validated here: a record that
    /// arrived through deserialization has not passed [`ValidationRecord::new`].
    fn append(
        &mut self,
        record: ValidationRecord,
        context: &AuditContext,
    ) -> Result<(), StoreError>;

    /// All records for a package version, oldest first.
    fn records_for(&self, package_id: &str, package_version: &str) -> Vec<ValidationRecord>;

    /// Recompute every stored digest. Returns the number of verified records
    /// or the first mismatch.
    fn verify_integrity(&self) -> Result<u64, StoreError>;

    fn events(&self) -> &[StoreEvent];
}

/// Deterministic in-memory store used for tests and local workflows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResultStore {
    records: BTreeMap<(String, String), Vec<ValidationRecord>>,
    events: Vec<StoreEvent>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn emit_event(
        &mut self,
        context: &AuditContext,
        package_id: &str,
        package_version: &str,
        event: &str,
        outcome: &str,
        error: Option<&StoreError>,
    ) {
        self.events.push(StoreEvent {
            trace_id: context.trace_id.clone(),
            component: context.component.clone(),
            package_id: package_id.to_string(),
            package_version: package_version.to_string(),
            event: event.to_string(),
            outcome: outcome.to_string(),
            error_code: error.map(|err| err.stable_code().to_string()),
        });
    }

    fn validate_record(&self, record: &ValidationRecord) -> Result<(), StoreError> {
        if record.package_id.trim().is_empty() {
            return Err(StoreError::EmptyPackageId);
        }
        if record.package_version.trim().is_empty() {
            return Err(StoreError::EmptyPackageVersion);
        }
        normalize_utc_timestamp(&record.recorded_at)?;
        let expected = payload_digest(&record.envelope.data);
        if record.data_digest != expected {
            return Err(StoreError::DigestMismatch {
                package_id: record.package_id.clone(),
                package_version: record.package_version.clone(),
                expected,
                found: record.data_digest.clone(),
            });
        }
        Ok(())
    }
}

impl ResultStore for InMemoryResultStore {
    fn append(
        &mut self,
        record: ValidationRecord,
        context: &AuditContext,
    ) -> Result<(), StoreError> {
        let result = self.validate_record(&record);
        match &result {
            Ok(()) => {
                self.emit_event(
                    context,
                    &record.package_id,
                    &record.package_version,
                    "append",
                    "ok",
                    None,
                );
                self.records
                    .entry((record.package_id.clone(), record.package_version.clone()))
                    .or_default()
                    .push(record);
            }
            Err(err) => {
                self.emit_event(
                    context,
                    &record.package_id,
                    &record.package_version,
                    "append",
                    "error",
                    Some(err),
                );
            }
        }
        result
    }

    fn records_for(&self, package_id: &str, package_version: &str) -> Vec<ValidationRecord> {
        self.records
            .get(&(package_id.to_string(), package_version.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn verify_integrity(&self) -> Result<u64, StoreError> {
        let mut verified = 0u64;
        for record in self.records.values().flatten() {
            let expected = payload_digest(&record.envelope.data);
            if record.data_digest != expected {
                return Err(StoreError::DigestMismatch {
                    package_id: record.package_id.clone(),
                    package_version: record.package_version.clone(),
                    expected,
                    found: record.data_digest.clone(),
                });
            }
            verified += 1;
        }
        Ok(verified)
    }

    fn events(&self) -> &[StoreEvent] {
        &self.events
    }
}
