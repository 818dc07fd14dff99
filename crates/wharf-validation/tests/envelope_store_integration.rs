//! Integration tests for the `envelope`, `audit`, and `result_store`
//! modules working together: seal an outcome, persist it, read it back,
//! decode it under audit.

#![forbid(unsafe_code)]

use wharf_validation::audit::{
    AuditContext, DecodeAuditLog, DecodeOutcome, audited_decode, payload_digest,
};
use wharf_validation::envelope::ValidationEnvelope;
use wharf_validation::result_store::{InMemoryResultStore, ResultStore, ValidationRecord};
use wharf_validation::taxonomy::TaxonomyVariant;
use wharf_validation::validation_error::{SignedPackage, ValidationError, build_error_registry};
use wharf_validation::validation_issue::{
    ClientSignatureFailure, ValidationIssue, build_issue_registry,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn ctx() -> AuditContext {
    AuditContext::new("trace-pipeline", "validation_worker").unwrap()
}

fn recorded(issue: &ValidationIssue, package_id: &str, package_version: &str) -> ValidationRecord {
    ValidationRecord::new(
        package_id,
        package_version,
        ValidationEnvelope::seal(issue),
        "2026-02-26T12:00:00Z",
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[test]
fn envelope_seal_pairs_code_and_payload() {
    let error = ValidationError::PackageIsSigned(
        SignedPackage::new("Hello.World", "1.3.4").unwrap(),
    );
    let envelope = ValidationEnvelope::seal(&error);
    assert_eq!(envelope.code, error.raw_code());
    assert_eq!(envelope.data, error.encode());
}

#[test]
fn envelope_open_round_trips_both_families() {
    let errors = build_error_registry().unwrap();
    let issues = build_issue_registry().unwrap();

    let error = ValidationError::PackageIsSigned(
        SignedPackage::new("Hello.World", "1.3.4").unwrap(),
    );
    let reopened = ValidationEnvelope::seal(&error).open(&errors).unwrap();
    assert_eq!(reopened, error);

    let issue = ValidationIssue::ClientSigningVerificationFailure(
        ClientSignatureFailure::new("NU3008", "The package integrity check failed.").unwrap(),
    );
    let reopened = ValidationEnvelope::seal(&issue).open(&issues).unwrap();
    assert_eq!(reopened, issue);
}

// ---------------------------------------------------------------------------
// Audited decode over stored envelopes
// ---------------------------------------------------------------------------

#[test]
fn stored_envelopes_decode_under_audit() {
    let issues = build_issue_registry().unwrap();
    let mut store = InMemoryResultStore::new();
    let mut log = DecodeAuditLog::new();
    let context = ctx();

    store
        .append(recorded(&ValidationIssue::PackageIsNotSigned, "Hello.World", "1.0.0"), &context)
        .unwrap();
    // A row written by a newer deployment: code unknown to this reader.
    store
        .append(
            ValidationRecord::new(
                "Hello.World",
                "1.0.0",
                ValidationEnvelope::new(31337, "{\"new_fields\":true}"),
                "2026-02-26T12:05:00Z",
            )
            .unwrap(),
            &context,
        )
        .unwrap();

    let rows = store.records_for("Hello.World", "1.0.0");
    assert_eq!(rows.len(), 2);

    let mut rendered = Vec::new();
    for row in &rows {
        let issue = audited_decode(
            &issues,
            &mut log,
            &context,
            row.envelope.code,
            &row.envelope.data,
        )
        .unwrap();
        rendered.push(issue.render());
    }

    assert_eq!(rendered[0], ValidationIssue::PackageIsNotSigned.render());
    assert_eq!(rendered[1], ValidationIssue::Unknown.render());

    let events = log.drain_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].outcome, DecodeOutcome::Decoded);
    assert_eq!(events[1].outcome, DecodeOutcome::UnknownCode);
    assert_eq!(events[1].code, 31337);
    assert_eq!(events[1].payload_digest, payload_digest("{\"new_fields\":true}"));
    assert_eq!(log.event_counts().get("validation_issue.decoded"), Some(&1));
    assert_eq!(
        log.event_counts().get("validation_issue.unknown_code"),
        Some(&1)
    );
}

// ---------------------------------------------------------------------------
// Store integrity
// ---------------------------------------------------------------------------

#[test]
fn store_detects_payload_tampering_on_append() {
    let mut store = InMemoryResultStore::new();
    let context = ctx();

    let mut record = recorded(&ValidationIssue::PackageIsSigned, "Hello.World", "1.0.0");
    record.envelope.data = "{\"c\":\"NU9999\",\"m\":\"forged\"}".to_string();

    assert!(store.append(record, &context).is_err());
    assert!(store.is_empty());
    let event = store.events().last().unwrap();
    assert_eq!(event.outcome, "error");
    assert_eq!(event.error_code, Some("WV-STOR-0004".to_string()));
}

#[test]
fn store_integrity_sweep_counts_all_rows() {
    let mut store = InMemoryResultStore::new();
    let context = ctx();
    for version in ["1.0.0", "1.1.0", "2.0.0"] {
        store
            .append(
                recorded(&ValidationIssue::OnlyAuthorSignaturesSupported, "Hello.World", version),
                &context,
            )
            .unwrap();
    }
    assert_eq!(store.verify_integrity(), Ok(3));
}

// ---------------------------------------------------------------------------
// Full lifecycle
// ---------------------------------------------------------------------------

#[test]
fn full_lifecycle_validate_seal_store_reload_render() {
    let issues = build_issue_registry().unwrap();
    let mut store = InMemoryResultStore::new();
    let mut log = DecodeAuditLog::new();
    let context = ctx();

    // 1. Validation produces a diagnostic for the package.
    let issue = ValidationIssue::ClientSigningVerificationFailure(
        ClientSignatureFailure::new("NU3018", "The package signature is invalid.").unwrap(),
    );

    // 2. Seal and persist it.
    let record = ValidationRecord::new(
        "Contoso.Utils",
        "2.0.0",
        ValidationEnvelope::seal(&issue),
        "2026-02-26T12:00:00+02:00",
    )
    .unwrap();
    assert_eq!(record.recorded_at, "2026-02-26T10:00:00Z");
    store.append(record, &context).unwrap();

    // 3. Reload and decode under audit.
    let rows = store.records_for("Contoso.Utils", "2.0.0");
    assert_eq!(rows.len(), 1);
    let reloaded = audited_decode(
        &issues,
        &mut log,
        &context,
        rows[0].envelope.code,
        &rows[0].envelope.data,
    )
    .unwrap();

    // 4. Render for the user.
    assert_eq!(reloaded.render(), "NU3018: The package signature is invalid.");

    // 5. Both the store and the decode log saw the operation.
    assert_eq!(store.events().len(), 1);
    assert_eq!(log.drain_events().len(), 1);
    assert_eq!(store.verify_integrity(), Ok(1));
}
