//! Generic machinery shared by the validation error and issue taxonomies.
//!
//! Each taxonomy is a closed set of variants keyed by a stable numeric wire
//! code. Codes are append-only: once assigned they are never renumbered and
//! never removed, so rows persisted years ago stay decodable. Code `0` is
//! reserved in every family for the `Unknown` fallback, which is what a
//! decoder returns when it meets a code registered by a newer deployment.
//!
//! Registries are built once at startup by an explicit builder and are
//! read-only afterwards. Decode dispatch never blocks and performs no I/O.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Numeric wire representation of a taxonomy code.
pub type RawCode = u16;

/// Reserved code for the `Unknown` fallback in every family.
pub const UNKNOWN_CODE: RawCode = 0;

/// Serialized payload of variants that carry no fields.
pub const EMPTY_PAYLOAD: &str = "{}";

pub const CODE_CATALOG_VERSION: u32 = 1;
pub const CODE_COMPATIBILITY_POLICY: &str =
    "append-only: wire codes are permanent, never renumbered, and retired codes remain decodable";

// ---------------------------------------------------------------------------
// TaxonomyVariant — contract every family value type satisfies
// ---------------------------------------------------------------------------

/// A member of a code-keyed taxonomy.
///
/// `encode` serializes the variant's own fields only; the code travels
/// out-of-band (see `ValidationEnvelope`). Variants without fields encode
/// to `"{}"`.
pub trait TaxonomyVariant: Sized {
    /// The stable wire code this value reports.
    fn raw_code(&self) -> RawCode;

    /// Serialize the variant's fields as a flat JSON object.
    fn encode(&self) -> String;

    /// A fresh fallback value (code `0`), owned by the caller.
    fn unknown() -> Self;
}

// ---------------------------------------------------------------------------
// VariantRegistration — one decodable code
// ---------------------------------------------------------------------------

/// Decode a payload string into a variant of the family.
pub type DecodeFn<V> = fn(&str) -> Result<V, TaxonomyError>;

/// Build a representative instance for registry self-checks.
pub type SampleFn<V> = fn() -> Result<V, TaxonomyError>;

/// A registered code with its decode dispatch and self-check sample.
#[derive(Debug, Clone, Copy)]
pub struct VariantRegistration<V> {
    pub code: RawCode,
    pub decode: DecodeFn<V>,
    pub sample: SampleFn<V>,
}

// ---------------------------------------------------------------------------
// TaxonomyError — typed error enum
// ---------------------------------------------------------------------------

/// Errors from taxonomy registration and decode dispatch.
///
/// An unrecognized code is not an error: decode yields the fallback instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxonomyError {
    /// Payload text for a recognized code could not be parsed.
    MalformedPayload { code: RawCode, detail: String },
    /// Payload parsed but a mandatory field is missing or empty.
    MissingRequiredField { code: RawCode, field: String },
    /// A code was registered twice, or code `0` was claimed.
    DuplicateRegistration { family: String, code: RawCode },
    /// A registered entry's sample reports a different code than it was
    /// registered under.
    CodeMismatch {
        family: String,
        registered: RawCode,
        reported: RawCode,
    },
}

impl fmt::Display for TaxonomyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload { code, detail } => {
                write!(f, "malformed payload for code {code}: {detail}")
            }
            Self::MissingRequiredField { code, field } => {
                write!(f, "missing required field '{field}' for code {code}")
            }
            Self::DuplicateRegistration { family, code } => {
                write!(f, "code {code} already registered in {family} taxonomy")
            }
            Self::CodeMismatch {
                family,
                registered,
                reported,
            } => {
                write!(
                    f,
                    "{family} taxonomy entry registered as {registered} reports code {reported}"
                )
            }
        }
    }
}

impl std::error::Error for TaxonomyError {}

// ---------------------------------------------------------------------------
// Payload helpers
// ---------------------------------------------------------------------------

/// Parse a payload string, mapping any serde failure to `MalformedPayload`.
///
/// Payloads must be flat JSON objects. Arrays, scalars, and JSON `null` are
/// rejected here before the wire struct parse; serde would otherwise accept
/// a positional sequence for any struct through its `visit_seq` path.
pub(crate) fn parse_payload<T: DeserializeOwned>(
    code: RawCode,
    payload: &str,
) -> Result<T, TaxonomyError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|err| TaxonomyError::MalformedPayload {
            code,
            detail: err.to_string(),
        })?;
    if !value.is_object() {
        return Err(TaxonomyError::MalformedPayload {
            code,
            detail: "payload is not a JSON object".to_string(),
        });
    }
    serde_json::from_value(value).map_err(|err| TaxonomyError::MalformedPayload {
        code,
        detail: err.to_string(),
    })
}

/// Serialize a payload struct as a flat JSON object.
pub(crate) fn encode_payload<T: Serialize>(payload: &T) -> String {
    // Payload structs are flat maps of strings; serialization cannot fail.
    serde_json::to_string(payload).unwrap_or_else(|_| EMPTY_PAYLOAD.to_string())
}

// ---------------------------------------------------------------------------
// TaxonomyRegistryBuilder — startup-time registration
// ---------------------------------------------------------------------------

/// Collects registrations for one family before the registry is frozen.
///
/// Duplicate codes are fatal at startup, as is any claim on the reserved
/// fallback code `0`.
#[derive(Debug)]
pub struct TaxonomyRegistryBuilder<V> {
    family: &'static str,
    entries: BTreeMap<RawCode, VariantRegistration<V>>,
}

impl<V> TaxonomyRegistryBuilder<V> {
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            entries: BTreeMap::new(),
        }
    }

    /// Register one decodable code for this family.
    pub fn register(&mut self, registration: VariantRegistration<V>) -> Result<(), TaxonomyError> {
        if registration.code == UNKNOWN_CODE || self.entries.contains_key(&registration.code) {
            return Err(TaxonomyError::DuplicateRegistration {
                family: self.family.to_string(),
                code: registration.code,
            });
        }
        self.entries.insert(registration.code, registration);
        Ok(())
    }

    /// Freeze the collected registrations into a read-only registry.
    pub fn build(self) -> TaxonomyRegistry<V> {
        TaxonomyRegistry {
            family: self.family,
            entries: self.entries,
        }
    }
}

// ---------------------------------------------------------------------------
// TaxonomyRegistry — frozen code table with decode dispatch
// ---------------------------------------------------------------------------

/// Read-only map from wire code to decode dispatch for one family.
///
/// Built once at startup, then shared by reference; every read path takes
/// `&self`, so concurrent decoding needs no locking.
///
/// Uses `BTreeMap` for deterministic iteration ordering.
#[derive(Debug)]
pub struct TaxonomyRegistry<V> {
    family: &'static str,
    entries: BTreeMap<RawCode, VariantRegistration<V>>,
}

impl<V> TaxonomyRegistry<V> {
    /// Stable family name used in logs and errors.
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Look up the registration for a code, if any.
    pub fn lookup(&self, code: RawCode) -> Option<&VariantRegistration<V>> {
        self.entries.get(&code)
    }

    /// All registered codes in ascending order. The fallback code `0` is
    /// never listed; it is implicit in every family.
    pub fn codes(&self) -> Vec<RawCode> {
        self.entries.keys().copied().collect()
    }

    /// Number of registered codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no codes are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: TaxonomyVariant> TaxonomyRegistry<V> {
    /// Decode a `(code, payload)` pair into an owned variant.
    ///
    /// An unrecognized code yields a fresh fallback without touching the
    /// payload. A recognized code with an unparseable payload is a hard
    /// `MalformedPayload` failure, never coerced to the fallback.
    pub fn decode(&self, code: RawCode, payload: &str) -> Result<V, TaxonomyError> {
        match self.entries.get(&code) {
            Some(registration) => (registration.decode)(payload),
            None => Ok(V::unknown()),
        }
    }

    /// Confirm every registered entry reports the code it is keyed under.
    pub fn self_check(&self) -> Result<(), TaxonomyError> {
        for (code, registration) in &self.entries {
            let sample = (registration.sample)()?;
            let reported = sample.raw_code();
            if reported != *code {
                return Err(TaxonomyError::CodeMismatch {
                    family: self.family.to_string(),
                    registered: *code,
                    reported,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CodeCatalog — machine-readable taxonomy manifest
// ---------------------------------------------------------------------------

/// One code in the exported catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCatalogEntry {
    pub numeric: RawCode,
    pub name: String,
    pub requires_payload: bool,
    pub deprecated: bool,
}

/// Machine-readable manifest of one family's full code assignment, including
/// the reserved fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCatalog {
    pub version: u32,
    pub compatibility_policy: String,
    pub family: String,
    pub entries: Vec<CodeCatalogEntry>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
