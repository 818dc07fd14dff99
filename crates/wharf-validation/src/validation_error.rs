//! The validation error taxonomy: outcomes that fail a package.
//!
//! One concrete error exists today, raised when a signed package reaches an
//! ingestion pipeline that rejects signed uploads. The wire keys of its
//! payload (`PackageId`, `PackageVersion`) predate the short-key convention
//! of the issue family and are frozen.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::taxonomy::{
    CODE_CATALOG_VERSION, CODE_COMPATIBILITY_POLICY, CodeCatalog, CodeCatalogEntry, EMPTY_PAYLOAD,
    RawCode, TaxonomyError, TaxonomyRegistry, TaxonomyRegistryBuilder, TaxonomyVariant,
    VariantRegistration, encode_payload, parse_payload,
};

/// Stable family name used in logs, errors, and the catalog.
pub const ERROR_FAMILY: &str = "validation_error";

/// Message rendered for errors persisted by deployments newer than this one.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred during package validation.";

// ---------------------------------------------------------------------------
// ValidationErrorCode — wire code assignment
// ---------------------------------------------------------------------------

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    Unknown = 0,
    PackageIsSigned = 1,
}

pub const ALL_ERROR_CODES: &[ValidationErrorCode] = &[
    ValidationErrorCode::Unknown,
    ValidationErrorCode::PackageIsSigned,
];

impl ValidationErrorCode {
    pub const fn numeric(self) -> RawCode {
        self as u16
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::PackageIsSigned => "package_is_signed",
        }
    }

    pub const fn requires_payload(self) -> bool {
        match self {
            Self::Unknown => false,
            Self::PackageIsSigned => true,
        }
    }

    pub const fn deprecated(self) -> bool {
        false
    }

    pub fn from_numeric(numeric: RawCode) -> Option<Self> {
        ALL_ERROR_CODES
            .iter()
            .copied()
            .find(|candidate| candidate.numeric() == numeric)
    }

    pub fn to_catalog_entry(self) -> CodeCatalogEntry {
        CodeCatalogEntry {
            numeric: self.numeric(),
            name: self.as_str().to_string(),
            requires_payload: self.requires_payload(),
            deprecated: self.deprecated(),
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SignedPackage — payload of the PackageIsSigned error
// ---------------------------------------------------------------------------

/// Package coordinates carried by the signed-package error.
///
/// Fields are immutable after construction and both are mandatory. Key
/// names and their order define the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedPackage {
    #[serde(rename = "PackageId")]
    package_id: String,
    #[serde(rename = "PackageVersion")]
    package_version: String,
}

impl SignedPackage {
    /// Build a validated payload. Empty fields are rejected on this path
    /// and on decode alike.
    pub fn new(
        package_id: impl Into<String>,
        package_version: impl Into<String>,
    ) -> Result<Self, TaxonomyError> {
        let package_id = package_id.into();
        let package_version = package_version.into();
        if package_id.is_empty() {
            return Err(TaxonomyError::MissingRequiredField {
                code: ValidationErrorCode::PackageIsSigned.numeric(),
                field: "package_id".to_string(),
            });
        }
        if package_version.is_empty() {
            return Err(TaxonomyError::MissingRequiredField {
                code: ValidationErrorCode::PackageIsSigned.numeric(),
                field: "package_version".to_string(),
            });
        }
        Ok(Self {
            package_id,
            package_version,
        })
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn package_version(&self) -> &str {
        &self.package_version
    }
}

/// Decode-side view of the payload. Missing keys and JSON `null` both land
/// as `None`, which the validating constructor then rejects.
#[derive(Debug, Deserialize)]
struct SignedPackageWire {
    #[serde(rename = "PackageId")]
    package_id: Option<String>,
    #[serde(rename = "PackageVersion")]
    package_version: Option<String>,
}

// ---------------------------------------------------------------------------
// ValidationError — the family value type
// ---------------------------------------------------------------------------

/// A decoded validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Fallback for codes this deployment does not recognize.
    Unknown,
    /// The package is signed and the pipeline rejects signed uploads.
    PackageIsSigned(SignedPackage),
}

impl ValidationError {
    pub fn code(&self) -> ValidationErrorCode {
        match self {
            Self::Unknown => ValidationErrorCode::Unknown,
            Self::PackageIsSigned(_) => ValidationErrorCode::PackageIsSigned,
        }
    }

    /// User-facing message for this error.
    pub fn render(&self) -> String {
        match self {
            Self::Unknown => UNKNOWN_ERROR_MESSAGE.to_string(),
            Self::PackageIsSigned(package) => format!(
                "Package {} {} is signed.",
                package.package_id(),
                package.package_version()
            ),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl TaxonomyVariant for ValidationError {
    fn raw_code(&self) -> RawCode {
        self.code().numeric()
    }

    fn encode(&self) -> String {
        match self {
            Self::Unknown => EMPTY_PAYLOAD.to_string(),
            Self::PackageIsSigned(package) => encode_payload(package),
        }
    }

    fn unknown() -> Self {
        Self::Unknown
    }
}

// ---------------------------------------------------------------------------
// Decode dispatch and registry construction
// ---------------------------------------------------------------------------

fn decode_package_is_signed(payload: &str) -> Result<ValidationError, TaxonomyError> {
    let wire: SignedPackageWire =
        parse_payload(ValidationErrorCode::PackageIsSigned.numeric(), payload)?;
    let package = SignedPackage::new(
        wire.package_id.unwrap_or_default(),
        wire.package_version.unwrap_or_default(),
    )?;
    Ok(ValidationError::PackageIsSigned(package))
}

fn sample_package_is_signed() -> Result<ValidationError, TaxonomyError> {
    Ok(ValidationError::PackageIsSigned(SignedPackage::new(
        "Sample.Package",
        "1.0.0",
    )?))
}

/// Build the error-family registry. Called once at startup; the result is
/// shared by reference afterwards.
pub fn build_error_registry() -> Result<TaxonomyRegistry<ValidationError>, TaxonomyError> {
    let mut builder = TaxonomyRegistryBuilder::new(ERROR_FAMILY);
    builder.register(VariantRegistration {
        code: ValidationErrorCode::PackageIsSigned.numeric(),
        decode: decode_package_is_signed,
        sample: sample_package_is_signed,
    })?;
    Ok(builder.build())
}

/// Machine-readable manifest of the error-family code assignment.
pub fn error_code_catalog() -> CodeCatalog {
    CodeCatalog {
        version: CODE_CATALOG_VERSION,
        compatibility_policy: CODE_COMPATIBILITY_POLICY.to_string(),
        family: ERROR_FAMILY.to_string(),
        entries: ALL_ERROR_CODES
            .iter()
            .copied()
            .map(ValidationErrorCode::to_catalog_entry)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
