//! The validation issue taxonomy: user-facing diagnostics from package
//! signing validation.
//!
//! The code assignment records the registry's signing rollout in order.
//! Codes 3, 10, and 11 are deprecated: the pipeline no longer produces
//! them (10 and 11 were superseded by the client-failure issue, code 2),
//! but rows persisted while they were live must stay renderable, so they
//! remain registered forever.
//!
//! Issue payloads use short stable wire keys: `c` (client failure code),
//! `m` (client failure message), `t` (certificate SHA-1 thumbprint), and
//! `o` (enhanced-key-usage identifier).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::taxonomy::{
    CODE_CATALOG_VERSION, CODE_COMPATIBILITY_POLICY, CodeCatalog, CodeCatalogEntry, EMPTY_PAYLOAD,
    RawCode, TaxonomyError, TaxonomyRegistry, TaxonomyRegistryBuilder, TaxonomyVariant,
    VariantRegistration, encode_payload, parse_payload,
};

/// Stable family name used in logs, errors, and the catalog.
pub const ISSUE_FAMILY: &str = "validation_issue";

/// Message rendered for issues persisted by deployments newer than this one.
pub const UNKNOWN_ISSUE_MESSAGE: &str = "Package validation reported an unrecognized issue.";

// ---------------------------------------------------------------------------
// ValidationIssueCode — wire code assignment
// ---------------------------------------------------------------------------

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationIssueCode {
    Unknown = 0,
    PackageIsSigned = 1,
    ClientSigningVerificationFailure = 2,
    PackageIsZip64 = 3,
    OnlyAuthorSignaturesSupported = 4,
    AuthorAndRepositoryCounterSignaturesNotSupported = 5,
    OnlySignatureFormatVersion1Supported = 6,
    AuthorCounterSignaturesNotSupported = 7,
    PackageIsNotSigned = 8,
    PackageShouldNotBeSignedButCanManageCertificates = 9,
    SigningCertificateRevoked = 10,
    SigningCertificateHasUnsupportedEku = 11,
}

pub const ALL_ISSUE_CODES: &[ValidationIssueCode] = &[
    ValidationIssueCode::Unknown,
    ValidationIssueCode::PackageIsSigned,
    ValidationIssueCode::ClientSigningVerificationFailure,
    ValidationIssueCode::PackageIsZip64,
    ValidationIssueCode::OnlyAuthorSignaturesSupported,
    ValidationIssueCode::AuthorAndRepositoryCounterSignaturesNotSupported,
    ValidationIssueCode::OnlySignatureFormatVersion1Supported,
    ValidationIssueCode::AuthorCounterSignaturesNotSupported,
    ValidationIssueCode::PackageIsNotSigned,
    ValidationIssueCode::PackageShouldNotBeSignedButCanManageCertificates,
    ValidationIssueCode::SigningCertificateRevoked,
    ValidationIssueCode::SigningCertificateHasUnsupportedEku,
];

impl ValidationIssueCode {
    pub const fn numeric(self) -> RawCode {
        self as u16
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::PackageIsSigned => "package_is_signed",
            Self::ClientSigningVerificationFailure => "client_signing_verification_failure",
            Self::PackageIsZip64 => "package_is_zip64",
            Self::OnlyAuthorSignaturesSupported => "only_author_signatures_supported",
            Self::AuthorAndRepositoryCounterSignaturesNotSupported => {
                "author_and_repository_counter_signatures_not_supported"
            }
            Self::OnlySignatureFormatVersion1Supported => {
                "only_signature_format_version_1_supported"
            }
            Self::AuthorCounterSignaturesNotSupported => "author_counter_signatures_not_supported",
            Self::PackageIsNotSigned => "package_is_not_signed",
            Self::PackageShouldNotBeSignedButCanManageCertificates => {
                "package_should_not_be_signed_but_can_manage_certificates"
            }
            Self::SigningCertificateRevoked => "signing_certificate_revoked",
            Self::SigningCertificateHasUnsupportedEku => "signing_certificate_has_unsupported_eku",
        }
    }

    pub const fn requires_payload(self) -> bool {
        matches!(
            self,
            Self::ClientSigningVerificationFailure
                | Self::SigningCertificateRevoked
                | Self::SigningCertificateHasUnsupportedEku
        )
    }

    /// Deprecated codes are never produced by current pipelines but stay
    /// registered so persisted rows keep decoding.
    pub const fn deprecated(self) -> bool {
        matches!(
            self,
            Self::PackageIsZip64
                | Self::SigningCertificateRevoked
                | Self::SigningCertificateHasUnsupportedEku
        )
    }

    pub fn from_numeric(numeric: RawCode) -> Option<Self> {
        ALL_ISSUE_CODES
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

impl fmt::Display for ValidationIssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload structs
// ---------------------------------------------------------------------------

/// Failure reported by the signing client, carried verbatim to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSignatureFailure {
    #[serde(rename = "c")]
    client_code: String,
    #[serde(rename = "m")]
    client_message: String,
}

impl ClientSignatureFailure {
    pub fn new(
        client_code: impl Into<String>,
        client_message: impl Into<String>,
    ) -> Result<Self, TaxonomyError> {
        let client_code = client_code.into();
        let client_message = client_message.into();
        if client_code.is_empty() {
            return Err(missing_field(
                ValidationIssueCode::ClientSigningVerificationFailure,
                "client_code",
            ));
        }
        if client_message.is_empty() {
            return Err(missing_field(
                ValidationIssueCode::ClientSigningVerificationFailure,
                "client_message",
            ));
        }
        Ok(Self {
            client_code,
            client_message,
        })
    }

    pub fn client_code(&self) -> &str {
        &self.client_code
    }

    pub fn client_message(&self) -> &str {
        &self.client_message
    }
}

/// Certificate identified by its SHA-1 thumbprint. Deprecated payload,
/// decode-only in practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevokedCertificate {
    #[serde(rename = "t")]
    thumbprint: String,
}

impl RevokedCertificate {
    pub fn new(thumbprint: impl Into<String>) -> Result<Self, TaxonomyError> {
        let thumbprint = thumbprint.into();
        if thumbprint.is_empty() {
            return Err(missing_field(
                ValidationIssueCode::SigningCertificateRevoked,
                "thumbprint",
            ));
        }
        Ok(Self { thumbprint })
    }

    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }
}

/// Certificate with an enhanced key usage the pipeline does not accept.
/// Deprecated payload, decode-only in practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedCertificateEku {
    #[serde(rename = "t")]
    thumbprint: String,
    #[serde(rename = "o")]
    eku_oid: String,
}

impl UnsupportedCertificateEku {
    pub fn new(
        thumbprint: impl Into<String>,
        eku_oid: impl Into<String>,
    ) -> Result<Self, TaxonomyError> {
        let thumbprint = thumbprint.into();
        let eku_oid = eku_oid.into();
        if thumbprint.is_empty() {
            return Err(missing_field(
                ValidationIssueCode::SigningCertificateHasUnsupportedEku,
                "thumbprint",
            ));
        }
        if eku_oid.is_empty() {
            return Err(missing_field(
                ValidationIssueCode::SigningCertificateHasUnsupportedEku,
                "eku_oid",
            ));
        }
        Ok(Self {
            thumbprint,
            eku_oid,
        })
    }

    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    pub fn eku_oid(&self) -> &str {
        &self.eku_oid
    }
}

fn missing_field(code: ValidationIssueCode, field: &str) -> TaxonomyError {
    TaxonomyError::MissingRequiredField {
        code: code.numeric(),
        field: field.to_string(),
    }
}

// Decode-side wire views. Missing keys and JSON `null` land as `None` and
// are rejected by the validating constructors.

#[derive(Debug, Deserialize)]
struct ClientSignatureFailureWire {
    #[serde(rename = "c")]
    client_code: Option<String>,
    #[serde(rename = "m")]
    client_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevokedCertificateWire {
    #[serde(rename = "t")]
    thumbprint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnsupportedCertificateEkuWire {
    #[serde(rename = "t")]
    thumbprint: Option<String>,
    #[serde(rename = "o")]
    eku_oid: Option<String>,
}

/// Payload shape for codes without fields: accepts any JSON object and
/// ignores extra fields. Non-object payloads are rejected upstream by
/// `parse_payload`.
#[derive(Debug, Deserialize)]
struct EmptyPayloadWire {}

// ---------------------------------------------------------------------------
// ValidationIssue — the family value type
// ---------------------------------------------------------------------------

/// A decoded validation issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Fallback for codes this deployment does not recognize.
    Unknown,
    PackageIsSigned,
    ClientSigningVerificationFailure(ClientSignatureFailure),
    PackageIsZip64,
    OnlyAuthorSignaturesSupported,
    AuthorAndRepositoryCounterSignaturesNotSupported,
    OnlySignatureFormatVersion1Supported,
    AuthorCounterSignaturesNotSupported,
    PackageIsNotSigned,
    PackageShouldNotBeSignedButCanManageCertificates,
    SigningCertificateRevoked(RevokedCertificate),
    SigningCertificateHasUnsupportedEku(UnsupportedCertificateEku),
}

impl ValidationIssue {
    pub fn code(&self) -> ValidationIssueCode {
        match self {
            Self::Unknown => ValidationIssueCode::Unknown,
            Self::PackageIsSigned => ValidationIssueCode::PackageIsSigned,
            Self::ClientSigningVerificationFailure(_) => {
                ValidationIssueCode::ClientSigningVerificationFailure
            }
            Self::PackageIsZip64 => ValidationIssueCode::PackageIsZip64,
            Self::OnlyAuthorSignaturesSupported => {
                ValidationIssueCode::OnlyAuthorSignaturesSupported
            }
            Self::AuthorAndRepositoryCounterSignaturesNotSupported => {
                ValidationIssueCode::AuthorAndRepositoryCounterSignaturesNotSupported
            }
            Self::OnlySignatureFormatVersion1Supported => {
                ValidationIssueCode::OnlySignatureFormatVersion1Supported
            }
            Self::AuthorCounterSignaturesNotSupported => {
                ValidationIssueCode::AuthorCounterSignaturesNotSupported
            }
            Self::PackageIsNotSigned => ValidationIssueCode::PackageIsNotSigned,
            Self::PackageShouldNotBeSignedButCanManageCertificates => {
                ValidationIssueCode::PackageShouldNotBeSignedButCanManageCertificates
            }
            Self::SigningCertificateRevoked(_) => ValidationIssueCode::SigningCertificateRevoked,
            Self::SigningCertificateHasUnsupportedEku(_) => {
                ValidationIssueCode::SigningCertificateHasUnsupportedEku
            }
        }
    }

    /// User-facing message for this issue.
    pub fn render(&self) -> String {
        match self {
            Self::Unknown => UNKNOWN_ISSUE_MESSAGE.to_string(),
            Self::PackageIsSigned => {
                "The package is signed. Signed packages are not accepted.".to_string()
            }
            Self::ClientSigningVerificationFailure(failure) => {
                format!("{}: {}", failure.client_code(), failure.client_message())
            }
            Self::PackageIsZip64 => "Zip64 packages are not supported.".to_string(),
            Self::OnlyAuthorSignaturesSupported => {
                "Only author signatures are supported.".to_string()
            }
            Self::AuthorAndRepositoryCounterSignaturesNotSupported => {
                "Author and repository countersignatures are not supported.".to_string()
            }
            Self::OnlySignatureFormatVersion1Supported => {
                "Only signature format version 1 is supported.".to_string()
            }
            Self::AuthorCounterSignaturesNotSupported => {
                "Author countersignatures are not supported.".to_string()
            }
            Self::PackageIsNotSigned => {
                "The package must be signed with one of the owner's registered certificates."
                    .to_string()
            }
            Self::PackageShouldNotBeSignedButCanManageCertificates => {
                "The package should not be signed, but the owner can register certificates to allow signing."
                    .to_string()
            }
            Self::SigningCertificateRevoked(certificate) => format!(
                "The signing certificate with thumbprint {} has been revoked.",
                certificate.thumbprint()
            ),
            Self::SigningCertificateHasUnsupportedEku(certificate) => format!(
                "The signing certificate with thumbprint {} has unsupported enhanced key usage {}.",
                certificate.thumbprint(),
                certificate.eku_oid()
            ),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl TaxonomyVariant for ValidationIssue {
    fn raw_code(&self) -> RawCode {
        self.code().numeric()
    }

    fn encode(&self) -> String {
        match self {
            Self::ClientSigningVerificationFailure(failure) => encode_payload(failure),
            Self::SigningCertificateRevoked(certificate) => encode_payload(certificate),
            Self::SigningCertificateHasUnsupportedEku(certificate) => encode_payload(certificate),
            _ => EMPTY_PAYLOAD.to_string(),
        }
    }

    fn unknown() -> Self {
        Self::Unknown
    }
}

// ---------------------------------------------------------------------------
// Decode dispatch and registry construction
// ---------------------------------------------------------------------------

fn parse_no_data(code: ValidationIssueCode, payload: &str) -> Result<(), TaxonomyError> {
    let EmptyPayloadWire {} = parse_payload(code.numeric(), payload)?;
    Ok(())
}

fn decode_package_is_signed(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    parse_no_data(ValidationIssueCode::PackageIsSigned, payload)?;
    Ok(ValidationIssue::PackageIsSigned)
}

fn decode_client_failure(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    let wire: ClientSignatureFailureWire = parse_payload(
        ValidationIssueCode::ClientSigningVerificationFailure.numeric(),
        payload,
    )?;
    let failure = ClientSignatureFailure::new(
        wire.client_code.unwrap_or_default(),
        wire.client_message.unwrap_or_default(),
    )?;
    Ok(ValidationIssue::ClientSigningVerificationFailure(failure))
}

fn decode_package_is_zip64(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    parse_no_data(ValidationIssueCode::PackageIsZip64, payload)?;
    Ok(ValidationIssue::PackageIsZip64)
}

fn decode_only_author_signatures(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    parse_no_data(ValidationIssueCode::OnlyAuthorSignaturesSupported, payload)?;
    Ok(ValidationIssue::OnlyAuthorSignaturesSupported)
}

fn decode_author_and_repository_counter_signatures(
    payload: &str,
) -> Result<ValidationIssue, TaxonomyError> {
    parse_no_data(
        ValidationIssueCode::AuthorAndRepositoryCounterSignaturesNotSupported,
        payload,
    )?;
    Ok(ValidationIssue::AuthorAndRepositoryCounterSignaturesNotSupported)
}

fn decode_only_signature_format_v1(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    parse_no_data(
        ValidationIssueCode::OnlySignatureFormatVersion1Supported,
        payload,
    )?;
    Ok(ValidationIssue::OnlySignatureFormatVersion1Supported)
}

fn decode_author_counter_signatures(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    parse_no_data(
        ValidationIssueCode::AuthorCounterSignaturesNotSupported,
        payload,
    )?;
    Ok(ValidationIssue::AuthorCounterSignaturesNotSupported)
}

fn decode_package_is_not_signed(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    parse_no_data(ValidationIssueCode::PackageIsNotSigned, payload)?;
    Ok(ValidationIssue::PackageIsNotSigned)
}

fn decode_should_not_be_signed(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    parse_no_data(
        ValidationIssueCode::PackageShouldNotBeSignedButCanManageCertificates,
        payload,
    )?;
    Ok(ValidationIssue::PackageShouldNotBeSignedButCanManageCertificates)
}

fn decode_certificate_revoked(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    let wire: RevokedCertificateWire = parse_payload(
        ValidationIssueCode::SigningCertificateRevoked.numeric(),
        payload,
    )?;
    let certificate = RevokedCertificate::new(wire.thumbprint.unwrap_or_default())?;
    Ok(ValidationIssue::SigningCertificateRevoked(certificate))
}

fn decode_certificate_unsupported_eku(payload: &str) -> Result<ValidationIssue, TaxonomyError> {
    let wire: UnsupportedCertificateEkuWire = parse_payload(
        ValidationIssueCode::SigningCertificateHasUnsupportedEku.numeric(),
        payload,
    )?;
    let certificate = UnsupportedCertificateEku::new(
        wire.thumbprint.unwrap_or_default(),
        wire.eku_oid.unwrap_or_default(),
    )?;
    Ok(ValidationIssue::SigningCertificateHasUnsupportedEku(
        certificate,
    ))
}

fn sample_client_failure() -> Result<ValidationIssue, TaxonomyError> {
    Ok(ValidationIssue::ClientSigningVerificationFailure(
        ClientSignatureFailure::new("NU3000", "sample message")?,
    ))
}

fn sample_certificate_revoked() -> Result<ValidationIssue, TaxonomyError> {
    Ok(ValidationIssue::SigningCertificateRevoked(
        RevokedCertificate::new("da39a3ee5e6b4b0d3255bfef95601890afd80709")?,
    ))
}

fn sample_certificate_unsupported_eku() -> Result<ValidationIssue, TaxonomyError> {
    Ok(ValidationIssue::SigningCertificateHasUnsupportedEku(
        UnsupportedCertificateEku::new(
            "da39a3ee5e6b4b0d3255bfef95601890afd80709",
            "1.3.6.1.5.5.7.3.3",
        )?,
    ))
}

/// Build the issue-family registry. Called once at startup; the result is
/// shared by reference afterwards. Deprecated codes are registered like any
/// other so their persisted rows keep decoding.
pub fn build_issue_registry() -> Result<TaxonomyRegistry<ValidationIssue>, TaxonomyError> {
    let mut builder = TaxonomyRegistryBuilder::new(ISSUE_FAMILY);

    builder.register(VariantRegistration {
        code: ValidationIssueCode::PackageIsSigned.numeric(),
        decode: decode_package_is_signed,
        sample: || Ok(ValidationIssue::PackageIsSigned),
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::ClientSigningVerificationFailure.numeric(),
        decode: decode_client_failure,
        sample: sample_client_failure,
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::PackageIsZip64.numeric(),
        decode: decode_package_is_zip64,
        sample: || Ok(ValidationIssue::PackageIsZip64),
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::OnlyAuthorSignaturesSupported.numeric(),
        decode: decode_only_author_signatures,
        sample: || Ok(ValidationIssue::OnlyAuthorSignaturesSupported),
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::AuthorAndRepositoryCounterSignaturesNotSupported.numeric(),
        decode: decode_author_and_repository_counter_signatures,
        sample: || Ok(ValidationIssue::AuthorAndRepositoryCounterSignaturesNotSupported),
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::OnlySignatureFormatVersion1Supported.numeric(),
        decode: decode_only_signature_format_v1,
        sample: || Ok(ValidationIssue::OnlySignatureFormatVersion1Supported),
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::AuthorCounterSignaturesNotSupported.numeric(),
        decode: decode_author_counter_signatures,
        sample: || Ok(ValidationIssue::AuthorCounterSignaturesNotSupported),
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::PackageIsNotSigned.numeric(),
        decode: decode_package_is_not_signed,
        sample: || Ok(ValidationIssue::PackageIsNotSigned),
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::PackageShouldNotBeSignedButCanManageCertificates.numeric(),
        decode: decode_should_not_be_signed,
        sample: || Ok(ValidationIssue::PackageShouldNotBeSignedButCanManageCertificates),
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::SigningCertificateRevoked.numeric(),
        decode: decode_certificate_revoked,
        sample: sample_certificate_revoked,
    })?;
    builder.register(VariantRegistration {
        code: ValidationIssueCode::SigningCertificateHasUnsupportedEku.numeric(),
        decode: decode_certificate_unsupported_eku,
        sample: sample_certificate_unsupported_eku,
    })?;

    Ok(builder.build())
}

/// Machine-readable manifest of the issue-family code assignment.
pub fn issue_code_catalog() -> CodeCatalog {
    CodeCatalog {
        version: CODE_CATALOG_VERSION,
        compatibility_policy: CODE_COMPATIBILITY_POLICY.to_string(),
        family: ISSUE_FAMILY.to_string(),
        entries: ALL_ISSUE_CODES
            .iter()
            .copied()
            .map(ValidationIssueCode::to_catalog_entry)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn registry() -> TaxonomyRegistry<ValidationIssue> {
        build_issue_registry().expect("registry")
    }

    fn client_failure() -> ValidationIssue {
        ValidationIssue::ClientSigningVerificationFailure(
            ClientSignatureFailure::new("NU3018", "The package signature is invalid.")
                .expect("payload"),
        )
    }

    // -- Code enum --

    #[test]
    fn numeric_codes_are_unique_and_dense() {
        let mut seen = BTreeSet::new();
        for code in ALL_ISSUE_CODES {
            assert!(seen.insert(code.numeric()), "{code:?} reuses a numeric");
        }
        let expected: BTreeSet<RawCode> = (0..=11).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn from_numeric_round_trips_all_codes() {
        for code in ALL_ISSUE_CODES {
            let round_trip = ValidationIssueCode::from_numeric(code.numeric());
            assert_eq!(round_trip, Some(*code));
        }
        assert_eq!(ValidationIssueCode::from_numeric(12), None);
        assert_eq!(ValidationIssueCode::from_numeric(u16::MAX), None);
    }

    #[test]
    fn deprecated_codes_are_exactly_the_retired_ones() {
        let deprecated: Vec<RawCode> = ALL_ISSUE_CODES
            .iter()
            .filter(|code| code.deprecated())
            .map(|code| code.numeric())
            .collect();
        assert_eq!(deprecated, vec![3, 10, 11]);
    }

    #[test]
    fn payload_bearing_codes_match_variant_shapes() {
        let with_payload: Vec<RawCode> = ALL_ISSUE_CODES
            .iter()
            .filter(|code| code.requires_payload())
            .map(|code| code.numeric())
            .collect();
        assert_eq!(with_payload, vec![2, 10, 11]);
    }

    // -- Payload validation --

    #[test]
    fn client_failure_requires_both_fields() {
        assert!(matches!(
            ClientSignatureFailure::new("", "message"),
            Err(TaxonomyError::MissingRequiredField { code: 2, .. })
        ));
        assert!(matches!(
            ClientSignatureFailure::new("NU3018", ""),
            Err(TaxonomyError::MissingRequiredField { code: 2, .. })
        ));
    }

    #[test]
    fn revoked_certificate_requires_thumbprint() {
        assert!(matches!(
            RevokedCertificate::new(""),
            Err(TaxonomyError::MissingRequiredField { code: 10, .. })
        ));
    }

    #[test]
    fn unsupported_eku_requires_both_fields() {
        assert!(matches!(
            UnsupportedCertificateEku::new("", "1.2.3"),
            Err(TaxonomyError::MissingRequiredField { code: 11, .. })
        ));
        assert!(matches!(
            UnsupportedCertificateEku::new("abc", ""),
            Err(TaxonomyError::MissingRequiredField { code: 11, .. })
        ));
    }

    // -- Encode --

    #[test]
    fn client_failure_uses_short_wire_keys() {
        let issue = client_failure();
        assert_eq!(
            issue.encode(),
            r#"{"c":"NU3018","m":"The package signature is invalid."}"#
        );
    }

    #[test]
    fn certificate_payloads_use_short_wire_keys() {
        let revoked = ValidationIssue::SigningCertificateRevoked(
            RevokedCertificate::new("aabbcc").expect("payload"),
        );
        assert_eq!(revoked.encode(), r#"{"t":"aabbcc"}"#);

        let eku = ValidationIssue::SigningCertificateHasUnsupportedEku(
            UnsupportedCertificateEku::new("aabbcc", "1.3.6.1.5.5.7.3.3").expect("payload"),
        );
        assert_eq!(eku.encode(), r#"{"t":"aabbcc","o":"1.3.6.1.5.5.7.3.3"}"#);
    }

    #[test]
    fn no_data_variants_encode_to_empty_object() {
        let no_data = [
            ValidationIssue::Unknown,
            ValidationIssue::PackageIsSigned,
            ValidationIssue::PackageIsZip64,
            ValidationIssue::OnlyAuthorSignaturesSupported,
            ValidationIssue::AuthorAndRepositoryCounterSignaturesNotSupported,
            ValidationIssue::OnlySignatureFormatVersion1Supported,
            ValidationIssue::AuthorCounterSignaturesNotSupported,
            ValidationIssue::PackageIsNotSigned,
            ValidationIssue::PackageShouldNotBeSignedButCanManageCertificates,
        ];
        for issue in &no_data {
            assert_eq!(issue.encode(), "{}", "{issue:?} must encode empty");
        }
    }

    // -- Decode --

    #[test]
    fn every_registered_variant_round_trips() {
        let registry = registry();
        let samples = [
            ValidationIssue::PackageIsSigned,
            client_failure(),
            ValidationIssue::PackageIsZip64,
            ValidationIssue::OnlyAuthorSignaturesSupported,
            ValidationIssue::AuthorAndRepositoryCounterSignaturesNotSupported,
            ValidationIssue::OnlySignatureFormatVersion1Supported,
            ValidationIssue::AuthorCounterSignaturesNotSupported,
            ValidationIssue::PackageIsNotSigned,
            ValidationIssue::PackageShouldNotBeSignedButCanManageCertificates,
            ValidationIssue::SigningCertificateRevoked(
                RevokedCertificate::new("aabbcc").expect("payload"),
            ),
            ValidationIssue::SigningCertificateHasUnsupportedEku(
                UnsupportedCertificateEku::new("aabbcc", "1.3.6.1.5.5.7.3.3").expect("payload"),
            ),
        ];
        for issue in &samples {
            let decoded = registry
                .decode(issue.raw_code(), &issue.encode())
                .expect("decode");
            assert_eq!(decoded, *issue);
        }
    }

    #[test]
    fn deprecated_codes_still_decode_and_render() {
        let registry = registry();

        let zip64 = registry.decode(3, "{}").expect("zip64 decodes");
        assert_eq!(zip64, ValidationIssue::PackageIsZip64);
        assert_eq!(zip64.render(), "Zip64 packages are not supported.");

        let revoked = registry
            .decode(10, r#"{"t":"da39a3ee"}"#)
            .expect("revoked decodes");
        assert_eq!(
            revoked.render(),
            "The signing certificate with thumbprint da39a3ee has been revoked."
        );
    }

    #[test]
    fn no_data_codes_reject_garbage_payloads() {
        let registry = registry();
        for payload in ["HELLO THIS IS DOG", "null", "[]", "3"] {
            let err = registry.decode(1, payload).expect_err("garbage payload");
            assert!(matches!(err, TaxonomyError::MalformedPayload { code: 1, .. }));
        }
    }

    #[test]
    fn no_data_codes_ignore_extra_fields() {
        let registry = registry();
        let decoded = registry
            .decode(1, r#"{"added_in_a_future_release":true}"#)
            .expect("decode");
        assert_eq!(decoded, ValidationIssue::PackageIsSigned);
    }

    #[test]
    fn client_failure_decode_rejects_missing_fields() {
        let registry = registry();
        let err = registry
            .decode(2, r#"{"c":"NU3018"}"#)
            .expect_err("missing message");
        assert_eq!(
            err,
            TaxonomyError::MissingRequiredField {
                code: 2,
                field: "client_message".to_string(),
            }
        );
    }

    #[test]
    fn unrecognized_code_falls_back_without_parsing() {
        let registry = registry();
        let decoded = registry.decode(12, "{\"broken").expect("fallback");
        assert_eq!(decoded, ValidationIssue::Unknown);
        assert_eq!(decoded.render(), UNKNOWN_ISSUE_MESSAGE);
    }

    // -- Registry --

    #[test]
    fn registry_self_check_passes() {
        registry().self_check().expect("self check");
    }

    #[test]
    fn registry_covers_every_non_fallback_code() {
        let registry = registry();
        assert_eq!(registry.len(), ALL_ISSUE_CODES.len() - 1);
        for code in ALL_ISSUE_CODES {
            if *code == ValidationIssueCode::Unknown {
                continue;
            }
            assert!(
                registry.lookup(code.numeric()).is_some(),
                "{code:?} is not registered"
            );
        }
    }

    // -- Catalog --

    #[test]
    fn catalog_matches_code_enum() {
        let catalog = issue_code_catalog();
        assert_eq!(catalog.family, ISSUE_FAMILY);
        assert_eq!(catalog.entries.len(), ALL_ISSUE_CODES.len());
        for (entry, code) in catalog.entries.iter().zip(ALL_ISSUE_CODES) {
            assert_eq!(entry.numeric, code.numeric());
            assert_eq!(entry.name, code.as_str());
            assert_eq!(entry.requires_payload, code.requires_payload());
            assert_eq!(entry.deprecated, code.deprecated());
        }
    }

    #[test]
    fn catalog_round_trips_as_json() {
        let catalog = issue_code_catalog();
        let json = serde_json::to_string_pretty(&catalog).expect("serialize");
        let restored: CodeCatalog = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, catalog);
    }

    // -- Render --

    #[test]
    fn client_failure_renders_code_and_message() {
        assert_eq!(
            client_failure().render(),
            "NU3018: The package signature is invalid."
        );
    }

    #[test]
    fn render_messages_are_distinct_per_code() {
        let issues = [
            ValidationIssue::Unknown,
            ValidationIssue::PackageIsSigned,
            ValidationIssue::PackageIsZip64,
            ValidationIssue::OnlyAuthorSignaturesSupported,
            ValidationIssue::AuthorAndRepositoryCounterSignaturesNotSupported,
            ValidationIssue::OnlySignatureFormatVersion1Supported,
            ValidationIssue::AuthorCounterSignaturesNotSupported,
            ValidationIssue::PackageIsNotSigned,
            ValidationIssue::PackageShouldNotBeSignedButCanManageCertificates,
        ];
        let rendered: BTreeSet<String> = issues.iter().map(ValidationIssue::render).collect();
        assert_eq!(rendered.len(), issues.len());
    }
}
