//! certmeta-lib: Certificate metadata decoding for signature validation.
//!
//! Decodes the X.509 extensions a validation engine relies on (key
//! identifiers, AIA, CRL distribution points, qualified certificate
//! statements, ...) into typed values, builds and matches OCSP certificate
//! identifiers, decodes CRL revocation reasons, and derives stable
//! identifiers for signatures and certificates.

pub mod asn1;
mod digest;
mod display;
mod extensions;
mod fields;
mod identifier;
pub mod oid;
mod parser;
mod revocation;
mod util;

pub use asn1::asn1_signature_policy_digest;
pub use digest::{compute_digest, DigestAlgorithm};
pub use display::{display_text, to_json};
pub use extensions::{
    decode_extensions, decode_extensions_with_options, failure_policy, preferred_ca_issuers_url,
    DecodeOptions, ExtensionSource, ExtensionValues, FailurePolicy,
};
pub use fields::{
    AuthorityInformationAccess, AuthorityKeyIdentifier, BasicConstraints, CertificateExtension,
    CertificateExtensions, CertificatePolicies, CertificatePolicy, CrlDistributionPoints,
    ExtendedKeyUsages, ExtensionKind, KeyUsage, KeyUsageBit, OcspNoCheck, OtherExtension,
    PdsLocation, Psd2QcType, PspRole, QcLimitValue, QcStatements, QcType, RawExtension,
    RoleOfPsp, SemanticsIdentifier, SubjectAlternativeNames, SubjectKeyIdentifier,
    ValidityAssuredShortTerm,
};
pub use identifier::{
    counter_signature_deterministic_id, deterministic_id, fallback_signing_time,
    CertificateNumbering, NumberingMode,
};
pub use parser::{
    certificate_extensions_from_der, certificate_extensions_from_pem, certificate_id_from_der,
    parse_certificate_extensions,
};
pub use revocation::{
    build_certificate_id, build_certificate_id_with, crl_revocation_token_key,
    decode_crl_revocation_reason, latest_single_response_for, matches, ocsp_revocation_token_key,
    parse_ocsp_response, single_responses_for, BasicOcspResponse, CertStatus, CertificateId,
    RevocationReason, SingleResponse,
};

/// Errors returned by certmeta-lib.
#[derive(Debug, thiserror::Error)]
pub enum CertMetaError {
    #[error("Malformed ASN.1: {0}")]
    MalformedAsn1(String),

    #[error("Malformed {name} extension: {reason}")]
    ExtensionError { name: &'static str, reason: String },

    #[error("Digest unavailable: {0}")]
    DigestUnavailable(String),

    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("DER encoding error: {0}")]
    EncodingError(String),

    #[error("OCSP error: {0}")]
    OcspError(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
